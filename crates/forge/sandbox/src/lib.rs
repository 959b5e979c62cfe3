//! Forge Script Sandbox
//!
//! Loads and invokes untrusted, generated JavaScript with a bounded
//! capability set. Generated code (test factories, solutions, custom
//! judges) is never evaluated in-process by the host language; it runs
//! in an embedded interpreter with:
//!
//! - **A fresh context per execution**: no globals survive a run.
//! - **An explicit allow-list**: the prelude's node constructors and
//!   codec/comparator helpers, backed by a single native entry point.
//!   There is no filesystem, network, clock or module loader.
//! - **A wall-clock timeout** per request, plus interpreter loop and
//!   recursion limits for scripts that keep running after the caller
//!   has stopped waiting.
//! - **JSON-only data exchange**: bindings enter as JSON, results leave
//!   as JSON. Live node structures cross as tagged node graphs.
//!
//! ```rust,ignore
//! let sandbox = BoaSandbox::default();
//! let request = ExecutionRequest::new("return listToArray(arrayToList(xs));", timeout)
//!     .bind_value("xs", json!([1, 2, 3]));
//! assert_eq!(sandbox.execute(request).await?, json!([1, 2, 3]));
//! ```

#![deny(unsafe_code)]

mod config;
mod error;
pub mod host;
mod program;
mod runtime;

pub use config::SandboxConfig;
pub use error::{ExecutionError, SandboxResult};
pub use program::{Binding, ExecutionRequest, PRELUDE};
pub use runtime::{BoaSandbox, ScriptSandbox};
