//! Forge Test Generation
//!
//! Turns a generated test factory into a trusted set of test cases:
//!
//! 1. [`TestCaseExecutor`] runs the factory in the sandbox with the
//!    reference solution and problem context, under a hard timeout, and
//!    validates its output (shape, arity, codec normalization, parsed
//!    [`Constraints`], duplicates).
//! 2. [`CrossValidator`] runs both the primary and the secondary
//!    solution on every surviving case through the judge engine and
//!    keeps only the cases both pass.
//!
//! [`SolutionRunner`] is the shared building block for calling a
//! solution source on serialized inputs.

#![deny(unsafe_code)]

mod constraints;
mod cross_validator;
mod error;
mod executor;
mod runner;

pub use constraints::{eval_number, Bound, Constraints, Limit, Target, Violation};
pub use cross_validator::{CaseOutcome, CrossValidation, CrossValidator, SolutionRole};
pub use error::{ExecutorError, ExecutorResult, RetryAction, RunError};
pub use executor::{ExecutorConfig, GenerationOutcome, TestCaseExecutor};
pub use runner::{SolutionRun, SolutionRunner};
