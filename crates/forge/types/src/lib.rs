//! Forge Domain Types
//!
//! The data model shared by every stage of the exercise pipeline.
//!
//! # Key Concepts
//!
//! - **ProblemSpec**: An immutable, fully generated exercise: statement,
//!   constraints, signature, starting code and two independent solutions.
//! - **TestCase**: One serialized argument list plus its expected output.
//!   Structural values (lists, trees) are always in flat serialized form.
//! - **JudgeConfig**: The grading strategy, as a sum type so that a new
//!   strategy cannot be silently ignored by a dispatcher.
//! - **BuilderState**: The single-owner progress record of one builder run.

#![deny(unsafe_code)]

mod builder;
mod errors;
mod judge;
mod problem;
mod test_case;

pub use builder::*;
pub use errors::*;
pub use judge::*;
pub use problem::*;
pub use test_case::*;
