//! Forge Judge Engine
//!
//! Decides pass/fail for a candidate's output on one test case. The
//! strategy comes from the problem's [`JudgeConfig`](forge_types::JudgeConfig)
//! and is dispatched by exhaustive match:
//!
//! - **ReturnValue** (also used when no config is present): round both
//!   sides to 5 decimals, normalize order if it does not matter, compare.
//! - **MutatingArrayWithK**: grade the count `k` and the first `k`
//!   elements of the mutated array argument.
//! - **CustomScript**: run a problem-specific `judge(args, returnValue,
//!   expected)` in the sandbox. `deepEqual` and `roundTo5Decimals` are
//!   the helpers meant for judging, but the script runs with the whole
//!   sandbox prelude in scope, so the structure codecs (`arrayToList`,
//!   `listToArray`, `arrayToTree`, `treeToArray`, `arrayTo_Node`,
//!   `_NodeToArray`) and the `ListNode`, `TreeNode` and `_Node`
//!   constructors are callable too.
//!
//! Judging is total: every outcome, including a broken custom judge, is
//! a [`Verdict`].

#![deny(unsafe_code)]

mod engine;
mod mutating;
mod verdict;

pub use engine::{judge_return_value, JudgeEngine};
pub use mutating::{judge_mutating, ExpectedK};
pub use verdict::Verdict;
