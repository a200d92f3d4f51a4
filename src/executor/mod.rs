//! Test execution engine
//!
//! Duration-bounded soak runs and repeat-bounded benchmark runs over a
//! [`Results`](crate::results::Results) aggregate.

#![allow(dead_code)]
#![allow(unused_imports)]

mod benchmark;
mod scheduler;
mod summary;
mod worker;

pub use scheduler::{ExecutorError, PROGRESS_INTERVAL};
pub use summary::{RunMode, RunSummary};
