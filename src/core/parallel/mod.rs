//! Batch processing: whole merge jobs dispatched onto a bounded worker
//! pool. Jobs are independent and share no mutable state; the pool
//! dispatches jobs, never sub-phases.

pub mod scheduler;
pub mod task;

pub use scheduler::TaskScheduler;
pub use task::{Task, TaskResult};
