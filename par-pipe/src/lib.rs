//! Parallel executor for jsonl-pipes.
//!
//! Sources are the unit of parallelism: each one is processed start to
//! finish by a single worker from a fixed-size pool, with its records in
//! order. Sources run concurrently with each other, so completion order
//! and the order in which batches reach the sink across sources are
//! unspecified.

pub mod executor;
pub mod report;

pub use executor::run_parallel;
pub use report::{ParallelReport, SourceOutcome};
