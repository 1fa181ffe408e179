//! # jsonl-pipes
//!
//! A lazy, batched record pipeline over newline-delimited JSON.
//!
//! Each input line is decoded, validated against a closed set of record
//! shapes, filtered by a business predicate, transformed, grouped into
//! fixed-size batches, and handed to a sink that reports how many records
//! it accepted.
//!
//! ## Overview
//!
//! - **Strict shapes**: a record is valid only if its field names and JSON
//!   types match one shape exactly
//! - **Lazy evaluation**: records are pulled one at a time; at most one batch
//!   is resident per source
//! - **Two executors**: sequential here, parallel in the `par-pipe` crate
//!
//! ## Example
//!
//! ```
//! use jsonl_pipes::{CountingSink, Executor, MemorySource, PipelineConfig};
//!
//! let source = MemorySource::new().with_lines(
//!     "events",
//!     [
//!         r#"{"kind":"string-tag","string":"banana"}"#,
//!         r#"{"kind":"string-tag","number":1000,"extra":1}"#,
//!         r#"{"kind":"string-tag","number":950}"#,
//!     ],
//! );
//!
//! let executor = Executor::new(&PipelineConfig::default(), source, CountingSink).unwrap();
//! assert_eq!(executor.run("events").unwrap(), 2);
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod source;
pub mod stage;

pub use batch::{Batch, Batches, FaultTrap};
pub use config::{
    ConfigOverrides, DEFAULT_BATCH_SIZE, DEFAULT_PATTERN, DEFAULT_SUFFIX, DEFAULT_THRESHOLD,
    PipelineConfig, default_workers,
};
pub use error::PipelineError;
pub use executor::Executor;
pub use pipeline::Pipeline;
pub use record::{
    LogNumberRecord, NumberRecord, RawRecord, Record, ShapeTag, StringRecord, TransformedRecord,
    is_valid, shape_of,
};
pub use sink::{CountingSink, JsonLinesSink, Sink};
pub use source::{JsonLinesSource, MemorySource, RecordStream, Source};
pub use stage::{KeepStage, Stage, Staged, TransformStage, ValidateStage};
