//! Error types for pipeline execution.
//!
//! Structural mismatches and filtered records are not errors; they are
//! dropped silently by their stages. Everything here aborts the source
//! being processed.

use thiserror::Error;

/// A fault that aborts processing of one source.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source could not be opened.
    #[error("cannot open source '{source_id}': {cause}")]
    Open {
        source_id: String,
        #[source]
        cause: std::io::Error,
    },

    /// Reading from an open source failed.
    #[error("read error in '{source_id}' at line {line}: {cause}")]
    Io {
        source_id: String,
        line: usize,
        #[source]
        cause: std::io::Error,
    },

    /// A line could not be decoded as JSON at all.
    #[error("undecodable record in '{source_id}' at line {line}: {cause}")]
    Decode {
        source_id: String,
        line: usize,
        #[source]
        cause: serde_json::Error,
    },

    /// Logarithm of a non-positive number.
    #[error("cannot take logarithm of non-positive number {value}")]
    Domain { value: i64 },

    /// The sink failed while persisting a batch.
    #[error("sink rejected batch: {0}")]
    Sink(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The worker pool could not be created.
    #[error("worker pool: {0}")]
    Pool(String),

    /// A worker panicked while running a source.
    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// The source id this error belongs to, when it carries one.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            PipelineError::Open { source_id, .. }
            | PipelineError::Io { source_id, .. }
            | PipelineError::Decode { source_id, .. } => Some(source_id),
            _ => None,
        }
    }
}
