//! Persistence sinks.
//!
//! A sink consumes one batch and reports how many records it accepted. It
//! may accept fewer than it is given and stop reading early. Upstream faults
//! never reach a sink; the executor cuts the batch short and reports them
//! itself.

use std::io::Write;
use std::sync::Mutex;

use crate::error::PipelineError;
use crate::record::TransformedRecord;

/// Persists batches. Shared by every worker, hence `&self`.
pub trait Sink: Send + Sync {
    /// Consume `batch` and return the number of records accepted.
    fn persist(
        &self,
        batch: &mut dyn Iterator<Item = TransformedRecord>,
    ) -> Result<usize, PipelineError>;
}

/// Accepts everything and stores nothing. Returns the batch length.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingSink;

impl Sink for CountingSink {
    fn persist(
        &self,
        batch: &mut dyn Iterator<Item = TransformedRecord>,
    ) -> Result<usize, PipelineError> {
        Ok(batch.count())
    }
}

/// Writes each record as one JSON line.
///
/// A batch is serialized into a buffer first and written in one locked call,
/// so batches from different workers never interleave line by line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn persist(
        &self,
        batch: &mut dyn Iterator<Item = TransformedRecord>,
    ) -> Result<usize, PipelineError> {
        let mut buf = Vec::new();
        let mut accepted = 0;
        for record in batch {
            serde_json::to_writer(&mut buf, &record)
                .map_err(|e| PipelineError::Sink(e.to_string()))?;
            buf.push(b'\n');
            accepted += 1;
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PipelineError::Sink("writer lock poisoned".to_string()))?;
        writer
            .write_all(&buf)
            .and_then(|()| writer.flush())
            .map_err(|e| PipelineError::Sink(e.to_string()))?;
        Ok(accepted)
    }
}
