//! Pipeline driver and the sequential executor.
//!
//! [`Executor::run`] pushes one source through
//! validate -> keep -> transform -> batch -> sink in a single lazy pass.
//! At most one batch of records is in flight at a time, so memory use is
//! bounded by the batch size rather than the source size.
//!
//! [`Executor::run_all`] is the sequential strategy: one source after
//! another on the calling thread. The parallel strategy lives in the
//! `par-pipe` crate and reuses [`Executor::run`] per source.

use std::num::NonZeroUsize;

use crate::batch::FaultTrap;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::sink::Sink;
use crate::source::Source;
use crate::stage::{KeepStage, Stage, TransformStage, ValidateStage};

/// Runs the record pipeline over sources from `S` into sink `K`.
pub struct Executor<S, K> {
    source: S,
    sink: K,
    keep: KeepStage,
    transform: TransformStage,
    batch_size: NonZeroUsize,
}

impl<S: Source, K: Sink> Executor<S, K> {
    /// Build an executor, validating `config` first.
    pub fn new(config: &PipelineConfig, source: S, sink: K) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            source,
            sink,
            keep: KeepStage::new(config.threshold, config.compile_pattern()?),
            transform: TransformStage::new(config.suffix.clone()),
            batch_size: config.batch_size()?,
        })
    }

    /// Process one source and return the number of records the sink
    /// accepted across all its batches.
    ///
    /// A source with nothing to persist returns 0 without calling the sink.
    /// Decode, domain and sink faults abort this source only.
    ///
    /// The sink only ever sees records. An upstream fault ends the batch
    /// being handed out, and once the sink returns the rest of that batch's
    /// quota is drained; the first fault found either way is returned no
    /// matter what the sink reported.
    pub fn run(&self, source_id: &str) -> Result<usize, PipelineError> {
        let records = self.source.open(source_id)?;
        log::debug!(
            "{source_id}: {} -> {} -> {} in batches of {}",
            ValidateStage.name(),
            self.keep.name(),
            self.transform.name(),
            self.batch_size
        );
        let mut batches = Pipeline::new(records)
            .stage(ValidateStage)
            .stage(&self.keep)
            .stage(&self.transform)
            .batches(self.batch_size);

        let mut accepted = 0;
        let mut batch_no = 0;
        while let Some(batch) = batches.next_batch() {
            batch_no += 1;
            let mut records = FaultTrap::new(batch);
            let persisted = self.sink.persist(&mut records);
            records.finish()?;
            let count = persisted?;
            log::debug!("{source_id}: batch {batch_no} accepted {count} records");
            accepted += count;
        }

        log::info!(
            "{source_id}: {accepted} records accepted in {} batches",
            batches.emitted()
        );
        Ok(accepted)
    }

    /// Sequential strategy: run each source in order on this thread and sum
    /// the totals.
    ///
    /// Stops at the first faulting source and returns its error; later
    /// sources are not started.
    pub fn run_all<T: AsRef<str>>(&self, source_ids: &[T]) -> Result<usize, PipelineError> {
        let mut total = 0;
        for source_id in source_ids {
            total += self.run(source_id.as_ref())?;
        }
        Ok(total)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }
}
