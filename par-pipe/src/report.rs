//! Aggregated results of a parallel run.

use jsonl_pipes::PipelineError;

/// What happened to one dispatched source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source_id: String,
    pub result: Result<usize, PipelineError>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// One outcome per dispatched source, in dispatch order.
#[derive(Debug, Default)]
pub struct ParallelReport {
    outcomes: Vec<SourceOutcome>,
}

impl ParallelReport {
    pub fn new(outcomes: Vec<SourceOutcome>) -> Self {
        Self { outcomes }
    }

    /// Records accepted across every source that succeeded.
    pub fn total(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    /// Sources that faulted.
    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(SourceOutcome::is_ok)
    }

    pub fn outcomes(&self) -> &[SourceOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
