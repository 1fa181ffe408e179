//! Pipeline stages and the lazy adapter that chains them.
//!
//! Each stage takes one element and returns zero or one element. `Ok(None)`
//! means "drop this element and pull the next one", which is how invalid and
//! filtered records leave the stream. `Err` is a fault and ends the source.

use regex::Regex;

use crate::error::PipelineError;
use crate::record::{LogNumberRecord, RawRecord, Record, StringRecord, TransformedRecord};

/// A pipeline stage that processes elements one at a time.
pub trait Stage {
    type Input;
    type Output;

    /// Process a single element, returning it (possibly changed), nothing,
    /// or a fault.
    fn process(&self, input: Self::Input) -> Result<Option<Self::Output>, PipelineError>;

    /// The display name of this stage.
    fn name(&self) -> &str;
}

impl<S: Stage + ?Sized> Stage for &S {
    type Input = S::Input;
    type Output = S::Output;

    fn process(&self, input: Self::Input) -> Result<Option<Self::Output>, PipelineError> {
        (**self).process(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// Stage implementations
// ---------------------------------------------------------------------------

/// VALIDATE - keeps raw records that match a recognized shape.
pub struct ValidateStage;

impl Stage for ValidateStage {
    type Input = RawRecord;
    type Output = Record;

    fn process(&self, input: RawRecord) -> Result<Option<Record>, PipelineError> {
        Ok(Record::parse(&input))
    }

    fn name(&self) -> &str {
        "VALIDATE"
    }
}

/// KEEP - keeps records whose number exceeds `threshold` or whose text
/// matches `pattern`. A shape without the relevant payload fails that clause.
pub struct KeepStage {
    threshold: i64,
    pattern: Regex,
}

impl KeepStage {
    pub fn new(threshold: i64, pattern: Regex) -> Self {
        Self { threshold, pattern }
    }

    pub fn keep(&self, record: &Record) -> bool {
        if record.number().is_some_and(|n| n > self.threshold) {
            return true;
        }
        record.text().is_some_and(|s| self.pattern.is_match(s))
    }
}

impl Stage for KeepStage {
    type Input = Record;
    type Output = Record;

    fn process(&self, input: Record) -> Result<Option<Record>, PipelineError> {
        Ok(self.keep(&input).then_some(input))
    }

    fn name(&self) -> &str {
        "KEEP"
    }
}

/// TRANSFORM - appends `suffix` to text payloads and replaces numeric
/// payloads with their natural logarithm.
pub struct TransformStage {
    suffix: String,
}

impl TransformStage {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Fails with [`PipelineError::Domain`] for a number `<= 0`.
    pub fn transform(&self, record: Record) -> Result<TransformedRecord, PipelineError> {
        match record {
            Record::String(StringRecord { kind, mut string }) => {
                string.push_str(&self.suffix);
                Ok(TransformedRecord::String(StringRecord { kind, string }))
            }
            Record::Number(r) if r.number <= 0 => Err(PipelineError::Domain { value: r.number }),
            Record::Number(r) => Ok(TransformedRecord::Number(LogNumberRecord {
                kind: r.kind,
                number: (r.number as f64).ln(),
            })),
        }
    }
}

impl Stage for TransformStage {
    type Input = Record;
    type Output = TransformedRecord;

    fn process(&self, input: Record) -> Result<Option<TransformedRecord>, PipelineError> {
        self.transform(input).map(Some)
    }

    fn name(&self) -> &str {
        "TRANSFORM"
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Lazily applies a stage to every element pulled from `upstream`.
///
/// Upstream faults pass through untouched. Elements the stage drops are
/// skipped without yielding, so one `next()` may pull several upstream
/// elements.
pub struct Staged<I, S> {
    upstream: I,
    stage: S,
}

impl<I, S> Staged<I, S> {
    pub fn new(upstream: I, stage: S) -> Self {
        Self { upstream, stage }
    }
}

impl<I, S> Iterator for Staged<I, S>
where
    I: Iterator<Item = Result<S::Input, PipelineError>>,
    S: Stage,
{
    type Item = Result<S::Output, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let input = match self.upstream.next()? {
                Ok(input) => input,
                Err(e) => return Some(Err(e)),
            };
            match self.stage.process(input) {
                Ok(Some(output)) => return Some(Ok(output)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
