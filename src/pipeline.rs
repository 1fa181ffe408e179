//! Lazy pipeline builder.
//!
//! A [`Pipeline`] wraps an iterator of `Result`s and grows by adding stages.
//! Nothing runs until the final iterator (or a batch of it) is pulled.
//!
//! ```
//! use jsonl_pipes::{Pipeline, RawRecord, ValidateStage};
//! use serde_json::json;
//!
//! let raw = vec![
//!     Ok(RawRecord::new(json!({"kind": "string-tag", "string": "banana"}))),
//!     Ok(RawRecord::new(json!({"kind": "string-tag", "number": "1000"}))),
//! ];
//!
//! let valid: Vec<_> = Pipeline::new(raw.into_iter())
//!     .stage(ValidateStage)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(valid.len(), 1);
//! ```

use std::num::NonZeroUsize;

use crate::batch::Batches;
use crate::error::PipelineError;
use crate::stage::{Stage, Staged};

/// A lazily evaluated chain of stages over a fallible stream.
pub struct Pipeline<I> {
    inner: I,
}

impl<T, I> Pipeline<I>
where
    I: Iterator<Item = Result<T, PipelineError>>,
{
    pub fn new(source: I) -> Self {
        Self { inner: source }
    }

    /// Append a stage to the chain.
    pub fn stage<S>(self, stage: S) -> Pipeline<Staged<I, S>>
    where
        S: Stage<Input = T>,
    {
        Pipeline {
            inner: Staged::new(self.inner, stage),
        }
    }

    /// Hand the chain to the batcher.
    pub fn batches(self, size: NonZeroUsize) -> Batches<I> {
        Batches::new(self.inner, size)
    }
}

impl<T, I> Iterator for Pipeline<I>
where
    I: Iterator<Item = Result<T, PipelineError>>,
{
    type Item = Result<T, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
