//! Record sources.
//!
//! A source turns an id into a lazy stream of [`RawRecord`]s, one per input
//! line, in line order. A line that is not JSON at all is a fault for that
//! source; a line that is JSON but matches no shape is left for the
//! validate stage to drop.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::error::PipelineError;
use crate::record::RawRecord;

/// Lazy stream of decoded records from one source.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<RawRecord, PipelineError>> + 'a>;

/// Opens sources by id. Each call starts a fresh pass from the beginning.
pub trait Source: Send + Sync {
    fn open(&self, source_id: &str) -> Result<RecordStream<'_>, PipelineError>;
}

impl<T: Source + ?Sized> Source for &T {
    fn open(&self, source_id: &str) -> Result<RecordStream<'_>, PipelineError> {
        (**self).open(source_id)
    }
}

/// Reads newline-delimited JSON from a file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesSource;

impl Source for JsonLinesSource {
    fn open(&self, source_id: &str) -> Result<RecordStream<'_>, PipelineError> {
        let file = File::open(source_id).map_err(|cause| PipelineError::Open {
            source_id: source_id.to_string(),
            cause,
        })?;
        log::debug!("opened source {source_id}");
        Ok(Box::new(decode_lines(
            source_id.to_string(),
            BufReader::new(file).lines(),
        )))
    }
}

/// In-memory sources keyed by id, decoded with the same rules as files.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sources: HashMap<String, Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the lines served for `source_id`.
    pub fn with_lines<S, L>(mut self, source_id: S, lines: impl IntoIterator<Item = L>) -> Self
    where
        S: Into<String>,
        L: Into<String>,
    {
        self.sources
            .insert(source_id.into(), lines.into_iter().map(Into::into).collect());
        self
    }
}

impl Source for MemorySource {
    fn open(&self, source_id: &str) -> Result<RecordStream<'_>, PipelineError> {
        let lines = self
            .sources
            .get(source_id)
            .ok_or_else(|| PipelineError::Open {
                source_id: source_id.to_string(),
                cause: io::Error::new(io::ErrorKind::NotFound, "no such source"),
            })?;
        Ok(Box::new(decode_lines(
            source_id.to_string(),
            lines.iter().map(|line| Ok(line.clone())),
        )))
    }
}

/// Decode each line as JSON. Line numbers in errors are 1-based.
fn decode_lines<L>(
    source_id: String,
    lines: L,
) -> impl Iterator<Item = Result<RawRecord, PipelineError>>
where
    L: Iterator<Item = io::Result<String>>,
{
    lines.enumerate().map(move |(idx, line)| {
        let line_no = idx + 1;
        let line = line.map_err(|cause| PipelineError::Io {
            source_id: source_id.clone(),
            line: line_no,
            cause,
        })?;
        RawRecord::from_json(&line).map_err(|cause| PipelineError::Decode {
            source_id: source_id.clone(),
            line: line_no,
            cause,
        })
    })
}
