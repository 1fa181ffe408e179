//! Record shapes and structural validation.
//!
//! A line of input decodes into a [`RawRecord`], an untyped JSON value. It is
//! valid only if it parses into exactly one of the recognized shapes: same
//! field names, same JSON types, nothing extra, nothing missing. Parsing is
//! strict; a quoted `"1000"` or a float `1000.0` does not satisfy an integer
//! field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An undecoded-to-shape record: one JSON value read from one source line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Decode one line of JSON text.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line).map(Self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Identifies which recognized shape a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    String,
    Number,
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeTag::String => write!(f, "StringRecord"),
            ShapeTag::Number => write!(f, "NumberRecord"),
        }
    }
}

/// `{"kind": <text>, "string": <text>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringRecord {
    pub kind: String,
    pub string: String,
}

/// `{"kind": <text>, "number": <integer>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberRecord {
    pub kind: String,
    pub number: i64,
}

/// A [`NumberRecord`] after its payload has been replaced by its natural log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogNumberRecord {
    pub kind: String,
    pub number: f64,
}

type ShapeParser = fn(&Value) -> Option<Record>;

/// Candidate shapes in declared order. The first successful parse wins.
const SHAPES: &[(ShapeTag, ShapeParser)] = &[
    (ShapeTag::String, parse_string),
    (ShapeTag::Number, parse_number),
];

/// Find the first declared shape `raw` parses into.
///
/// Only JSON objects are candidates. Serde would otherwise accept a
/// positional array for a struct.
fn match_shape(raw: &RawRecord) -> Option<(ShapeTag, Record)> {
    let value = raw.as_value();
    if !value.is_object() {
        return None;
    }
    SHAPES
        .iter()
        .find_map(|(tag, parse)| parse(value).map(|record| (*tag, record)))
}

fn parse_string(value: &Value) -> Option<Record> {
    StringRecord::deserialize(value).ok().map(Record::String)
}

fn parse_number(value: &Value) -> Option<Record> {
    NumberRecord::deserialize(value).ok().map(Record::Number)
}

/// A record known to match exactly one recognized shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    String(StringRecord),
    Number(NumberRecord),
}

impl Record {
    /// Parse a raw record into the first shape it matches, if any.
    pub fn parse(raw: &RawRecord) -> Option<Record> {
        match_shape(raw).map(|(_, record)| record)
    }

    pub fn shape(&self) -> ShapeTag {
        match self {
            Record::String(_) => ShapeTag::String,
            Record::Number(_) => ShapeTag::Number,
        }
    }

    /// The numeric payload, if this shape has one.
    pub fn number(&self) -> Option<i64> {
        match self {
            Record::Number(r) => Some(r.number),
            Record::String(_) => None,
        }
    }

    /// The text payload, if this shape has one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Record::String(r) => Some(&r.string),
            Record::Number(_) => None,
        }
    }
}

/// A validated record whose payload has been rewritten by the transform
/// stage. Serializes with the same field names as its source shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformedRecord {
    String(StringRecord),
    Number(LogNumberRecord),
}

impl TransformedRecord {
    pub fn shape(&self) -> ShapeTag {
        match self {
            TransformedRecord::String(_) => ShapeTag::String,
            TransformedRecord::Number(_) => ShapeTag::Number,
        }
    }
}

/// The single shape `raw` structurally matches, or `None`.
pub fn shape_of(raw: &RawRecord) -> Option<ShapeTag> {
    match_shape(raw).map(|(tag, _)| tag)
}

/// True iff `raw` matches a recognized shape. Never fails on malformed input.
pub fn is_valid(raw: &RawRecord) -> bool {
    shape_of(raw).is_some()
}
