// src/domain/cursor.rs
//
// Opaque keyset cursor: base64url(JSON {"id", "v", "s"}).
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::constants::MAX_CURSOR_LEN;
use crate::domain::{DomainError, FilterSummary};
use crate::util::time::timestamp_key;

/// URL-safe alphabet, unpadded on output, padding tolerated on input.
const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    #[serde(rename = "p")]
    Popular,
    #[serde(rename = "n")]
    New,
    #[serde(rename = "u")]
    Updated,
    #[serde(rename = "m")]
    MostUsed,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Popular,
        SortMode::New,
        SortMode::Updated,
        SortMode::MostUsed,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            SortMode::Popular => "p",
            SortMode::New => "n",
            SortMode::Updated => "u",
            SortMode::MostUsed => "m",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.tag() == tag)
    }

    /// The sort key this mode reads from a row.
    pub fn value_of(&self, row: &FilterSummary) -> SortValue {
        match self {
            SortMode::Popular => SortValue::Float(row.popularity),
            SortMode::New => SortValue::Text(timestamp_key(&row.created_at)),
            SortMode::Updated => SortValue::Text(timestamp_key(&row.updated_at)),
            SortMode::MostUsed => SortValue::Int(row.export_count),
        }
    }

    /// Whether a cursor value has the kind this mode sorts on.
    pub fn accepts(&self, value: &SortValue) -> bool {
        match self {
            SortMode::Popular | SortMode::MostUsed => value.is_numeric(),
            SortMode::New | SortMode::Updated => matches!(value, SortValue::Text(_)),
        }
    }

    /// Keyset order: sort value descending, then id ascending.
    pub fn compare(&self, a: &FilterSummary, b: &FilterSummary) -> Ordering {
        let (va, vb) = (self.value_of(a), self.value_of(b));
        vb.compare(&va)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SortMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s {
            "popular" => Some(SortMode::Popular),
            "new" | "newest" => Some(SortMode::New),
            "updated" => Some(SortMode::Updated),
            "most-used" | "most_used" => Some(SortMode::MostUsed),
            tag => SortMode::from_tag(tag),
        };
        mode.ok_or_else(|| DomainError::Validation(format!("unknown sort mode '{s}'")))
    }
}

/// Primary ordering key carried by a cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SortValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl SortValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortValue::Int(_) | SortValue::Float(_))
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(SortValue::Int)
                .or_else(|| n.as_f64().map(SortValue::Float)),
            Value::String(s) => Some(SortValue::Text(s.clone())),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SortValue::Int(i) => Value::from(*i),
            SortValue::Float(f) => Value::from(*f),
            SortValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Numbers compare numerically across Int/Float; text compares bytewise.
    /// Mixed kinds are incomparable.
    pub fn compare(&self, other: &SortValue) -> Option<Ordering> {
        match (self, other) {
            (SortValue::Int(a), SortValue::Int(b)) => Some(a.cmp(b)),
            (SortValue::Text(a), SortValue::Text(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            SortValue::Int(i) => Some(*i as f64),
            SortValue::Float(f) => Some(*f),
            SortValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub id: i64,
    pub v: SortValue,
    pub s: SortMode,
}

/// Outcome of decoding a client-supplied token.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorDecode {
    Valid(Cursor),
    Invalid,
}

impl CursorDecode {
    pub fn is_valid(&self) -> bool {
        matches!(self, CursorDecode::Valid(_))
    }

    pub fn into_cursor(self) -> Option<Cursor> {
        match self {
            CursorDecode::Valid(cursor) => Some(cursor),
            CursorDecode::Invalid => None,
        }
    }
}

impl Cursor {
    pub fn new(id: i64, v: SortValue, s: SortMode) -> Self {
        Self { id, v, s }
    }

    /// Resume point after `row` under `sort`.
    pub fn for_row(sort: SortMode, row: &FilterSummary) -> Self {
        Self::new(row.id, sort.value_of(row), sort)
    }

    pub fn encode(&self) -> String {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(self.id));
        fields.insert("v".to_string(), self.v.to_json());
        fields.insert("s".to_string(), Value::from(self.s.tag()));
        CURSOR_ENGINE.encode(Value::Object(fields).to_string())
    }

    /// Never fails: anything that is not a well-formed cursor is `Invalid`.
    pub fn decode(token: &str) -> CursorDecode {
        match Self::parse(token) {
            Some(cursor) => CursorDecode::Valid(cursor),
            None => {
                debug!(token_len = token.len(), "Rejected invalid cursor");
                CursorDecode::Invalid
            }
        }
    }

    fn parse(token: &str) -> Option<Cursor> {
        let token = token.trim();
        if token.is_empty() || token.len() > MAX_CURSOR_LEN {
            return None;
        }
        let bytes = CURSOR_ENGINE.decode(token).ok()?;
        let payload: Value = serde_json::from_slice(&bytes).ok()?;
        let fields = payload.as_object()?;

        let id = fields.get("id")?.as_i64()?;
        let v = SortValue::from_json(fields.get("v")?)?;
        let s = SortMode::from_tag(fields.get("s")?.as_str()?)?;
        Some(Cursor { id, v, s })
    }

    /// A cursor only resumes a listing with the same sort mode and a value of
    /// the right kind.
    pub fn applies_to(&self, sort: SortMode) -> bool {
        self.s == sort && sort.accepts(&self.v)
    }

    /// True when `row` comes strictly after this cursor in keyset order.
    pub fn admits(&self, row: &FilterSummary) -> bool {
        match self.s.value_of(row).compare(&self.v) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => row.id > self.id,
            _ => false,
        }
    }
}
