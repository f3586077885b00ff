//! Inbound event normalization.
//!
//! Events arrive in three shapes: the record itself, an envelope whose `body`
//! is a JSON string, or an envelope whose `body` is already an object. The
//! shape is resolved once here; everything downstream sees a [`RawRecord`].

use churn_core::types::RawRecord;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an event could not be turned into a complete record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Record is missing required fields (declaration order)
    #[error("Missing required fields: {missing:?}")]
    Validation {
        /// Missing field names
        missing: Vec<String>,
    },

    /// Event or body is not a JSON object
    #[error("Malformed request body: {0}")]
    Parse(String),
}

/// Resolved shape of an inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum EventShape {
    /// No `body` key; the event is the record
    Direct(Map<String, Value>),
    /// `body` holds serialized JSON
    WrappedString(String),
    /// `body` is already an object
    WrappedObject(Map<String, Value>),
}

impl EventShape {
    /// Classify an event by the presence and type of `body`
    pub fn classify(event: Value) -> Result<Self, NormalizeError> {
        let Value::Object(mut map) = event else {
            return Err(NormalizeError::Parse(format!(
                "event must be a JSON object, got {}",
                kind(&event)
            )));
        };

        match map.remove("body") {
            None => Ok(Self::Direct(map)),
            Some(Value::String(body)) => Ok(Self::WrappedString(body)),
            Some(Value::Object(body)) => Ok(Self::WrappedObject(body)),
            Some(other) => Err(NormalizeError::Parse(format!(
                "body must be a string or object, got {}",
                kind(&other)
            ))),
        }
    }

    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::WrappedString(_) => "wrapped_string",
            Self::WrappedObject(_) => "wrapped_object",
        }
    }

    /// Turn the shape into a record without checking completeness
    pub fn resolve(self) -> Result<RawRecord, NormalizeError> {
        match self {
            Self::Direct(map) | Self::WrappedObject(map) => Ok(RawRecord::from(map)),
            Self::WrappedString(body) => match serde_json::from_str::<Value>(&body) {
                Ok(Value::Object(map)) => Ok(RawRecord::from(map)),
                Ok(other) => Err(NormalizeError::Parse(format!(
                    "body must encode a JSON object, got {}",
                    kind(&other)
                ))),
                Err(e) => Err(NormalizeError::Parse(e.to_string())),
            },
        }
    }
}

/// Reject records missing any required field
pub fn validate(record: RawRecord) -> Result<RawRecord, NormalizeError> {
    let missing = record.missing_fields();
    if missing.is_empty() {
        Ok(record)
    } else {
        Err(NormalizeError::Validation {
            missing: missing.into_iter().map(str::to_string).collect(),
        })
    }
}

/// Normalize an event of any supported shape into a complete record
pub fn normalize(event: Value) -> Result<RawRecord, NormalizeError> {
    normalize_shape(EventShape::classify(event)?)
}

/// Normalize an already classified event
pub fn normalize_shape(shape: EventShape) -> Result<RawRecord, NormalizeError> {
    validate(shape.resolve()?)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
