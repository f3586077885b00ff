//! Feature encoding from raw records to the manifest's numeric space.
//!
//! Numbers are copied, booleans become 1/0 and strings become a single
//! `"<field>_<value>"` indicator set to 1. The candidate columns are then
//! aligned to the manifest: every manifest column takes its candidate value
//! or 0, and candidates the manifest does not know are dropped.
//!
//! A categorical value never seen at training time therefore encodes as
//! "none of the known categories" (all of that field's indicators 0). No
//! error is raised; [`Encoding::unseen`] lists such values so callers can
//! log them.

use std::collections::HashMap;

use churn_core::constants::{INDICATOR_SEPARATOR, REQUIRED_FIELDS};
use churn_core::error::{Error, Result};
use churn_core::types::{EncodedVector, RawRecord};
use serde_json::Value;

use crate::manifest::Manifest;

/// Categorical value whose indicator column is absent from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnseenCategory {
    /// Record field
    pub field: String,
    /// Observed value
    pub value: String,
}

/// Encoded vector plus what alignment threw away
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    /// Vector aligned to the manifest
    pub vector: EncodedVector,
    /// Categorical values that matched no manifest column
    pub unseen: Vec<UnseenCategory>,
    /// Non-categorical columns that are not part of the manifest
    pub dropped: Vec<String>,
}

/// Encoder bound to a manifest
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    manifest: Manifest,
}

impl FeatureEncoder {
    /// Create an encoder for `manifest`
    #[must_use]
    pub fn new(manifest: Manifest) -> Self {
        Self { manifest }
    }

    /// The manifest vectors are aligned to
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Width of every encoded vector
    #[must_use]
    pub fn width(&self) -> usize {
        self.manifest.len()
    }

    /// Encode a record
    pub fn encode(&self, raw: &RawRecord) -> Result<EncodedVector> {
        encode(raw, &self.manifest)
    }

    /// Encode a record and report unseen categories and dropped columns
    pub fn encode_with_report(&self, raw: &RawRecord) -> Result<Encoding> {
        encode_with_report(raw, &self.manifest)
    }
}

/// Encode `raw` into a vector positionally aligned to `manifest`
pub fn encode(raw: &RawRecord, manifest: &Manifest) -> Result<EncodedVector> {
    encode_with_report(raw, manifest).map(|encoding| encoding.vector)
}

/// Encode `raw` and report what did not survive manifest alignment
pub fn encode_with_report(raw: &RawRecord, manifest: &Manifest) -> Result<Encoding> {
    let candidates = expand(raw, manifest)?;

    let vector: EncodedVector = manifest
        .iter()
        .map(|column| candidates.get(column).map_or(0.0, |c| c.value))
        .collect();

    let mut unseen = Vec::new();
    let mut dropped = Vec::new();
    for (column, candidate) in &candidates {
        if manifest.position(column).is_some() {
            continue;
        }
        match &candidate.category {
            Some((field, value)) => unseen.push(UnseenCategory {
                field: (*field).to_string(),
                value: (*value).to_string(),
            }),
            None => dropped.push(column.clone()),
        }
    }
    // HashMap order is arbitrary; keep reports stable
    unseen.sort_by(|a, b| (&a.field, &a.value).cmp(&(&b.field, &b.value)));
    dropped.sort();

    Ok(Encoding {
        vector,
        unseen,
        dropped,
    })
}

struct Candidate<'a> {
    value: f64,
    category: Option<(&'a str, &'a str)>,
}

/// Expand a record into candidate columns
fn expand<'a>(raw: &'a RawRecord, manifest: &Manifest) -> Result<HashMap<String, Candidate<'a>>> {
    let mut candidates = HashMap::with_capacity(raw.len());

    for (field, value) in raw.iter() {
        match value {
            Value::Number(n) => {
                let value = n.as_f64().ok_or_else(|| Error::UnsupportedValue {
                    field: field.clone(),
                    kind: "number",
                })?;
                candidates.insert(field.clone(), Candidate { value, category: None });
            }
            Value::Bool(b) => {
                let value = if *b { 1.0 } else { 0.0 };
                candidates.insert(field.clone(), Candidate { value, category: None });
            }
            Value::String(s) => {
                let column = format!("{field}{INDICATOR_SEPARATOR}{s}");
                candidates.insert(
                    column,
                    Candidate {
                        value: 1.0,
                        category: Some((field.as_str(), s.as_str())),
                    },
                );
            }
            Value::Null | Value::Array(_) | Value::Object(_) => {
                // Non-scalars in extra fields are ignored; anything the model reads must be scalar
                let relevant = REQUIRED_FIELDS.contains(&field.as_str())
                    || manifest.position(field).is_some();
                if relevant {
                    return Err(Error::UnsupportedValue {
                        field: field.clone(),
                        kind: json_kind(value),
                    });
                }
            }
        }
    }

    Ok(candidates)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> Manifest {
        Manifest::new(
            [
                "Age",
                "CreditScore",
                "Tenure",
                "Balance",
                "EstimatedSalary",
                "NumOfProducts",
                "HasCrCard",
                "IsActiveMember",
                "Geography_France",
                "Geography_Germany",
                "Geography_Spain",
                "Gender_Female",
                "Gender_Male",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        )
        .unwrap()
    }

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => RawRecord::from(map),
            other => panic!("not an object: {other}"),
        }
    }

    fn scenario_a() -> RawRecord {
        record(json!({
            "Geography": "France",
            "Gender": "Female",
            "Age": 42,
            "CreditScore": 600,
            "Tenure": 3,
            "Balance": 0.0,
            "EstimatedSalary": 50000,
            "NumOfProducts": 1,
            "HasCrCard": 1,
            "IsActiveMember": 1
        }))
    }

    fn column(manifest: &Manifest, vector: &[f64], name: &str) -> f64 {
        vector[manifest.position(name).unwrap()]
    }

    #[test]
    fn test_encode_aligned_to_manifest() {
        let m = manifest();
        let v = encode(&scenario_a(), &m).unwrap();

        assert_eq!(v.len(), m.len());
        assert_eq!(
            v,
            vec![42.0, 600.0, 3.0, 0.0, 50000.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_manifest_order_drives_positions() {
        let reversed: Vec<String> = manifest().columns().iter().rev().cloned().collect();
        let m = Manifest::new(reversed).unwrap();
        let v = encode(&scenario_a(), &m).unwrap();

        assert_eq!(v.len(), m.len());
        assert_eq!(column(&m, &v, "Age"), 42.0);
        assert_eq!(column(&m, &v, "Gender_Female"), 1.0);
        assert_eq!(v[0], 0.0); // Gender_Male
        assert_eq!(v[m.len() - 1], 42.0);
    }

    #[test]
    fn test_unseen_geography_zero_fills_all_indicators() {
        // Known degradation: an unseen country is encoded as "no known country", not rejected
        let m = manifest();
        let mut raw = scenario_a();
        raw.insert("Geography", "Italy");

        let encoding = encode_with_report(&raw, &m).unwrap();
        for name in ["Geography_France", "Geography_Germany", "Geography_Spain"] {
            assert_eq!(column(&m, &encoding.vector, name), 0.0, "{name}");
        }
        assert_eq!(column(&m, &encoding.vector, "Age"), 42.0);
        assert_eq!(
            encoding.unseen,
            vec![UnseenCategory {
                field: "Geography".to_string(),
                value: "Italy".to_string(),
            }]
        );
    }

    #[test]
    fn test_category_values_are_case_sensitive() {
        let m = manifest();
        let mut raw = scenario_a();
        raw.insert("Gender", "female");

        let encoding = encode_with_report(&raw, &m).unwrap();
        assert_eq!(column(&m, &encoding.vector, "Gender_Female"), 0.0);
        assert_eq!(column(&m, &encoding.vector, "Gender_Male"), 0.0);
        assert_eq!(encoding.unseen.len(), 1);
    }

    #[test]
    fn test_extra_fields_dropped() {
        let m = manifest();
        let mut raw = scenario_a();
        raw.insert("CustomerId", 15_634_602);
        raw.insert("Surname", "Hargrave");
        raw.insert("Notes", json!(["vip"]));

        let encoding = encode_with_report(&raw, &m).unwrap();
        assert_eq!(encoding.vector, encode(&scenario_a(), &m).unwrap());
        assert_eq!(encoding.dropped, vec!["CustomerId".to_string()]);
        assert_eq!(encoding.unseen[0].field, "Surname");
    }

    #[test]
    fn test_missing_fields_encode_as_zero() {
        let m = manifest();
        let raw = record(json!({"Geography": "Spain", "Age": 30}));
        let v = encode(&raw, &m).unwrap();

        assert_eq!(v.len(), m.len());
        assert_eq!(column(&m, &v, "Age"), 30.0);
        assert_eq!(column(&m, &v, "Geography_Spain"), 1.0);
        assert_eq!(column(&m, &v, "CreditScore"), 0.0);
    }

    #[test]
    fn test_bool_encodes_as_number() {
        let m = manifest();
        let mut raw = scenario_a();
        raw.insert("HasCrCard", false);
        raw.insert("IsActiveMember", true);

        let v = encode(&raw, &m).unwrap();
        assert_eq!(column(&m, &v, "HasCrCard"), 0.0);
        assert_eq!(column(&m, &v, "IsActiveMember"), 1.0);
    }

    #[test]
    fn test_numeric_string_is_categorical() {
        // "42" is a string, so it becomes Age_42 and the Age slot stays 0
        let m = manifest();
        let mut raw = scenario_a();
        raw.insert("Age", "42");

        let encoding = encode_with_report(&raw, &m).unwrap();
        assert_eq!(column(&m, &encoding.vector, "Age"), 0.0);
        assert_eq!(encoding.unseen[0].value, "42");
    }

    #[test]
    fn test_null_required_field_rejected() {
        let m = manifest();
        let mut raw = scenario_a();
        raw.insert("Balance", Value::Null);

        let err = encode(&raw, &m).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedValue {
                field: "Balance".to_string(),
                kind: "null",
            }
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = FeatureEncoder::new(manifest());
        let raw = scenario_a();

        let first = encoder.encode(&raw).unwrap();
        let second = encoder.encode(&raw).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
        assert_eq!(encoder.width(), 13);
    }
}
