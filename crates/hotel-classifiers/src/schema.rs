//! Booking record schema.
//!
//! A `FeatureSchema` is the explicit contract between training and serving:
//! the ordered list of input fields the pipeline was fit on, their kinds and
//! the vocabulary observed for each categorical field. It is persisted with
//! the artifact and every incoming record is validated against it before it
//! reaches the preprocessor.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClassifierError, Result};

/// One booking as submitted for prediction: field name -> JSON value.
pub type BookingRecord = serde_json::Map<String, Value>;

/// Cell tokens treated as missing (the usual NA markers of CSV exports).
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_token(s: &str) -> bool {
    MISSING_TOKENS.contains(&s.trim())
}

/// Parse a number, rejecting `inf` and friends.
pub fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A single raw cell before imputation and encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Parse a CSV cell for a column of the given kind.
    pub fn parse_cell(cell: &str, kind: FieldKind) -> Option<RawValue> {
        if is_missing_token(cell) {
            return Some(RawValue::Missing);
        }
        match kind {
            FieldKind::Numeric => parse_finite(cell).map(RawValue::Number),
            FieldKind::Categorical => Some(RawValue::Text(cell.to_string())),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Expected input fields, in the order the preprocessor consumes them.
    pub fields: Vec<FieldSpec>,
    /// Name of the label column the model was trained against.
    pub target: String,
    /// Columns removed before training because they leak the outcome.
    pub dropped: Vec<String>,
    /// Fit-time vocabulary per categorical field.
    pub vocabularies: BTreeMap<String, Vec<String>>,
}

impl FeatureSchema {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Check a record against the schema and convert it to a raw row in
    /// schema order.
    ///
    /// Missing or unknown keys are a `SchemaMismatch`. `null` values are
    /// accepted and left for the preprocessor to impute. Categorical values
    /// outside the vocabulary are accepted as-is.
    pub fn validate(&self, record: &BookingRecord) -> Result<Vec<RawValue>> {
        let expected: BTreeSet<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        let missing: Vec<&str> = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| !record.contains_key(*name))
            .collect();
        let unexpected: BTreeSet<&str> = record
            .keys()
            .map(String::as_str)
            .filter(|key| !expected.contains(key))
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            let mut problems = Vec::new();
            if !missing.is_empty() {
                problems.push(format!("missing fields {:?}", missing));
            }
            if !unexpected.is_empty() {
                problems.push(format!("unexpected fields {:?}", unexpected));
            }
            return Err(ClassifierError::SchemaMismatch(problems.join("; ")));
        }

        self.fields
            .iter()
            .map(|field| coerce_value(field, &record[&field.name]))
            .collect()
    }
}

fn coerce_value(field: &FieldSpec, value: &Value) -> Result<RawValue> {
    match (field.kind, value) {
        (_, Value::Null) => Ok(RawValue::Missing),
        (FieldKind::Numeric, Value::Number(n)) => n
            .as_f64()
            .map(RawValue::Number)
            .ok_or_else(|| ClassifierError::invalid_value(&field.name, "number out of range")),
        (FieldKind::Numeric, Value::String(s)) => RawValue::parse_cell(s, FieldKind::Numeric)
            .ok_or_else(|| {
                ClassifierError::invalid_value(
                    &field.name,
                    format!("'{}' is not a finite number", s),
                )
            }),
        (FieldKind::Numeric, other) => Err(ClassifierError::invalid_value(
            &field.name,
            format!("expected a number, got {}", other),
        )),
        (FieldKind::Categorical, Value::String(s)) => {
            Ok(RawValue::parse_cell(s, FieldKind::Categorical).unwrap_or(RawValue::Missing))
        }
        (FieldKind::Categorical, Value::Number(n)) => Ok(RawValue::Text(n.to_string())),
        (FieldKind::Categorical, Value::Bool(b)) => Ok(RawValue::Text(b.to_string())),
        (FieldKind::Categorical, other) => Err(ClassifierError::invalid_value(
            &field.name,
            format!("expected a string, got {}", other),
        )),
    }
}
