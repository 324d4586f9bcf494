use std::{error::Error, fmt};

use serde_json::Value;

/// The prediction input fields, in feature vector order.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "ID",
    "settimana",
    "giornoSettimana",
    "Glucosio al Risveglio (07:00)",
    "Glucosio alle 09:30",
    "Glucosio alle 13:00",
    "Glucosio alle 15:00",
    "Glucosio alle 18:00",
    "Glucosio alle 20:00",
];

/// Whether a field must be present in a prediction request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence {
    Required,
    Optional { default: f64 },
}

/// A single declared field of a `FeatureSchema`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub presence: Presence,
}

/// Typed validation failures while extracting features from a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The request body is not a JSON object.
    NotAnObject { got: &'static str },
    /// A required field is absent or null.
    Missing { field: &'static str },
    /// A field is present but is not a number.
    WrongType { field: &'static str, got: &'static str },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::NotAnObject { got } => {
                write!(f, "expected a JSON object, got {got}")
            }
            SchemaError::Missing { field } => write!(f, "missing required field '{field}'"),
            SchemaError::WrongType { field, got } => {
                write!(f, "field '{field}' must be a number, got {got}")
            }
        }
    }
}

impl Error for SchemaError {}

/// An ordered feature vector produced by a `FeatureSchema`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

/// Declares which request fields build the feature vector and how absent
/// fields are treated.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    fields: Vec<FieldRule>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::lenient()
    }
}

impl FeatureSchema {
    /// Creates a schema from explicit rules, in feature vector order.
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// Every field is optional and defaults to 0.
    pub fn lenient() -> Self {
        Self::with_presence(Presence::Optional { default: 0.0 })
    }

    /// Every field is required.
    pub fn strict() -> Self {
        Self::with_presence(Presence::Required)
    }

    fn with_presence(presence: Presence) -> Self {
        let fields = FEATURE_COLUMNS
            .into_iter()
            .map(|name| FieldRule { name, presence })
            .collect();

        Self { fields }
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Returns the field names in feature vector order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|rule| rule.name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the feature vector of a request body.
    ///
    /// # Args
    /// * `body` - The JSON request body.
    ///
    /// # Returns
    /// The ordered features, or the first `SchemaError` found. A `null` value
    /// is treated as an absent field and booleans read as 1 and 0, the same
    /// way training cells are read.
    pub fn extract(&self, body: &Value) -> Result<FeatureVector, SchemaError> {
        let Value::Object(map) = body else {
            return Err(SchemaError::NotAnObject {
                got: kind_of(body),
            });
        };

        self.fields
            .iter()
            .map(|rule| match (map.get(rule.name), rule.presence) {
                (None | Some(Value::Null), Presence::Optional { default }) => Ok(default),
                (None | Some(Value::Null), Presence::Required) => {
                    Err(SchemaError::Missing { field: rule.name })
                }
                (Some(Value::Bool(flag)), _) => Ok(if *flag { 1.0 } else { 0.0 }),
                (Some(value), _) => value.as_f64().ok_or(SchemaError::WrongType {
                    field: rule.name,
                    got: kind_of(value),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FeatureVector)
    }
}

/// Names the JSON kind of a value for error messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
