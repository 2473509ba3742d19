//! Static structural schemas for credential payloads.
//!
//! A schema is a closed table of fields: every key in a payload must be
//! declared, every required key must be present, and every value must be
//! one of the field's accepted JSON types.

use serde_json::{Map, Value};

use super::CredentialsError;

/// A JSON value type accepted by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Boolean,
    Null,
}

impl ValueType {
    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Null, Value::Null)
        )
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

/// One declared field of a schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub types: &'static [ValueType],
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, types: &'static [ValueType]) -> Self {
        Self {
            name,
            types,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, types: &'static [ValueType]) -> Self {
        Self {
            name,
            types,
            required: false,
        }
    }
}

pub(crate) const STRING: &[ValueType] = &[ValueType::String];
pub(crate) const NULLABLE_STRING: &[ValueType] = &[ValueType::String, ValueType::Null];
pub(crate) const BOOLEAN: &[ValueType] = &[ValueType::Boolean];

/// A named, closed set of fields.
#[derive(Debug, Clone, Copy)]
pub struct CredentialSchema {
    pub kind: &'static str,
    pub fields: &'static [FieldSpec],
}

impl CredentialSchema {
    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Check `values` against the schema, collecting every violation.
    pub fn validate(&self, values: &Map<String, Value>) -> Result<(), CredentialsError> {
        let mut violations = Vec::new();

        for field in self.fields.iter().filter(|f| f.required) {
            if !values.contains_key(field.name) {
                violations.push(format!("'{}' is a required property", field.name));
            }
        }

        for (key, value) in values {
            match self.field(key) {
                None => violations.push(format!("additional property '{key}' is not allowed")),
                Some(field) if !field.types.iter().any(|t| t.matches(value)) => {
                    let expected: Vec<&str> = field.types.iter().map(|t| t.as_str()).collect();
                    violations.push(format!(
                        "'{key}' must be of type {}, got {value}",
                        expected.join(" or ")
                    ));
                }
                Some(_) => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(kind = self.kind, ?violations, "credential payload rejected");
            Err(CredentialsError::SchemaValidation {
                kind: self.kind,
                violations,
            })
        }
    }
}
