// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Demonstrations and training examples
//!
//! An [`Example`] is a flat mapping from field name to value. The same type
//! serves as a few-shot demonstration and as a training example.

use crate::error::{Error, Result};
use crate::signature::Signature;
use crate::types::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One few-shot demonstration or training example
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Example {
    fields: FieldMap,
}

impl Example {
    /// Create an empty example
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an existing field map
    pub fn from_fields(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Add a field, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Whether the field is present
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All fields
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Consume into the underlying map
    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the example has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values of the signature's input fields present in this example, in signature order.
    pub fn inputs<'s>(
        &'s self,
        signature: &'s Signature,
    ) -> impl Iterator<Item = (&'s str, &'s str)> {
        signature
            .input_names()
            .filter_map(move |name| self.get(name).map(|v| (name, v)))
    }

    /// Values of the signature's output fields present in this example, in signature order.
    pub fn outputs<'s>(
        &'s self,
        signature: &'s Signature,
    ) -> impl Iterator<Item = (&'s str, &'s str)> {
        signature
            .output_names()
            .filter_map(move |name| self.get(name).map(|v| (name, v)))
    }

    /// Raw mapping form, as persisted in module state.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Rehydrate from the raw mapping form.
    ///
    /// The value must be an object; strings are taken as-is, numbers and
    /// booleans are stringified. Anything else is a state error.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::state(format!(
                "demo must be a mapping of field name to value, got {}",
                json_kind(value)
            ))
        })?;

        let mut example = Self::new();
        for (key, value) in object {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(Error::state(format!(
                        "demo field `{}` must be a scalar, got {}",
                        key,
                        json_kind(other)
                    )))
                }
            };
            example.insert(key.clone(), text);
        }
        Ok(example)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<FieldMap> for Example {
    fn from(fields: FieldMap) -> Self {
        Self::from_fields(fields)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Example {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
