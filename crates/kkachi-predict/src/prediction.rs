// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Prediction results and completion extraction

use crate::error::{Error, Result};
use crate::signature::Signature;
use crate::types::FieldMap;
use serde::{Deserialize, Serialize};

/// One raw completion from the model: field name to text segment.
pub type Completion = FieldMap;

/// Ordered structured completions, tagged with the signature that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    signature: Signature,
    completions: Vec<FieldMap>,
}

impl Prediction {
    /// Assemble a prediction from already-projected completions.
    pub fn from_completions(completions: Vec<FieldMap>, signature: Signature) -> Self {
        Self {
            signature,
            completions,
        }
    }

    /// The signature the completions belong to
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// All completions, in the order the model returned them
    pub fn completions(&self) -> &[FieldMap] {
        &self.completions
    }

    /// Get a field of the first completion
    pub fn get(&self, field: &str) -> Option<&str> {
        self.completions
            .first()?
            .get(field)
            .map(String::as_str)
    }

    /// Values of `field` across all completions that have it
    pub fn values<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.completions
            .iter()
            .filter_map(move |c| c.get(field).map(String::as_str))
    }

    /// The first completion, or an empty map
    pub fn to_field_map(&self) -> FieldMap {
        self.completions.first().cloned().unwrap_or_default()
    }

    /// Number of completions
    pub fn len(&self) -> usize {
        self.completions.len()
    }

    /// Whether there are no completions
    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }
}

/// Project raw completions onto the signature's output fields.
///
/// Output fields are taken in signature order. Any output field whose name
/// is also a key of `pinned` (the caller's input values) is left out: the
/// caller supplied it, so it is not a novel output. This means the key set of
/// each completion depends on the call site, not only on the signature.
///
/// A completion missing a non-pinned output field is a prediction error.
pub fn extract_completions(
    raw: Vec<Completion>,
    signature: &Signature,
    pinned: &FieldMap,
) -> Result<Vec<FieldMap>> {
    raw.into_iter()
        .enumerate()
        .map(|(i, mut completion)| {
            let mut projected = FieldMap::new();
            for name in signature.output_names() {
                if pinned.contains_key(name) {
                    continue;
                }
                let value = completion.swap_remove(name).ok_or_else(|| {
                    Error::prediction(format!(
                        "completion {} has no value for output field `{}`",
                        i, name
                    ))
                })?;
                projected.insert(name.to_string(), value);
            }
            Ok(projected)
        })
        .collect()
}
