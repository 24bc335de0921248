// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! JSON Adapter
//!
//! Formats prompts that request a JSON object and extracts that object from
//! the response.

use crate::adapter::{input_pairs, render_lines, Adapter};
use crate::error::{Error, Result};
use crate::example::Example;
use crate::lm::LmRequest;
use crate::signature::Signature;
use crate::types::FieldMap;
use serde_json::{Map, Value};

/// JSON adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JSONConfig {
    /// Pretty-print demo objects and the schema
    pub pretty: bool,
    /// Include the output key schema in the prompt
    pub include_schema: bool,
}

impl Default for JSONConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl JSONConfig {
    /// Create new config.
    pub const fn new() -> Self {
        Self {
            pretty: true,
            include_schema: true,
        }
    }

    /// Set pretty printing.
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set schema inclusion.
    pub const fn with_schema(mut self, include: bool) -> Self {
        self.include_schema = include;
        self
    }
}

/// JSON adapter for prompt-mode models.
///
/// Formats prompts as:
/// ```text
/// [Instructions]
///
/// Respond with a JSON object with exactly these keys:
/// {
///   "answer": "<string>"
/// }
///
/// ---
///
/// Question: 2+2?
/// {"answer": "4"}
///
/// ---
///
/// Question: 3+3?
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JSONAdapter {
    config: JSONConfig,
}

impl JSONAdapter {
    /// Create a new JSON adapter.
    pub const fn new(config: JSONConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &JSONConfig {
        &self.config
    }

    fn to_json(&self, value: &Value) -> Result<String> {
        let text = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    fn schema(&self, signature: &Signature) -> Result<String> {
        let keys: Map<String, Value> = signature
            .output_fields
            .iter()
            .map(|field| {
                let hint = if field.desc.is_empty() {
                    "<string>".to_string()
                } else {
                    format!("<{}>", field.desc)
                };
                (field.name.clone(), Value::String(hint))
            })
            .collect();
        self.to_json(&Value::Object(keys))
    }

    fn demo_outputs(&self, signature: &Signature, demo: &Example) -> Result<Option<String>> {
        let outputs: Map<String, Value> = demo
            .outputs(signature)
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        if outputs.is_empty() {
            return Ok(None);
        }
        self.to_json(&Value::Object(outputs)).map(Some)
    }
}

/// Locate the first balanced `{...}` in `text`, skipping braces inside
/// JSON strings.
pub(crate) fn first_json_object(text: &str) -> Option<&str> {
    let mut search = 0;
    while let Some(offset) = text[search..].find('{') {
        let start = search + offset;
        if let Some(len) = balanced_len(&text[start..]) {
            return Some(&text[start..start + len]);
        }
        search = start + 1;
    }
    None
}

fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if in_string {
            match c {
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
    }
    None
}

fn value_to_text(name: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Err(Error::parse(format!("output field `{}` is null", name))),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Ok(nested.to_string()),
    }
}

impl Adapter for JSONAdapter {
    fn format(
        &self,
        signature: &Signature,
        demos: &[Example],
        inputs: &FieldMap,
    ) -> Result<LmRequest> {
        let mut prompt = String::new();

        if !signature.instructions.is_empty() {
            prompt.push_str(&signature.instructions);
            prompt.push_str("\n\n");
        }

        if self.config.include_schema {
            prompt.push_str("Respond with a JSON object with exactly these keys:\n");
            prompt.push_str(&self.schema(signature)?);
            prompt.push_str("\n\n");
        }

        for (i, demo) in demos.iter().enumerate() {
            let shown = render_lines(input_pairs(signature, demo.fields()));
            let outputs = match self.demo_outputs(signature, demo)? {
                Some(outputs) if !shown.is_empty() => outputs,
                _ => {
                    tracing::debug!(demo = i, "skipping demo without inputs or outputs");
                    continue;
                }
            };
            prompt.push_str("---\n\n");
            prompt.push_str(&shown);
            prompt.push('\n');
            prompt.push_str(&outputs);
            prompt.push_str("\n\n");
        }

        if !demos.is_empty() {
            prompt.push_str("---\n\n");
        }
        prompt.push_str(&render_lines(input_pairs(signature, inputs)));

        Ok(LmRequest::prompt(prompt))
    }

    fn parse(&self, signature: &Signature, completion: &str) -> Result<FieldMap> {
        let object = first_json_object(completion)
            .ok_or_else(|| Error::parse("no JSON object in model output"))?;

        let mut map = match serde_json::from_str::<Value>(object) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(Error::parse("model output is not a JSON object")),
            Err(e) => return Err(Error::parse(format!("invalid JSON in model output: {}", e))),
        };

        let mut parsed = FieldMap::new();
        for name in signature.output_names() {
            let value = map
                .remove(name)
                .ok_or_else(|| Error::parse(format!("missing key `{}` in JSON output", name)))?;
            parsed.insert(name.to_string(), value_to_text(name, value)?);
        }
        Ok(parsed)
    }

    fn name(&self) -> &'static str {
        "JSON"
    }
}
