// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Adapters
//!
//! Adapters translate between a [`Signature`] and the raw text a model
//! reads and writes.
//!
//! ## Available Adapters
//!
//! - `ChatAdapter`: message-mode requests, `Prefix: value` line parsing
//! - `JSONAdapter`: prompt-mode requests, JSON object parsing
//!
//! Every adapter is driven by the same orchestration, [`call_adapter`]:
//! format, call the model, parse each output, validate the parsed keys.

pub mod chat;
pub mod json;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::example::Example;
use crate::lm::{LanguageModel, LmRequest};
use crate::signature::Signature;
use crate::types::FieldMap;

/// Adapter trait.
///
/// Adapters handle:
/// 1. Formatting requests for the model
/// 2. Parsing raw outputs back into field values
pub trait Adapter: Send + Sync {
    /// Build the request for `inputs`, embedding each demo's fields the
    /// same way the live inputs are rendered.
    fn format(&self, signature: &Signature, demos: &[Example], inputs: &FieldMap)
        -> Result<LmRequest>;

    /// Recover the signature's output fields from one raw output.
    fn parse(&self, signature: &Signature, completion: &str) -> Result<FieldMap>;

    /// Adapter name.
    fn name(&self) -> &'static str;
}

/// Format, call the model, and parse every output.
///
/// The request variant decides the call mode: a prompt string or a message
/// list. Outputs are parsed in the order the model returned them. The first
/// parse failure is logged together with the request and the offending
/// output, then returned; no output is dropped silently. Each parsed map must
/// hold exactly the signature's output fields.
pub fn call_adapter<A: Adapter + ?Sized>(
    adapter: &A,
    lm: &dyn LanguageModel,
    lm_kwargs: &Config,
    signature: &Signature,
    demos: &[Example],
    inputs: &FieldMap,
) -> Result<Vec<FieldMap>> {
    let request = adapter.format(signature, demos, inputs)?;
    call_with_request(adapter, lm, lm_kwargs, signature, &request)
}

/// Call the model with an already formatted `request` and parse every output.
///
/// The second half of [`call_adapter`], for callers that keep the request.
pub fn call_with_request<A: Adapter + ?Sized>(
    adapter: &A,
    lm: &dyn LanguageModel,
    lm_kwargs: &Config,
    signature: &Signature,
    request: &LmRequest,
) -> Result<Vec<FieldMap>> {
    let outputs = lm.call(request, lm_kwargs)?;

    tracing::debug!(
        adapter = adapter.name(),
        mode = request.mode(),
        outputs = outputs.len(),
        "model call returned"
    );

    outputs
        .iter()
        .enumerate()
        .map(|(i, output)| {
            let parsed = adapter.parse(signature, output).map_err(|err| {
                tracing::error!(
                    adapter = adapter.name(),
                    index = i,
                    request = %request.to_text(),
                    output = %output,
                    error = %err,
                    "failed to parse model output"
                );
                err
            })?;
            validate_fields(signature, &parsed)?;
            Ok(parsed)
        })
        .collect()
}

/// Check that `parsed` holds exactly the signature's output fields.
pub fn validate_fields(signature: &Signature, parsed: &FieldMap) -> Result<()> {
    let exact = parsed.len() == signature.output_fields.len()
        && signature.output_names().all(|name| parsed.contains_key(name));
    if exact {
        Ok(())
    } else {
        Err(Error::validation(
            signature.output_names(),
            parsed.keys().map(String::as_str),
        ))
    }
}

/// Match `label` at the start of `line`, ignoring ASCII case.
///
/// Returns the rest of the line after the label.
pub fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        line.get(label.len()..)
    } else {
        None
    }
}

/// Render `(prefix, value)` pairs as `Prefix value` lines.
pub fn render_lines<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (prefix, value) in pairs {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(prefix);
        out.push(' ');
        out.push_str(value);
    }
    out
}

/// Input fields of `signature` present in `values`, in signature order, as
/// `(prefix, value)` pairs.
pub(crate) fn input_pairs<'a>(
    signature: &'a Signature,
    values: &'a FieldMap,
) -> impl Iterator<Item = (&'a str, &'a str)> {
    signature.input_fields.iter().filter_map(move |field| {
        values
            .get(&field.name)
            .map(|value| (field.prefix.as_str(), value.as_str()))
    })
}

/// Output fields of `signature` present in `values`, in signature order, as
/// `(prefix, value)` pairs.
pub(crate) fn output_pairs<'a>(
    signature: &'a Signature,
    values: &'a FieldMap,
) -> impl Iterator<Item = (&'a str, &'a str)> {
    signature.output_fields.iter().filter_map(move |field| {
        values
            .get(&field.name)
            .map(|value| (field.prefix.as_str(), value.as_str()))
    })
}

// Re-exports
pub use chat::{ChatAdapter, ChatConfig};
pub use json::{JSONAdapter, JSONConfig};
