// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Field definitions for signatures

use serde::{Deserialize, Serialize};

/// Type of field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Input field
    Input,
    /// Output field
    Output,
}

impl FieldType {
    /// Lowercase name, as used in messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// A named slot in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,

    /// Field description
    #[serde(default)]
    pub desc: String,

    /// Display label used when rendering the field, e.g. `"Answer:"`
    pub prefix: String,

    /// Field type (input or output)
    pub field_type: FieldType,

    /// Optional format specification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Field {
    /// Create a new field; the prefix is inferred from the name.
    pub fn new(name: impl Into<String>, desc: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let prefix = infer_prefix(&name);

        Self {
            name,
            desc: desc.into(),
            prefix,
            field_type,
            format: None,
        }
    }

    /// Set the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the format
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Whether this is an input field.
    #[inline]
    pub fn is_input(&self) -> bool {
        self.field_type == FieldType::Input
    }

    /// Whether this is an output field.
    #[inline]
    pub fn is_output(&self) -> bool {
        self.field_type == FieldType::Output
    }
}

/// Derive a display label from a field name.
///
/// Splits on underscores, camelCase humps, acronym boundaries and
/// letter/digit boundaries, capitalises each word and appends a colon:
///
/// - `question` -> `Question:`
/// - `answerText` -> `Answer Text:`
/// - `chain_of_thought` -> `Chain Of Thought:`
/// - `HTMLParser` -> `HTML Parser:`
/// - `step2` -> `Step 2:`
pub fn infer_prefix(name: &str) -> String {
    let words = split_words(name);
    let mut result = String::with_capacity(name.len() + words.len() + 1);

    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            result.push(' ');
        }
        if word.chars().all(|c| !c.is_lowercase()) {
            // acronyms and numbers stay as written
            result.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                result.extend(first.to_uppercase());
                result.extend(chars.flat_map(char::to_lowercase));
            }
        }
    }

    result.push(':');
    result
}

fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && ch.is_uppercase())
                // "HTMLParser": break before the 'P'
                || (prev.is_uppercase()
                    && ch.is_uppercase()
                    && next.map_or(false, char::is_lowercase))
                || (prev.is_alphabetic() && ch.is_ascii_digit())
                || (prev.is_ascii_digit() && ch.is_alphabetic());

            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Helper to create an input field
pub struct InputField;

impl InputField {
    /// Create an input field.
    pub fn create(name: impl Into<String>, desc: impl Into<String>) -> Field {
        Field::new(name, desc, FieldType::Input)
    }
}

/// Helper to create an output field
pub struct OutputField;

impl OutputField {
    /// Create an output field.
    pub fn create(name: impl Into<String>, desc: impl Into<String>) -> Field {
        Field::new(name, desc, FieldType::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_prefix() {
        assert_eq!(infer_prefix("question"), "Question:");
        assert_eq!(infer_prefix("answerText"), "Answer Text:");
        assert_eq!(infer_prefix("someValue"), "Some Value:");
        assert_eq!(infer_prefix("chain_of_thought"), "Chain Of Thought:");
        assert_eq!(infer_prefix("HTMLParser"), "HTML Parser:");
        assert_eq!(infer_prefix("step2"), "Step 2:");
        assert_eq!(infer_prefix("URL"), "URL:");
    }

    #[test]
    fn test_infer_prefix_collapses_separators() {
        assert_eq!(infer_prefix("__private__name"), "Private Name:");
    }

    #[test]
    fn test_field_creation() {
        let field = InputField::create("query", "User query");
        assert_eq!(field.name, "query");
        assert_eq!(field.desc, "User query");
        assert_eq!(field.prefix, "Query:");
        assert_eq!(field.field_type, FieldType::Input);
        assert!(field.is_input());
        assert!(!field.is_output());
    }

    #[test]
    fn test_field_overrides() {
        let field = OutputField::create("answer", "")
            .with_prefix("Final Answer:")
            .with_format("a single number");
        assert_eq!(field.prefix, "Final Answer:");
        assert_eq!(field.format.as_deref(), Some("a single number"));
        assert!(field.is_output());
    }
}
