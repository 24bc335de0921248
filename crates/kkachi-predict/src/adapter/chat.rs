// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Chat Adapter
//!
//! Formats requests as chat transcripts and reads `Prefix: value` lines back.

use crate::adapter::{input_pairs, output_pairs, render_lines, strip_label, Adapter};
use crate::error::{Error, Result};
use crate::example::Example;
use crate::field::Field;
use crate::lm::{LmRequest, Message};
use crate::signature::Signature;
use crate::types::FieldMap;

/// Chat adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    /// Include field descriptions in the system message
    pub include_descriptions: bool,
    /// End the system message with the expected output layout
    pub include_format_hint: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatConfig {
    /// Create new config.
    pub const fn new() -> Self {
        Self {
            include_descriptions: true,
            include_format_hint: true,
        }
    }

    /// Set description inclusion.
    pub const fn with_descriptions(mut self, include: bool) -> Self {
        self.include_descriptions = include;
        self
    }

    /// Set the output layout hint.
    pub const fn with_format_hint(mut self, include: bool) -> Self {
        self.include_format_hint = include;
        self
    }
}

/// Chat-style adapter.
///
/// Builds a message list:
/// ```text
/// [System]    instructions, field lists, output layout
/// [User]      Question: 2+2?          (one pair per demo)
/// [Assistant] Answer: 4
/// [User]      Question: 3+3?          (live inputs)
/// ```
///
/// Parsing scans the output line by line. A line starting with an output
/// field's prefix (or `name:`) opens that field; following lines belong to
/// it until another field label appears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatAdapter {
    config: ChatConfig,
}

impl ChatAdapter {
    /// Create a new chat adapter.
    pub const fn new(config: ChatConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn system_message(&self, signature: &Signature) -> String {
        let mut out = String::new();

        if !signature.instructions.is_empty() {
            out.push_str(&signature.instructions);
            out.push_str("\n\n");
        }

        out.push_str("Your input fields are:\n");
        self.describe_fields(&mut out, &signature.input_fields);
        out.push_str("Your output fields are:\n");
        self.describe_fields(&mut out, &signature.output_fields);

        if self.config.include_format_hint {
            out.push_str("\nRespond with each output field on its own line, ");
            out.push_str("starting with its label:\n");
            for field in &signature.output_fields {
                out.push_str(&field.prefix);
                out.push_str(" ...\n");
            }
        }

        out.truncate(out.trim_end().len());
        out
    }

    fn describe_fields(&self, out: &mut String, fields: &[Field]) {
        for field in fields {
            out.push_str("- ");
            out.push_str(&field.prefix);
            if self.config.include_descriptions && !field.desc.is_empty() {
                out.push(' ');
                out.push_str(&field.desc);
            }
            if let Some(format) = &field.format {
                out.push_str(" (");
                out.push_str(format);
                out.push(')');
            }
            out.push('\n');
        }
    }

    /// Labels recognized at the start of a line, longest first.
    fn labels<'s>(signature: &'s Signature) -> Vec<(String, &'s Field)> {
        let mut labels: Vec<(String, &Field)> = signature
            .fields()
            .flat_map(|field| {
                [
                    (field.prefix.clone(), field),
                    (format!("{}:", field.name), field),
                ]
            })
            .collect();
        labels.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        labels
    }
}

fn match_label<'s, 't>(
    labels: &[(String, &'s Field)],
    line: &'t str,
) -> Option<(&'s Field, &'t str)> {
    let line = line.trim_start().trim_start_matches("**");
    labels.iter().find_map(|(label, field)| {
        strip_label(line, label).map(|rest| (*field, rest.trim_start_matches("**")))
    })
}

fn flush(parsed: &mut FieldMap, section: Option<(&str, Vec<&str>)>) {
    if let Some((name, lines)) = section {
        parsed.insert(name.to_string(), lines.join("\n").trim().to_string());
    }
}

impl Adapter for ChatAdapter {
    fn format(
        &self,
        signature: &Signature,
        demos: &[Example],
        inputs: &FieldMap,
    ) -> Result<LmRequest> {
        let mut messages = Vec::with_capacity(2 + demos.len() * 2);
        messages.push(Message::system(self.system_message(signature)));

        for (i, demo) in demos.iter().enumerate() {
            let user = render_lines(input_pairs(signature, demo.fields()));
            let assistant = render_lines(output_pairs(signature, demo.fields()));
            if user.is_empty() || assistant.is_empty() {
                tracing::debug!(demo = i, "skipping demo without inputs or outputs");
                continue;
            }
            messages.push(Message::user(user));
            messages.push(Message::assistant(assistant));
        }

        messages.push(Message::user(render_lines(input_pairs(signature, inputs))));
        Ok(LmRequest::messages(messages))
    }

    fn parse(&self, signature: &Signature, completion: &str) -> Result<FieldMap> {
        let labels = Self::labels(signature);
        let mut parsed = FieldMap::new();
        let mut current: Option<(&str, Vec<&str>)> = None;

        for line in completion.lines() {
            match match_label(&labels, line) {
                Some((field, rest)) => {
                    flush(&mut parsed, current.take());
                    // input echoes close the open section; repeated outputs keep the first value
                    if field.is_output() && !parsed.contains_key(&field.name) {
                        current = Some((field.name.as_str(), vec![rest]));
                    }
                }
                None => {
                    if let Some((_, lines)) = current.as_mut() {
                        lines.push(line);
                    }
                }
            }
        }
        flush(&mut parsed, current);

        signature
            .output_fields
            .iter()
            .map(|field| match parsed.swap_remove(&field.name) {
                Some(value) => Ok((field.name.clone(), value)),
                None => Err(Error::parse(format!(
                    "missing output field `{}`: no line starting with {:?}",
                    field.name, field.prefix
                ))),
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "Chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::Role;
    use crate::types::field_map;

    fn qa() -> Signature {
        Signature::parse("question -> answer").unwrap()
    }

    #[test]
    fn test_format_messages() {
        let adapter = ChatAdapter::default();
        let demos = vec![Example::new().with("question", "2+2?").with("answer", "4")];
        let request = adapter
            .format(&qa(), &demos, &field_map([("question", "3+3?")]))
            .unwrap();

        let messages = match request {
            LmRequest::Messages(messages) => messages,
            other => panic!("expected messages, got {:?}", other),
        };
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Your input fields are:\n- Question:"));
        assert!(messages[0].content.contains("Answer: ..."));
        assert_eq!(messages[1], Message::user("Question: 2+2?"));
        assert_eq!(messages[2], Message::assistant("Answer: 4"));
        assert_eq!(messages[3], Message::user("Question: 3+3?"));
    }

    #[test]
    fn test_format_descriptions() {
        let sig = Signature::new("Answer briefly.")
            .add_input(crate::field::InputField::create("question", "a math question"))
            .unwrap()
            .add_output(crate::field::OutputField::create("answer", "a number"))
            .unwrap();

        let with = ChatAdapter::default().system_message(&sig);
        assert!(with.starts_with("Answer briefly.\n\n"));
        assert!(with.contains("- Question: a math question"));

        let config = ChatConfig::new()
            .with_descriptions(false)
            .with_format_hint(false);
        let without = ChatAdapter::new(config).system_message(&sig);
        assert!(!without.contains("a math question"));
        assert!(!without.contains("Respond with"));
    }

    #[test]
    fn test_format_skips_incomplete_demos() {
        let demos = vec![
            Example::new().with("question", "only a question"),
            Example::new().with("question", "1+1?").with("answer", "2"),
        ];
        let request = ChatAdapter::default()
            .format(&qa(), &demos, &FieldMap::new())
            .unwrap();
        match request {
            LmRequest::Messages(messages) => assert_eq!(messages.len(), 4),
            other => panic!("expected messages, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_field() {
        let parsed = ChatAdapter::default().parse(&qa(), "Answer: 6").unwrap();
        assert_eq!(parsed, field_map([("answer", "6")]));
    }

    #[test]
    fn test_parse_multiline_and_case() {
        let sig = Signature::parse("question -> reasoning, answer").unwrap();
        let text = "reasoning: three plus three\nis six\n\n**Answer:** 6\n";
        let parsed = ChatAdapter::default().parse(&sig, text).unwrap();
        assert_eq!(parsed["reasoning"], "three plus three\nis six");
        assert_eq!(parsed["answer"], "6");
    }

    #[test]
    fn test_parse_returns_signature_order() {
        let sig = Signature::parse("question -> reasoning, answer").unwrap();
        let parsed = ChatAdapter::default()
            .parse(&sig, "Answer: 6
Reasoning: three plus three")
            .unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), ["reasoning", "answer"]);
    }

    #[test]
    fn test_parse_ignores_echoed_inputs_and_preamble() {
        let text = "Sure.\nQuestion: 3+3?\nAnswer: 6\nAnswer: 7";
        let parsed = ChatAdapter::default().parse(&qa(), text).unwrap();
        assert_eq!(parsed, field_map([("answer", "6")]));
    }

    #[test]
    fn test_parse_missing_field() {
        let err = ChatAdapter::default().parse(&qa(), "6").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("`answer`"));
    }

    #[test]
    fn test_parse_prefers_longest_label() {
        let sig = Signature::parse("q -> answer, answer_text").unwrap();
        let parsed = ChatAdapter::default()
            .parse(&sig, "Answer Text: long form\nAnswer: short")
            .unwrap();
        assert_eq!(parsed["answer_text"], "long form");
        assert_eq!(parsed["answer"], "short");
    }
}
