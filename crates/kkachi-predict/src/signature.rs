// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Signature system for defining input/output contracts
//!
//! A [`Signature`] is declared either with [`SignatureBuilder`] or from the
//! shorthand `"question, context -> answer"` via [`Signature::parse`].

use crate::error::{Result, SignatureError};
use crate::field::{Field, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signature defining the input/output contract of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Instruction/prompt for the task
    pub instructions: String,

    /// Input fields, in declaration order
    pub input_fields: Vec<Field>,

    /// Output fields, in declaration order
    pub output_fields: Vec<Field>,
}

impl Signature {
    /// Create a new signature
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            input_fields: Vec::new(),
            output_fields: Vec::new(),
        }
    }

    /// Add an input field
    pub fn add_input(mut self, field: Field) -> Result<Self> {
        self.check_new_field(&field, FieldType::Input)?;
        self.input_fields.push(field);
        Ok(self)
    }

    /// Add an output field
    pub fn add_output(mut self, field: Field) -> Result<Self> {
        self.check_new_field(&field, FieldType::Output)?;
        self.output_fields.push(field);
        Ok(self)
    }

    fn check_new_field(&self, field: &Field, expected: FieldType) -> Result<()> {
        if field.field_type != expected {
            return Err(SignatureError::WrongKind {
                name: field.name.clone(),
                expected: expected.as_str(),
            }
            .into());
        }
        if self.field(&field.name).is_some() {
            return Err(SignatureError::DuplicateField(field.name.clone()).into());
        }
        Ok(())
    }

    /// Get all fields (inputs then outputs)
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.input_fields.iter().chain(self.output_fields.iter())
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|f| f.name == name)
    }

    /// Input field names in order.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.input_fields.iter().map(|f| f.name.as_str())
    }

    /// Output field names in order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.output_fields.iter().map(|f| f.name.as_str())
    }

    /// Replace the instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Parse a signature from string format: "input1, input2 -> output1, output2"
    ///
    /// Every name must be a single whitespace-free token and unique across
    /// the whole signature. Fields get no description; the instructions are
    /// synthesized from the field names.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split("->").collect();
        if parts.len() != 2 {
            return Err(SignatureError::Syntax(format!(
                "signature must be in format 'inputs -> outputs', got {:?}",
                s
            ))
            .into());
        }

        let inputs = split_names(parts[0])?;
        let outputs = split_names(parts[1])?;

        let quote = |names: &[&str]| {
            names
                .iter()
                .map(|n| format!("`{}`", n))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let instructions = format!(
            "Given the fields {}, produce the fields {}.",
            quote(&inputs),
            quote(&outputs)
        );

        let mut sig = Self::new(instructions);
        for name in inputs {
            sig = sig.add_input(Field::new(name, "", FieldType::Input))?;
        }
        for name in outputs {
            sig = sig.add_output(Field::new(name, "", FieldType::Output))?;
        }

        Ok(sig)
    }

    /// Convert signature to string format
    pub fn to_string_format(&self) -> String {
        let inputs: Vec<&str> = self.input_names().collect();
        let outputs: Vec<&str> = self.output_names().collect();
        format!("{} -> {}", inputs.join(", "), outputs.join(", "))
    }
}

fn split_names(side: &str) -> Result<Vec<&str>> {
    side.split(',')
        .map(str::trim)
        .map(|name| -> Result<&str> {
            if name.is_empty() {
                Err(SignatureError::Syntax(format!("empty field name in {:?}", side.trim())).into())
            } else if name.split_whitespace().count() != 1 {
                Err(SignatureError::Syntax(format!(
                    "field name {:?} must be a single token",
                    name
                ))
                .into())
            } else {
                Ok(name)
            }
        })
        .collect()
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_format())
    }
}

impl std::str::FromStr for Signature {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Anything that resolves into a [`Signature`]: an existing signature is
/// used unchanged, shorthand strings are parsed.
pub trait IntoSignature {
    /// Resolve into a structured signature.
    fn into_signature(self) -> Result<Signature>;
}

impl IntoSignature for Signature {
    fn into_signature(self) -> Result<Signature> {
        Ok(self)
    }
}

impl IntoSignature for &Signature {
    fn into_signature(self) -> Result<Signature> {
        Ok(self.clone())
    }
}

impl IntoSignature for &str {
    fn into_signature(self) -> Result<Signature> {
        Signature::parse(self)
    }
}

impl IntoSignature for String {
    fn into_signature(self) -> Result<Signature> {
        Signature::parse(&self)
    }
}

/// Builder for creating signatures
pub struct SignatureBuilder {
    signature: Signature,
}

impl SignatureBuilder {
    /// Create a new builder
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            signature: Signature::new(instructions),
        }
    }

    /// Add an input field
    pub fn input(mut self, field: Field) -> Result<Self> {
        self.signature = self.signature.add_input(field)?;
        Ok(self)
    }

    /// Add an output field
    pub fn output(mut self, field: Field) -> Result<Self> {
        self.signature = self.signature.add_output(field)?;
        Ok(self)
    }

    /// Build the signature
    pub fn build(self) -> Signature {
        self.signature
    }
}
