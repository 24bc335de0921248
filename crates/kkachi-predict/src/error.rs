// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Error types for kkachi-predict

use thiserror::Error;

/// Result type alias for kkachi-predict operations
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while declaring or assembling a signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Malformed shorthand (`"a, b -> c"`) or an invalid field name.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The same field name appears more than once.
    #[error("duplicate field name `{0}`")]
    DuplicateField(String),

    /// An input field was added as an output, or vice versa.
    #[error("field `{name}` must be an {expected} field")]
    WrongKind {
        /// Offending field
        name: String,
        /// Expected kind, "input" or "output"
        expected: &'static str,
    },
}

/// Main error type for kkachi-predict
#[derive(Error, Debug)]
pub enum Error {
    /// Signature-related errors
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    /// No language model could be resolved for a call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure reported by the model client
    #[error("LM error: {0}")]
    Lm(String),

    /// Module execution errors
    #[error("Module error: {0}")]
    Module(String),

    /// A completion could not be projected onto the signature
    #[error("Prediction error: {0}")]
    Prediction(String),

    /// An adapter could not extract fields from raw model text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Parsed field set differs from the declared output fields
    #[error("Validation error: expected output fields {expected:?} but got {actual:?}")]
    Validation {
        /// Declared output field names, sorted
        expected: Vec<String>,
        /// Parsed field names, sorted
        actual: Vec<String>,
    },

    /// Persisted module state could not be restored
    #[error("State error: {0}")]
    State(String),

    /// Telemetry sink failure (never surfaced from a forward call)
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a shorthand syntax error
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Signature(SignatureError::Syntax(msg.into()))
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The error raised when neither the call, the instance nor the ambient context has a model.
    pub fn no_lm() -> Self {
        Self::configuration(
            "no language model configured; bind one to the module, pass one per call, \
             or set a process-wide default with settings::configure",
        )
    }

    /// Create an LM error
    pub fn lm(msg: impl Into<String>) -> Self {
        Self::Lm(msg.into())
    }

    /// Create a module error
    pub fn module(msg: impl Into<String>) -> Self {
        Self::Module(msg.into())
    }

    /// Create a prediction error
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a validation error from the expected and actual field names.
    ///
    /// Both lists are sorted so the message is stable regardless of map ordering.
    pub fn validation<E, A>(expected: E, actual: A) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let mut expected: Vec<String> = expected.into_iter().map(Into::into).collect();
        let mut actual: Vec<String> = actual.into_iter().map(Into::into).collect();
        expected.sort();
        actual.sort();
        Self::Validation { expected, actual }
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a telemetry error
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry(msg.into())
    }

    /// Get the error category for logging/metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Signature(_) => "signature",
            Self::Configuration(_) => "configuration",
            Self::Lm(_) => "lm",
            Self::Module(_) => "module",
            Self::Prediction(_) => "prediction",
            Self::Parse(_) => "parse",
            Self::Validation { .. } => "validation",
            Self::State(_) => "state",
            Self::Telemetry(_) => "telemetry",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}
