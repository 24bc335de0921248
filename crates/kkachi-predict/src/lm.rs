// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Language model client contract.
//!
//! The pipeline only needs three things from a model client: its default
//! options (`kwargs`), a way to send a prompt or a chat transcript and get
//! back one or more raw outputs, and its call history. Provider clients live
//! outside this crate; [`MockLm`] and [`FailingLm`] are provided for tests.
//!
//! # Examples
//!
//! ```
//! use kkachi_predict::lm::{LanguageModel, LmRequest, MockLm};
//! use kkachi_predict::Config;
//!
//! let lm = MockLm::new(|_request, _overrides| vec!["Answer: 4".to_string()]);
//! let outputs = lm.call(&LmRequest::prompt("2+2?"), &Config::new()).unwrap();
//! assert_eq!(outputs, ["Answer: 4"]);
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to a model client.
pub type SharedLm = Arc<dyn LanguageModel>;

/// Default options for a model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmConfig {
    /// Model name
    pub model: String,

    /// Temperature
    pub temperature: f64,

    /// Number of generations per request
    pub n: u64,

    /// Max tokens
    pub max_tokens: u32,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.0,
            n: 1,
            max_tokens: 4000,
        }
    }
}

impl LmConfig {
    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the number of generations.
    pub fn with_n(mut self, n: u64) -> Self {
        self.n = n;
        self
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The option mapping a client exposes as its `kwargs`.
    pub fn to_kwargs(&self) -> Config {
        Config::new()
            .with("model", self.model.as_str())
            .with("temperature", self.temperature)
            .with("n", self.n)
            .with("max_tokens", self.max_tokens)
    }
}

/// Chat role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// User turn
    User,
    /// Assistant turn
    Assistant,
}

/// One role/content pair of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// System message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A request to a model: either a plain prompt or a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LmRequest {
    /// Prompt mode
    Prompt(String),
    /// Message mode
    Messages(Vec<Message>),
}

impl LmRequest {
    /// Prompt-mode request.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::Prompt(text.into())
    }

    /// Message-mode request.
    pub fn messages(messages: Vec<Message>) -> Self {
        Self::Messages(messages)
    }

    /// `"prompt"` or `"messages"`.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Prompt(_) => "prompt",
            Self::Messages(_) => "messages",
        }
    }

    /// Flatten to a single string, for logs and telemetry.
    pub fn to_text(&self) -> String {
        match self {
            Self::Prompt(text) => text.clone(),
            Self::Messages(messages) => messages
                .iter()
                .map(|m| format!("[{:?}] {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// What was sent
    pub request: LmRequest,
    /// Effective options: client defaults with call overrides applied
    pub kwargs: Config,
    /// Raw outputs returned
    pub outputs: Vec<String>,
}

/// Trait for language model clients.
///
/// Object safe so clients can be shared as [`SharedLm`] and made ambient.
pub trait LanguageModel: Send + Sync {
    /// Default options: at least `temperature`, `n` and `model`.
    fn kwargs(&self) -> &Config;

    /// Send a request; `overrides` are applied over [`LanguageModel::kwargs`].
    fn call(&self, request: &LmRequest, overrides: &Config) -> Result<Vec<String>>;

    /// Calls made so far, oldest first.
    fn history(&self) -> Vec<HistoryEntry> {
        Vec::new()
    }

    /// Get the model name for logging.
    fn model_name(&self) -> &str {
        self.kwargs().model().unwrap_or("unknown")
    }
}

type Responder = dyn Fn(&LmRequest, &Config) -> Vec<String> + Send + Sync;

/// A mock model for testing.
///
/// Responses come from a closure receiving the request and the effective
/// options. Every call is recorded in the history.
pub struct MockLm {
    responder: Box<Responder>,
    kwargs: Config,
    history: Mutex<Vec<HistoryEntry>>,
}

impl MockLm {
    /// Create a new mock model with the given responder.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&LmRequest, &Config) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            kwargs: LmConfig::default().with_model("mock").to_kwargs(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// A mock that always answers with `outputs`.
    ///
    /// When the effective `n` exceeds the number of outputs, the last output
    /// is repeated so exactly `n` outputs come back.
    pub fn constant<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outputs: Vec<String> = outputs.into_iter().map(Into::into).collect();
        Self::new(move |_, kwargs| {
            let n = kwargs.n().unwrap_or(1).max(1) as usize;
            let mut out: Vec<String> = outputs.iter().take(n).cloned().collect();
            while out.len() < n {
                match out.last() {
                    Some(last) => {
                        let last = last.clone();
                        out.push(last);
                    }
                    None => break,
                }
            }
            out
        })
    }

    /// Replace the default options.
    pub fn with_kwargs(mut self, config: LmConfig) -> Self {
        self.kwargs = config.to_kwargs();
        self
    }

    /// Set a custom model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.kwargs.insert("model", name.into());
        self
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.history.lock().len()
    }

    /// Most recent call, if any.
    pub fn last_call(&self) -> Option<HistoryEntry> {
        self.history.lock().last().cloned()
    }
}

impl LanguageModel for MockLm {
    fn kwargs(&self) -> &Config {
        &self.kwargs
    }

    fn call(&self, request: &LmRequest, overrides: &Config) -> Result<Vec<String>> {
        let kwargs = self.kwargs.merged(overrides);
        let outputs = (self.responder)(request, &kwargs);
        self.history.lock().push(HistoryEntry {
            request: request.clone(),
            kwargs,
            outputs: outputs.clone(),
        });
        Ok(outputs)
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().clone()
    }
}

/// A model that fails every call with a specific message.
///
/// Useful for testing error propagation.
#[derive(Debug, Clone)]
pub struct FailingLm {
    message: String,
    kwargs: Config,
}

impl FailingLm {
    /// Create a new failing model with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kwargs: LmConfig::default().with_model("failing").to_kwargs(),
        }
    }
}

impl LanguageModel for FailingLm {
    fn kwargs(&self) -> &Config {
        &self.kwargs
    }

    fn call(&self, _request: &LmRequest, _overrides: &Config) -> Result<Vec<String>> {
        Err(Error::lm(&self.message))
    }
}

/// Wrap a client into a [`SharedLm`].
pub fn shared<L: LanguageModel + 'static>(lm: L) -> SharedLm {
    Arc::new(lm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_lm_records_history() {
        let lm = MockLm::new(|request, _| vec![format!("echo: {}", request.to_text())]);

        let out = lm
            .call(&LmRequest::prompt("hi"), &Config::new().with("temperature", 0.3))
            .unwrap();
        assert_eq!(out, ["echo: hi"]);
        assert_eq!(lm.call_count(), 1);

        let last = lm.last_call().unwrap();
        assert_eq!(last.request, LmRequest::prompt("hi"));
        assert_eq!(last.kwargs.temperature(), Some(0.3));
        assert_eq!(last.kwargs.model(), Some("mock"));
        assert_eq!(lm.history().len(), 1);
    }

    #[test]
    fn test_constant_repeats_to_n() {
        let lm = MockLm::constant(["a", "b"]);
        let out = lm
            .call(&LmRequest::prompt("x"), &Config::new().with("n", 4))
            .unwrap();
        assert_eq!(out, ["a", "b", "b", "b"]);

        let out = lm.call(&LmRequest::prompt("x"), &Config::new()).unwrap();
        assert_eq!(out, ["a"]);
    }

    #[test]
    fn test_failing_lm() {
        let lm = FailingLm::new("intentional failure");
        let err = lm.call(&LmRequest::prompt("x"), &Config::new()).unwrap_err();
        assert!(err.to_string().contains("intentional failure"));
        assert_eq!(lm.model_name(), "failing");
    }

    #[test]
    fn test_lm_config_kwargs() {
        let kwargs = LmConfig::default()
            .with_model("small")
            .with_temperature(0.2)
            .with_n(3)
            .with_max_tokens(10)
            .to_kwargs();
        assert_eq!(kwargs.model(), Some("small"));
        assert_eq!(kwargs.temperature(), Some(0.2));
        assert_eq!(kwargs.n(), Some(3));
    }

    #[test]
    fn test_request_modes() {
        assert_eq!(LmRequest::prompt("x").mode(), "prompt");
        let request = LmRequest::messages(vec![Message::system("s"), Message::user("u")]);
        assert_eq!(request.mode(), "messages");
        assert_eq!(request.to_text(), "[System] s\n[User] u");
    }
}
