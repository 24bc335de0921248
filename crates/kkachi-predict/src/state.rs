// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Persisted module state.
//!
//! A [`PredictState`] is the snapshot taken by `Predict::dump_state` and
//! applied by `Predict::load_state`. Each key is optional so a state can
//! carry any subset of `{lm, traces, train, demos}`; only present keys are
//! applied on load.
//!
//! Demos are kept in their raw mapping form and rehydrated into
//! [`Example`]s on load. Through JSON, `lm` is written as the model's name
//! and never read back: a model handle cannot be rebuilt from text.

use crate::error::Result;
use crate::example::Example;
use crate::lm::SharedLm;
use crate::trace::TraceEntry;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Snapshot of a predictor's mutable state.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PredictState {
    /// Bound model; `Some(None)` means "explicitly unbound"
    #[serde(
        default,
        skip_deserializing,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_lm"
    )]
    pub lm: Option<Option<SharedLm>>,
    /// Recorded traces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces: Option<Vec<TraceEntry>>,
    /// Training examples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train: Option<Vec<Example>>,
    /// Demos in raw mapping form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demos: Option<Vec<Value>>,
}

fn serialize_lm<S: Serializer>(
    lm: &Option<Option<SharedLm>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    lm.as_ref()
        .and_then(|lm| lm.as_ref().map(|lm| lm.model_name()))
        .serialize(serializer)
}

impl PredictState {
    /// Create an empty state: applying it changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bound model
    pub fn with_lm(mut self, lm: Option<SharedLm>) -> Self {
        self.lm = Some(lm);
        self
    }

    /// Set the traces
    pub fn with_traces(mut self, traces: Vec<TraceEntry>) -> Self {
        self.traces = Some(traces);
        self
    }

    /// Set the training examples
    pub fn with_train(mut self, train: Vec<Example>) -> Self {
        self.train = Some(train);
        self
    }

    /// Set the demos from their raw mapping form
    pub fn with_demos(mut self, demos: Vec<Value>) -> Self {
        self.demos = Some(demos);
        self
    }

    /// Names of the keys this state carries.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::with_capacity(4);
        if self.lm.is_some() {
            keys.push("lm");
        }
        if self.traces.is_some() {
            keys.push("traces");
        }
        if self.train.is_some() {
            keys.push("train");
        }
        if self.demos.is_some() {
            keys.push("demos");
        }
        keys
    }

    /// Rehydrate the raw demos, failing on the first malformed entry.
    pub fn rehydrate_demos(&self) -> Result<Option<Vec<Example>>> {
        self.demos
            .as_ref()
            .map(|demos| demos.iter().map(Example::from_value).collect())
            .transpose()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON; `lm` is ignored if present
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Debug for PredictState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lm = self
            .lm
            .as_ref()
            .map(|lm| lm.as_ref().map(|lm| lm.model_name().to_string()));
        f.debug_struct("PredictState")
            .field("lm", &lm)
            .field("traces", &self.traces.as_ref().map(Vec::len))
            .field("train", &self.train.as_ref().map(Vec::len))
            .field("demos", &self.demos)
            .finish()
    }
}
