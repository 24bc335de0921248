// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Per-call configuration resolution
//!
//! Every call merges three sources into one effective configuration:
//! the module's defaults, an explicit per-call [`Config`], and the typed
//! slots of [`CallArgs`] (signature, demos, model). Explicit per-call
//! options win over module defaults.

use crate::error::{Error, Result};
use crate::example::Example;
use crate::lm::SharedLm;
use crate::signature::Signature;
use crate::types::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Temperature forced when several generations are requested at near-zero temperature.
pub const SAMPLING_TEMPERATURE: f64 = 0.7;

/// Temperatures at or below this collapse samples into near-duplicates.
pub const GREEDY_TEMPERATURE_CEILING: f64 = 0.15;

/// Option name to value mapping, e.g. `temperature`, `n`, `model`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(BTreeMap<String, Value>);

impl Config {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an option
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get an option
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove an option
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether the option is set
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// `temperature`, if set to a number
    pub fn temperature(&self) -> Option<f64> {
        self.get("temperature").and_then(Value::as_f64)
    }

    /// `n` (number of generations), if set to a non-negative whole number.
    ///
    /// Accepts `3.0` as well as `3`, since JSON readers and callers may store
    /// a whole count as a float.
    pub fn n(&self) -> Option<u64> {
        let value = self.get("n")?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })
    }

    /// `model`, if set to a string
    pub fn model(&self) -> Option<&str> {
        self.get("model").and_then(Value::as_str)
    }

    /// Copy of `self` with every option of `overrides` applied on top.
    pub fn merged(&self, overrides: &Config) -> Config {
        let mut merged = self.clone();
        for (k, v) in overrides.iter() {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Iterate options in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no option is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Call-time arguments for a module.
///
/// The privileged slots (`signature`, `demos`, `config`, `lm`) override the
/// module's defaults for this call only; everything set through
/// [`CallArgs::input`] is a value for one of the signature's input fields.
#[derive(Clone, Default)]
pub struct CallArgs {
    pub(crate) signature: Option<Signature>,
    pub(crate) demos: Option<Vec<Example>>,
    pub(crate) config: Config,
    pub(crate) lm: Option<SharedLm>,
    pub(crate) inputs: FieldMap,
}

impl CallArgs {
    /// Create empty call arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one input value
    pub fn input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Set several input values
    pub fn inputs<I, K, V>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inputs
            .extend(inputs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Use a different signature for this call
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Use these demos instead of the module's for this call
    pub fn demos(mut self, demos: Vec<Example>) -> Self {
        self.demos = Some(demos);
        self
    }

    /// Explicit per-call options; merged over the module's config
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use this model for this call
    pub fn lm(mut self, lm: SharedLm) -> Self {
        self.lm = Some(lm);
        self
    }

    /// Input values set so far
    pub fn input_values(&self) -> &FieldMap {
        &self.inputs
    }
}

impl std::fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallArgs")
            .field("signature", &self.signature.as_ref().map(|s| s.to_string()))
            .field("demos", &self.demos.as_ref().map(Vec::len))
            .field("config", &self.config)
            .field("lm", &self.lm.as_ref().map(|lm| lm.model_name().to_string()))
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Module-level defaults consulted when a call leaves a slot empty.
#[derive(Clone, Copy)]
pub struct Defaults<'a> {
    /// Module signature
    pub signature: &'a Signature,
    /// Module demos
    pub demos: &'a [Example],
    /// Module config
    pub config: &'a Config,
    /// Model bound to the module, if any
    pub lm: Option<&'a SharedLm>,
}

/// Where the model for a call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmSource {
    /// Passed in [`CallArgs`]
    Call,
    /// Bound to the module instance
    Instance,
    /// The ambient/default context
    Ambient,
}

/// Fully resolved inputs to one generation call.
#[derive(Clone)]
pub struct ResolvedCall {
    /// Effective signature
    pub signature: Signature,
    /// Effective demos
    pub demos: Vec<Example>,
    /// Effective options after merging and the temperature heuristic
    pub config: Config,
    /// Model used for this call
    pub lm: SharedLm,
    /// Which source supplied `lm`
    pub lm_source: LmSource,
    /// Values for a prefix of the signature's input fields
    pub inputs: FieldMap,
}

/// Resolve call arguments against module defaults and the ambient model.
///
/// Fails with a configuration error when no model is available from the
/// call, the module or the ambient context.
pub fn resolve(
    defaults: Defaults<'_>,
    args: CallArgs,
    ambient_lm: Option<SharedLm>,
) -> Result<ResolvedCall> {
    let CallArgs {
        signature,
        demos,
        config,
        lm,
        inputs,
    } = args;

    let signature = signature.unwrap_or_else(|| defaults.signature.clone());
    let demos = demos.unwrap_or_else(|| defaults.demos.to_vec());
    let mut config = defaults.config.merged(&config);

    let (lm, lm_source) = match (lm, defaults.lm) {
        (Some(lm), _) => (lm, LmSource::Call),
        (None, Some(lm)) => (lm.clone(), LmSource::Instance),
        (None, None) => (ambient_lm.ok_or_else(Error::no_lm)?, LmSource::Ambient),
    };

    apply_temperature_heuristic(&mut config, lm.kwargs());

    Ok(ResolvedCall {
        signature,
        demos,
        config,
        lm,
        lm_source,
        inputs,
    })
}

/// Force [`SAMPLING_TEMPERATURE`] when more than one generation is requested
/// at an unset or near-zero temperature.
///
/// `temperature` and `n` fall back to the model's defaults when the config
/// leaves them unset. Returns `true` if the config was changed.
pub fn apply_temperature_heuristic(config: &mut Config, lm_kwargs: &Config) -> bool {
    let temperature = config.temperature().or_else(|| lm_kwargs.temperature());
    let num_generations = config.n().or_else(|| lm_kwargs.n()).unwrap_or(1);

    let greedy = temperature.map_or(true, |t| t <= GREEDY_TEMPERATURE_CEILING);
    if greedy && num_generations > 1 {
        tracing::debug!(
            n = num_generations,
            prior = ?temperature,
            forced = SAMPLING_TEMPERATURE,
            "raising temperature for multi-sample generation"
        );
        config.insert("temperature", SAMPLING_TEMPERATURE);
        return true;
    }
    false
}
