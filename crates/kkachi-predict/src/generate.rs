// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Generation: the boundary between a module and the model.
//!
//! A [`Generator`] receives the effective signature and options, a
//! [`Query`] carrying demos and the live input values, and the calling
//! module's [`StageId`], and returns raw completions. The default
//! [`AdapterGenerator`] formats the query with an [`Adapter`], calls the
//! ambient model and parses each output.

use crate::adapter::{call_with_request, Adapter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::example::Example;
use crate::lm::LmRequest;
use crate::prediction::Completion;
use crate::settings;
use crate::signature::Signature;
use crate::types::FieldMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque per-instance token that disambiguates generation calls made
/// for the same signature by different module instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    /// Generate a fresh identifier: 8 random bytes as 16 lowercase hex chars.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u64(COUNTER.fetch_add(1, Ordering::Relaxed));
        if let Ok(elapsed) = SystemTime::now().duration_since(UNIX_EPOCH) {
            hasher.write_u128(elapsed.as_nanos());
        }
        Self(format!("{:016x}", hasher.finish()))
    }

    /// The token as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The example-like object handed to a generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Few-shot demonstrations
    pub demos: Vec<Example>,
    /// Values for a prefix of the signature's input fields
    pub inputs: FieldMap,
    /// Filled by the generator with the first completion, if any
    pub outputs: Option<FieldMap>,
    /// The request the generator sent to the model, if it records one
    pub request: Option<LmRequest>,
}

impl Query {
    /// Create a query from demos and input values
    pub fn new(demos: Vec<Example>, inputs: FieldMap) -> Self {
        Self {
            demos,
            inputs,
            outputs: None,
            request: None,
        }
    }
}

/// The generation call a module delegates to.
///
/// Implementations must not swallow or retry failures; whatever they
/// return is propagated to the module's caller unchanged.
pub trait Generator: Send + Sync {
    /// Generate completions for `query` under `signature` and `config`.
    fn generate(
        &self,
        signature: &Signature,
        config: &Config,
        query: Query,
        stage: &StageId,
    ) -> Result<(Query, Vec<Completion>)>;
}

impl<G: Generator + ?Sized> Generator for std::sync::Arc<G> {
    fn generate(
        &self,
        signature: &Signature,
        config: &Config,
        query: Query,
        stage: &StageId,
    ) -> Result<(Query, Vec<Completion>)> {
        (**self).generate(signature, config, query, stage)
    }
}

/// Generator that drives an [`Adapter`] against the ambient model.
///
/// The effective config is passed to the model as per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct AdapterGenerator<A> {
    adapter: A,
}

impl<A: Adapter> AdapterGenerator<A> {
    /// Create a generator around `adapter`
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// The wrapped adapter
    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<A: Adapter> Generator for AdapterGenerator<A> {
    fn generate(
        &self,
        signature: &Signature,
        config: &Config,
        mut query: Query,
        stage: &StageId,
    ) -> Result<(Query, Vec<Completion>)> {
        let lm = settings::current().lm.ok_or_else(Error::no_lm)?;

        tracing::debug!(
            stage = %stage,
            adapter = self.adapter.name(),
            model = lm.model_name(),
            demos = query.demos.len(),
            "generating"
        );

        let request = self.adapter.format(signature, &query.demos, &query.inputs)?;
        let completions =
            call_with_request(&self.adapter, lm.as_ref(), config, signature, &request)?;

        query.outputs = completions.first().cloned();
        query.request = Some(request);
        Ok((query, completions))
    }
}
