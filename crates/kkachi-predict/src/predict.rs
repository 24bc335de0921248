// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Predict module for LM-based predictions with demo management
//!
//! [`Predict`] owns a signature, default options, an optional bound model
//! and its demos, traces and training examples. A forward call:
//!
//! 1. resolves the effective signature, demos, options and model
//!    ([`config::resolve`]),
//! 2. hands a [`Query`] to its [`Generator`], inside a scoped context when
//!    the model was given explicitly,
//! 3. projects the completions onto the output fields
//!    ([`extract_completions`]),
//! 4. reports to telemetry and the active trace sink.

use crate::adapter::ChatAdapter;
use crate::config::{self, CallArgs, Config, Defaults, LmSource, ResolvedCall};
use crate::error::Result;
use crate::example::Example;
use crate::generate::{AdapterGenerator, Generator, Query, StageId};
use crate::lm::SharedLm;
use crate::module::Module;
use crate::prediction::{extract_completions, Completion, Prediction};
use crate::settings;
use crate::signature::{IntoSignature, Signature};
use crate::state::PredictState;
use crate::telemetry::{self, GenerationEvent};
use crate::trace::{self, TraceEntry};
use std::fmt;
use std::time::SystemTime;

/// Predict module that uses an LM to generate predictions.
///
/// ## Example
///
/// ```
/// use kkachi_predict::lm::{shared, MockLm};
/// use kkachi_predict::{CallArgs, Example, Predict};
///
/// let lm = shared(MockLm::constant(["Answer: 6"]));
/// let predict = Predict::new("question -> answer")
///     .unwrap()
///     .with_lm(lm)
///     .with_demos(vec![Example::new().with("question", "2+2?").with("answer", "4")]);
///
/// let pred = predict.forward(CallArgs::new().input("question", "3+3?")).unwrap();
/// assert_eq!(pred.get("answer"), Some("6"));
/// ```
pub struct Predict<G = AdapterGenerator<ChatAdapter>> {
    stage: StageId,
    signature: Signature,
    config: Config,
    generator: G,
    lm: Option<SharedLm>,
    traces: Vec<TraceEntry>,
    train: Vec<Example>,
    demos: Vec<Example>,
}

impl Predict {
    /// Create a predictor that drives the chat adapter.
    ///
    /// Shorthand strings such as `"question -> answer"` are parsed; a
    /// malformed one is a signature error.
    pub fn new(signature: impl IntoSignature) -> Result<Self> {
        Self::with_generator(signature, AdapterGenerator::default())
    }
}

impl<G: Generator> Predict<G> {
    /// Create a predictor with a custom generator.
    pub fn with_generator(signature: impl IntoSignature, generator: G) -> Result<Self> {
        let signature = signature.into_signature()?;
        let stage = StageId::generate();
        tracing::debug!(stage = %stage, signature = %signature, "predict created");

        Ok(Self {
            stage,
            signature,
            config: Config::new(),
            generator,
            lm: None,
            traces: Vec::new(),
            train: Vec::new(),
            demos: Vec::new(),
        })
    }

    /// Set default options
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Bind a model to this instance
    pub fn with_lm(mut self, lm: SharedLm) -> Self {
        self.lm = Some(lm);
        self
    }

    /// Set default demos
    pub fn with_demos(mut self, demos: Vec<Example>) -> Self {
        self.demos = demos;
        self
    }

    /// Set training examples
    pub fn with_train(mut self, train: Vec<Example>) -> Self {
        self.train = train;
        self
    }

    /// Stage identifier of this instance
    pub fn stage(&self) -> &StageId {
        &self.stage
    }

    /// Default signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Default options
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The generator
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Bound model, if any
    pub fn lm(&self) -> Option<&SharedLm> {
        self.lm.as_ref()
    }

    /// Traces kept on the instance
    pub fn traces(&self) -> &[TraceEntry] {
        &self.traces
    }

    /// Training examples
    pub fn train(&self) -> &[Example] {
        &self.train
    }

    /// Default demos
    pub fn demos(&self) -> &[Example] {
        &self.demos
    }

    /// Bind or unbind a model
    pub fn set_lm(&mut self, lm: Option<SharedLm>) {
        self.lm = lm;
    }

    /// Replace the default demos
    pub fn set_demos(&mut self, demos: Vec<Example>) {
        self.demos = demos;
    }

    /// Replace the training examples
    pub fn set_train(&mut self, train: Vec<Example>) {
        self.train = train;
    }

    /// Replace the traces kept on the instance
    pub fn set_traces(&mut self, traces: Vec<TraceEntry>) {
        self.traces = traces;
    }

    /// Clear the bound model, traces, training examples and demos.
    ///
    /// The signature, options and stage identifier are kept.
    pub fn reset(&mut self) {
        self.lm = None;
        self.traces.clear();
        self.train.clear();
        self.demos.clear();
    }

    /// Snapshot all four state keys.
    pub fn dump_state(&self) -> PredictState {
        PredictState {
            lm: Some(self.lm.clone()),
            traces: Some(self.traces.clone()),
            train: Some(self.train.clone()),
            demos: Some(self.demos.iter().map(Example::to_value).collect()),
        }
    }

    /// Apply the keys present in `state`.
    ///
    /// Demos are rehydrated before anything is assigned: if one is
    /// malformed the instance is left unchanged.
    pub fn load_state(&mut self, state: PredictState) -> Result<()> {
        let demos = state.rehydrate_demos()?;
        let PredictState {
            lm, traces, train, ..
        } = state;

        if let Some(lm) = lm {
            self.lm = lm;
        }
        if let Some(traces) = traces {
            self.traces = traces;
        }
        if let Some(train) = train {
            self.train = train;
        }
        if let Some(demos) = demos {
            self.demos = demos;
        }
        Ok(())
    }

    /// Run the module; same as [`Module::forward`].
    pub fn call(&self, args: CallArgs) -> Result<Prediction> {
        self.forward(args)
    }

    /// Resolve, generate, extract, report.
    pub fn forward(&self, args: CallArgs) -> Result<Prediction> {
        let _span = tracing::info_span!(
            "predict",
            stage = %self.stage,
            signature = %self.signature
        )
        .entered();

        let start = SystemTime::now();
        let ambient = settings::current();
        let defaults = Defaults {
            signature: &self.signature,
            demos: &self.demos,
            config: &self.config,
            lm: self.lm.as_ref(),
        };
        let ResolvedCall {
            signature,
            demos,
            config,
            lm,
            lm_source,
            inputs,
        } = config::resolve(defaults, args, ambient.lm.clone())?;

        let query = Query::new(demos, inputs.clone());
        let (query, raw) = self.invoke(&signature, &config, query, &lm, lm_source)?;
        let completions = extract_completions(raw, &signature, &inputs)?;
        let prediction = Prediction::from_completions(completions, signature);

        if let Some(sink) = ambient.telemetry.as_deref() {
            let event = GenerationEvent {
                name: Module::name(self).to_string(),
                model: lm.model_name().to_string(),
                start,
                end: SystemTime::now(),
                model_parameters: lm.kwargs().clone(),
                prompt: query.request,
                completion: prediction.completions().to_vec(),
                metadata: inputs.clone(),
            };
            telemetry::notify(sink, &event);
        }

        trace::record(TraceEntry {
            module: Module::name(self).to_string(),
            stage: self.stage.to_string(),
            inputs,
            prediction: prediction.clone(),
        });

        Ok(prediction)
    }

    fn invoke(
        &self,
        signature: &Signature,
        config: &Config,
        query: Query,
        lm: &SharedLm,
        source: LmSource,
    ) -> Result<(Query, Vec<Completion>)> {
        let generate = || self.generator.generate(signature, config, query, &self.stage);

        let (query, completions) = match source {
            LmSource::Ambient => generate()?,
            LmSource::Call | LmSource::Instance => settings::with_context(
                |ctx| {
                    ctx.lm = Some(lm.clone());
                    ctx.query_only = true;
                },
                generate,
            )?,
        };

        tracing::debug!(
            completions = completions.len(),
            source = ?source,
            "generation finished"
        );
        Ok((query, completions))
    }
}

impl<G: Generator> Module for Predict<G> {
    fn forward(&self, args: CallArgs) -> Result<Prediction> {
        Predict::forward(self, args)
    }

    fn name(&self) -> &str {
        "Predict"
    }
}

impl<G> fmt::Display for Predict<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predict({})", self.signature)
    }
}

impl<G> fmt::Debug for Predict<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predict")
            .field("stage", &self.stage)
            .field("signature", &self.signature.to_string())
            .field("config", &self.config)
            .field("lm", &self.lm.as_ref().map(|lm| lm.model_name().to_string()))
            .field("traces", &self.traces.len())
            .field("train", &self.train.len())
            .field("demos", &self.demos.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lm::{shared, FailingLm, LmConfig, MockLm};
    use crate::types::field_map;
    use serde_json::json;
    use std::sync::Arc;

    /// Generator returning fixed completions and recording what it saw.
    struct Scripted {
        completions: Vec<Completion>,
        seen: parking_lot::Mutex<Vec<(Config, bool, Option<String>)>>,
    }

    impl Scripted {
        fn new(completions: Vec<Completion>) -> Self {
            Self {
                completions,
                seen: parking_lot::Mutex::new(Vec::new()),
            }
        }
    }

    impl Generator for Scripted {
        fn generate(
            &self,
            _signature: &Signature,
            config: &Config,
            query: Query,
            _stage: &StageId,
        ) -> Result<(Query, Vec<Completion>)> {
            let ctx = settings::current();
            self.seen.lock().push((
                config.clone(),
                ctx.query_only,
                ctx.lm.map(|lm| lm.model_name().to_string()),
            ));
            Ok((query, self.completions.clone()))
        }
    }

    fn mock(name: &str) -> SharedLm {
        shared(MockLm::constant(["Answer: 1"]).with_name(name))
    }

    #[test]
    fn test_new_rejects_malformed_signature() {
        let err = Predict::new("question with spaces -> answer").unwrap_err();
        assert_eq!(err.category(), "signature");
    }

    #[test]
    fn test_display() {
        let p = Predict::new("question -> answer").unwrap();
        assert_eq!(p.to_string(), "Predict(question -> answer)");
    }

    #[test]
    fn test_no_model_is_configuration_error() {
        let p = Predict::new("question -> answer").unwrap();
        let err = p.forward(CallArgs::new().input("question", "?")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_bound_model_runs_in_query_only_scope() {
        let gen = Arc::new(Scripted::new(vec![field_map([("answer", "1")])]));
        let p = Predict::with_generator("question -> answer", gen.clone())
            .unwrap()
            .with_lm(mock("bound"));

        p.forward(CallArgs::new().input("question", "?")).unwrap();

        let seen = gen.seen.lock();
        assert!(seen[0].1);
        assert_eq!(seen[0].2.as_deref(), Some("bound"));
        assert!(settings::current().lm.is_none());
    }

    #[test]
    fn test_ambient_model_runs_without_scope() {
        let gen = Arc::new(Scripted::new(vec![field_map([("answer", "1")])]));
        let p = Predict::with_generator("question -> answer", gen.clone()).unwrap();

        settings::with_context(
            |ctx| ctx.lm = Some(mock("ambient")),
            || {
                let depth = settings::depth();
                p.forward(CallArgs::new()).unwrap();
                assert_eq!(settings::depth(), depth);
            },
        );

        let seen = gen.seen.lock();
        assert!(!seen[0].1);
        assert_eq!(seen[0].2.as_deref(), Some("ambient"));
    }

    #[test]
    fn test_per_call_model_wins() {
        let gen = Arc::new(Scripted::new(vec![field_map([("answer", "1")])]));
        let p = Predict::with_generator("question -> answer", gen.clone())
            .unwrap()
            .with_lm(mock("bound"));

        p.forward(CallArgs::new().lm(mock("per-call"))).unwrap();
        assert_eq!(gen.seen.lock()[0].2.as_deref(), Some("per-call"));
    }

    #[test]
    fn test_config_merge_and_heuristic() {
        let gen = Arc::new(Scripted::new(vec![field_map([("answer", "1")])]));
        let lm = shared(
            MockLm::constant(["Answer: 1"]).with_kwargs(LmConfig::default().with_temperature(0.0)),
        );
        let p = Predict::with_generator("question -> answer", gen.clone())
            .unwrap()
            .with_config(Config::new().with("max_tokens", 10).with("n", 1))
            .with_lm(lm);

        p.forward(CallArgs::new().config(Config::new().with("n", 3)))
            .unwrap();

        let config = &gen.seen.lock()[0].0;
        assert_eq!(config.n(), Some(3));
        assert_eq!(config.temperature(), Some(0.7));
        assert_eq!(config.get("max_tokens"), Some(&json!(10)));
    }

    #[test]
    fn test_pinned_outputs_are_dropped() {
        let gen = Scripted::new(vec![field_map([("reasoning", "r"), ("answer", "a")])]);
        let p = Predict::with_generator("question -> reasoning, answer", gen)
            .unwrap()
            .with_lm(mock("m"));

        let pred = p
            .forward(
                CallArgs::new()
                    .input("question", "q")
                    .input("reasoning", "given"),
            )
            .unwrap();
        assert_eq!(pred.completions(), [field_map([("answer", "a")])]);
    }

    #[test]
    fn test_generator_errors_propagate() {
        let p = Predict::new("question -> answer")
            .unwrap()
            .with_lm(shared(FailingLm::new("boom")));
        let err = p.forward(CallArgs::new().input("question", "?")).unwrap_err();
        assert!(matches!(err, Error::Lm(ref m) if m == "boom"));
        assert!(settings::current().lm.is_none());
        assert_eq!(settings::depth(), 0);
    }

    #[test]
    fn test_reset_keeps_stage() {
        let mut p = Predict::new("question -> answer")
            .unwrap()
            .with_lm(mock("m"))
            .with_demos(vec![Example::new().with("question", "q")])
            .with_train(vec![Example::new().with("question", "t")]);
        let stage = p.stage().clone();

        p.reset();

        assert!(p.lm().is_none());
        assert!(p.demos().is_empty());
        assert!(p.train().is_empty());
        assert!(p.traces().is_empty());
        assert_eq!(p.stage(), &stage);
    }

    #[test]
    fn test_stage_ids_differ_across_instances() {
        let a = Predict::new("q -> a").unwrap();
        let b = Predict::new("q -> a").unwrap();
        assert_ne!(a.stage(), b.stage());
    }

    #[test]
    fn test_dump_and_load_roundtrip() {
        let lm = mock("m");
        let p = Predict::new("question -> answer")
            .unwrap()
            .with_lm(lm.clone())
            .with_demos(vec![Example::new().with("question", "2+2?").with("answer", "4")])
            .with_train(vec![Example::new().with("question", "t")]);

        let mut fresh = Predict::new("question -> answer").unwrap();
        fresh.load_state(p.dump_state()).unwrap();

        assert!(Arc::ptr_eq(fresh.lm().unwrap(), &lm));
        assert_eq!(fresh.demos(), p.demos());
        assert_eq!(fresh.train(), p.train());
        assert_eq!(fresh.traces(), p.traces());
    }

    #[test]
    fn test_load_subset_and_failure_is_atomic() {
        let mut p = Predict::new("question -> answer")
            .unwrap()
            .with_train(vec![Example::new().with("question", "keep")]);

        p.load_state(PredictState::new().with_demos(vec![json!({"question": "d"})]))
            .unwrap();
        assert_eq!(p.demos()[0].get("question"), Some("d"));
        assert_eq!(p.train()[0].get("question"), Some("keep"));

        let bad = PredictState::new()
            .with_train(Vec::new())
            .with_demos(vec![json!("not a mapping")]);
        let err = p.load_state(bad).unwrap_err();
        assert!(matches!(err, Error::State(_)));
        assert_eq!(p.train().len(), 1);
        assert_eq!(p.demos().len(), 1);
    }

    #[test]
    fn test_call_is_forward() {
        let gen = Scripted::new(vec![field_map([("answer", "x")])]);
        let p = Predict::with_generator("question -> answer", gen)
            .unwrap()
            .with_lm(mock("m"));
        let pred = p.call(CallArgs::new()).unwrap();
        assert_eq!(pred.to_field_map(), field_map([("answer", "x")]));
    }
}
