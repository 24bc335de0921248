// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! # Kkachi Predict - Signature-driven LM invocation
//!
//! Declare what a language model call consumes and produces, and let the
//! pipeline build the request, call the model and hand back structured
//! output.
//!
//! ## Architecture
//!
//! - **Signatures**: typed input/output field contracts, parsed from
//!   shorthand such as `"question -> answer"`
//! - **Predict**: resolves options, demos and the model per call, delegates
//!   to a [`Generator`] and projects completions onto the output fields
//! - **Adapters**: turn a signature into a prompt or message list and parse
//!   raw model text back, with one shared validate-after-parse orchestration
//! - **Ambient context**: a per-thread stack of model/trace/telemetry
//!   settings with guaranteed restoration
//!
//! ## Quick Start
//!
//! ```
//! use kkachi_predict::prelude::*;
//!
//! let lm = shared(MockLm::constant(["Answer: 6"]));
//! let qa = Predict::new("question -> answer")?
//!     .with_demos(vec![Example::new().with("question", "2+2?").with("answer", "4")]);
//!
//! let ((), traces) = trace::collect(|| {
//!     settings::with_context(|ctx| ctx.lm = Some(lm.clone()), || {
//!         let pred = qa.forward(CallArgs::new().input("question", "3+3?")).unwrap();
//!         assert_eq!(pred.get("answer"), Some("6"));
//!     })
//! });
//! assert_eq!(traces.len(), 1);
//! # Ok::<(), kkachi_predict::Error>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::new_without_default)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod example;
pub mod field;
pub mod generate;
pub mod lm;
pub mod module;
pub mod predict;
pub mod prediction;
pub mod settings;
pub mod signature;
pub mod state;
pub mod telemetry;
pub mod trace;
pub mod types;

// Re-exports for convenience
pub use adapter::{
    call_adapter, call_with_request, validate_fields, Adapter, ChatAdapter, ChatConfig,
    JSONAdapter, JSONConfig,
};
pub use config::{CallArgs, Config, GREEDY_TEMPERATURE_CEILING, SAMPLING_TEMPERATURE};
pub use error::{Error, Result, SignatureError};
pub use example::Example;
pub use field::{Field, FieldType, InputField, OutputField};
pub use generate::{AdapterGenerator, Generator, Query, StageId};
pub use lm::{LanguageModel, LmConfig, LmRequest, Message, Role, SharedLm};
pub use module::{FnModule, Module};
pub use predict::Predict;
pub use prediction::{extract_completions, Completion, Prediction};
pub use settings::{Context, ContextGuard};
pub use signature::{IntoSignature, Signature, SignatureBuilder};
pub use state::PredictState;
pub use telemetry::{GenerationEvent, RecordingTelemetry, SharedTelemetry, Telemetry};
pub use trace::{TraceEntry, TraceSink};
pub use types::{field_map, FieldMap};

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::{Error, Result};

    // Core types
    pub use crate::{
        CallArgs, Config, Example, Field, FieldMap, InputField, Module, OutputField, Predict,
        Prediction, Signature, SignatureBuilder,
    };

    // Adapters
    pub use crate::{Adapter, ChatAdapter, JSONAdapter};

    // LM client
    pub use crate::lm::{shared, FailingLm, MockLm};
    pub use crate::{LanguageModel, LmConfig, SharedLm};

    // Ambient context
    pub use crate::{settings, trace};
}

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
