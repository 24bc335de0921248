// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Best-effort generation telemetry.
//!
//! After each forward call the ambient [`Telemetry`] sink, if any, receives a
//! [`GenerationEvent`]. A failing sink is logged and ignored; it never changes
//! the prediction returned to the caller.

use crate::config::Config;
use crate::error::Result;
use crate::lm::LmRequest;
use crate::types::FieldMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;

/// Shared handle to a telemetry sink.
pub type SharedTelemetry = Arc<dyn Telemetry>;

/// Report for one forward call.
#[derive(Debug, Clone)]
pub struct GenerationEvent {
    /// Module name
    pub name: String,
    /// Model name
    pub model: String,
    /// When the forward call started
    pub start: SystemTime,
    /// When the prediction was assembled
    pub end: SystemTime,
    /// The model's default options
    pub model_parameters: Config,
    /// The request sent for this call, if the generator recorded it
    pub prompt: Option<LmRequest>,
    /// Completions of the prediction
    pub completion: Vec<FieldMap>,
    /// The call's input values
    pub metadata: FieldMap,
}

/// Receiver of generation reports.
pub trait Telemetry: Send + Sync {
    /// Handle one report.
    fn on_generation(&self, event: &GenerationEvent) -> Result<()>;
}

/// Deliver `event`, logging and discarding any failure.
pub fn notify(sink: &dyn Telemetry, event: &GenerationEvent) {
    if let Err(err) = sink.on_generation(event) {
        tracing::warn!(
            module = %event.name,
            model = %event.model,
            error = %err,
            "telemetry notification failed"
        );
    }
}

/// Telemetry sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<GenerationEvent>>,
}

impl RecordingTelemetry {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> Vec<GenerationEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Telemetry for RecordingTelemetry {
    fn on_generation(&self, event: &GenerationEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Broken;

    impl Telemetry for Broken {
        fn on_generation(&self, _event: &GenerationEvent) -> Result<()> {
            Err(Error::telemetry("collector unreachable"))
        }
    }

    fn event() -> GenerationEvent {
        let now = SystemTime::now();
        GenerationEvent {
            name: "Predict".into(),
            model: "mock".into(),
            start: now,
            end: now,
            model_parameters: Config::new(),
            prompt: None,
            completion: Vec::new(),
            metadata: FieldMap::new(),
        }
    }

    #[test]
    fn test_recording_telemetry() {
        let rec = RecordingTelemetry::new();
        notify(&rec, &event());
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.events()[0].model, "mock");
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        notify(&Broken, &event());
    }
}
