// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Trace recording.
//!
//! When the ambient context carries a [`TraceSink`], every forward call
//! appends one [`TraceEntry`]. The recorder only ever appends; the owner of
//! the sink decides when to truncate it.

use crate::prediction::Prediction;
use crate::settings;
use crate::types::FieldMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One recorded call: which module ran, with what inputs, and what it predicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Module name
    pub module: String,
    /// Stage identifier of the module instance
    pub stage: String,
    /// Copy of the call's input values
    pub inputs: FieldMap,
    /// Resulting prediction
    pub prediction: Prediction,
}

/// Shared, append-only trace collector.
///
/// Cloning yields another handle to the same list.
#[derive(Debug, Clone, Default)]
pub struct TraceSink {
    entries: Arc<Mutex<Vec<TraceEntry>>>,
}

impl TraceSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&self, entry: TraceEntry) {
        self.entries.lock().push(entry);
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.lock().clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entry has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Keep only the first `len` entries
    pub fn truncate(&self, len: usize) {
        self.entries.lock().truncate(len);
    }

    /// Remove and return all entries
    pub fn take(&self) -> Vec<TraceEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Whether both handles share the same list
    pub fn same_sink(&self, other: &TraceSink) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

/// Append `entry` to the active sink, if tracing is on for this call chain.
///
/// Returns whether the entry was recorded.
pub fn record(entry: TraceEntry) -> bool {
    match settings::current().trace {
        Some(sink) => {
            sink.push(entry);
            true
        }
        None => false,
    }
}

/// Run `body` with a fresh sink active and return what it recorded.
pub fn collect<R>(body: impl FnOnce() -> R) -> (R, Vec<TraceEntry>) {
    let sink = TraceSink::new();
    let handle = sink.clone();
    let result = settings::with_context(|ctx| ctx.trace = Some(handle), body);
    (result, sink.take())
}
