// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Ambient context: the current model, query-only flag, trace sink and
//! telemetry sink consulted when a call does not supply its own.
//!
//! There are two layers:
//!
//! - **Process-wide defaults**, set with [`configure`].
//! - **A per-thread stack of frames**, pushed with [`enter`] or
//!   [`with_context`]. The innermost frame wins; without frames the
//!   defaults apply.
//!
//! Frames are popped by [`ContextGuard`]'s `Drop`, so the enclosing state is
//! restored on every exit path, including panics. Each thread has its own
//! stack, so concurrent call chains never see each other's frames.
//!
//! ```
//! use kkachi_predict::lm::{shared, MockLm};
//! use kkachi_predict::settings;
//!
//! let lm = shared(MockLm::constant(["Answer: 4"]));
//! assert!(settings::current().lm.is_none());
//! settings::with_context(|ctx| ctx.lm = Some(lm.clone()), || {
//!     assert!(settings::current().lm.is_some());
//! });
//! assert!(settings::current().lm.is_none());
//! ```

use crate::lm::SharedLm;
use crate::telemetry::SharedTelemetry;
use crate::trace::TraceSink;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

/// One frame of ambient settings.
#[derive(Clone, Default)]
pub struct Context {
    /// Current model
    pub lm: Option<SharedLm>,
    /// Generators must not mutate shared demonstration/training state
    pub query_only: bool,
    /// Active trace collector
    pub trace: Option<TraceSink>,
    /// Telemetry sink notified after each forward call
    pub telemetry: Option<SharedTelemetry>,
}

impl Context {
    /// The empty context: no model, no trace, no telemetry.
    pub const EMPTY: Context = Context {
        lm: None,
        query_only: false,
        trace: None,
        telemetry: None,
    };

    /// Whether `self` and `other` hold the same model handle (or both none).
    pub fn same_lm(&self, other: &Context) -> bool {
        match (&self.lm, &other.lm) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("lm", &self.lm.as_ref().map(|lm| lm.model_name().to_string()))
            .field("query_only", &self.query_only)
            .field("trace", &self.trace.as_ref().map(TraceSink::len))
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}

static DEFAULTS: RwLock<Context> = parking_lot::const_rwlock(Context::EMPTY);

thread_local! {
    static STACK: RefCell<Vec<Context>> = const { RefCell::new(Vec::new()) };
}

/// Modify the process-wide defaults.
///
/// Frames already pushed on any thread are not affected.
pub fn configure(f: impl FnOnce(&mut Context)) {
    f(&mut DEFAULTS.write());
}

/// Snapshot of the process-wide defaults.
pub fn defaults() -> Context {
    DEFAULTS.read().clone()
}

/// The effective context for the calling thread.
pub fn current() -> Context {
    STACK
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(defaults)
}

/// Number of frames pushed on the calling thread.
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// Restores the enclosing context when dropped.
///
/// Not `Send`: the frame lives on the stack of the thread that pushed it.
#[must_use = "the context is popped as soon as the guard is dropped"]
pub struct ContextGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        // also discards frames of inner guards; a no-op if an outer guard already popped this one
        let _ = STACK.try_with(|stack| stack.borrow_mut().truncate(self.depth.saturating_sub(1)));
    }
}

/// Push `ctx` as the innermost frame until the guard is dropped.
pub fn enter(ctx: Context) -> ContextGuard {
    let depth = STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(ctx);
        stack.len()
    });
    ContextGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Run `body` in a frame derived from [`current`] with `overrides` applied.
pub fn with_context<R>(overrides: impl FnOnce(&mut Context), body: impl FnOnce() -> R) -> R {
    let mut ctx = current();
    overrides(&mut ctx);
    let _guard = enter(ctx);
    body()
}
