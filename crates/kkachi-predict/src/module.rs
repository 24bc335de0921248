// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Module trait and base implementations
//!
//! A [`Module`] takes [`CallArgs`] and produces a [`Prediction`]. Modules run
//! synchronously on the caller's thread, so the ambient context pushed by
//! the caller (model, trace sink, telemetry) is visible to every module
//! they invoke.
//!
//! ## Example
//!
//! ```
//! use kkachi_predict::{CallArgs, FnModule, Module, Prediction, Signature};
//!
//! let echo = FnModule::new("Echo", |args: CallArgs| {
//!     let sig = Signature::parse("text -> echo")?;
//!     let text = args.input_values().get("text").cloned().unwrap_or_default();
//!     let mut out = kkachi_predict::FieldMap::new();
//!     out.insert("echo".into(), text);
//!     Ok(Prediction::from_completions(vec![out], sig))
//! });
//!
//! let pred = echo.forward(CallArgs::new().input("text", "hi")).unwrap();
//! assert_eq!(pred.get("echo"), Some("hi"));
//! assert_eq!(echo.name(), "Echo");
//! ```

use crate::config::CallArgs;
use crate::error::Result;
use crate::prediction::Prediction;

/// Core trait for executable modules.
pub trait Module: Send + Sync {
    /// Execute the module.
    fn forward(&self, args: CallArgs) -> Result<Prediction>;

    /// Get module name for debugging and tracing.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<M: Module + ?Sized> Module for Box<M> {
    fn forward(&self, args: CallArgs) -> Result<Prediction> {
        (**self).forward(args)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A module that wraps a function.
///
/// This allows using closures and functions as modules without
/// defining a new struct.
pub struct FnModule<F> {
    f: F,
    name: &'static str,
}

impl<F> FnModule<F> {
    /// Create a new function module.
    pub const fn new(name: &'static str, f: F) -> Self {
        Self { f, name }
    }
}

impl<F> Clone for FnModule<F>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            name: self.name,
        }
    }
}

impl<F> Module for FnModule<F>
where
    F: Fn(CallArgs) -> Result<Prediction> + Send + Sync,
{
    fn forward(&self, args: CallArgs) -> Result<Prediction> {
        (self.f)(args)
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_fn_module_propagates_errors() {
        let m = FnModule::new("Broken", |_args: CallArgs| -> Result<Prediction> {
            Err(Error::module("nothing to do"))
        });
        let err = m.forward(CallArgs::new()).unwrap_err();
        assert_eq!(err.category(), "module");
    }

    #[test]
    fn test_boxed_module_keeps_name() {
        let m: Box<dyn Module> = Box::new(FnModule::new("Named", |_args: CallArgs| {
            Err(Error::module("unused"))
        }));
        assert_eq!(m.name(), "Named");
    }
}
