// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Core type definitions

use indexmap::IndexMap;

/// Field name to value mapping.
///
/// Keeps insertion order, so completions list their fields in signature order.
pub type FieldMap = IndexMap<String, String>;

/// Build a [`FieldMap`] from `(name, value)` pairs.
pub fn field_map<I, K, V>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
