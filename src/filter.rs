//! The filter seam between the host framework and stampa's helpers.
//!
//! A filter is a deterministic text transformation: content in, transformed
//! content out. The host framework owns when filters run and what they run
//! on; stampa owns how individual filters behave and how their results are
//! memoized ([`crate::cache::CachedFilter`]).
//!
//! Parameters distinguish invocation configurations that must not share a
//! cache entry. They are an ordered map only incidentally — [`FilterParams`]
//! is a `BTreeMap` so iteration order is the canonical sorted order, and two
//! maps built in different insertion orders are indistinguishable.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::cache::StoreError;

/// Options passed to a filter invocation, keyed by option name.
///
/// Equal maps produce equal cache keys regardless of how they were built;
/// see [`crate::cache::CacheKey`].
pub type FilterParams = BTreeMap<String, ParamValue>;

/// A scalar filter option value.
///
/// Filters take simple switches and knobs, not structured data. The textual
/// rendering (`Display`) is stable and is what the cache key canonicalizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("filter produced invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("`{command}` failed (exit {status:?}): {stderr}")]
    Exec {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),
}

/// A deterministic content transformation.
///
/// Implementations must be pure functions of `(content, params)`: the
/// caching layer assumes that re-running a filter on identical input yields
/// identical output. Failures propagate to the host untouched — no filter
/// in this crate retries or degrades.
pub trait Filter {
    fn run(&self, content: &str, params: &FilterParams) -> Result<String, FilterError>;
}

/// Convenience constructor for literal parameter maps.
///
/// ```
/// use stampa::filter::{params, ParamValue};
///
/// let p = params([("toc", ParamValue::Bool(true)), ("level", ParamValue::Int(2))]);
/// assert_eq!(p.len(), 2);
/// ```
pub fn params<I, K>(pairs: I) -> FilterParams
where
    I: IntoIterator<Item = (K, ParamValue)>,
    K: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v))
        .collect()
}
