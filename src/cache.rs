//! Content-addressed filter cache.
//!
//! Format filters are the slow part of a site build — an external AsciiDoc
//! process per document adds up fast. This module lets a host wrap any
//! [`Filter`] so that re-running it on unchanged input is a single store
//! read instead of a recomputation, across process restarts.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **content-addressed**: the key is a SHA-256 digest of the
//! input bytes plus a canonical serialization of the filter parameters.
//! Nothing about file names, paths, or modification times enters the key,
//! so renames and `git checkout` (which resets mtimes) never invalidate
//! anything — only actual content or parameter changes do.
//!
//! The canonical parameter form is parameter names sorted lexicographically,
//! each rendered as `name=value` and terminated with an ASCII record
//! separator. Two parameter maps that are equal as sets of pairs digest to
//! identical bytes no matter how they were built. A digest collision between
//! logically different inputs is accepted hashing risk, not handled.
//!
//! ## Storage
//!
//! [`CacheStore`] is the injected persistence seam: `get` and `put`, raw
//! bytes, nothing else. [`DirStore`] is the shipped engine — one file per
//! entry under a cache directory, named by the hex digest, written through
//! a temp-file rename so a torn entry is impossible. [`MemoryStore`] backs
//! tests and single-run hosts.
//!
//! Entries are immutable once written: filters are pure, so re-deriving a
//! key re-derives the same bytes and a redundant `put` is idempotent.
//!
//! ## Concurrency
//!
//! There is deliberately no locking around the lookup-compute-store step.
//! Two concurrent misses on the same key both compute; both writes land via
//! atomic rename and carry identical bytes, so the last writer wins without
//! corruption. Hosts that want at-most-once computation can wrap the filter
//! in their own per-key lock — the cache does not impose one.
//!
//! ## Failure policy
//!
//! A store that cannot be opened, read, or written fails the invocation.
//! There is no fallback to uncached execution: a dead cache that silently
//! degrades to recomputing everything is a performance bug nobody files.
//! Failed filter runs are never stored, so the next call retries.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::filter::{Filter, FilterError, FilterParams};

/// Record separator between canonicalized `name=value` pairs.
const PARAM_SEP: u8 = 0x1e;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cache store IO error: {0}")]
    Io(#[from] io::Error),
}

/// Digest uniquely identifying an (input, params) pair.
///
/// Fixed-length SHA-256. Equal inputs and equal parameter maps always
/// produce equal keys; parameter insertion order never affects the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Compute the key for an input and parameter map.
    ///
    /// Digest input: `input ‖ 0x00 ‖ canonical(params)`. The NUL guard keeps
    /// input bytes from bleeding into the parameter region.
    pub fn compute(input: &[u8], params: &FilterParams) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(input);
        hasher.update([0u8]);
        hasher.update(canonical_params(params));
        Self(hasher.finalize().into())
    }

    /// Hex rendering, used as the on-disk entry name.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonical byte serialization of a parameter map.
///
/// `BTreeMap` iteration is already lexicographic by key; each pair is
/// rendered `name=value` and terminated by [`PARAM_SEP`].
fn canonical_params(params: &FilterParams) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in params {
        out.extend_from_slice(name.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value.to_string().as_bytes());
        out.push(PARAM_SEP);
    }
    out
}

/// Persistent mapping from [`CacheKey`] to stored output bytes.
///
/// Implementations choose their own lifetime model — per-call opening or a
/// long-lived handle — the cache logic is the same either way. `put` must
/// be durable by the time it returns.
pub trait CacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &CacheKey, value: &[u8]) -> Result<(), StoreError>;
}

impl<S: CacheStore + ?Sized> CacheStore for &S {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &CacheKey, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }
}

/// Disk-backed store: one digest-named file per entry.
///
/// Writes go to a temp file in the cache directory and are renamed into
/// place, so concurrent writers race benignly and readers never observe a
/// partial entry.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// Failure to create the directory is fatal for the caller — there is
    /// no degraded uncached mode.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.to_hex())
    }
}

impl CacheStore for DirStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, key: &CacheKey, value: &[u8]) -> Result<(), StoreError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        io::Write::write_all(&mut tmp, value)?;
        tmp.persist(self.entry_path(key)).map_err(|err| err.error)?;
        Ok(())
    }
}

/// In-process store for tests and single-run hosts.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &CacheKey, value: &[u8]) -> Result<(), StoreError> {
        self.entries.lock().unwrap().insert(*key, value.to_vec());
        Ok(())
    }
}

/// Memoizing decorator around any [`Filter`].
///
/// Lookup-or-compute-and-store, stateless across calls other than through
/// the injected store. Cache entries are returned UTF-8 decoded; an entry
/// that fails to decode is an error, not a silent recompute.
pub struct CachedFilter<F, S> {
    inner: F,
    store: S,
    hits: AtomicU32,
    misses: AtomicU32,
}

impl<F: Filter, S: CacheStore> CachedFilter<F, S> {
    pub fn new(inner: F, store: S) -> Self {
        Self {
            inner,
            store,
            hits: AtomicU32::new(0),
            misses: AtomicU32::new(0),
        }
    }

    /// Hit/miss counts accumulated since construction.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Unwrap, discarding the store and counters.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: Filter, S: CacheStore> Filter for CachedFilter<F, S> {
    fn run(&self, content: &str, params: &FilterParams) -> Result<String, FilterError> {
        let key = CacheKey::compute(content.as_bytes(), params);

        if let Some(bytes) = self.store.get(&key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "filter cache hit");
            return Ok(String::from_utf8(bytes)?);
        }

        let output = self.inner.run(content, params)?;
        self.store.put(&key, output.as_bytes())?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, bytes = output.len(), "filter cache miss, stored");
        Ok(output)
    }
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} computed ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} computed", self.misses)
        }
    }
}
