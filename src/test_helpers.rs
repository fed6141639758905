//! Shared test utilities.
//!
//! Builders for items and a counting stub filter used across the unit test
//! suites. Kept out of the public API — integration tests build their own
//! fixtures.

use std::cell::Cell;
use std::rc::Rc;

use time::OffsetDateTime;

use crate::filter::{Filter, FilterError, FilterParams};
use crate::item::{Item, KIND_ARTICLE};

/// An article item with a creation time — the minimum most helpers need.
pub fn article(identifier: &str, created: OffsetDateTime) -> Item {
    let mut item = Item::new(identifier, "");
    item.kind = Some(KIND_ARTICLE.to_string());
    item.created_at = Some(created);
    item
}

/// Stub filter that counts invocations of the wrapped transform.
///
/// The counter is shared via `Rc` so tests keep a handle after moving the
/// filter into a decorator.
pub struct CountingFilter {
    transform: Box<dyn Fn(&str) -> String>,
    calls: Rc<Cell<u32>>,
    fail_next: Cell<bool>,
}

impl CountingFilter {
    pub fn new(transform: impl Fn(&str) -> String + 'static) -> Self {
        Self {
            transform: Box::new(transform),
            calls: Rc::new(Cell::new(0)),
            fail_next: Cell::new(false),
        }
    }

    /// Uppercases its input.
    pub fn upper() -> Self {
        Self::new(|content| content.to_uppercase())
    }

    /// Uppercases its input, but the first invocation fails.
    pub fn fail_first() -> Self {
        let filter = Self::upper();
        filter.fail_next.set(true);
        filter
    }

    /// Handle on the invocation counter.
    pub fn calls(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.calls)
    }
}

impl Filter for CountingFilter {
    fn run(&self, content: &str, _params: &FilterParams) -> Result<String, FilterError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_next.replace(false) {
            return Err(FilterError::Exec {
                command: "stub".to_string(),
                status: Some(1),
                stderr: "induced failure".to_string(),
            });
        }
        Ok((self.transform)(content))
    }
}

/// Write an executable stub script and return its path.
#[cfg(unix)]
pub fn stub_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
