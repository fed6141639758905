//! Created/updated timestamps harvested from git history.
//!
//! Filesystem mtimes lie (`git checkout` resets them), and asking authors to
//! hand-maintain dates is worse. Commit history already knows when every
//! source file appeared and when it last changed, so this module shells out
//! to `git log` per content subdirectory and turns the answer into
//! `created_at`/`updated_at` stamps.
//!
//! The log is read with `--name-only --pretty=format:%ci`: each commit
//! contributes a timestamp line followed by the files it touched. Commits
//! arrive newest first, so for any file the first time seen is its last
//! modification and the final time seen is its creation.
//!
//! Explicit timestamps on items are never overwritten — git history is the
//! fallback, not the authority.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::item::{Item, parse_datetime};

/// Sidecar metadata files never count as content edits.
const IGNORED_EXTENSION: &str = "yaml";

#[derive(Error, Debug)]
pub enum GitLogError {
    #[error("failed to run git in {dir}: {source}")]
    Spawn {
        dir: String,
        source: std::io::Error,
    },
    #[error("git log failed in {dir} (exit {status:?}): {stderr}")]
    Exec {
        dir: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("git log output is not UTF-8 in {dir}")]
    Encoding { dir: String },
}

/// Commit times per item identifier, newest first.
#[derive(Debug, Default)]
pub struct GitTimestamps {
    table: HashMap<String, Vec<OffsetDateTime>>,
}

impl GitTimestamps {
    /// Run `git log` under each of `dirs` (relative to `content_root`) and
    /// collect commit times per derived identifier.
    ///
    /// A subdirectory that does not exist is skipped with a warning — sites
    /// are not required to have every conventional directory. A git
    /// invocation that actually fails is an error.
    pub fn harvest(content_root: &Path, dirs: &[&str]) -> Result<Self, GitLogError> {
        let mut stamps = Self::default();
        for dir in dirs {
            let workdir = content_root.join(dir);
            if !workdir.is_dir() {
                warn!(dir = %workdir.display(), "skipping missing content directory");
                continue;
            }

            let output = Command::new("git")
                .args(["--no-pager", "log", "--name-only", "--pretty=format:%ci"])
                .current_dir(&workdir)
                .output()
                .map_err(|source| GitLogError::Spawn {
                    dir: dir.to_string(),
                    source,
                })?;

            if !output.status.success() {
                return Err(GitLogError::Exec {
                    dir: dir.to_string(),
                    status: output.status.code(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                });
            }

            let log = String::from_utf8(output.stdout).map_err(|_| GitLogError::Encoding {
                dir: dir.to_string(),
            })?;
            stamps.ingest(dir, &log);
        }
        Ok(stamps)
    }

    /// Parse one directory's `git log --name-only --pretty=format:%ci`
    /// output into the table. Separated from [`harvest`](Self::harvest) so
    /// parsing is testable without a repository.
    pub fn ingest(&mut self, dir: &str, log: &str) {
        let mut current: Option<OffsetDateTime> = None;
        for line in log.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            // Timestamp lines open a new commit chunk; anything else is a
            // file path belonging to the current chunk.
            if let Ok(time) = parse_datetime(line) {
                current = Some(time);
                continue;
            }
            let Some(time) = current else { continue };
            if line.ends_with(&format!(".{IGNORED_EXTENSION}")) {
                continue;
            }
            self.table
                .entry(identifier_for(dir, line))
                .or_default()
                .push(time);
        }
    }

    /// Commit times recorded for an identifier, newest first.
    pub fn times(&self, identifier: &str) -> Option<&[OffsetDateTime]> {
        self.table.get(identifier).map(Vec::as_slice)
    }

    /// Stamp items: newest commit fills a missing `updated_at`, oldest a
    /// missing `created_at`. Existing values are left alone.
    pub fn apply(&self, items: &mut [Item]) {
        for item in items {
            let Some(times) = self.table.get(&item.identifier) else {
                continue;
            };
            if item.updated_at.is_none() {
                item.updated_at = times.first().copied();
            }
            if item.created_at.is_none() {
                item.created_at = times.last().copied();
            }
        }
    }
}

/// Map a repository-relative file path to a content identifier.
///
/// `2024/widgets.txt` in dir `pages` becomes `/pages/2024/widgets/`; an
/// `index` final component collapses into its parent
/// (`about/index.txt` → `/pages/about/`).
fn identifier_for(dir: &str, file: &str) -> String {
    let stem = match file.rfind('.') {
        Some(dot) => &file[..dot],
        None => file,
    };
    let mut identifier = format!("/{dir}/{stem}/");
    if let Some(prefix) = identifier.strip_suffix("index/") {
        identifier = prefix.to_string();
    }
    identifier
}
