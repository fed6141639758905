//! AsciiDoc-to-HTML filter shim.
//!
//! Rendering is delegated to the external `asciidoc` binary — the point of
//! this module is process plumbing, not document parsing. Content goes in on
//! stdin, an HTML fragment comes back on stdout (`-s` suppresses the full
//! document wrapper), and any failure surfaces the process's stderr.
//!
//! AsciiDoc's `-s` flag also drops the document title, so a leading
//! `= Title` line is extracted here and prepended to the output as an
//! escaped `<h1>`.
//!
//! Implements [`Filter`], so wrap it in a
//! [`CachedFilter`](crate::cache::CachedFilter) to skip the subprocess for
//! unchanged documents.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use maud::html;
use tracing::debug;

use crate::filter::{Filter, FilterError, FilterParams};

/// Arguments for a fragment render: HTML5 backend, stdout output, stdin input.
const ASCIIDOC_ARGS: &[&str] = &["-s", "-b", "html5", "-o", "-", "-"];

/// Filter that shells out to `asciidoc`.
#[derive(Debug, Clone)]
pub struct AsciiDocFilter {
    command: PathBuf,
}

impl Default for AsciiDocFilter {
    fn default() -> Self {
        Self {
            command: PathBuf::from("asciidoc"),
        }
    }
}

impl AsciiDocFilter {
    /// Filter using `asciidoc` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter using an explicit binary path.
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Filter for AsciiDocFilter {
    /// Render `content` to an HTML fragment. Takes no options.
    fn run(&self, content: &str, _params: &FilterParams) -> Result<String, FilterError> {
        let header = document_title(content)
            .map(|title| html! { h1 { (title) } }.into_string() + "\n");

        let mut child = Command::new(&self.command)
            .args(ASCIIDOC_ARGS)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a scoped thread so a child blocked on a full
        // stdout pipe cannot deadlock against us writing its stdin.
        let mut stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            scope.spawn(|| {
                if let Some(stdin) = stdin.as_mut() {
                    let _ = stdin.write_all(content.as_bytes());
                }
                drop(stdin.take());
            });
            child.wait_with_output()
        })?;

        if !output.status.success() {
            return Err(FilterError::Exec {
                command: self.command.display().to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let body = String::from_utf8(output.stdout)?.replace("\r\n", "\n");
        debug!(bytes = body.len(), "asciidoc render complete");

        match header {
            Some(h) => Ok(h + &body),
            None => Ok(body),
        }
    }
}

/// Extract the document title from a leading `= Title` line.
///
/// The line must start with a single `=`; the title may not itself begin
/// with `=` (that would be a level-2 section). A trailing `=` marker is
/// trimmed, as AsciiDoc allows symmetric title underlining.
pub fn document_title(content: &str) -> Option<&str> {
    let first = content.lines().next()?;
    let rest = first.strip_prefix('=')?;
    let title = rest.trim_start_matches(' ');
    if title.is_empty() || title.starts_with('=') {
        return None;
    }
    Some(title.trim_end_matches(' ').trim_end_matches('=').trim_end_matches(' '))
}
