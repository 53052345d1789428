//! Post-build pass that keeps a single canonical favicon link in generated HTML.
//!
//! `claat export` rewrites `<head>` on every run, dropping any icon the site
//! relies on. The pass restores it without caring how the tag was written
//! before, and running it again over its own output changes nothing.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

pub const FAVICON_TAG: &str =
    r#"<link rel="icon" href="/assets/favicon.svg?v=2" type="image/svg+xml">"#;

static ICON_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\b[^>]*\brel\s*=\s*["']icon["'][^>]*>"#)
        .expect("Invalid icon link regex")
});

static TITLE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</title\s*>").expect("Invalid title regex"));

static HEAD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("Invalid head regex"));

/// What [`normalize_html`] did to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaviconEdit {
    /// An existing icon link was swapped for the canonical tag.
    Replaced,
    InsertedAfterTitle,
    InsertedAfterHead,
    /// No `<title>` or `<head>` anchor; the tag was put at the very start.
    Prepended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Missing,
    Unchanged(FaviconEdit),
    Updated(FaviconEdit),
}

/// Returns `html` with exactly the canonical favicon tag in place.
pub fn normalize_html(html: &str) -> (String, FaviconEdit) {
    if let Some(found) = ICON_LINK_RE.find(html) {
        let mut out = String::with_capacity(html.len() + FAVICON_TAG.len());
        out.push_str(&html[..found.start()]);
        out.push_str(FAVICON_TAG);
        out.push_str(&html[found.end()..]);
        return (out, FaviconEdit::Replaced);
    }

    if let Some(found) = TITLE_CLOSE_RE.find(html) {
        return (insert_after(html, found.end()), FaviconEdit::InsertedAfterTitle);
    }

    if let Some(found) = HEAD_OPEN_RE.find(html) {
        return (insert_after(html, found.end()), FaviconEdit::InsertedAfterHead);
    }

    (format!("  {FAVICON_TAG}\n{html}"), FaviconEdit::Prepended)
}

// Anchors followed by a newline get the tag on its own indented line.
fn insert_after(html: &str, pos: usize) -> String {
    let (head, tail) = html.split_at(pos);
    match tail.strip_prefix('\n') {
        Some(rest) => format!("{head}\n  {FAVICON_TAG}\n{rest}"),
        None => format!("{head}{FAVICON_TAG}{tail}"),
    }
}

/// Normalizes one file in place. Missing files are not an error.
pub fn ensure_favicon(path: &Path) -> anyhow::Result<FileOutcome> {
    let html = match std::fs::read_to_string(path) {
        Ok(html) => html,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(FileOutcome::Missing),
        Err(err) => return Err(err).with_context(|| format!("read html: {}", path.display())),
    };

    let (normalized, edit) = normalize_html(&html);
    if normalized == html {
        return Ok(FileOutcome::Unchanged(edit));
    }

    std::fs::write(path, normalized).with_context(|| format!("write html: {}", path.display()))?;
    Ok(FileOutcome::Updated(edit))
}

pub fn normalize_files(paths: &[PathBuf]) -> anyhow::Result<Vec<(PathBuf, FileOutcome)>> {
    let mut outcomes = Vec::with_capacity(paths.len());
    for path in paths {
        let outcome = ensure_favicon(path)?;
        match outcome {
            FileOutcome::Missing => {
                tracing::debug!(path = %path.display(), "favicon target missing; skipped");
            }
            FileOutcome::Unchanged(_) | FileOutcome::Updated(_) => {
                tracing::info!(path = %path.display(), ?outcome, "ensured favicon");
            }
        }
        outcomes.push((path.clone(), outcome));
    }
    Ok(outcomes)
}
