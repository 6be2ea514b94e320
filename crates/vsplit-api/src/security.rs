//! Security utilities for input validation and sanitization.
//!
//! This module provides:
//! - Upload filename sanitization
//! - Extension checks against the accepted video formats
//! - Path traversal checks for download requests

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use vsplit_models::encoding::{is_allowed_extension, ALLOWED_EXTENSIONS};

/// Maximum sanitized filename length.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Characters that survive sanitization.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename regex"));

/// Reserved device names on Windows filesystems.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// Reduce a client-supplied filename to a safe ASCII form.
///
/// Path separators become spaces, whitespace runs collapse to `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are
/// stripped. Returns an empty string when nothing usable remains.
pub fn secure_filename(name: &str) -> String {
    let flattened: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let mut result: String = cleaned
        .trim_matches(|c| c == '.' || c == '_')
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .collect();

    let stem = result.split('.').next().unwrap_or_default().to_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        result.insert(0, '_');
    }

    result
}

/// Split a filename into `(base, extension)` at the last dot.
///
/// The extension is returned without the dot; `None` when there is none.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, Some(ext)),
        _ => (filename, None),
    }
}

/// Whether a client filename carries an accepted video extension.
pub fn has_allowed_extension(filename: &str) -> bool {
    split_extension(filename)
        .1
        .map(is_allowed_extension)
        .unwrap_or(false)
}

/// Message returned when an upload has an unsupported extension.
pub fn invalid_extension_message() -> String {
    format!("Invalid file type. Allowed: {}", ALLOWED_EXTENSIONS.join(", "))
}

/// Whether `path` stays inside the directory it is joined to.
///
/// Only plain name components are accepted: no `..`, no root, no prefix.
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.contains('\0') {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}
