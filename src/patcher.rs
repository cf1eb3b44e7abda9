// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Survey page patcher.
//!
//! The survey page embeds one JavaScript object literal,
//! `const descriptionsDatabase = { ... };`, mapping item keys to
//! description strings. Approving a change rewrites exactly one entry
//! inside that literal; every byte outside the literal's span is
//! preserved as-is.
//!
//! Keys and values are escaped for double-quoted JS strings before they
//! are spliced in. An unescaped quote would break out of the entry and
//! corrupt the page, so this is a correctness requirement rather than
//! cosmetics.

use thiserror::Error;

/// Declaration that opens the embedded literal.
const DB_DECL: &str = "const descriptionsDatabase";

/// Terminator of the embedded literal.
const DB_CLOSE: &str = "};";

/// Indentation used for entries written by the patcher, matching the
/// literal's hand-written entries.
const ENTRY_INDENT: &str = "      ";

/// Patcher error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("descriptions database declaration not found")]
    MarkerNotFound,

    #[error("descriptions database is not terminated")]
    UnterminatedLiteral,
}

/// Replace or insert one `key: value` entry inside the embedded literal.
///
/// Returns the full rewritten document. If `key` already has an entry
/// its value is replaced in place; otherwise a new entry is appended
/// just before the literal's closing boundary, keeping the literal
/// valid when re-parsed.
pub fn patch(document: &str, key: &str, value: &str) -> Result<String, PatchError> {
    let (body_start, body_end) = locate_literal(document)?;
    let body = &document[body_start..body_end];

    let key = escape_js_string(key);
    let value = escape_js_string(value);
    let entry = format!("\n{ENTRY_INDENT}\"{key}\": \"{value}\",");

    let new_body = match find_entry(body, &key) {
        Some((entry_start, entry_end)) => {
            format!("{}{}{}", &body[..entry_start], entry, &body[entry_end..])
        }
        None => format!("{}{}\n", body.trim_end(), entry),
    };

    let mut out = String::with_capacity(document.len() + new_body.len());
    out.push_str(&document[..body_start]);
    out.push_str(&new_body);
    out.push_str(&document[body_end..]);
    Ok(out)
}

/// Derive the database key for a proposal.
///
/// A non-empty proposed name wins, with runs of whitespace collapsed to
/// single underscores; otherwise the filename with its final extension
/// stripped. Must stay in lockstep with the lookup normalization in the
/// survey page's reader script.
pub fn derive_key(new_name: &str, filename: &str) -> String {
    let trimmed = new_name.trim();
    if trimmed.is_empty() {
        strip_extension(filename).to_string()
    } else {
        trimmed.split_whitespace().collect::<Vec<_>>().join("_")
    }
}

/// Locate the literal's body: the span between the declaration's `{`
/// and its closing `};`.
fn locate_literal(document: &str) -> Result<(usize, usize), PatchError> {
    let decl = document.find(DB_DECL).ok_or(PatchError::MarkerNotFound)?;
    let after_decl = decl + DB_DECL.len();

    let open = document[after_decl..]
        .find('{')
        .map(|rel| after_decl + rel)
        .ok_or(PatchError::MarkerNotFound)?;

    // Only `=` and whitespace may sit between the declaration and `{`
    if document[after_decl..open].trim() != "=" {
        return Err(PatchError::MarkerNotFound);
    }

    let body_start = open + 1;
    let body_end = document[body_start..]
        .find(DB_CLOSE)
        .map(|rel| body_start + rel)
        .ok_or(PatchError::UnterminatedLiteral)?;

    Ok((body_start, body_end))
}

/// Find an existing `"key": "value",` entry in the literal body.
///
/// Returns the span to replace, including the entry's leading newline
/// and trailing comma. The key must be the first token on its line.
fn find_entry(body: &str, escaped_key: &str) -> Option<(usize, usize)> {
    let needle = format!("\"{escaped_key}\"");
    let mut from = 0;

    while let Some(rel) = body[from..].find(&needle) {
        let at = from + rel;
        let line_start = body[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);

        if body[line_start..at].chars().all(char::is_whitespace) {
            if let Some(end) = entry_end(body, at + needle.len()) {
                let start = line_start.saturating_sub(1);
                return Some((start, end));
            }
        }
        from = at + needle.len();
    }
    None
}

/// Scan past `: "value"` and an optional trailing comma, honoring
/// backslash escapes inside the value. Returns the end offset, or None
/// if what follows the key is not a string entry.
fn entry_end(body: &str, mut i: usize) -> Option<usize> {
    let bytes = body.as_bytes();

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b':') {
        return None;
    }
    i += 1;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b'"') {
        return None;
    }
    i += 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => break,
            _ => i += 1,
        }
    }
    if i >= bytes.len() {
        return None;
    }
    i += 1; // closing quote

    let mut end = i;
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }
    if bytes.get(end) == Some(&b',') {
        end += 1;
    }
    Some(end)
}

/// Escape for a double-quoted JS string literal.
fn escape_js_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => &filename[..idx],
        _ => filename,
    }
}
