//! Java-properties text codec.
//!
//! Both the admin extras bundle and the NFC payload body use the format a
//! provisioning receiver reads back with `java.util.Properties.load`:
//! `#` comment lines, then one escaped `key=value` line per entry.

use crate::error::{ProvisioningError, ProvisioningResult};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Character handling when storing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// Keep non-ASCII characters as they are (text destinations).
    Text,
    /// Escape everything outside printable ASCII as `\uXXXX` (byte
    /// destinations read back as ISO-8859-1).
    Ascii,
}

/// An ordered set of string properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }

    /// Serialize with a header comment and the current local time.
    pub fn store(&self, comment: Option<&str>, escaping: Escaping) -> String {
        self.store_at(comment, escaping, Local::now())
    }

    /// Serialize with a header comment and an explicit timestamp line.
    pub fn store_at(
        &self,
        comment: Option<&str>,
        escaping: Escaping,
        at: DateTime<Local>,
    ) -> String {
        let mut out = String::new();
        if let Some(comment) = comment {
            write_comment(&mut out, comment);
        }
        out.push('#');
        out.push_str(&at.format("%a %b %d %H:%M:%S %Z %Y").to_string());
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true, escaping));
            out.push('=');
            out.push_str(&escape(value, false, escaping));
            out.push('\n');
        }
        out
    }

    /// Parse properties text.
    pub fn load(text: &str) -> ProvisioningResult<Self> {
        let mut props = Self::new();
        for (line_no, line) in logical_lines(text) {
            let (raw_key, raw_value) = split_key_value(&line);
            let key = unescape(raw_key, line_no)?;
            let value = unescape(raw_value, line_no)?;
            props.entries.insert(key, value);
        }
        Ok(props)
    }

    /// Parse properties from bytes, reading them as ISO-8859-1.
    pub fn load_latin1(bytes: &[u8]) -> ProvisioningResult<Self> {
        let text: String = bytes.iter().map(|&b| b as char).collect();
        Self::load(&text)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn write_comment(out: &mut String, comment: &str) {
    out.push('#');
    let mut chars = comment.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
                // Continuation lines must stay comments.
                if !matches!(chars.peek(), Some('#') | Some('!')) {
                    out.push('#');
                }
            }
            c if (c as u32) > 0xff => push_unicode_escape(out, c),
            c => out.push(c),
        }
    }
    out.push('\n');
}

fn push_unicode_escape(out: &mut String, c: char) {
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        let _ = write!(out, "\\u{:04X}", unit);
    }
}

fn escape(s: &str, is_key: bool, escaping: Escaping) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' if i == 0 || is_key => out.push_str("\\ "),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if escaping == Escaping::Ascii && (c < ' ' || c > '~') => {
                push_unicode_escape(&mut out, c)
            }
            c => out.push(c),
        }
    }
    out
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Split text into logical lines, joining backslash continuations and
/// dropping blank and comment lines. Yields the 1-based physical line number
/// where each logical line starts.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, physical) in text.lines().enumerate() {
        let trimmed = physical.trim_start_matches(is_blank);
        let (start, mut logical) = match current.take() {
            Some(pending) => pending,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        let trailing = trimmed.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some((start, logical));
        } else {
            logical.push_str(trimmed);
            lines.push((start, logical));
        }
    }

    if let Some(pending) = current {
        lines.push(pending);
    }
    lines
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut separator = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];
    if separator {
        rest = &rest[1..];
    }
    rest = rest.trim_start_matches(is_blank);
    if !separator && let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> ProvisioningResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut pending_high: Option<u16> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        match next {
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = u16::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .ok_or_else(|| ProvisioningError::Properties {
                        line,
                        reason: format!("malformed \\uXXXX escape '\\u{}'", hex),
                    })?;
                match unit {
                    0xD800..=0xDBFF => {
                        flush_surrogate(&mut out, &mut pending_high);
                        pending_high = Some(unit);
                    }
                    0xDC00..=0xDFFF => match pending_high.take() {
                        Some(high) => {
                            out.extend(char::decode_utf16([high, unit]).map(|r| {
                                r.unwrap_or(char::REPLACEMENT_CHARACTER)
                            }));
                        }
                        None => out.push(char::REPLACEMENT_CHARACTER),
                    },
                    _ => {
                        flush_surrogate(&mut out, &mut pending_high);
                        out.push(char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                }
            }
            other => {
                flush_surrogate(&mut out, &mut pending_high);
                out.push(match other {
                    't' => '\t',
                    'n' => '\n',
                    'r' => '\r',
                    'f' => '\x0c',
                    c => c,
                });
            }
        }
    }
    flush_surrogate(&mut out, &mut pending_high);
    Ok(out)
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u16>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}
