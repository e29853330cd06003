//! Line-oriented reading and rewriting of backend config files
//!
//! A setting lives on one "pattern line": the first line whose trimmed start
//! is the key followed by the dialect's separator. Reading decodes that line's
//! value; writing replaces every matching line with a freshly formatted one
//! and leaves all other lines byte-identical, line endings included.
//! A key absent from a non-empty file is never appended.

use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigStore;
use crate::error::{SettingsError, SettingsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `key = value`, with an optional libconfig `;` terminator
    Assignment,
    /// `Option "Key" "value"` inside an Xorg section
    XorgOption,
}

/// Boolean spelling used by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolTokens {
    /// `true` / `false`
    Word,
    /// `1` / `0`
    Digit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Boolean(BoolTokens),
    /// Stored as a fraction with two decimals, surfaced as 0-100
    Percentage,
    /// One word from a fixed vocabulary, written through `template`
    /// (`{}` is replaced by the word)
    Enumerated {
        vocabulary: &'static [&'static str],
        template: &'static str,
    },
    /// Presence of one letter in a composite field. Read-only.
    Flag(char),
    Text,
}

/// How one setting is located and encoded in its file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineKey {
    pub key: &'static str,
    pub dialect: Dialect,
    pub shape: ValueShape,
}

impl LineKey {
    pub const fn new(key: &'static str, dialect: Dialect, shape: ValueShape) -> Self {
        Self { key, dialect, shape }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Bool(bool),
    Percent(u8),
    Word(String),
    Text(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("key '{0}' not present")]
    KeyNotFound(&'static str),
    #[error("value {value:?} does not fit '{key}'")]
    ShapeMismatch { key: &'static str, value: TypedValue },
    #[error("'{0}' is a composite field and cannot be rewritten")]
    ReadOnly(&'static str),
}

/// A matched pattern line split into the parts a rewrite keeps
#[derive(Debug, PartialEq, Eq)]
struct Matched<'l> {
    indent: &'l str,
    value: &'l str,
    terminator: &'l str,
}

fn match_line<'l>(line: &'l str, key: &LineKey) -> Option<Matched<'l>> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    match key.dialect {
        Dialect::Assignment => {
            let rest = trimmed.strip_prefix(key.key)?.trim_start();
            let rest = rest.strip_prefix('=')?.trim();
            let (value, terminator) = match rest.strip_suffix(';') {
                Some(v) => (v.trim_end(), ";"),
                None => (rest, ""),
            };
            Some(Matched { indent, value, terminator })
        }
        Dialect::XorgOption => {
            let rest = trimmed.strip_prefix("Option")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let rest = rest.trim_start().strip_prefix('"')?;
            let rest = rest.strip_prefix(key.key)?.strip_prefix('"')?.trim();
            let value = rest
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(rest);
            Some(Matched { indent, value, terminator: "" })
        }
    }
}

fn format_line(m: &Matched<'_>, key: &LineKey, encoded: &str) -> String {
    match key.dialect {
        Dialect::Assignment => format!("{}{} = {}{}", m.indent, key.key, encoded, m.terminator),
        Dialect::XorgOption => format!("{}Option \"{}\" \"{}\"", m.indent, key.key, encoded),
    }
}

pub fn decode(raw: &str, shape: ValueShape) -> Option<TypedValue> {
    match shape {
        ValueShape::Boolean(BoolTokens::Word) => parse_bool_word(raw).map(TypedValue::Bool),
        ValueShape::Boolean(BoolTokens::Digit) => {
            raw.parse::<i64>().ok().map(|n| TypedValue::Bool(n != 0))
        }
        ValueShape::Percentage => {
            let fraction: f64 = raw.parse().ok()?;
            if !fraction.is_finite() {
                return None;
            }
            let percent = (fraction * 100.0).round().clamp(0.0, 100.0);
            Some(TypedValue::Percent(percent as u8))
        }
        ValueShape::Enumerated { vocabulary, .. } => vocabulary
            .iter()
            .find(|word| raw.split_whitespace().any(|token| token == **word))
            .map(|word| TypedValue::Word(word.to_string())),
        ValueShape::Flag(letter) => Some(TypedValue::Bool(raw.contains(letter))),
        ValueShape::Text => Some(TypedValue::Text(raw.to_string())),
    }
}

fn parse_bool_word(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn encode(key: &LineKey, value: &TypedValue) -> Result<String, EncodeError> {
    let mismatch = || EncodeError::ShapeMismatch {
        key: key.key,
        value: value.clone(),
    };

    match (key.shape, value) {
        (ValueShape::Boolean(BoolTokens::Word), TypedValue::Bool(b)) => {
            Ok(if *b { "true" } else { "false" }.to_string())
        }
        (ValueShape::Boolean(BoolTokens::Digit), TypedValue::Bool(b)) => {
            Ok(if *b { "1" } else { "0" }.to_string())
        }
        (ValueShape::Percentage, TypedValue::Percent(p)) => {
            Ok(format!("{:.2}", f64::from((*p).min(100)) / 100.0))
        }
        (ValueShape::Enumerated { vocabulary, template }, TypedValue::Word(word)) => {
            if vocabulary.contains(&word.as_str()) {
                Ok(template.replace("{}", word))
            } else {
                Err(mismatch())
            }
        }
        (ValueShape::Flag(_), _) => Err(EncodeError::ReadOnly(key.key)),
        (ValueShape::Text, TypedValue::Text(text)) => Ok(text.clone()),
        _ => Err(mismatch()),
    }
}

/// Value of the first pattern line for `key`, if any
pub fn read_value(text: &str, key: &LineKey) -> Option<TypedValue> {
    let matched = text.lines().find_map(|line| match_line(line, key))?;
    decode(matched.value, key.shape)
}

/// Rewrite every pattern line for `key`; all other bytes are kept as-is
pub fn rewrite(text: &str, key: &LineKey, value: &TypedValue) -> Result<String, EncodeError> {
    let encoded = encode(key, value)?;
    let mut out = String::with_capacity(text.len() + encoded.len());
    let mut hits = 0usize;

    for segment in text.split_inclusive('\n') {
        let body = segment.trim_end_matches(['\n', '\r']);
        let ending = &segment[body.len()..];
        match match_line(body, key) {
            Some(m) => {
                hits += 1;
                out.push_str(&format_line(&m, key, &encoded));
                out.push_str(ending);
            }
            None => out.push_str(segment),
        }
    }

    if hits == 0 {
        return Err(EncodeError::KeyNotFound(key.key));
    }
    Ok(out)
}

/// Read `key` from the file at `path`. A missing file, a missing key or an
/// undecodable value all read as `None`.
pub fn read_file(store: &dyn ConfigStore, path: &Path, key: &LineKey) -> Option<TypedValue> {
    match store.read(path) {
        Ok(text) => read_value(&text, key),
        Err(e) => {
            debug!(path = %path.display(), key = key.key, error = %e, "Config not readable");
            None
        }
    }
}

/// Apply one or more rewrites to the file at `path` in a single write.
/// An empty or absent file has no layout to preserve and is written fresh
/// from the updates; otherwise a missing key fails without touching the file.
pub fn write_file(
    store: &dyn ConfigStore,
    path: &Path,
    updates: &[(LineKey, TypedValue)],
) -> SettingsResult<()> {
    let existing = match store.read(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(SettingsError::from_io(path.to_path_buf(), e)),
    };

    let mut text = if existing.trim().is_empty() {
        String::new()
    } else {
        existing
    };
    let fresh = text.is_empty();

    for (key, value) in updates {
        let result = if fresh {
            encode(key, value).map(|encoded| {
                let blank = Matched { indent: "", value: "", terminator: "" };
                text.push_str(&format_line(&blank, key, &encoded));
                text.push('\n');
            })
        } else {
            rewrite(&text, key, value).map(|rewritten| text = rewritten)
        };
        result.map_err(|e| encode_failure(path, e))?;
    }

    store
        .write(path, &text)
        .map_err(|e| SettingsError::from_io(path.to_path_buf(), e))?;
    debug!(path = %path.display(), keys = updates.len(), fresh, "Rewrote config lines");
    Ok(())
}

fn encode_failure(path: &Path, err: EncodeError) -> SettingsError {
    match err {
        EncodeError::KeyNotFound(key) => SettingsError::KeyMissing {
            key: key.to_string(),
            path: path.to_path_buf(),
        },
        EncodeError::ReadOnly(key) => SettingsError::NotSupported {
            setting: key,
            action: "set",
            hint: format!("edit {} manually", path.display()),
        },
        EncodeError::ShapeMismatch { key, value } => SettingsError::InvalidValue {
            setting: key,
            value: format!("{value:?}"),
            expected: "a value matching the setting's type".to_string(),
        },
    }
}
