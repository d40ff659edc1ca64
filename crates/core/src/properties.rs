//! Flat key-value properties files
//!
//! Reads and writes the `java.util.Properties` text format used by Gradle
//! projects for files such as `key.properties` and `local.properties`:
//!
//! - `#` and `!` start comment lines
//! - keys end at the first unescaped `=`, `:` or whitespace
//! - a line ending in an odd number of backslashes continues on the next line
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded, with
//!   UTF-16 surrogate pairs combined into one character
//!
//! Files are read as UTF-8. When a key appears more than once the last
//! value wins.
//!
//! # Example
//!
//! ```rust
//! use aningcall_core::properties::Properties;
//!
//! let props = Properties::parse("keyAlias = upload\nstoreFile: /keys/release.jks\n").unwrap();
//! assert_eq!(props.get("keyAlias"), Some("upload"));
//! assert_eq!(props.get("storeFile"), Some("/keys/release.jks"));
//! ```

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error as ThisError;

/// A syntax error inside a properties document
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line where the offending logical line starts
    pub line: usize,
    /// What was wrong
    pub message: String,
}

/// Parsed properties, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties from text
    pub fn parse(input: &str) -> std::result::Result<Self, ParseError> {
        let mut props = Self::new();
        for logical in logical_lines(input) {
            let (key, value) = split_entry(&logical.text);
            let key = unescape(key, logical.line)?;
            let value = unescape(value, logical.line)?;
            props.entries.insert(key, value);
        }
        Ok(props)
    }

    /// Parse properties from raw bytes, which must be UTF-8
    pub fn from_utf8(bytes: &[u8]) -> std::result::Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ParseError {
            line: count_line_breaks(&bytes[..e.valid_up_to()]) + 1,
            message: "file is not valid UTF-8".to_string(),
        })?;
        Self::parse(text)
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Render as properties text, escaping keys and values so that
    /// [`Properties::parse`] reads back the same entries
    pub fn to_properties_string(&self, header: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(header) = header {
            for line in header.lines() {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    /// Write to a file
    pub fn store(&self, path: &Path, header: Option<&str>) -> Result<()> {
        std::fs::write(path, self.to_properties_string(header))
            .map_err(|e| Error::from(e).with_context(format!("Writing {}", path.display())))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

struct LogicalLine {
    line: usize,
    text: String,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// Line breaks in `bytes`, with `\r\n` counted once like [`natural_lines`]
fn count_line_breaks(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\r' || (b == b'\n' && (i == 0 || bytes[i - 1] != b'\r')))
        .count()
}

/// Split input into natural lines on `\n`, `\r\n` or a lone `\r`
fn natural_lines(input: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        match rest.find(&['\n', '\r'][..]) {
            Some(idx) => {
                lines.push(&rest[..idx]);
                let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[idx + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Join continuation lines and drop comments and blank lines
fn logical_lines(input: &str) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut current: Option<LogicalLine> = None;

    for (idx, raw) in natural_lines(input).into_iter().enumerate() {
        let trimmed = raw.trim_start_matches(is_blank);

        let mut logical = match current.take() {
            Some(open) => open,
            None => {
                if trimmed.is_empty() || trimmed.starts_with(&['#', '!'][..]) {
                    continue;
                }
                LogicalLine {
                    line: idx + 1,
                    text: String::new(),
                }
            }
        };

        let trailing = trimmed.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            logical.text.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some(logical);
        } else {
            logical.text.push_str(trimmed);
            out.push(logical);
        }
    }

    // A continuation at end of input still yields its line
    if let Some(open) = current {
        out.push(open);
    }

    out
}

/// Split a logical line into its raw (still escaped) key and value
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut has_sep = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                has_sep = true;
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
    if has_sep {
        rest = &rest[1..];
    }
    rest = rest.trim_start_matches(is_blank);
    if !has_sep && rest.starts_with(&['=', ':'][..]) {
        rest = rest[1..].trim_start_matches(is_blank);
    }
    (key, rest)
}

/// Decode backslash escapes
fn unescape(raw: &str, line: usize) -> std::result::Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let unit = code_unit(&mut chars, line)?;
                let decoded = if (0xD800..=0xDBFF).contains(&unit) {
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => code_unit(&mut chars, line)?,
                        _ => return Err(unpaired_surrogate(unit, line)),
                    };
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(unpaired_surrogate(unit, line));
                    }
                    char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
                } else {
                    char::from_u32(unit)
                };
                match decoded {
                    Some(ch) => out.push(ch),
                    None => return Err(unpaired_surrogate(unit, line)),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Read the four hex digits of a `\uXXXX` escape
fn code_unit(chars: &mut std::str::Chars<'_>, line: usize) -> std::result::Result<u32, ParseError> {
    let hex: String = chars.by_ref().take(4).collect();
    let valid = hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit());
    valid
        .then(|| u32::from_str_radix(&hex, 16).ok())
        .flatten()
        .ok_or_else(|| ParseError {
            line,
            message: format!("malformed \\uXXXX escape: \\u{}", hex),
        })
}

fn unpaired_surrogate(unit: u32, line: usize) -> ParseError {
    ParseError {
        line,
        message: format!("unpaired surrogate in escape \\u{:04X}", unit),
    }
}

/// Encode a key or value so it parses back unchanged
fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_separators() {
        let props = Properties::parse("a=1\nb:2\nc 3\nd = 4\ne   :  5\nf\t=\t6\n").unwrap();

        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some("4"));
        assert_eq!(props.get("e"), Some("5"));
        assert_eq!(props.get("f"), Some("6"));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let input = "# comment\n! also a comment\n\n   \n  # indented comment\nkey=value\n";
        let props = Properties::parse(input).unwrap();

        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn test_parse_value_keeps_inner_and_trailing_text() {
        let props = Properties::parse("storeFile=/keys/my release.jks  \npath=a=b:c\n").unwrap();

        assert_eq!(props.get("storeFile"), Some("/keys/my release.jks  "));
        assert_eq!(props.get("path"), Some("a=b:c"));
    }

    #[test]
    fn test_parse_key_without_value() {
        let props = Properties::parse("emptyKey\nother=\n").unwrap();

        assert_eq!(props.get("emptyKey"), Some(""));
        assert_eq!(props.get("other"), Some(""));
    }

    #[test]
    fn test_parse_continuation_lines() {
        let input = "fruits = apple, banana, \\\n         pear\nnext=1\n";
        let props = Properties::parse(input).unwrap();

        assert_eq!(props.get("fruits"), Some("apple, banana, pear"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_parse_even_backslashes_do_not_continue() {
        let props = Properties::parse("dir=C:\\\\\nnext=1\n").unwrap();

        assert_eq!(props.get("dir"), Some("C:\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_parse_continuation_at_end_of_input() {
        let props = Properties::parse("key=value\\").unwrap();
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn test_parse_escapes() {
        let props = Properties::parse("my\\ key=tab\\there\nuni=\\u00e9t\\u00E9\nliteral=\\q\n").unwrap();

        assert_eq!(props.get("my key"), Some("tab\there"));
        assert_eq!(props.get("uni"), Some("été"));
        assert_eq!(props.get("literal"), Some("q"));
    }

    #[test]
    fn test_parse_escaped_separator_in_key() {
        let props = Properties::parse("a\\=b=c\n").unwrap();
        assert_eq!(props.get("a=b"), Some("c"));
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let props = Properties::parse("a=1\r\nb=2\rc=3").unwrap();

        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
    }

    #[test]
    fn test_parse_duplicate_key_last_wins() {
        let props = Properties::parse("keyAlias=first\nkeyAlias=second\n").unwrap();

        assert_eq!(props.len(), 1);
        assert_eq!(props.get("keyAlias"), Some("second"));
    }

    #[test]
    fn test_parse_malformed_unicode_escape_reports_line() {
        let err = Properties::parse("ok=1\n\nbad=\\u12G4\n").unwrap_err();

        assert_eq!(err.line, 3);
        assert!(err.message.contains("\\uXXXX"));
    }

    #[test]
    fn test_parse_truncated_unicode_escape() {
        let err = Properties::parse("bad=\\u12").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_parse_surrogate_pair_escape() {
        let props = Properties::parse("storePassword=p\\uD83D\\uDE00w\nlower=\\ud83d\\ude00\n").unwrap();

        assert_eq!(props.get("storePassword"), Some("p\u{1F600}w"));
        assert_eq!(props.get("lower"), Some("\u{1F600}"));
    }

    #[test]
    fn test_parse_rejects_unpaired_surrogates() {
        for input in [
            "a=\\uD83D\n",
            "a=\\uD83Dx\n",
            "a=\\uD83D\\u0041\n",
            "a=\\uDE00\\uD83D\n",
            "a=\\uDE00\n",
        ] {
            let err = Properties::parse(input).unwrap_err();
            assert_eq!(err.line, 1, "{input}");
            assert!(err.message.contains("surrogate"), "{input}: {}", err.message);
        }
    }

    #[test]
    fn test_parse_rejects_signed_unicode_escape() {
        let err = Properties::parse("a=\\u+123\n").unwrap_err();
        assert!(err.message.contains("\\uXXXX"));
    }

    #[test]
    fn test_from_utf8_reports_line_of_invalid_byte() {
        let err = Properties::from_utf8(b"a=1\nb=\xff\xfe\n").unwrap_err();
        assert_eq!(err.line, 2);

        let err = Properties::from_utf8(b"a=1\rb=2\rc=\xff\n").unwrap_err();
        assert_eq!(err.line, 3);

        let err = Properties::from_utf8(b"a=1\r\nb=\xff\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_store_writes_header_and_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.properties");
        let props: Properties = [("keyAlias", "upload"), ("storeFile", " /odd path")]
            .into_iter()
            .collect();

        props.store(&path, Some("Release signing")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("# Release signing\n"));
        assert!(text.contains("keyAlias=upload\n"));
        assert!(text.contains("storeFile=\\ /odd path\n"));
    }

    proptest! {
        #[test]
        fn prop_rendered_properties_parse_back(
            entries in proptest::collection::btree_map(
                r"[a-zA-Z0-9 =:#!._\\\té-]{1,12}",
                r"[a-zA-Z0-9 =:#!._/\\\té-]{0,24}",
                0..8,
            )
        ) {
            let props: Properties = entries.clone().into_iter().collect();
            let reparsed = Properties::parse(&props.to_properties_string(None)).unwrap();
            prop_assert_eq!(reparsed, props);
        }
    }
}
