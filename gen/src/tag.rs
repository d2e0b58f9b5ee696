//! Field tag parsing.
//!
//! A tag is the string carried by a field's `#[db(...)]` attribute. It holds
//! space-separated `key:"value"` pairs, for example
//! `sql:"id" key:"true" table:"users"`. Only `sql`, `table`, `key`, `audit`
//! and `update` mean anything to the generator; every other key is ignored.
//!
//! # Examples
//!
//! ```
//! use dbobj_gen::{AuditRole, FieldTag};
//!
//! let tag = FieldTag::parse(r#"sql:"modified" audit:"time" update:"false""#);
//! assert_eq!(tag.sql_column.as_deref(), Some("modified"));
//! assert_eq!(tag.audit, AuditRole::Time);
//! assert!(!tag.updatable);
//! ```

/// Role a field plays in the audit-apply method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditRole {
    #[default]
    None,
    /// Receives the modifying user id.
    User,
    /// Receives the modification timestamp.
    Time,
}

/// Metadata extracted from one field's tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTag {
    /// Column name; a field without one is not persisted.
    pub sql_column: Option<String>,
    /// Field maps to the primary key column.
    pub is_key: bool,
    /// Table name for the whole type.
    pub table: Option<String>,
    pub audit: AuditRole,
    /// False only when `update` is an explicit, well-formed false.
    pub updatable: bool,
}

impl Default for FieldTag {
    fn default() -> Self {
        Self {
            sql_column: None,
            is_key: false,
            table: None,
            audit: AuditRole::None,
            updatable: true,
        }
    }
}

impl FieldTag {
    /// Parses a raw tag string.
    ///
    /// Never fails: malformed input simply yields fewer recognized keys.
    pub fn parse(raw: &str) -> Self {
        let non_empty = |value: String| (!value.is_empty()).then_some(value);

        let audit = match lookup(raw, "audit").as_deref() {
            Some("user") => AuditRole::User,
            Some("time") => AuditRole::Time,
            _ => AuditRole::None,
        };
        let updatable = !matches!(
            lookup(raw, "update").as_deref().and_then(parse_bool),
            Some(false)
        );

        Self {
            sql_column: lookup(raw, "sql").and_then(non_empty),
            is_key: lookup(raw, "key").is_some_and(|value| !value.is_empty()),
            table: lookup(raw, "table").and_then(non_empty),
            audit,
            updatable,
        }
    }

    /// Returns `true` when the field maps to a column.
    pub fn is_persisted(&self) -> bool {
        self.sql_column.is_some()
    }
}

/// Returns the value stored under `key` in a tag string.
///
/// Scanning stops at the first malformed pair, so keys after a syntax error
/// are never found. When a key repeats, the first occurrence wins.
pub fn lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
            .unwrap_or(rest.len());
        if name_len == 0 {
            return None;
        }
        let (name, after) = rest.split_at(name_len);
        let after = after.strip_prefix(":\"")?;
        let (body, remainder) = split_quoted(after)?;

        if name == key {
            return unquote(body);
        }
        rest = remainder;
    }
}

/// Splits `s` (positioned just after an opening quote) at its closing quote.
fn split_quoted(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some((&s[..i], &s[i + 1..])),
            _ => i += 1,
        }
    }
    None
}

/// Decodes the escapes of a double-quoted value body.
fn unquote(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\n' {
            return None;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            '\\' => '\\',
            '"' => '"',
            'x' => {
                let value = hex_digits(&mut chars, 2)?;
                // Bytes above ASCII would not form valid UTF-8 on their own.
                if value > 0x7f {
                    return None;
                }
                char::from_u32(value)?
            }
            'u' => char::from_u32(hex_digits(&mut chars, 4)?)?,
            'U' => char::from_u32(hex_digits(&mut chars, 8)?)?,
            first @ '0'..='7' => {
                let mut value = first.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                if value > 0x7f {
                    return None;
                }
                char::from_u32(value)?
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

/// Parses the boolean spellings accepted by the `update` key.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
