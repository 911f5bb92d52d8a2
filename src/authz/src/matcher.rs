//! Pattern matching primitives
//!
//! Two flavours are used by the policies:
//!
//! - [`matches`]: the permission-entry wildcard. `"*"` matches anything, every
//!   other pattern is compared for exact equality. No globbing, no prefixes.
//! - [`GlobPattern`]: filename-style globs used by scope permissions
//!   (`*`, `?`, `[a-z]`, `[!x]`, `\` escapes). Separators (`/`) are never
//!   crossed by a wildcard.

use crate::error::{AuthzError, Result};
use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;

/// The universal wildcard token
pub const WILDCARD: &str = "*";

/// Match a permission-entry pattern against a requested value
#[inline]
pub fn matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

/// Compiled filename-style glob
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidInput`] for an unterminated or empty
    /// character class, a bare `-` outside a range, an inverted range or a
    /// trailing escape.
    pub fn new(pattern: &str) -> Result<Self> {
        let source = translate(pattern)?;
        let regex = Regex::new(&source)
            .map_err(|e| AuthzError::InvalidInput(format!("glob '{}': {}", pattern, e)))?;

        Ok(Self { regex })
    }

    /// Whether the whole `name` matches
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// One-shot glob match; an invalid pattern matches nothing
pub fn glob_match(pattern: &str, name: &str) -> bool {
    GlobPattern::new(pattern)
        .map(|glob| glob.is_match(name))
        .unwrap_or(false)
}

/// Translate a glob into an anchored regular expression
fn translate(pattern: &str) -> Result<String> {
    let bad = |reason: &str| AuthzError::InvalidInput(format!("glob '{}': {}", pattern, reason));

    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' => {
                let escaped = chars.next().ok_or_else(|| bad("trailing escape"))?;
                out.push_str(&regex::escape(&escaped.to_string()));
            }
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('!') | Some('^')) {
                    chars.next();
                    out.push_str("^/");
                }

                let mut members = 0usize;
                loop {
                    let lo = match chars.next() {
                        None => return Err(bad("unterminated character class")),
                        Some(']') if members > 0 => break,
                        Some(']') => return Err(bad("empty character class")),
                        Some(c) => class_char(c, &mut chars).map_err(|r| bad(r))?,
                    };

                    if chars.peek() == Some(&'-') {
                        chars.next();
                        let hi = match chars.next() {
                            None => return Err(bad("unterminated character class")),
                            Some(c) => class_char(c, &mut chars).map_err(|r| bad(r))?,
                        };
                        if hi < lo {
                            return Err(bad("inverted character range"));
                        }
                        out.push_str(&regex::escape(&lo.to_string()));
                        out.push('-');
                        out.push_str(&regex::escape(&hi.to_string()));
                    } else {
                        out.push_str(&regex::escape(&lo.to_string()));
                    }
                    members += 1;
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}

/// One class member; a bare `-` or `]` is only valid as `\-` or `\]`
fn class_char(c: char, rest: &mut Peekable<Chars<'_>>) -> std::result::Result<char, &'static str> {
    match c {
        '\\' => rest.next().ok_or("trailing escape"),
        '-' => Err("unescaped '-' in character class"),
        ']' => Err("unterminated character range"),
        other => Ok(other),
    }
}
