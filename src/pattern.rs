//! The find pattern and its replacement.
//!
//! Replacement strings use the `regex` crate syntax: `$1`, `${1}`, `$name`,
//! `${name}`, and `$$` for a literal dollar sign. A `$` that does not start a
//! reference is copied through as-is. References to groups the pattern does
//! not define are rejected up front; left alone they would silently expand to
//! nothing.

use anyhow::{Result, bail};
use regex::Regex;
use std::borrow::Cow;

/// A compiled pattern paired with its replacement and the replace-all policy.
#[derive(Debug, Clone)]
pub struct FindReplace {
    regex: Regex,
    replacement: String,
    replace_all: bool,
}

impl FindReplace {
    /// Fails if `replacement` refers to a capture group `regex` lacks.
    pub fn new(regex: Regex, replacement: impl Into<String>, replace_all: bool) -> Result<Self> {
        let replacement = replacement.into();
        validate_replacement(&regex, &replacement)?;
        Ok(Self {
            regex,
            replacement,
            replace_all,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn replace_all(&self) -> bool {
        self.replace_all
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn count_matches(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    /// Applies the configured policy: every match, or only the first.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.replace(text, self.replace_all)
    }

    /// Replaces every non-overlapping match when `all`, else the first only.
    pub fn replace<'t>(&self, text: &'t str, all: bool) -> Cow<'t, str> {
        if all {
            self.regex.replace_all(text, self.replacement.as_str())
        } else {
            self.regex.replace(text, self.replacement.as_str())
        }
    }
}

/// Checks every group reference in `replacement` against the groups of `regex`.
pub fn validate_replacement(regex: &Regex, replacement: &str) -> Result<()> {
    for name in group_refs(replacement) {
        let known = match name.parse::<usize>() {
            Ok(index) => index < regex.captures_len(),
            Err(_) => regex.capture_names().flatten().any(|n| n == name),
        };
        if !known {
            bail!(
                "Replacement '{}' refers to capture group '{}' which pattern '{}' does not define \
                 (write '$$' for a literal '$')",
                replacement,
                name,
                regex.as_str()
            );
        }
    }
    Ok(())
}

/// Extracts the group names and indices referenced by a replacement string,
/// following the same parsing rules `regex` applies during expansion.
fn group_refs(replacement: &str) -> Vec<&str> {
    let mut refs = Vec::new();
    let mut pos = 0;

    while let Some(offset) = replacement[pos..].find('$') {
        let dollar = pos + offset;
        let rest = &replacement[dollar + 1..];

        if rest.starts_with('$') {
            pos = dollar + 2;
            continue;
        }

        if let Some(braced) = rest.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 => {
                    refs.push(&braced[..end]);
                    pos = dollar + 2 + end + 1;
                }
                _ => pos = dollar + 1,
            }
            continue;
        }

        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if len > 0 {
            refs.push(&rest[..len]);
        }
        pos = dollar + 1 + len;
    }

    refs
}
