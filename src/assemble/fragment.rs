//! Fragment parsing
//!
//! A fragment is one source file contributing to the assembled module.
//! Its prologue can carry up to three metadata regions ahead of the body:
//! `#Requires` declarations, `using namespace` imports, and a `param(...)`
//! block (present only to host suppression attributes). The body is
//! everything after the furthest region end, trimmed.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// A parsed source fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// `#Requires ...` declarations, trimmed, in source order
    pub requirements: Vec<String>,

    /// `using namespace ...` declarations, trimmed, in source order
    pub usings: Vec<String>,

    /// Fragment body with prologue regions stripped
    pub body: String,
}

impl Fragment {
    /// Reads and parses a fragment file
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fragment: {}", path.display()))?;

        Ok(Self::parse(&text))
    }

    /// Parses fragment text into prologue metadata and body.
    ///
    /// A fragment with no recognizable prologue contributes its entire
    /// text as body.
    pub fn parse(text: &str) -> Self {
        let mut requirements = Vec::new();
        let mut usings = Vec::new();
        let mut prologue_end = 0;

        let mut offset = 0;
        while offset < text.len() {
            let line_end = text[offset..]
                .find('\n')
                .map(|i| offset + i + 1)
                .unwrap_or(text.len());
            let trimmed = text[offset..line_end].trim();

            if trimmed.is_empty() {
                offset = line_end;
                continue;
            }

            if let Some(rest) = strip_keyword(trimmed, "#Requires") {
                if rest.starts_with(char::is_whitespace) {
                    requirements.push(trimmed.to_string());
                    prologue_end = line_end;
                    offset = line_end;
                    continue;
                }
            }

            if let Some(rest) = strip_keyword(trimmed, "using namespace") {
                if rest.starts_with(char::is_whitespace) || rest.is_empty() {
                    usings.push(trimmed.to_string());
                    prologue_end = line_end;
                    offset = line_end;
                    continue;
                }
            }

            // Attribute lines prefix the param block; the block itself
            // ends at its balanced closing paren.
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                offset = line_end;
                continue;
            }
            if let Some(rest) = strip_keyword(trimmed, "param") {
                if rest.is_empty() || rest.starts_with('(') || rest.starts_with(char::is_whitespace)
                {
                    if let Some(end) = balanced_block_end(text, offset) {
                        prologue_end = end;
                        offset = end;
                        continue;
                    }
                }
            }

            break;
        }

        Self {
            requirements,
            usings,
            body: text[prologue_end..].trim().to_string(),
        }
    }
}

/// Case-insensitive keyword match at the start of a line; returns the
/// remainder on a hit. A multibyte character straddling the keyword
/// length is not a match, not a slicing panic.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    if line.len() >= keyword.len()
        && line.is_char_boundary(keyword.len())
        && line[..keyword.len()].eq_ignore_ascii_case(keyword)
    {
        Some(&line[keyword.len()..])
    } else {
        None
    }
}

/// Finds the end offset (exclusive) of a parenthesized block starting on
/// the line at `start`. Parens inside quoted strings do not count.
fn balanced_block_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_quote: Option<u8> = None;
    let mut seen_open = false;

    for i in start..bytes.len() {
        let c = bytes[i];
        match in_quote {
            Some(q) => {
                if c == q {
                    in_quote = None;
                }
            }
            None => match c {
                b'\'' | b'"' => in_quote = Some(c),
                b'(' => {
                    depth += 1;
                    seen_open = true;
                }
                b')' => {
                    depth = depth.checked_sub(1)?;
                    if seen_open && depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            },
        }
    }

    None
}
