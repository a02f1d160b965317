//! Mask classification and compilation.
//!
//! A raw `mask`/`pattern` attribute is one of:
//!
//! - a regex literal, matched in full,
//! - a character-class allow-list (`a-z`, `0-9`, `[A-Za-z' -]`, ...),
//!   matched permissively so partial input stays valid,
//! - a formatting mask (`(###) ###-####`), matched strictly token by token.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static CLASS_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:a-z|A-Z|a-zA-Z|0-9|a-z0-9|A-Z0-9|a-zA-Z0-9)$")
        .expect("Invalid class spec regex")
});

static BRACKET_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]+\]$").expect("Invalid bracket class regex"));

const MASK_TOKENS: &[char] = &['#', '9', 'N', 'a', 'A', '@', '*', 'X'];
const REGEX_META: &[char] = &['\\', '[', ']', '?', '+'];

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("empty mask")]
    Empty,
    #[error("invalid mask pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How a mask string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    Regex,
    CharClass,
    Format,
}

/// A classified mask with its full-match regex.
#[derive(Debug, Clone)]
pub struct CompiledMask {
    kind: MaskKind,
    source: String,
    regex: Regex,
}

impl CompiledMask {
    pub fn kind(&self) -> MaskKind {
        self.kind
    }

    /// Mask text after dash normalization.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// Formatting masks are shown to the user in pattern messages.
    pub fn display_mask(&self) -> Option<&str> {
        (self.kind == MaskKind::Format).then_some(self.source.as_str())
    }
}

impl fmt::Display for CompiledMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_dash_variant(ch: char) -> bool {
    matches!(
        ch,
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}'
    )
}

/// Replace typographic dashes and minus signs with ASCII `-`.
pub fn normalize_dashes(raw: &str) -> String {
    raw.chars()
        .map(|ch| if is_dash_variant(ch) { '-' } else { ch })
        .collect()
}

fn has_mask_tokens(mask: &str) -> bool {
    mask.contains(MASK_TOKENS)
}

fn has_strong_regex_markers(mask: &str) -> bool {
    mask.starts_with('^')
        || mask.ends_with('$')
        || mask.contains(['{', '}', '|'])
        || mask.contains("(?:")
}

fn is_class_spec(mask: &str) -> bool {
    CLASS_SPEC.is_match(mask) || BRACKET_CLASS.is_match(mask)
}

/// Classify a dash-normalized, trimmed mask.
pub fn classify_mask(mask: &str) -> MaskKind {
    if has_strong_regex_markers(mask) {
        return MaskKind::Regex;
    }
    if is_class_spec(mask) {
        return MaskKind::CharClass;
    }
    // Mask tokens are plain characters once a metacharacter makes it a regex.
    if mask.contains(REGEX_META) && compiles_as_regex(mask) {
        return MaskKind::Regex;
    }
    MaskKind::Format
}

fn compiles_as_regex(mask: &str) -> bool {
    Regex::new(&format!("^(?:{mask})$")).is_ok()
}

/// Classify and compile a raw mask or pattern attribute.
pub fn compile_mask(raw: &str) -> Result<CompiledMask, MaskError> {
    let source = normalize_dashes(raw).trim().to_string();
    if source.is_empty() {
        return Err(MaskError::Empty);
    }
    let kind = classify_mask(&source);
    let pattern = match kind {
        MaskKind::Regex => format!("^(?:{source})$"),
        MaskKind::CharClass => class_pattern(&source),
        MaskKind::Format => format_pattern(&source),
    };
    let regex = Regex::new(&pattern).map_err(|err| MaskError::InvalidPattern {
        pattern: pattern.clone(),
        source: err,
    })?;
    Ok(CompiledMask {
        kind,
        source,
        regex,
    })
}

/// Strict full-match regex for a formatting mask, ignoring classification.
pub fn compile_mask_to_regex(mask: &str) -> Result<Regex, MaskError> {
    let normalized = normalize_dashes(mask);
    let pattern = format_pattern(&normalized);
    Regex::new(&pattern).map_err(|source| MaskError::InvalidPattern { pattern, source })
}

/// Whether a mask would be applied as an input formatting mask.
pub fn is_formatting_mask(raw: &str) -> bool {
    let mask = normalize_dashes(raw);
    let mask = mask.trim();
    !mask.is_empty() && classify_mask(mask) == MaskKind::Format && has_mask_tokens(mask)
}

fn class_pattern(spec: &str) -> String {
    if spec.starts_with('[') {
        return format!("^{spec}*$");
    }
    const CANONICAL: [&str; 7] = [
        "a-z", "A-Z", "a-zA-Z", "0-9", "a-z0-9", "A-Z0-9", "a-zA-Z0-9",
    ];
    if CANONICAL.contains(&spec) {
        format!("^[{spec}]*$")
    } else {
        // Mixed-case spellings such as "A-z" only name a letter class.
        format!("(?i)^[{}]*$", spec.to_ascii_lowercase())
    }
}

fn format_pattern(mask: &str) -> String {
    let mut pattern = String::with_capacity(mask.len() * 4 + 2);
    pattern.push('^');
    for ch in mask.chars() {
        match ch {
            '#' | '9' | 'N' => pattern.push_str(r"\d"),
            'a' | 'A' | '@' => pattern.push_str("[A-Za-z]"),
            '*' | 'X' => pattern.push_str("[A-Za-z0-9]"),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    pattern
}
