//! Prompt-injection neutralization for raw query text.
//!
//! Runs before any interpretation stage sees the query. Markup tags and
//! fenced code blocks are neutralized first so that override keywords
//! hidden inside them are still caught by the keyword pass.

use std::sync::LazyLock;

use regex::Regex;

/// Replaces an open or close markup tag.
pub const TAG_PLACEHOLDER: &str = "[markup]";

/// Replaces a fenced code block.
pub const CODE_PLACEHOLDER: &str = "[code]";

/// Replaces an instruction-override keyword.
pub const KEYWORD_PLACEHOLDER: &str = "[filtered]";

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z!/][^<>]*>").expect("valid tag regex"));

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid code fence regex"));

static STRAY_DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```|[<>]").expect("valid delimiter regex"));

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:system|assistant|ignore|instructions?|override)\b")
        .expect("valid keyword regex")
});

/// Query text with injection-prone substrings replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery(String);

impl SanitizedQuery {
    /// The sanitized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the sanitized text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SanitizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Neutralize markup, code fences, and override keywords in `text`.
///
/// Total and deterministic. Running it on its own output changes nothing.
pub fn sanitize(text: &str) -> SanitizedQuery {
    let without_tags = TAG_RE.replace_all(text, TAG_PLACEHOLDER);
    let without_fences = CODE_FENCE_RE.replace_all(&without_tags, CODE_PLACEHOLDER);
    // Unpaired delimiters become spaces, not nothing, so that removing one
    // can never splice two fragments into a keyword.
    let without_delimiters = STRAY_DELIMITER_RE.replace_all(&without_fences, " ");
    let filtered = KEYWORD_RE.replace_all(&without_delimiters, KEYWORD_PLACEHOLDER);
    SanitizedQuery(filtered.into_owned())
}
