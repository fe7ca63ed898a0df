use std::sync::LazyLock;

use regex::{Regex, RegexSet, RegexSetBuilder};

/// Technical debris left behind by page-builder tooling, embedded form
/// configs, builder marketing copy and raw comment syntax. Matched
/// case-insensitively anywhere in the text.
pub const DEBRIS_PATTERNS: &[&str] = &[
    r"nominify\s+(begin|end)",
    r"Content Oriented Web",
    r"Make great presentations",
    r"longreads.+landing pages",
    r"photo stories.+blogs",
    r"forms\.js",
    r"popup\.js",
    r"https?://postnikovmd\.com",
    r"header\s*/header\s*footer\s*/footer",
    r"googleoff:.+googleon:",
    r"/noindex\s+noindex/",
    r"<!--.+-->",
    r#"\{"lid":.+"li_nm""#,
    r"\[\{.+li_type.+\}\]",
];

const MIN_CHARS: usize = 3;

static DIGITS_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s\p{P}]+$").unwrap());
// "div class container", "header /header": class-name residue read as text
static CLASS_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]+(?:\s+[a-z/]+){1,2}\s*$").unwrap());

static DEFAULT_CLASSIFIER: LazyLock<NoiseClassifier> =
    LazyLock::new(|| NoiseClassifier::new(DEBRIS_PATTERNS).unwrap());

#[derive(Debug, Clone)]
pub struct NoiseClassifier {
    debris: RegexSet,
}

impl NoiseClassifier {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let debris = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()?;
        Ok(NoiseClassifier { debris })
    }

    /// The built-in debris table, compiled once per process.
    pub fn builtin() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }

    /// Built-in debris table plus caller-supplied patterns.
    pub fn with_extra(extra: &[String]) -> Result<Self, regex::Error> {
        if extra.is_empty() {
            return Ok(Self::builtin());
        }
        Self::new(
            DEBRIS_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .chain(extra.iter().cloned()),
        )
    }

    /// First matching rule wins: blank, too short, debris pattern,
    /// digits/punctuation only, class-name shape.
    pub fn is_noise(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return true;
        }
        if trimmed.chars().count() < MIN_CHARS {
            return true;
        }
        if self.debris.is_match(text) {
            return true;
        }
        if DIGITS_PUNCT_RE.is_match(trimmed) {
            return true;
        }
        CLASS_SHAPE_RE.is_match(trimmed)
    }
}

// ── Tests ──
