//! Requirement extraction
//!
//! A single pass over the input: split on sentence terminators, keep the
//! sentences that contain a requirement keyword, clean them, categorize them and
//! number them in input order.

use log::debug;

use crate::config::{ConfigError, ExtractorConfig, FALLBACK_CATEGORY};
use crate::models::{Category, Requirement};

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];
const STRAY_SEPARATORS: &[char] = &[',', ';', ':'];

/// Extracts requirements from free-form text
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Create an extractor, validating the config and lower-casing its
    /// keywords so they match regardless of how they were written
    pub fn new(config: ExtractorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: config.validated()?,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Returns the requirements found in `text`, numbered `REQ_001..` in input
    /// order. Text without any requirement sentence yields an empty list.
    pub fn extract(&self, text: &str) -> Vec<Requirement> {
        let mut requirements = Vec::new();

        for sentence in split_sentences(text) {
            let lower = sentence.to_lowercase();
            if !self.is_requirement(&lower) {
                debug!("Skipping non-requirement sentence: {:?}", sentence);
                continue;
            }

            let cleaned = clean_requirement(sentence);
            if cleaned.is_empty() {
                continue;
            }

            let category = self.categorize(&cleaned);
            let req = Requirement::new(requirements.len() + 1, cleaned, category);
            debug!("Extracted {} [{}]: {}", req.id, req.category, req.text);
            requirements.push(req);
        }

        requirements
    }

    /// Whether a lower-cased sentence contains any requirement keyword
    fn is_requirement(&self, lower: &str) -> bool {
        self.config
            .requirement_keywords
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
    }

    /// First category rule with a keyword contained in `sentence`, in rule order
    pub fn categorize(&self, sentence: &str) -> Category {
        let lower = sentence.to_lowercase();
        self.config
            .category_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|rule| rule.category)
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

/// Extract with the built-in vocabularies
pub fn extract(text: &str) -> Vec<Requirement> {
    Extractor::default().extract(text)
}

/// Splits on `.`, `!` and `?`, dropping fragments that are blank after trimming
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Normalizes a sentence for display: strips stray separators at either end,
/// collapses whitespace, capitalizes the first character and ends it with `.`.
/// Returns an empty string when nothing is left.
pub fn clean_requirement(sentence: &str) -> String {
    let trimmed = sentence.trim_matches(|c: char| c.is_whitespace() || STRAY_SEPARATORS.contains(&c));
    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    let mut cleaned = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };

    if !cleaned.ends_with('.') {
        cleaned.push('.');
    }
    cleaned
}
