//! Keyword vocabularies and generator settings
//!
//! The built-in tables below are the defaults. A YAML config file can replace
//! either section; it is validated once at load time so a bad vocabulary never
//! reaches the per-sentence matching.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::Framework;
use crate::models::Category;

/// Phrases that mark a sentence as a requirement
pub const REQUIREMENT_KEYWORDS: &[&str] = &[
    "should",
    "must",
    "shall",
    "will",
    "needs to",
    "required to",
    "has to",
    "validates",
    "ensures",
    "verifies",
    "checks",
    "prevents",
    "allows",
    "enables",
];

/// Category vocabularies in priority order. The first rule with a matching
/// keyword wins; `Functional` is the fallback and has no rule.
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Security,
        &["authenticate", "authoriz", "permission", "secure", "encrypt"],
    ),
    (Category::Validation, &["validat", "verify", "check", "ensure"]),
    (Category::Input, &["input", "enter", "provide"]),
    (Category::Output, &["display", "output", "show", "return"]),
    (Category::Performance, &["performance", "fast", "optimi", "speed"]),
];

/// Category used when no rule matches
pub const FALLBACK_CATEGORY: Category = Category::Functional;

/// Default cap on derived test-name length (before the `test_` prefix)
pub const DEFAULT_MAX_NAME_LEN: usize = 50;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Requirement keyword list is empty")]
    NoRequirementKeywords,

    #[error("Empty keyword in {0}")]
    EmptyKeyword(String),

    #[error("Category {0} has no keywords")]
    EmptyCategory(Category),

    #[error("Category {0} is listed more than once")]
    DuplicateCategory(Category),

    #[error("Category {0} is the fallback and cannot have a rule")]
    FallbackHasRule(Category),

    #[error("Maximum test-name length must be at least 1")]
    ZeroNameLength,

    #[error("Suite name {0:?} is not a valid identifier")]
    InvalidSuiteName(String),
}

/// One category vocabulary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Vocabularies driving the extractor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractorConfig {
    #[serde(default = "default_requirement_keywords")]
    pub requirement_keywords: Vec<String>,
    /// Checked in list order
    #[serde(default = "default_category_rules")]
    pub category_rules: Vec<CategoryRule>,
}

fn default_requirement_keywords() -> Vec<String> {
    REQUIREMENT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_category_rules() -> Vec<CategoryRule> {
    CATEGORY_RULES
        .iter()
        .map(|(category, keywords)| CategoryRule {
            category: *category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            requirement_keywords: default_requirement_keywords(),
            category_rules: default_category_rules(),
        }
    }
}

impl ExtractorConfig {
    /// Checks the vocabularies and lower-cases every keyword so matching can
    /// compare against a lower-cased sentence directly.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.requirement_keywords.is_empty() {
            return Err(ConfigError::NoRequirementKeywords);
        }
        if self.requirement_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::EmptyKeyword(
                "requirement keywords".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.category_rules {
            if rule.category == FALLBACK_CATEGORY {
                return Err(ConfigError::FallbackHasRule(rule.category));
            }
            if !seen.insert(rule.category) {
                return Err(ConfigError::DuplicateCategory(rule.category));
            }
            if rule.keywords.is_empty() {
                return Err(ConfigError::EmptyCategory(rule.category));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::EmptyKeyword(format!(
                    "category {}",
                    rule.category
                )));
            }
        }

        for keyword in &mut self.requirement_keywords {
            *keyword = keyword.trim().to_lowercase();
        }
        for rule in &mut self.category_rules {
            for keyword in &mut rule.keywords {
                *keyword = keyword.trim().to_lowercase();
            }
        }

        Ok(self)
    }
}

/// Settings for test skeleton generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub framework: Framework,
    /// Container name; the framework's default is used when unset
    #[serde(default)]
    pub suite_name: Option<String>,
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

fn default_max_name_len() -> usize {
    DEFAULT_MAX_NAME_LEN
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            framework: Framework::default(),
            suite_name: None,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl GeneratorConfig {
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.max_name_len == 0 {
            return Err(ConfigError::ZeroNameLength);
        }
        if let Some(name) = &self.suite_name {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidSuiteName(name.clone()));
            }
        }
        Ok(self)
    }

    /// Suite name to emit, falling back to the framework's conventional one
    pub fn suite_name(&self) -> &str {
        self.suite_name
            .as_deref()
            .unwrap_or_else(|| self.framework.default_suite_name())
    }
}

/// ASCII identifier accepted by every supported framework
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    /// Loads and validates a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses and validates config from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        Ok(Self {
            extractor: self.extractor.validated()?,
            generator: self.generator.validated()?,
        })
    }
}

/// Gets the config file to use, if any.
///
/// `REQTEST_CONFIG` wins when set. Otherwise `~/.reqtest.yaml` is used when it
/// exists.
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("REQTEST_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir()
        .map(|home| home.join(".reqtest.yaml"))
        .filter(|path| path.exists())
}
