pub mod checklist;
pub mod config;
pub mod export;
pub mod extractor;
pub mod generator;
pub mod models;
pub mod naming;
pub mod runner;

// Re-export commonly used types
pub use checklist::{Checklist, ChecklistError, Summary, TreeError};
pub use config::{
    get_config_path, CategoryRule, Config, ConfigError, ExtractorConfig, GeneratorConfig,
    CATEGORY_RULES, REQUIREMENT_KEYWORDS,
};
pub use extractor::{extract, Extractor};
pub use generator::{generate, Framework, Generator, PytestTemplate, RustTemplate, TestEntry, TestTemplate};
pub use models::{Category, Requirement};
pub use naming::{assign_test_names, derive_test_name, TestNamer};
pub use runner::{PytestRunner, RunnerError, TestOutcome, TestStatus};
