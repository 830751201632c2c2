//! Test skeleton generation
//!
//! The generator owns ordering and naming; a [`TestTemplate`] only knows how to
//! spell a suite in one framework's syntax. Output is a single source file with
//! one container, empty setup/teardown hooks and one stub per requirement.

mod pytest;
mod rust;

pub use pytest::PytestTemplate;
pub use rust::RustTemplate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::models::{flatten, Requirement};
use crate::naming::assign_test_names;

/// A requirement paired with the unique test name generated for it
#[derive(Debug, Clone)]
pub struct TestEntry<'a> {
    pub name: String,
    pub requirement: &'a Requirement,
}

/// Framework-specific spelling of a test suite
pub trait TestTemplate {
    /// Extension for the generated file, without the dot
    fn file_extension(&self) -> &'static str;

    /// Imports and anything else that precedes the container
    fn file_header(&self, out: &mut String);

    fn suite_open(&self, out: &mut String, suite_name: &str);

    /// Setup and teardown placeholders, emitted once per container
    fn setup_teardown(&self, out: &mut String);

    fn test_entry(&self, out: &mut String, entry: &TestEntry<'_>);

    fn suite_close(&self, out: &mut String);
}

/// Supported output frameworks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Pytest,
    Rust,
}

impl Framework {
    pub fn all() -> &'static [Framework] {
        &[Framework::Pytest, Framework::Rust]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Framework::Pytest => "pytest",
            Framework::Rust => "rust",
        }
    }

    pub fn default_suite_name(&self) -> &'static str {
        match self {
            Framework::Pytest => "TestRequirements",
            Framework::Rust => "requirement_tests",
        }
    }

    pub fn template(&self) -> Box<dyn TestTemplate> {
        match self {
            Framework::Pytest => Box::new(PytestTemplate),
            Framework::Rust => Box::new(RustTemplate),
        }
    }

    /// Default file name for saving a generated suite
    pub fn default_file_name(&self) -> String {
        format!("test_requirements.{}", self.template().file_extension())
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pytest" | "python" | "py" => Ok(Framework::Pytest),
            "rust" | "rs" => Ok(Framework::Rust),
            _ => Err(format!(
                "Unknown framework: {}. Supported frameworks: pytest, rust",
                s
            )),
        }
    }
}

/// Turns an ordered requirement tree into test-suite source text
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Create a generator from an already validated config
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Pairs every requirement (parents before children) with its unique name
    pub fn entries<'a>(&self, requirements: &'a [Requirement]) -> Vec<TestEntry<'a>> {
        let all = flatten(requirements);
        let names = assign_test_names(&all, self.config.max_name_len);
        names
            .into_iter()
            .zip(all)
            .map(|(name, requirement)| TestEntry { name, requirement })
            .collect()
    }

    /// Renders the whole suite. An empty slice still gives a well-formed,
    /// empty container.
    pub fn generate(&self, requirements: &[Requirement]) -> String {
        let template = self.config.framework.template();
        let mut out = String::new();

        template.file_header(&mut out);
        template.suite_open(&mut out, self.config.suite_name());
        template.setup_teardown(&mut out);
        for entry in self.entries(requirements) {
            template.test_entry(&mut out, &entry);
        }
        template.suite_close(&mut out);

        out
    }
}

/// Generate a pytest suite with default settings
pub fn generate(requirements: &[Requirement]) -> String {
    Generator::default().generate(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;

    const SAMPLE: &str = "The application should validate user input. \
        The system must authenticate users before allowing access. \
        Users should be able to save their work. \
        The interface needs to display error messages clearly. \
        Performance should be optimized for large datasets.";

    #[test]
    fn test_entry_count_and_order_match_requirements() {
        let reqs = extract(SAMPLE);
        let generator = Generator::default();
        let entries = generator.entries(&reqs);
        assert_eq!(entries.len(), reqs.len());
        for (entry, req) in entries.iter().zip(&reqs) {
            assert_eq!(entry.requirement.id, req.id);
        }

        let code = generator.generate(&reqs);
        let positions: Vec<usize> = entries
            .iter()
            .map(|e| code.find(&format!("def {}(self)", e.name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sub_requirements_follow_parent() {
        let mut reqs = extract("Users must log in. Users must log out.");
        let mut child = Requirement::new(1, "Sessions must expire.".to_string(), reqs[0].category);
        child.id = "REQ_001.1".to_string();
        child.parent_id = Some("REQ_001".to_string());
        reqs[0].sub_requirements.push(child);

        let entries = Generator::default().entries(&reqs);
        let ids: Vec<_> = entries.iter().map(|e| e.requirement.id.as_str()).collect();
        assert_eq!(ids, vec!["REQ_001", "REQ_001.1", "REQ_002"]);
    }

    #[test]
    fn test_names_unique_after_truncation() {
        let reqs = extract(
            "The system must authenticate users before allowing access to reports. \
             The system must authenticate users before allowing access to billing.",
        );
        let entries = Generator::default().entries(&reqs);
        assert_eq!(
            entries[0].name,
            "test_the_system_must_authenticate_users_before_allowing"
        );
        assert_eq!(
            entries[1].name,
            "test_the_system_must_authenticate_users_before_allowing_2"
        );
    }

    #[test]
    fn test_framework_from_str() {
        assert_eq!("PyTest".parse::<Framework>(), Ok(Framework::Pytest));
        assert_eq!("rs".parse::<Framework>(), Ok(Framework::Rust));
        assert!("junit".parse::<Framework>().is_err());
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(Framework::Pytest.default_file_name(), "test_requirements.py");
        assert_eq!(Framework::Rust.default_file_name(), "test_requirements.rs");
    }

    #[test]
    fn test_generation_is_pure() {
        let reqs = extract(SAMPLE);
        let before = reqs.clone();
        let first = generate(&reqs);
        let second = generate(&reqs);
        assert_eq!(first, second);
        assert_eq!(reqs, before);
    }
}
