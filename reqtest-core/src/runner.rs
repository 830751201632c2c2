//! pytest runner
//!
//! Writes a generated pytest suite to a scratch directory, runs it with a
//! Python interpreter and maps the verbose report back to requirement ids.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::generator::{Framework, Generator};
use crate::models::Requirement;

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors that can occur while running a suite
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to launch {python:?}: {source}")]
    Launch {
        python: PathBuf,
        source: std::io::Error,
    },

    #[error("Test execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a single requirement's test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
    Skipped,
}

impl TestStatus {
    /// Matches a status word from pytest's verbose report
    fn from_report_word(word: &str) -> Option<Self> {
        match word {
            "PASSED" => Some(TestStatus::Passed),
            "FAILED" => Some(TestStatus::Failed),
            "ERROR" => Some(TestStatus::Error),
            "SKIPPED" => Some(TestStatus::Skipped),
            _ => None,
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            TestStatus::Passed => "Test passed successfully",
            TestStatus::Failed => "Test failed - check implementation",
            TestStatus::Error => "Test error - check syntax",
            TestStatus::Skipped => "Test skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Error => write!(f, "error"),
            TestStatus::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub status: TestStatus,
    pub message: String,
}

impl TestOutcome {
    pub fn new(status: TestStatus, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

/// Runs generated pytest suites
#[derive(Debug, Clone)]
pub struct PytestRunner {
    python: PathBuf,
    timeout: Duration,
}

impl Default for PytestRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl PytestRunner {
    pub fn new<P: Into<PathBuf>>(python: P) -> Self {
        Self {
            python: python.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generates the pytest suite for `requirements`, runs it and returns an
    /// outcome for every requirement in the tree.
    pub fn run(
        &self,
        requirements: &[Requirement],
        config: &GeneratorConfig,
    ) -> Result<HashMap<String, TestOutcome>, RunnerError> {
        let config = pytest_config(config);
        let names = test_names(requirements, &config);
        let generator = Generator::new(config);

        let dir = tempfile::Builder::new().prefix("reqtest-").tempdir()?;
        let test_file = dir.path().join(Framework::Pytest.default_file_name());
        fs::write(&test_file, generator.generate(requirements))?;

        let report_path = dir.path().join("pytest-report.txt");
        let report = File::create(&report_path)?;

        debug!("Running {:?} -m pytest {:?}", self.python, test_file);
        let mut child = Command::new(&self.python)
            .arg("-m")
            .arg("pytest")
            .arg(&test_file)
            .args(["-v", "--tb=short", "-p", "no:cacheprovider"])
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::from(report.try_clone()?))
            .stderr(Stdio::from(report))
            .spawn()
            .map_err(|source| RunnerError::Launch {
                python: self.python.clone(),
                source,
            })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() > self.timeout {
                // Already-exited races are fine here
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunnerError::Timeout(self.timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let output = fs::read_to_string(&report_path)?;
        Ok(parse_pytest_output(&output, status.success(), &names))
    }
}

/// The configured generator settings, forced to a suite pytest collects:
/// pytest framework and its default `Test*` class name.
fn pytest_config(config: &GeneratorConfig) -> GeneratorConfig {
    GeneratorConfig {
        framework: Framework::Pytest,
        suite_name: None,
        ..config.clone()
    }
}

/// Maps pytest's verbose report to requirement outcomes.
///
/// `names` pairs each generated test name with its requirement id. Lines like
/// `file.py::TestRequirements::test_name PASSED [ 50%]` are matched by test
/// name. If nothing could be matched every requirement gets an outcome
/// inferred from the exit status; requirements still missing are `Skipped`.
pub fn parse_pytest_output(
    output: &str,
    exit_ok: bool,
    names: &[(String, String)],
) -> HashMap<String, TestOutcome> {
    let by_name: HashMap<&str, &str> = names
        .iter()
        .map(|(name, id)| (name.as_str(), id.as_str()))
        .collect();
    let mut results = HashMap::new();

    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(node) = tokens.iter().copied().find(|t| t.contains("::")) else {
            continue;
        };
        let Some(status) = tokens.iter().copied().find_map(TestStatus::from_report_word) else {
            continue;
        };

        let test_name = node
            .rsplit("::")
            .next()
            .unwrap_or(node)
            .split('[')
            .next()
            .unwrap_or_default();
        if let Some(id) = by_name.get(test_name) {
            results.insert(
                id.to_string(),
                TestOutcome::new(status, status.default_message()),
            );
        }
    }

    if results.is_empty() {
        warn!("No per-test results found in pytest output, inferring from exit status");
        let (status, message) = if exit_ok {
            (TestStatus::Passed, "Test passed (inferred from exit code)")
        } else {
            (TestStatus::Failed, "Test failed (inferred from exit code)")
        };
        for (_, id) in names {
            results.insert(id.clone(), TestOutcome::new(status, message));
        }
    }

    for (_, id) in names {
        results.entry(id.clone()).or_insert_with(|| {
            TestOutcome::new(
                TestStatus::Skipped,
                "Test was not executed or could not be parsed",
            )
        });
    }

    results
}

/// Test names paired with requirement ids, as the runner sees them
pub fn test_names(requirements: &[Requirement], config: &GeneratorConfig) -> Vec<(String, String)> {
    let generator = Generator::new(config.clone());
    generator
        .entries(requirements)
        .into_iter()
        .map(|entry| (entry.name, entry.requirement.id.clone()))
        .collect()
}
