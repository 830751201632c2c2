//! Test-name derivation
//!
//! Names are built from the requirement text alone, so the generator and the
//! runner's output parser always agree on which test belongs to which
//! requirement.

use std::collections::HashSet;

use crate::models::Requirement;

/// Prefix put in front of every derived test name
pub const TEST_PREFIX: &str = "test_";

/// Used when the text has no usable characters
const EMPTY_NAME: &str = "requirement";

/// Derives the base identifier for a requirement text.
///
/// Lower-cases, keeps ASCII letters, digits, underscores and whitespace,
/// collapses whitespace runs into `_`, truncates to `max_len` characters and
/// prefixes `test_`. Names that would start with a digit get `req_` first.
pub fn derive_test_name(text: &str, max_len: usize) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    let truncated: String = joined.chars().take(max_len).collect();
    let body = truncated.trim_end_matches('_');

    let body = if body.is_empty() {
        EMPTY_NAME.to_string()
    } else if body.starts_with(|c: char| c.is_ascii_digit()) {
        format!("req_{}", body)
    } else {
        body.to_string()
    };

    format!("{}{}", TEST_PREFIX, body)
}

/// Hands out unique test names for a sequence of requirements.
///
/// The first requirement to claim a name keeps it. A later requirement that
/// derives the same name gets its sequence number appended
/// (`test_users_must_log_in_2`, or `_4_1` for `REQ_004.1`). If even that is
/// taken a counter is appended until the name is free.
#[derive(Debug)]
pub struct TestNamer {
    max_len: usize,
    taken: HashSet<String>,
}

impl TestNamer {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            taken: HashSet::new(),
        }
    }

    /// Returns the unique name for `req` and reserves it
    pub fn assign(&mut self, req: &Requirement) -> String {
        let base = derive_test_name(&req.text, self.max_len);
        if self.taken.insert(base.clone()) {
            return base;
        }

        let with_sequence = format!("{}_{}", base, req.sequence_suffix());
        if self.taken.insert(with_sequence.clone()) {
            return with_sequence;
        }

        let mut counter = 2usize;
        loop {
            let candidate = format!("{}_{}", with_sequence, counter);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Unique names for every requirement, in order
pub fn assign_test_names(requirements: &[&Requirement], max_len: usize) -> Vec<String> {
    let mut namer = TestNamer::new(max_len);
    requirements.iter().map(|req| namer.assign(req)).collect()
}
