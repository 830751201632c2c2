//! Checklist document
//!
//! Owns the requirement tree between extraction and export: checked state,
//! sub-requirements, the plain-text export format and its parser.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extractor::{clean_requirement, Extractor};
use crate::models::{self, is_valid_id, parent_of, Category, Requirement};
use crate::runner::{TestOutcome, TestStatus};

pub const CHECKLIST_TITLE: &str = "Requirements Checklist";
const RULE_WIDTH: usize = 50;
const UNCHECKED_MARK: &str = "[ ]";
const CHECKED_MARK: &str = "[x]";

/// Errors raised while parsing an exported checklist
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChecklistError {
    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Line {line}: unknown category '{name}'")]
    UnknownCategory { line: usize, name: String },

    #[error("Line {line}: duplicate requirement id {id}")]
    DuplicateId { line: usize, id: String },

    #[error("Line {line}: parent of {id} has not been listed")]
    MissingParent { line: usize, id: String },

    #[error("Line {line}: {id} is out of sequence, expected {expected}")]
    OutOfSequence {
        line: usize,
        id: String,
        expected: String,
    },

    #[error("Requirement {id}: {reason}")]
    InvalidRequirement { id: String, reason: String },
}

/// Errors raised by operations on the requirement tree
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Requirement not found: {0}")]
    NotFound(String),

    #[error("Requirement {parent} has {len} sub-requirements, index {index} is out of range")]
    IndexOutOfRange {
        parent: String,
        index: usize,
        len: usize,
    },

    #[error("Sub-requirement text is empty")]
    EmptyText,
}

/// Counts over every requirement in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub checked: usize,
    /// Non-zero counts only, in [`Category::all`] order
    pub by_category: Vec<(Category, usize)>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total: {} | Checked: {}", self.total, self.checked)?;
        if !self.by_category.is_empty() {
            let parts: Vec<String> = self
                .by_category
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            write!(f, " | {}", parts.join(", "))?;
        }
        Ok(())
    }
}

/// An ordered requirement tree with checked state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub requirements: Vec<Requirement>,
}

fn find_in<'a>(reqs: &'a [Requirement], id: &str) -> Option<&'a Requirement> {
    for req in reqs {
        if req.id == id {
            return Some(req);
        }
        if let Some(found) = find_in(&req.sub_requirements, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(reqs: &'a mut [Requirement], id: &str) -> Option<&'a mut Requirement> {
    for req in reqs.iter_mut() {
        if req.id == id {
            return Some(req);
        }
        if let Some(found) = find_in_mut(&mut req.sub_requirements, id) {
            return Some(found);
        }
    }
    None
}

fn set_checked_recursive(reqs: &mut [Requirement], checked: bool) {
    for req in reqs {
        req.checked = checked;
        set_checked_recursive(&mut req.sub_requirements, checked);
    }
}

fn invalid(id: &str, reason: impl Into<String>) -> ChecklistError {
    ChecklistError::InvalidRequirement {
        id: id.to_string(),
        reason: reason.into(),
    }
}

/// Applies the rules the text format enforces line by line to a whole
/// subtree. Children must be numbered `{parent}.1..n` in order; their
/// `parent_id` is filled in when missing.
fn validate_tree(
    reqs: &mut [Requirement],
    parent_id: Option<&str>,
    seen: &mut HashSet<String>,
) -> Result<(), ChecklistError> {
    for (index, req) in reqs.iter_mut().enumerate() {
        if !is_valid_id(&req.id) {
            return Err(invalid(&req.id, "invalid requirement id"));
        }
        if !seen.insert(req.id.clone()) {
            return Err(invalid(&req.id, "duplicate requirement id"));
        }

        match parent_id {
            None => {
                if req.depth() != 0 || req.parent_id.is_some() {
                    return Err(invalid(&req.id, "listed at the top level but has a parent"));
                }
            }
            Some(parent) => {
                let expected = format!("{}.{}", parent, index + 1);
                if req.id != expected {
                    return Err(invalid(
                        &req.id,
                        format!("out of sequence, expected {}", expected),
                    ));
                }
                if req.parent_id.as_deref().is_some_and(|p| p != parent) {
                    return Err(invalid(&req.id, format!("parent id does not match {}", parent)));
                }
                req.parent_id = Some(parent.to_string());
            }
        }

        if req.text.trim().is_empty() {
            return Err(invalid(&req.id, "requirement text is empty"));
        }
        if req.text.contains(&['\n', '\r'][..]) {
            return Err(invalid(&req.id, "requirement text spans several lines"));
        }

        let id = req.id.clone();
        validate_tree(&mut req.sub_requirements, Some(&id), seen)?;
    }
    Ok(())
}

/// Gives every child of `parent` the id `{parent.id}.{n}` again, all the way down
fn renumber_sub_requirements(parent: &mut Requirement) {
    let parent_id = parent.id.clone();
    for (i, sub) in parent.sub_requirements.iter_mut().enumerate() {
        sub.id = format!("{}.{}", parent_id, i + 1);
        sub.parent_id = Some(parent_id.clone());
        renumber_sub_requirements(sub);
    }
}

impl Checklist {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    /// Checks a tree built outside [`Checklist::parse`], such as a JSON
    /// import, against the same rules as the text format.
    pub fn validated(mut self) -> Result<Self, ChecklistError> {
        let mut seen = HashSet::new();
        validate_tree(&mut self.requirements, None, &mut seen)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Every requirement, parents before children
    pub fn flatten(&self) -> Vec<&Requirement> {
        models::flatten(&self.requirements)
    }

    /// Searches the whole tree
    pub fn find(&self, id: &str) -> Option<&Requirement> {
        find_in(&self.requirements, id)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Requirement, TreeError> {
        find_in_mut(&mut self.requirements, id).ok_or_else(|| TreeError::NotFound(id.to_string()))
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) -> Result<(), TreeError> {
        self.find_mut(id)?.checked = checked;
        Ok(())
    }

    pub fn check(&mut self, id: &str) -> Result<(), TreeError> {
        self.set_checked(id, true)
    }

    pub fn uncheck(&mut self, id: &str) -> Result<(), TreeError> {
        self.set_checked(id, false)
    }

    pub fn check_all(&mut self) {
        set_checked_recursive(&mut self.requirements, true);
    }

    pub fn uncheck_all(&mut self) {
        set_checked_recursive(&mut self.requirements, false);
    }

    /// Adds a child under `parent_id` and returns its id. The text is cleaned
    /// and categorized the same way extracted sentences are.
    pub fn add_sub_requirement(
        &mut self,
        parent_id: &str,
        text: &str,
        extractor: &Extractor,
    ) -> Result<String, TreeError> {
        let text = clean_requirement(text);
        if text.is_empty() {
            return Err(TreeError::EmptyText);
        }
        let category = extractor.categorize(&text);

        let parent = self.find_mut(parent_id)?;
        let owner = parent.id.clone();
        let id = format!("{}.{}", owner, parent.sub_requirements.len() + 1);
        parent.sub_requirements.push(Requirement {
            id: id.clone(),
            text,
            category,
            checked: false,
            parent_id: Some(owner),
            sub_requirements: Vec::new(),
        });

        Ok(id)
    }

    /// Removes the child at `index` (0-based) and renumbers the ones after it
    pub fn remove_sub_requirement(
        &mut self,
        parent_id: &str,
        index: usize,
    ) -> Result<Requirement, TreeError> {
        let parent = self.find_mut(parent_id)?;
        let len = parent.sub_requirements.len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange {
                parent: parent.id.clone(),
                index,
                len,
            });
        }

        let removed = parent.sub_requirements.remove(index);
        renumber_sub_requirements(parent);
        Ok(removed)
    }

    pub fn summary(&self) -> Summary {
        let all = self.flatten();
        let mut counts: HashMap<Category, usize> = HashMap::new();
        for req in &all {
            *counts.entry(req.category).or_default() += 1;
        }

        Summary {
            total: all.len(),
            checked: all.iter().filter(|r| r.checked).count(),
            by_category: Category::all()
                .iter()
                .filter_map(|c| counts.get(c).map(|n| (*c, *n)))
                .collect(),
        }
    }

    /// Updates checked state from test outcomes. Passing requirements are
    /// checked, failing or erroring ones unchecked, skipped ones left alone.
    /// Returns how many requirements had an outcome.
    pub fn apply_outcomes(&mut self, outcomes: &HashMap<String, TestOutcome>) -> usize {
        let mut applied = 0;
        for (id, outcome) in outcomes {
            let Ok(req) = self.find_mut(id) else {
                continue;
            };
            match outcome.status {
                TestStatus::Passed => req.checked = true,
                TestStatus::Failed | TestStatus::Error => req.checked = false,
                TestStatus::Skipped => {}
            }
            applied += 1;
        }
        applied
    }

    /// Plain-text export stamped with the current local time
    pub fn render(&self) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.render_with_timestamp(&timestamp)
    }

    pub fn render_with_timestamp(&self, timestamp: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", CHECKLIST_TITLE));
        output.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDTH)));
        output.push_str(&format!("Generated on: {}\n\n", timestamp));

        for req in self.flatten() {
            output.push_str(&format_line(req));
            output.push('\n');
        }

        output.push_str(&format!("\n{}\n", self.summary()));
        output
    }

    /// Parses an exported checklist. Lines that do not start with a checkbox
    /// are ignored; the tree is rebuilt from the ids, and children must appear
    /// in order (`REQ_001.1` before `REQ_001.2`).
    pub fn parse(text: &str) -> Result<Self, ChecklistError> {
        let mut checklist = Checklist::default();
        let mut seen = HashSet::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let Some(mut req) = parse_line(raw.trim(), line)? else {
                continue;
            };

            if !seen.insert(req.id.clone()) {
                return Err(ChecklistError::DuplicateId { line, id: req.id });
            }

            match parent_of(&req.id).map(str::to_string) {
                None => checklist.requirements.push(req),
                Some(parent_id) => {
                    let parent = find_in_mut(&mut checklist.requirements, &parent_id).ok_or(
                        ChecklistError::MissingParent {
                            line,
                            id: req.id.clone(),
                        },
                    )?;
                    let expected = format!("{}.{}", parent_id, parent.sub_requirements.len() + 1);
                    if req.id != expected {
                        return Err(ChecklistError::OutOfSequence {
                            line,
                            id: req.id,
                            expected,
                        });
                    }
                    req.parent_id = Some(parent_id);
                    parent.sub_requirements.push(req);
                }
            }
        }

        Ok(checklist)
    }
}

/// `[x] REQ_001 [Security] text`, indented two spaces per nesting level
pub fn format_line(req: &Requirement) -> String {
    let mark = if req.checked { CHECKED_MARK } else { UNCHECKED_MARK };
    format!(
        "{}{} {} [{}] {}",
        "  ".repeat(req.depth()),
        mark,
        req.id,
        req.category,
        req.text
    )
}

/// Parses one trimmed line; `Ok(None)` for lines that are not requirement lines
fn parse_line(line: &str, line_no: usize) -> Result<Option<Requirement>, ChecklistError> {
    let (checked, rest) = if let Some(rest) = line.strip_prefix(UNCHECKED_MARK) {
        (false, rest)
    } else if let Some(rest) = line
        .strip_prefix(CHECKED_MARK)
        .or_else(|| line.strip_prefix("[X]"))
    {
        (true, rest)
    } else {
        return Ok(None);
    };

    let malformed = |reason: &str| ChecklistError::Malformed {
        line: line_no,
        reason: reason.to_string(),
    };

    let (id, rest) = rest
        .trim_start()
        .split_once(' ')
        .ok_or_else(|| malformed("expected an id followed by a category"))?;
    if !is_valid_id(id) {
        return Err(malformed(&format!("invalid requirement id '{}'", id)));
    }

    let rest = rest
        .trim_start()
        .strip_prefix('[')
        .ok_or_else(|| malformed("expected [Category] after the id"))?;
    let (name, text) = rest
        .split_once(']')
        .ok_or_else(|| malformed("unterminated category"))?;
    let category = name
        .parse::<Category>()
        .map_err(|_| ChecklistError::UnknownCategory {
            line: line_no,
            name: name.to_string(),
        })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(malformed("requirement text is empty"));
    }

    Ok(Some(Requirement {
        id: id.to_string(),
        text: text.to_string(),
        category,
        checked,
        parent_id: None,
        sub_requirements: Vec::new(),
    }))
}
