use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every extracted requirement id
pub const ID_PREFIX: &str = "REQ_";

/// Classification label applied to a requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Validation,
    Input,
    Output,
    Security,
    Performance,
    Functional,
}

impl Category {
    /// All categories, in the order used for summaries
    pub fn all() -> &'static [Category] {
        &[
            Category::Validation,
            Category::Input,
            Category::Output,
            Category::Security,
            Category::Performance,
            Category::Functional,
        ]
    }

    /// Get display label for the category
    pub fn label(&self) -> &'static str {
        match self {
            Category::Validation => "Validation",
            Category::Input => "Input",
            Category::Output => "Output",
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::Functional => "Functional",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// One extracted, categorized statement derived from an input sentence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Sequential identifier, `REQ_001` for top-level, `REQ_001.2` for children
    pub id: String,
    /// Cleaned sentence content
    pub text: String,
    pub category: Category,
    /// Set by whoever drives the checklist; never touched by extraction or generation
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_requirements: Vec<Requirement>,
}

impl Requirement {
    /// Creates a top-level requirement with the given 1-based sequence number
    pub fn new(sequence: usize, text: String, category: Category) -> Self {
        Self {
            id: format_id(sequence),
            text,
            category,
            checked: false,
            parent_id: None,
            sub_requirements: Vec::new(),
        }
    }

    /// Nesting level derived from the id (`REQ_001` is 0, `REQ_001.1` is 1)
    pub fn depth(&self) -> usize {
        id_depth(&self.id)
    }

    /// Sequence part of the id, with nested levels joined by `_`
    /// (`REQ_004.2` gives `4_2`).
    pub fn sequence_suffix(&self) -> String {
        self.id
            .strip_prefix(ID_PREFIX)
            .unwrap_or(&self.id)
            .split('.')
            .map(|part| part.trim_start_matches('0'))
            .map(|part| if part.is_empty() { "0" } else { part })
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Formats a top-level id: `REQ_` followed by a 3-digit zero-padded sequence
pub fn format_id(sequence: usize) -> String {
    format!("{}{:03}", ID_PREFIX, sequence)
}

/// Number of nesting levels encoded in an id
pub fn id_depth(id: &str) -> usize {
    id.matches('.').count()
}

/// Parent id encoded in a nested id, `None` for top-level ids
pub fn parent_of(id: &str) -> Option<&str> {
    id.rfind('.').map(|pos| &id[..pos])
}

/// Checks that an id has the `REQ_<digits>(.<digits>)*` shape
pub fn is_valid_id(id: &str) -> bool {
    match id.strip_prefix(ID_PREFIX) {
        Some(rest) => rest
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())),
        None => false,
    }
}

/// Every requirement in the tree, parents before their children
pub fn flatten(requirements: &[Requirement]) -> Vec<&Requirement> {
    fn walk<'a>(reqs: &'a [Requirement], out: &mut Vec<&'a Requirement>) {
        for req in reqs {
            out.push(req);
            walk(&req.sub_requirements, out);
        }
    }

    let mut out = Vec::new();
    walk(requirements, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id_pads_to_three_digits() {
        assert_eq!(format_id(1), "REQ_001");
        assert_eq!(format_id(42), "REQ_042");
        assert_eq!(format_id(1234), "REQ_1234");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("security".parse::<Category>(), Ok(Category::Security));
        assert_eq!(" Output ".parse::<Category>(), Ok(Category::Output));
        assert!("Usability".parse::<Category>().is_err());
    }

    #[test]
    fn test_depth_and_parent() {
        assert_eq!(id_depth("REQ_001"), 0);
        assert_eq!(id_depth("REQ_001.2.1"), 2);
        assert_eq!(parent_of("REQ_001.2.1"), Some("REQ_001.2"));
        assert_eq!(parent_of("REQ_001"), None);
    }

    #[test]
    fn test_sequence_suffix() {
        let mut req = Requirement::new(4, "Text.".to_string(), Category::Functional);
        assert_eq!(req.sequence_suffix(), "4");
        req.id = "REQ_004.2".to_string();
        assert_eq!(req.sequence_suffix(), "4_2");
    }

    #[test]
    fn test_flatten_is_pre_order() {
        let mut parent = Requirement::new(1, "A.".to_string(), Category::Functional);
        let mut child = Requirement::new(1, "B.".to_string(), Category::Input);
        child.id = "REQ_001.1".to_string();
        let mut grandchild = Requirement::new(1, "C.".to_string(), Category::Output);
        grandchild.id = "REQ_001.1.1".to_string();
        child.sub_requirements.push(grandchild);
        parent.sub_requirements.push(child);
        let second = Requirement::new(2, "D.".to_string(), Category::Functional);

        let all = [parent, second];
        let ids: Vec<_> = flatten(&all).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["REQ_001", "REQ_001.1", "REQ_001.1.1", "REQ_002"]);
    }

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("REQ_001"));
        assert!(is_valid_id("REQ_001.10"));
        assert!(!is_valid_id("REQ_"));
        assert!(!is_valid_id("REQ_01a"));
        assert!(!is_valid_id("SPEC-001"));
        assert!(!is_valid_id("REQ_001."));
    }
}
