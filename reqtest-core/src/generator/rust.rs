use super::{TestEntry, TestTemplate};

/// `#[cfg(test)]` module with one `#[test]` stub per requirement
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTemplate;

/// Escapes text for a `todo!` format string literal
fn escape_format_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('{', "{{")
        .replace('}', "}}")
}

impl TestTemplate for RustTemplate {
    fn file_extension(&self) -> &'static str {
        "rs"
    }

    fn file_header(&self, out: &mut String) {
        out.push_str("//! Test skeletons generated from requirements\n\n");
    }

    fn suite_open(&self, out: &mut String, suite_name: &str) {
        out.push_str("#[cfg(test)]\n");
        out.push_str(&format!("mod {} {{\n", suite_name));
    }

    fn setup_teardown(&self, out: &mut String) {
        out.push_str("    /// Runs before each test\n");
        out.push_str("    #[allow(dead_code)]\n");
        out.push_str("    fn setup() {}\n");
        out.push('\n');
        out.push_str("    /// Runs after each test\n");
        out.push_str("    #[allow(dead_code)]\n");
        out.push_str("    fn teardown() {}\n");
    }

    fn test_entry(&self, out: &mut String, entry: &TestEntry<'_>) {
        let req = entry.requirement;
        out.push('\n');
        out.push_str(&format!("    /// {}\n", req.text));
        out.push_str("    #[test]\n");
        out.push_str(&format!("    fn {}() {{\n", entry.name));
        out.push_str(&format!(
            "        // TODO: Implement test for requirement {}\n",
            req.id
        ));
        out.push_str(&format!("        // Category: {}\n", req.category));
        out.push_str(&format!("        // Requirement: {}\n", req.text));
        out.push_str(&format!(
            "        todo!(\"{}: {}\");\n",
            req.id,
            escape_format_literal(&req.text)
        ));
        out.push_str("    }\n");
    }

    fn suite_close(&self, out: &mut String) {
        out.push_str("}\n");
    }
}
