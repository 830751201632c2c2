use anyhow::Result;
use reqtest_core::{
    export, extract, generate, Category, Checklist, Config, Extractor, Framework, Generator,
    GeneratorConfig,
};
use tempfile::tempdir;

const REQUIREMENTS: &str = "\
Login page notes.
The application should validate user input.
The system must authenticate users before allowing access.
Users should be able to save their work!
The interface needs to display error messages clearly?
Performance should be optimized for large datasets.
The sky is blue.";

#[test]
fn test_extract_then_generate_pytest() {
    let reqs = extract(REQUIREMENTS);
    let summary: Vec<_> = reqs
        .iter()
        .map(|r| (r.id.as_str(), r.category))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("REQ_001", Category::Validation),
            ("REQ_002", Category::Security),
            ("REQ_003", Category::Functional),
            ("REQ_004", Category::Output),
            ("REQ_005", Category::Performance),
        ]
    );

    let code = generate(&reqs);
    assert_eq!(code.matches("    def test_").count(), reqs.len());
    for req in &reqs {
        assert!(code.contains(&format!("# TODO: Implement test for requirement {}", req.id)));
        assert!(code.contains(&format!("# Category: {}", req.category)));
    }
    assert!(code.contains("def test_users_should_be_able_to_save_their_work(self):"));
}

#[test]
fn test_no_requirements_still_generates_suites() {
    let reqs = extract("The sky is blue. Grass is green.");
    assert!(reqs.is_empty());

    for framework in Framework::all() {
        let generator = Generator::new(GeneratorConfig {
            framework: *framework,
            ..GeneratorConfig::default()
        });
        let code = generator.generate(&reqs);
        assert!(code.contains(framework.default_suite_name()));
        assert!(generator.entries(&reqs).is_empty());
    }
}

#[test]
fn test_checklist_export_edit_import() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("requirements_checklist.txt");
    let extractor = Extractor::default();

    let mut checklist = Checklist::new(extractor.extract(REQUIREMENTS));
    checklist.check("REQ_002")?;
    checklist.add_sub_requirement("REQ_002", "tokens must be encrypted", &extractor)?;
    export::export_checklist(&checklist, &path)?;

    let mut loaded = export::import_checklist(&path)?;
    assert_eq!(loaded, checklist);

    loaded.check("REQ_002.1")?;
    export::export_checklist(&loaded, &path)?;
    let content = std::fs::read_to_string(&path)?;
    assert!(content.contains("  [x] REQ_002.1 [Security] Tokens must be encrypted."));
    assert!(content.contains("Total: 6 | Checked: 2"));

    // Generating from the checklist covers the sub-requirement too
    let code = generate(&loaded.requirements);
    assert_eq!(code.matches("    def test_").count(), 6);

    Ok(())
}

#[test]
fn test_custom_config_changes_categories() -> Result<()> {
    let config = Config::from_yaml(
        r#"
extractor:
  category_rules:
    - category: Performance
      keywords: [optimi]
    - category: Security
      keywords: [authenticate]
generator:
  framework: rust
  suite_name: login_tests
"#,
    )?;

    let extractor = Extractor::new(config.extractor)?;
    let reqs = extractor.extract("Login must authenticate quickly and be optimized.");
    assert_eq!(reqs[0].category, Category::Performance);

    let code = Generator::new(config.generator).generate(&reqs);
    assert!(code.contains("mod login_tests {"));
    assert!(code.contains("fn test_login_must_authenticate_quickly_and_be_optimized()"));

    Ok(())
}
