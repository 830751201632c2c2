use crate::checklist::Checklist;
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

/// Read an input text file (requirements prose or an exported checklist)
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write generated text, creating parent directories as needed
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Export the checklist in its plain-text format
pub fn export_checklist(checklist: &Checklist, output_path: &Path) -> Result<()> {
    write_text(output_path, &checklist.render())?;

    info!("Exported checklist: {}", output_path.display());
    info!("  {}", checklist.summary());

    Ok(())
}

/// Load a checklist previously written by [`export_checklist`]
pub fn import_checklist(path: &Path) -> Result<Checklist> {
    let content = read_text(path)?;
    Checklist::parse(&content).with_context(|| format!("Failed to parse checklist {}", path.display()))
}

/// Pretty JSON for the requirement tree
pub fn to_json(checklist: &Checklist) -> Result<String> {
    Ok(serde_json::to_string_pretty(checklist)?)
}

/// Export the requirement tree to JSON format
pub fn export_json(checklist: &Checklist, output_path: &Path) -> Result<()> {
    write_text(output_path, &to_json(checklist)?)?;

    info!("Exported to JSON: {}", output_path.display());
    info!("  Total requirements: {}", checklist.flatten().len());

    Ok(())
}

/// Parse a requirement tree from JSON text. The tree must satisfy the same
/// rules as a parsed text checklist.
pub fn from_json(content: &str) -> Result<Checklist> {
    let checklist: Checklist = serde_json::from_str(content)?;
    Ok(checklist.validated()?)
}

/// Load a requirement tree from a JSON file
pub fn import_json(path: &Path) -> Result<Checklist> {
    let content = read_text(path)?;
    from_json(&content).with_context(|| format!("Failed to parse JSON {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{extract, Extractor};
    use tempfile::tempdir;

    fn sample() -> Checklist {
        let mut checklist = Checklist::new(extract(
            "The api must return JSON. Inputs should be validated. Nothing here.",
        ));
        checklist.check("REQ_002").unwrap();
        checklist
            .add_sub_requirement("REQ_001", "errors must return 4xx codes", &Extractor::default())
            .unwrap();
        checklist
    }

    #[test]
    fn test_checklist_file_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out").join("requirements_checklist.txt");
        let checklist = sample();

        export_checklist(&checklist, &path)?;
        let loaded = import_checklist(&path)?;
        assert_eq!(loaded, checklist);

        Ok(())
    }

    #[test]
    fn test_json_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("requirements.json");
        let checklist = sample();

        export_json(&checklist, &path)?;
        let content = fs::read_to_string(&path)?;
        assert!(content.contains("\"id\": \"REQ_001.1\""));
        assert!(content.contains("\"category\": \"Validation\""));

        let loaded = import_json(&path)?;
        assert_eq!(loaded, checklist);

        Ok(())
    }

    #[test]
    fn test_json_import_is_validated() {
        let multi_line = r#"{"requirements":[
            {"id":"REQ_001","text":"Users must log in.\nThen leave","category":"Security"}
        ]}"#;
        let err = from_json(multi_line).unwrap_err();
        assert!(err.to_string().contains("several lines"));

        let bogus = r#"{"requirements":[{"id":"bogus","text":"","category":"Input"}]}"#;
        assert!(from_json(bogus).is_err());

        let skipped_child = r#"{"requirements":[
            {"id":"REQ_001","text":"A.","category":"Input","sub_requirements":[
                {"id":"REQ_001.2","text":"B.","category":"Input"}
            ]}
        ]}"#;
        assert!(from_json(skipped_child).is_err());

        let no_parent_ids = r#"{"requirements":[
            {"id":"REQ_001","text":"A.","category":"Input","sub_requirements":[
                {"id":"REQ_001.1","text":"B.","category":"Input"}
            ]}
        ]}"#;
        let checklist = from_json(no_parent_ids).unwrap();
        assert_eq!(
            checklist.find("REQ_001.1").unwrap().parent_id.as_deref(),
            Some("REQ_001")
        );
    }

    #[test]
    fn test_errors_name_the_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let err = read_text(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));

        let bad = dir.path().join("bad.txt");
        fs::write(&bad, "[ ] REQ_001 [Nope] Text.").unwrap();
        let err = import_checklist(&bad).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.txt"));
        assert!(format!("{:#}", err).contains("unknown category"));
    }
}
