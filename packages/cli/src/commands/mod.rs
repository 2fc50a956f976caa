pub mod apply;
pub mod check;
pub mod outline;
pub mod reconcile;

pub use apply::{apply, ApplyArgs};
pub use check::{check, CheckArgs};
pub use outline::{outline, OutlineArgs};
pub use reconcile::{reconcile, ReconcileArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use stylecascade_document::Document;
use stylecascade_editor::{StyleDefinition, StyleEngine, StyleRegistry};
use walkdir::WalkDir;

/// Engine over the project's style list, or `styles` when given
pub(crate) fn load_engine(config: &Config, cwd: &str, styles: Option<&Path>) -> Result<StyleEngine> {
    let path = match styles {
        Some(path) => path.to_path_buf(),
        None => config.get_styles_path(cwd),
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read style list {}", path.display()))?;
    let definitions: Vec<StyleDefinition> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid style list {}", path.display()))?;

    let registry = StyleRegistry::with_styles(definitions)?;
    Ok(StyleEngine::new(registry, config.engine.clone()))
}

/// The input file, or every document under the input directory
pub(crate) fn collect_documents(input: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            input.display()
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_document = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(&config.document_suffix))
            .unwrap_or(false);
        if path.is_file() && is_document {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    Ok(files)
}

/// Input path, defaulting to the project's documents directory
pub(crate) fn resolve_input(input: Option<PathBuf>, config: &Config, cwd: &str) -> PathBuf {
    input.unwrap_or_else(|| config.get_docs_dir(cwd))
}

pub(crate) fn read_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    Document::from_json(&content).with_context(|| format!("Invalid document {}", path.display()))
}

pub(crate) fn write_document(path: &Path, doc: &Document) -> Result<()> {
    fs::write(path, doc.to_json()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_documents_filters_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("part1");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("intro.doc.json"), "{}").unwrap();
        fs::write(nested.join("body.doc.json"), "{}").unwrap();
        fs::write(dir.path().join("styles.json"), "[]").unwrap();

        let files = collect_documents(dir.path(), &Config::default()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.to_string_lossy().ends_with(".doc.json")));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = collect_documents(&dir.path().join("nope"), &Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_engine_from_styles_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("styles.json"),
            r#"[{ "styleName": "Body", "styles": { "fontSize": 11 } }]"#,
        )
        .unwrap();
        let cwd = dir.path().display().to_string();

        let engine = load_engine(&Config::default(), &cwd, None).unwrap();
        assert!(engine.registry().exists("body"));
    }
}
