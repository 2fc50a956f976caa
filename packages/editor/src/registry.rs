//! # Style Registry
//!
//! Cache of named style definitions shared by every editor in the process.
//!
//! The registry publishes immutable snapshots. Writers build a complete new
//! snapshot and swap it in; readers either hold the old snapshot or the new
//! one and never see a half-updated list. A style pass takes one snapshot up
//! front and uses it for its whole duration.

use crate::style::StyleDefinition;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use stylecascade_document::RESERVED_STYLE_NONE;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate style name: {0}")]
    DuplicateName(String),

    #[error("Style name is reserved: {0}")]
    ReservedName(String),

    #[error("Style not found: {0}")]
    NotFound(String),
}

/// Immutable view of the registered styles
#[derive(Debug, Default)]
pub struct StyleSnapshot {
    styles: Vec<Arc<StyleDefinition>>,
    by_name: HashMap<String, usize>,
}

impl StyleSnapshot {
    fn build(styles: Vec<StyleDefinition>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(styles.len());
        for (index, style) in styles.iter().enumerate() {
            if style.is_reserved() {
                return Err(RegistryError::ReservedName(style.style_name.clone()));
            }
            if by_name.insert(fold(&style.style_name), index).is_some() {
                return Err(RegistryError::DuplicateName(style.style_name.clone()));
            }
        }

        Ok(Self {
            styles: styles.into_iter().map(Arc::new).collect(),
            by_name,
        })
    }

    /// Style by name; `None` for the reserved name and unknown names
    pub fn get_by_name(&self, name: &str) -> Option<Arc<StyleDefinition>> {
        if name == RESERVED_STYLE_NONE {
            return None;
        }
        self.by_name
            .get(&fold(name))
            .map(|&index| Arc::clone(&self.styles[index]))
    }

    /// First registered numbered style at `level`
    pub fn get_by_level(&self, level: u32) -> Option<Arc<StyleDefinition>> {
        self.styles
            .iter()
            .find(|style| style.styles.outline_level() == Some(level))
            .cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(&fold(name))
    }

    pub fn styles(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    fn to_definitions(&self) -> Vec<StyleDefinition> {
        self.styles.iter().map(|s| (**s).clone()).collect()
    }
}

/// Shared handle to the process-wide style cache
///
/// Cloning the handle shares the same cache.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    current: Arc<ArcSwap<StyleSnapshot>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with `styles`
    pub fn with_styles(styles: Vec<StyleDefinition>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.replace_all(styles)?;
        Ok(registry)
    }

    /// Consistent view for the duration of one pass
    pub fn snapshot(&self) -> Arc<StyleSnapshot> {
        self.current.load_full()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<StyleDefinition>> {
        self.current.load().get_by_name(name)
    }

    pub fn get_by_level(&self, level: u32) -> Option<Arc<StyleDefinition>> {
        self.current.load().get_by_level(level)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.current.load().exists(name)
    }

    /// Swap in a whole new list of styles
    ///
    /// The list is rejected as a whole when it holds duplicate names or
    /// claims the reserved name; the previous styles stay in place.
    pub fn replace_all(&self, styles: Vec<StyleDefinition>) -> Result<(), RegistryError> {
        let snapshot = StyleSnapshot::build(styles)?;
        debug!(count = snapshot.len(), "Replacing style registry");
        self.current.store(Arc::new(snapshot));
        Ok(())
    }

    /// Add a style, or replace the one with the same name
    pub fn upsert(&self, style: StyleDefinition) -> Result<(), RegistryError> {
        self.update(|styles| {
            let key = fold(&style.style_name);
            match styles.iter_mut().find(|s| fold(&s.style_name) == key) {
                Some(existing) => *existing = style.clone(),
                None => styles.push(style.clone()),
            }
            Ok(())
        })
    }

    /// Rename a style, keeping its position in the list
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(), RegistryError> {
        self.update(|styles| {
            let key = fold(old_name);
            let style = styles
                .iter_mut()
                .find(|s| fold(&s.style_name) == key)
                .ok_or_else(|| RegistryError::NotFound(old_name.to_string()))?;
            style.style_name = new_name.to_string();
            Ok(())
        })
    }

    /// Remove a style by name
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        self.update(|styles| {
            let key = fold(name);
            let before = styles.len();
            styles.retain(|s| fold(&s.style_name) != key);
            if styles.len() == before {
                return Err(RegistryError::NotFound(name.to_string()));
            }
            Ok(())
        })
    }

    /// Read-copy-update: rebuild from the latest snapshot until the swap wins
    fn update(
        &self,
        mut edit: impl FnMut(&mut Vec<StyleDefinition>) -> Result<(), RegistryError>,
    ) -> Result<(), RegistryError> {
        loop {
            let current = self.current.load_full();
            let mut styles = current.to_definitions();
            edit(&mut styles)?;
            let next = Arc::new(StyleSnapshot::build(styles)?);

            let previous = self.current.compare_and_swap(&current, next);
            if Arc::ptr_eq(&*previous, &current) {
                return Ok(());
            }
        }
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleProps;

    fn heading(name: &str, level: u32) -> StyleDefinition {
        StyleDefinition::new(
            name,
            StyleProps {
                has_numbering: true,
                style_level: Some(level),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = StyleRegistry::with_styles(vec![heading("Heading1", 1)]).unwrap();

        assert!(registry.get_by_name("heading1").is_some());
        assert!(registry.get_by_name("HEADING1").is_some());
        assert!(registry.exists("Heading1"));
        assert!(registry.get_by_name("Missing").is_none());
    }

    #[test]
    fn test_reserved_name_never_resolves() {
        let registry = StyleRegistry::new();
        assert!(registry.get_by_name("None").is_none());

        let result = registry.replace_all(vec![StyleDefinition::new("none", StyleProps::default())]);
        assert_eq!(result, Err(RegistryError::ReservedName("none".into())));
    }

    #[test]
    fn test_duplicates_rejected_and_old_list_kept() {
        let registry = StyleRegistry::with_styles(vec![heading("Heading1", 1)]).unwrap();

        let result = registry.replace_all(vec![heading("Title", 1), heading("title", 2)]);
        assert!(matches!(result, Err(RegistryError::DuplicateName(_))));
        assert!(registry.exists("Heading1"));
        assert!(!registry.exists("Title"));
    }

    #[test]
    fn test_get_by_level_returns_first_numbered() {
        let mut plain = heading("Plain", 2);
        plain.styles.has_numbering = false;

        let registry = StyleRegistry::with_styles(vec![
            plain,
            heading("Heading2", 2),
            heading("Other2", 2),
        ])
        .unwrap();

        let found = registry.get_by_level(2).unwrap();
        assert_eq!(found.style_name, "Heading2");
        assert!(registry.get_by_level(3).is_none());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let registry = StyleRegistry::with_styles(vec![heading("Heading1", 1)]).unwrap();
        let snapshot = registry.snapshot();

        registry.replace_all(vec![heading("Heading2", 2)]).unwrap();

        assert!(snapshot.exists("Heading1"));
        assert!(!snapshot.exists("Heading2"));
        assert!(registry.exists("Heading2"));
    }

    #[test]
    fn test_upsert_rename_remove() {
        let registry = StyleRegistry::with_styles(vec![heading("Heading1", 1)]).unwrap();

        registry.upsert(heading("Heading2", 2)).unwrap();
        registry.upsert(heading("heading1", 3)).unwrap();
        assert_eq!(registry.snapshot().len(), 2);
        assert_eq!(registry.get_by_level(3).unwrap().style_name, "heading1");

        registry.rename("Heading2", "Section").unwrap();
        assert!(registry.exists("section"));
        assert!(registry.rename("Heading2", "Other").is_err());

        registry.remove("Section").unwrap();
        assert!(matches!(registry.remove("Section"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_clones_share_the_cache() {
        let registry = StyleRegistry::new();
        let handle = registry.clone();

        registry.replace_all(vec![heading("Heading1", 1)]).unwrap();
        assert!(handle.exists("Heading1"));
    }

    #[test]
    fn test_concurrent_readers_see_whole_lists() {
        let registry = StyleRegistry::with_styles(vec![heading("A1", 1), heading("A2", 2)]).unwrap();

        let reader = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    let snapshot = registry.snapshot();
                    let names: Vec<_> = snapshot.styles().map(|s| s.style_name.clone()).collect();
                    let all_a = names.iter().all(|n| n.starts_with('A'));
                    let all_b = names.iter().all(|n| n.starts_with('B'));
                    assert!(all_a || all_b, "torn list: {:?}", names);
                }
            })
        };

        for i in 0..200 {
            let prefix = if i % 2 == 0 { "B" } else { "A" };
            registry
                .replace_all(vec![
                    heading(&format!("{prefix}1"), 1),
                    heading(&format!("{prefix}2"), 2),
                ])
                .unwrap();
        }

        reader.join().unwrap();
    }
}
