//! # Style Engine
//!
//! Entry point bundling a [`StyleRegistry`] handle with an [`EngineConfig`].
//! Every operation works on a copy of the given document and returns the
//! resulting document together with the batch that produced it; on error
//! nothing is returned and the input is untouched.

use crate::applier::{ApplyMode, StyleApplier};
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::observer::DocumentChangeObserver;
use crate::outline::{render_outline, Outline};
use crate::overrides::OverrideTracker;
use crate::registry::StyleRegistry;
use serde::Serialize;
use std::path::Path;
use stylecascade_document::{
    BatchMeta, Document, EditBatch, Step, Transaction, RESERVED_STYLE_NONE,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct StyleEngine {
    registry: StyleRegistry,
    config: EngineConfig,
}

/// Problem found by [`StyleEngine::check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A numbered paragraph is more than one level deeper than its predecessor
    OutlineGap { index: usize, level: u32 },
    /// A paragraph names a style the registry does not know
    UnknownStyle { index: usize, style_name: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::OutlineGap { index, level } => {
                write!(f, "block {index}: level {level} skips an outline level")
            }
            Diagnostic::UnknownStyle { index, style_name } => {
                write!(f, "block {index}: unknown style \"{style_name}\"")
            }
        }
    }
}

impl StyleEngine {
    pub fn new(registry: StyleRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Engine over a JSON style list file, configured from `dir`
    pub fn load(styles_path: &Path, config_dir: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(styles_path)?;
        let styles = serde_json::from_str(&content)?;
        let registry = StyleRegistry::with_styles(styles)?;
        let config = EngineConfig::load(config_dir)?;
        info!(
            styles = registry.snapshot().len(),
            path = %styles_path.display(),
            "Loaded style registry"
        );
        Ok(Self::new(registry, config))
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Observer sharing this engine's registry
    pub fn observer(&self) -> DocumentChangeObserver {
        DocumentChangeObserver::new(self.registry.clone(), self.config.clone())
    }

    /// Explicitly apply `style_name` to the paragraphs touched by `[from, to]`
    pub fn apply_style(
        &self,
        doc: &Document,
        style_name: &str,
        from: usize,
        to: usize,
    ) -> Result<(Document, EditBatch), EngineError> {
        self.with_transaction(doc, |tx, engine| {
            let styles = engine.registry.snapshot();
            if style_name != RESERVED_STYLE_NONE && !styles.exists(style_name) {
                warn!(style = style_name, "Applying unknown style");
            }
            StyleApplier::new(&styles, &engine.config).apply_style(
                tx,
                style_name,
                from,
                to,
                ApplyMode::Explicit,
            )?;
            Ok(())
        })
    }

    /// Re-derive every paragraph from the style it names
    pub fn reconcile(&self, doc: &Document) -> Result<(Document, EditBatch), EngineError> {
        self.with_transaction(doc, |tx, engine| {
            let styles = engine.registry.snapshot();
            StyleApplier::new(&styles, &engine.config).reconcile_document(tx)?;
            OverrideTracker::new(&styles).update_document(tx)?;
            Ok(())
        })
    }

    /// Re-apply a modified style to every paragraph naming it, keeping overrides
    pub fn restyle_document(
        &self,
        doc: &Document,
        style_name: &str,
    ) -> Result<(Document, EditBatch), EngineError> {
        self.with_transaction(doc, |tx, engine| {
            let styles = engine.registry.snapshot();
            let applier = StyleApplier::new(&styles, &engine.config);
            let tracker = OverrideTracker::new(&styles);

            let mut index = 0;
            let mut restyled = 0;
            while index < tx.doc().blocks.len() {
                let block = &tx.doc().blocks[index];
                let named = block.attrs.style_name.eq_ignore_ascii_case(style_name);
                if block.is_paragraph() && named {
                    let inserted = applier.reconcile_block(tx, index)?;
                    index += inserted;
                    tracker.update_override_flags(tx, style_name, index)?;
                    restyled += 1;
                }
                index += 1;
            }
            info!(style = style_name, paragraphs = restyled, "Restyled document");
            Ok(())
        })
    }

    /// Point every paragraph naming `old_name` at `new_name`
    pub fn rename_in_document(
        &self,
        doc: &Document,
        old_name: &str,
        new_name: &str,
    ) -> Result<(Document, EditBatch), EngineError> {
        self.with_transaction(doc, |tx, _| {
            for index in 0..tx.doc().blocks.len() {
                let block = &tx.doc().blocks[index];
                if !block.attrs.style_name.eq_ignore_ascii_case(old_name) {
                    continue;
                }
                let mut attrs = block.attrs.clone();
                attrs.style_name = new_name.to_string();
                let pos = tx.doc().block_start(index);
                tx.step(Step::SetBlockAttrs { pos, attrs })?;
            }
            Ok(())
        })
    }

    /// Recompute override flags on every paragraph
    pub fn update_override_flags(
        &self,
        doc: &Document,
    ) -> Result<(Document, EditBatch), EngineError> {
        self.with_transaction(doc, |tx, engine| {
            let styles = engine.registry.snapshot();
            OverrideTracker::new(&styles).update_document(tx)?;
            Ok(())
        })
    }

    /// Outline labels plus the step persisting counter flags, if needed
    pub fn render_outline(&self, doc: &Document) -> (Outline, Option<Step>) {
        let outline = render_outline(doc, &self.config);
        let step = outline.flags_step(doc);
        (outline, step)
    }

    /// Outline gaps and dangling style names
    pub fn check(&self, doc: &Document) -> Vec<Diagnostic> {
        let styles = self.registry.snapshot();
        let mut diagnostics = Vec::new();

        let mut previous = 0;
        for (index, block) in doc.blocks.iter().enumerate() {
            if block.is_paragraph()
                && block.attrs.has_named_style()
                && !styles.exists(&block.attrs.style_name)
            {
                diagnostics.push(Diagnostic::UnknownStyle {
                    index,
                    style_name: block.attrs.style_name.clone(),
                });
            }
            if let Some(level) = block.level() {
                if level > previous + 1 {
                    diagnostics.push(Diagnostic::OutlineGap { index, level });
                }
                previous = level;
            }
        }
        diagnostics
    }

    fn with_transaction(
        &self,
        doc: &Document,
        run: impl FnOnce(&mut Transaction, &Self) -> Result<(), EngineError>,
    ) -> Result<(Document, EditBatch), EngineError> {
        let mut tx = Transaction::new(doc.clone());
        run(&mut tx, self)?;
        Ok(tx.finish(BatchMeta::default()))
    }
}
