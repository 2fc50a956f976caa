//! # Document Change Observer
//!
//! Hook the host editor calls once per accepted edit batch. It classifies
//! the batch and runs the style passes over a working copy of the new
//! document, returning the corrective batch (if any) the host should apply
//! before rendering.
//!
//! ## Phases
//!
//! ```text
//! NeverRendered ──first batch──▶ InitialRenderDone ──next batch──▶ SteadyState
//!   (reconcile every paragraph)    (passes, no delete repair)       (all passes)
//! ```
//!
//! The phase is owned by the caller and threaded through every call.
//!
//! ## Pass order
//!
//! Passes run in a fixed order, each seeing the steps of the ones before:
//! 1. Override flags (batch changed the document)
//! 2. Delete repair (backspace/delete batch in steady state)
//! 3. Line bold on the caret paragraph (every batch)
//! 4. Next-line style (Enter at the end of a styled paragraph)
//!
//! A failing pass drops the working copy: no partial correction escapes.
//! The correction's metadata carries the caret mapped through the
//! corrective steps.

use crate::applier::StyleApplier;
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::hierarchy::HierarchyRepairer;
use crate::overrides::OverrideTracker;
use crate::registry::{StyleRegistry, StyleSnapshot};
use crate::style::compute_marks_for_style;
use serde::{Deserialize, Serialize};
use stylecascade_document::{
    BatchMeta, Document, EditBatch, Key, ParagraphAttrs, Step, Transaction,
};
use tracing::{debug, info, instrument};

/// Where the observer is in the document's lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderPhase {
    #[default]
    NeverRendered,
    InitialRenderDone,
    SteadyState,
}

impl RenderPhase {
    /// Phase after one more successfully handled batch
    pub fn advance(self) -> Self {
        match self {
            RenderPhase::NeverRendered => RenderPhase::InitialRenderDone,
            RenderPhase::InitialRenderDone | RenderPhase::SteadyState => RenderPhase::SteadyState,
        }
    }
}

/// Result of handling one batch
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOutcome {
    /// Phase to pass to the next call
    pub phase: RenderPhase,
    /// Corrective batch to apply on top of the observed one
    pub correction: Option<EditBatch>,
}

/// What a pass can see besides the working transaction
pub struct PassContext<'a> {
    pub phase: RenderPhase,
    pub prev: &'a Document,
    pub batch: &'a EditBatch,
    pub styles: &'a StyleSnapshot,
    pub config: &'a EngineConfig,
}

/// One stage of the per-batch pipeline
pub trait BatchPass: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Record corrective steps on `tx`; returns whether anything changed
    fn run(&self, cx: &PassContext, tx: &mut Transaction) -> Result<bool, EngineError>;
}

/// Recompute override flags on every paragraph
#[derive(Debug)]
pub struct OverridePass;

impl BatchPass for OverridePass {
    fn name(&self) -> &'static str {
        "override"
    }

    fn run(&self, cx: &PassContext, tx: &mut Transaction) -> Result<bool, EngineError> {
        if !cx.batch.doc_changed() {
            return Ok(false);
        }
        Ok(OverrideTracker::new(cx.styles).update_document(tx)?)
    }
}

/// Relevel paragraphs after a backspace/delete changed the outline
#[derive(Debug)]
pub struct DeleteRepairPass;

impl BatchPass for DeleteRepairPass {
    fn name(&self) -> &'static str {
        "delete-repair"
    }

    fn run(&self, cx: &PassContext, tx: &mut Transaction) -> Result<bool, EngineError> {
        if cx.phase != RenderPhase::SteadyState
            || !cx.config.repair_hierarchy
            || !cx.batch.doc_changed()
            || !cx.batch.is_deletion()
        {
            return Ok(false);
        }
        if cx.prev.outline_levels() == tx.doc().outline_levels() {
            return Ok(false);
        }
        let repairer = HierarchyRepairer::new(cx.styles, cx.config);
        Ok(repairer.repair_on_delete(tx, cx.batch.meta.caret_after)?)
    }
}

/// Re-apply first-word / first-sentence bold where the caret is
#[derive(Debug)]
pub struct LineStylePass;

impl BatchPass for LineStylePass {
    fn name(&self) -> &'static str {
        "line-style"
    }

    fn run(&self, cx: &PassContext, tx: &mut Transaction) -> Result<bool, EngineError> {
        let Some(index) = cx
            .batch
            .meta
            .caret_after
            .and_then(|caret| tx.doc().block_index_at(caret))
        else {
            return Ok(false);
        };
        Ok(StyleApplier::new(cx.styles, cx.config).apply_line_bold(tx, index)?)
    }
}

/// Style the paragraph created by Enter with the successor style
#[derive(Debug)]
pub struct NextLinePass;

impl BatchPass for NextLinePass {
    fn name(&self) -> &'static str {
        "next-line"
    }

    fn run(&self, cx: &PassContext, tx: &mut Transaction) -> Result<bool, EngineError> {
        let meta = &cx.batch.meta;
        let (Some(before), Some(after)) = (meta.caret_before, meta.caret_after) else {
            return Ok(false);
        };
        if meta.last_key != Some(Key::Enter) || after != before + 2 {
            return Ok(false);
        }

        let doc = tx.doc();
        let Some(index) = doc.block_index_at(after).filter(|&i| i > 0) else {
            return Ok(false);
        };
        let created = &doc.blocks[index];
        if !created.is_paragraph() || !created.content.is_empty() {
            return Ok(false);
        }

        let Some(origin) = cx.styles.get_by_name(&doc.blocks[index - 1].attrs.style_name) else {
            return Ok(false);
        };
        let Some(next_name) = origin
            .styles
            .next_line_style_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        else {
            return Ok(false);
        };

        let successor = cx.styles.get_by_name(next_name);
        let attrs = match successor.as_deref() {
            Some(style) => ParagraphAttrs {
                style_name: style.style_name.clone(),
                style_level: style.styles.outline_level(),
                indent: style.styles.indent_level(),
                align: style.styles.align.clone(),
                line_spacing: style.styles.line_spacing(),
                ..created.attrs.clone()
            },
            None => ParagraphAttrs::default(),
        };

        let pos = doc.block_start(index);
        let mut changed = tx.step(Step::SetBlockAttrs { pos, attrs })?;
        if cx.config.repair_hierarchy {
            changed |= HierarchyRepairer::new(cx.styles, cx.config).repair(tx, index)? > 0;
        }
        tx.set_stored_marks(compute_marks_for_style(successor.as_deref()));

        debug!(
            from = origin.style_name.as_str(),
            to = next_name,
            index,
            "Propagated next-line style"
        );
        Ok(changed)
    }
}

/// Runs the style passes for every accepted batch
#[derive(Debug)]
pub struct DocumentChangeObserver {
    registry: StyleRegistry,
    config: EngineConfig,
    passes: Vec<Box<dyn BatchPass>>,
}

impl DocumentChangeObserver {
    /// Observer with the standard pass order
    pub fn new(registry: StyleRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            passes: vec![
                Box::new(OverridePass),
                Box::new(DeleteRepairPass),
                Box::new(LineStylePass),
                Box::new(NextLinePass),
            ],
        }
    }

    /// Handle one accepted batch that turned `prev` into `next`
    #[instrument(skip_all, fields(phase = ?phase, steps = batch.steps.len()))]
    pub fn on_edit_batch(
        &self,
        phase: RenderPhase,
        prev: &Document,
        next: &Document,
        batch: &EditBatch,
    ) -> Result<ObserverOutcome, EngineError> {
        let styles = self.registry.snapshot();
        let mut tx = Transaction::new(next.clone());

        if phase == RenderPhase::NeverRendered {
            StyleApplier::new(&styles, &self.config).reconcile_document(&mut tx)?;
            info!(steps = tx.steps().len(), "Initial render reconciled");
        } else {
            let cx = PassContext {
                phase,
                prev,
                batch,
                styles: &styles,
                config: &self.config,
            };
            for pass in &self.passes {
                let changed = pass.run(&cx, &mut tx)?;
                if changed {
                    debug!(pass = pass.name(), "Pass produced corrections");
                }
            }
        }

        let correction = if tx.steps().is_empty() && tx.stored_marks().is_none() {
            None
        } else {
            // Carry the caret past any blocks the passes inserted ahead of it
            let meta = BatchMeta {
                last_key: None,
                caret_before: batch.meta.caret_after,
                caret_after: batch.meta.caret_after.map(|caret| tx.map_pos(caret)),
            };
            Some(tx.into_batch(meta))
        };

        Ok(ObserverOutcome {
            phase: phase.advance(),
            correction,
        })
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
