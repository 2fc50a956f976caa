//! # Hierarchy Repair
//!
//! Keeps the outline contiguous: scanning numbered paragraphs top to
//! bottom, each level is at most one deeper than the one before it, and
//! the first numbered paragraph is level 1. Climbing back up by any amount
//! is always allowed.
//!
//! Two repairs exist:
//! - When a paragraph gains a level, empty `"None"` filler paragraphs are
//!   inserted for the skipped levels.
//! - When a deletion leaves a paragraph too deep, paragraphs from the caret
//!   onward are releveled to close the gap.

use crate::applier::StyleApplier;
use crate::config::EngineConfig;
use crate::registry::StyleSnapshot;
use std::ops::Range;
use stylecascade_document::{Block, Step, StepError, Transaction};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct HierarchyRepairer<'a> {
    styles: &'a StyleSnapshot,
    config: &'a EngineConfig,
}

impl<'a> HierarchyRepairer<'a> {
    pub fn new(styles: &'a StyleSnapshot, config: &'a EngineConfig) -> Self {
        Self { styles, config }
    }

    /// Insert fillers before block `index`, which now sits at `level`
    ///
    /// Returns the number of fillers inserted; block `index` moves down by
    /// that many places.
    pub fn repair_before(
        &self,
        tx: &mut Transaction,
        index: usize,
        level: u32,
    ) -> Result<usize, StepError> {
        let missing = match tx.doc().previous_level(index) {
            None => 1..level,
            Some(previous) => previous + 1..level,
        };
        let pos = tx.doc().block_start(index);
        self.insert_fillers(tx, pos, missing)
    }

    /// Insert fillers after block `last` to reach the next numbered paragraph
    pub fn repair_after(&self, tx: &mut Transaction, last: usize) -> Result<usize, StepError> {
        let doc = tx.doc();
        let Some((_, next)) = doc.next_numbered(last) else {
            return Ok(0);
        };
        let anchor = doc.blocks[..=last.min(doc.blocks.len().saturating_sub(1))]
            .iter()
            .rev()
            .find_map(Block::level);

        let missing = match anchor {
            None => 1..next,
            Some(anchor) => anchor + 1..next,
        };
        let pos = doc.block_range(last).end;
        self.insert_fillers(tx, pos, missing)
    }

    /// Close gaps on both sides of block `index`
    pub fn repair(&self, tx: &mut Transaction, index: usize) -> Result<usize, StepError> {
        let Some(level) = tx.doc().blocks.get(index).and_then(Block::level) else {
            return Ok(0);
        };
        let before = self.repair_before(tx, index, level)?;
        let after = self.repair_after(tx, index + before)?;
        Ok(before + after)
    }

    /// Relevel paragraphs after a deletion so no level climbs by more than one
    ///
    /// Starts at the block holding `caret` (the top of the document when
    /// unknown). A numbered paragraph sitting too deep is raised to one below
    /// its predecessor, and the same shift applies to the paragraphs nested
    /// under it, so siblings stay siblings. The shift ends at the first
    /// paragraph no deeper than the raised one originally was. A releveled
    /// styled paragraph takes the first registered style of its new level
    /// when one exists; fillers and paragraphs with no such style only
    /// change level.
    pub fn repair_on_delete(
        &self,
        tx: &mut Transaction,
        caret: Option<usize>,
    ) -> Result<bool, StepError> {
        let doc = tx.doc();
        let start = caret.and_then(|pos| doc.block_index_at(pos)).unwrap_or(0);
        let mut previous = doc.previous_level(start).unwrap_or(0);

        // (original level of the raised paragraph, levels removed)
        let mut shift: Option<(u32, u32)> = None;
        let mut relevels = Vec::new();
        for (index, block) in doc.blocks.iter().enumerate().skip(start) {
            let Some(level) = block.level() else {
                continue;
            };
            let shifted = match shift {
                Some((root, delta)) if level > root => level - delta,
                _ if level > previous + 1 => {
                    let delta = level - (previous + 1);
                    shift = Some((level, delta));
                    level - delta
                }
                _ => {
                    shift = None;
                    level
                }
            };
            let target = shifted.min(previous + 1).max(1);
            if target != level {
                relevels.push((index, target));
            }
            previous = target;
        }

        let applier = StyleApplier::new(self.styles, self.config).without_repair();
        for &(index, level) in &relevels {
            let block = &tx.doc().blocks[index];
            let mut attrs = block.attrs.clone();
            let styled = !block.is_filler() && self.styles.exists(&attrs.style_name);
            let replacement = if styled {
                self.styles.get_by_level(level)
            } else {
                None
            };

            attrs.style_level = Some(level);
            if let Some(style) = &replacement {
                attrs.style_name = style.style_name.clone();
            }
            let pos = tx.doc().block_start(index);
            tx.step(Step::SetBlockAttrs { pos, attrs })?;

            if replacement.is_some() {
                applier.reconcile_block(tx, index)?;
            }
            debug!(index, level, "Releveled paragraph after deletion");
        }

        Ok(!relevels.is_empty())
    }

    fn insert_fillers(
        &self,
        tx: &mut Transaction,
        pos: usize,
        levels: Range<u32>,
    ) -> Result<usize, StepError> {
        let levels = levels.start.max(1)..levels.end;
        let mut pos = pos;
        let mut count = 0;
        for level in levels.clone() {
            let filler = Block::filler(level);
            let size = filler.node_size();
            tx.step(Step::InsertBlock { pos, block: filler })?;
            pos += size;
            count += 1;
        }
        if count > 0 {
            debug!(from = levels.start, to = levels.end - 1, "Inserted outline fillers");
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StyleRegistry;
    use crate::style::{StyleDefinition, StyleProps};
    use stylecascade_document::Document;

    fn heading(level: u32) -> StyleDefinition {
        StyleDefinition::new(
            format!("Heading{level}"),
            StyleProps {
                has_numbering: true,
                style_level: Some(level),
                ..Default::default()
            },
        )
    }

    fn numbered(level: u32, text: &str) -> Block {
        Block::styled(format!("Heading{level}"), text).with_level(level)
    }

    fn levels(doc: &Document) -> Vec<Option<u32>> {
        doc.blocks.iter().map(Block::level).collect()
    }

    #[test]
    fn test_fillers_before_first_numbered_paragraph() {
        let registry = StyleRegistry::with_styles(vec![heading(1), heading(3)]).unwrap();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();

        let mut tx = Transaction::new(Document::new(vec![numbered(3, "Deep")]));
        let inserted = HierarchyRepairer::new(&snapshot, &config)
            .repair_before(&mut tx, 0, 3)
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(levels(tx.doc()), vec![Some(1), Some(2), Some(3)]);
        assert!(tx.doc().blocks[0].is_filler());
        assert!(tx.doc().blocks[1].is_filler());
    }

    #[test]
    fn test_no_fillers_for_small_steps_or_climbing_back() {
        let registry = StyleRegistry::new();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();
        let repairer = HierarchyRepairer::new(&snapshot, &config);

        let doc = Document::new(vec![
            numbered(1, "A"),
            numbered(2, "B"),
            numbered(3, "C"),
            numbered(1, "D"),
        ]);
        let mut tx = Transaction::new(doc);
        for index in 0..4 {
            repairer.repair(&mut tx, index).unwrap();
        }
        assert!(tx.steps().is_empty());
    }

    #[test]
    fn test_fillers_after_range_close_gap_to_next() {
        let registry = StyleRegistry::new();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();

        let doc = Document::new(vec![
            numbered(1, "A"),
            Block::paragraph("text"),
            numbered(4, "D"),
        ]);
        let mut tx = Transaction::new(doc);
        let inserted = HierarchyRepairer::new(&snapshot, &config)
            .repair_after(&mut tx, 1)
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(
            levels(tx.doc()),
            vec![Some(1), None, Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn test_fillers_reach_levels_beyond_counter_limit() {
        let registry = StyleRegistry::new();
        let snapshot = registry.snapshot();
        let config = EngineConfig {
            max_outline_level: 2,
            ..Default::default()
        };

        let mut tx = Transaction::new(Document::new(vec![numbered(5, "Deep")]));
        let inserted = HierarchyRepairer::new(&snapshot, &config)
            .repair_before(&mut tx, 0, 5)
            .unwrap();
        assert_eq!(inserted, 4);
        assert_eq!(tx.doc().find_outline_gap(), None);
    }

    #[test]
    fn test_delete_relevels_and_restyles() {
        let registry = StyleRegistry::with_styles(vec![heading(1), heading(2)]).unwrap();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();

        // Heading1 was deleted; two Heading2 paragraphs remain
        let doc = Document::new(vec![numbered(2, "B"), numbered(2, "C")]);
        let mut tx = Transaction::new(doc);
        let changed = HierarchyRepairer::new(&snapshot, &config)
            .repair_on_delete(&mut tx, Some(1))
            .unwrap();

        assert!(changed);
        assert_eq!(levels(tx.doc()), vec![Some(1), Some(2)]);
        assert_eq!(tx.doc().blocks[0].attrs.style_name, "Heading1");
        assert_eq!(tx.doc().blocks[1].attrs.style_name, "Heading2");
    }

    #[test]
    fn test_delete_keeps_nested_siblings_together() {
        let registry =
            StyleRegistry::with_styles(vec![heading(1), heading(2), heading(3)]).unwrap();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();

        // Heading1 was deleted; B has two children C and D
        let doc = Document::new(vec![
            numbered(2, "B"),
            numbered(3, "C"),
            numbered(3, "D"),
            numbered(2, "E"),
        ]);
        let mut tx = Transaction::new(doc);
        HierarchyRepairer::new(&snapshot, &config)
            .repair_on_delete(&mut tx, Some(1))
            .unwrap();

        assert_eq!(levels(tx.doc()), vec![Some(1), Some(2), Some(2), Some(2)]);
        assert_eq!(tx.doc().blocks[1].attrs.style_name, "Heading2");
        assert_eq!(tx.doc().blocks[2].attrs.style_name, "Heading2");
    }

    #[test]
    fn test_delete_cascades_through_deeper_levels() {
        let registry = StyleRegistry::new();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();

        let doc = Document::new(vec![
            numbered(1, "A"),
            numbered(3, "C"),
            numbered(4, "D"),
            numbered(2, "E"),
        ]);
        let mut tx = Transaction::new(doc);
        HierarchyRepairer::new(&snapshot, &config)
            .repair_on_delete(&mut tx, Some(2))
            .unwrap();

        assert_eq!(
            levels(tx.doc()),
            vec![Some(1), Some(2), Some(3), Some(2)]
        );
        assert_eq!(tx.doc().find_outline_gap(), None);
    }
}
