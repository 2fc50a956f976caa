//! # Style Application
//!
//! Realizes a named style on a range of paragraphs as a sequence of steps
//! recorded on a [`Transaction`].
//!
//! ## Per-paragraph algorithm
//!
//! 1. Strip marks: every style-owned mark in explicit mode, only marks
//!    that were not overridden in reconcile mode. Links always survive.
//! 2. Set paragraph attributes from the style.
//! 3. Add the style's marks over non-empty text, in [`StyleProperty`] order.
//!    Reconcile mode leaves runs that hold an overridden mark of the same
//!    type alone.
//! 4. Apply the line-bold rule (first word or first sentence).
//! 5. Close any outline gap before the paragraph.
//!
//! After the whole range is done, the gap between the range and the next
//! numbered paragraph is closed as well.
//!
//! [`StyleProperty`]: crate::style::StyleProperty

use crate::config::EngineConfig;
use crate::hierarchy::HierarchyRepairer;
use crate::registry::StyleSnapshot;
use crate::style::{LineBold, StyleDefinition};
use serde::{Deserialize, Serialize};
use stylecascade_document::{
    Mark, MarkFilter, MarkType, ParagraphAttrs, Step, StepError, Transaction,
    RESERVED_STYLE_NONE,
};
use tracing::{debug, instrument};

/// How existing formatting is treated when a style is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyMode {
    /// The user picked a style: manual formatting is discarded
    Explicit,
    /// Re-derive formatting from the stored style name, keeping overrides
    Reconcile,
}

#[derive(Debug, Clone, Copy)]
pub struct StyleApplier<'a> {
    styles: &'a StyleSnapshot,
    config: &'a EngineConfig,
    repair: bool,
}

impl<'a> StyleApplier<'a> {
    pub fn new(styles: &'a StyleSnapshot, config: &'a EngineConfig) -> Self {
        Self {
            styles,
            config,
            repair: config.repair_hierarchy,
        }
    }

    /// Same applier, but never inserting fillers
    pub fn without_repair(mut self) -> Self {
        self.repair = false;
        self
    }

    /// Apply `style_name` to every paragraph touched by `[from, to]`
    #[instrument(level = "debug", skip(self, tx))]
    pub fn apply_style(
        &self,
        tx: &mut Transaction,
        style_name: &str,
        from: usize,
        to: usize,
        mode: ApplyMode,
    ) -> Result<(), StepError> {
        let size = tx.doc().content_size();
        if from > size || to > size {
            return Err(StepError::PositionOutOfRange {
                pos: from.max(to),
                size,
            });
        }

        let range = tx.doc().blocks_between(from, to);
        if range.is_empty() {
            return Ok(());
        }

        // Fillers are only restyled when targeted on their own
        let single = range.len() == 1;
        let mut index = range.start;
        let mut end = range.end;
        while index < end {
            if !single && tx.doc().blocks[index].is_filler() {
                index += 1;
                continue;
            }
            let inserted = self.apply_to_block(tx, index, style_name, mode)?;
            index += inserted + 1;
            end += inserted;
        }

        if self.repair {
            self.repairer().repair_after(tx, end - 1)?;
        }
        Ok(())
    }

    /// Re-derive block `index` from the style it names
    ///
    /// Returns the number of fillers inserted before the block.
    pub fn reconcile_block(&self, tx: &mut Transaction, index: usize) -> Result<usize, StepError> {
        let style_name = match tx.doc().blocks.get(index) {
            Some(block) => block.attrs.style_name.clone(),
            None => return Err(StepError::BlockNotFound(index)),
        };
        self.apply_to_block(tx, index, &style_name, ApplyMode::Reconcile)
    }

    /// Reconcile every paragraph in the document
    pub fn reconcile_document(&self, tx: &mut Transaction) -> Result<(), StepError> {
        let mut index = 0;
        while index < tx.doc().blocks.len() {
            index += self.reconcile_block(tx, index)? + 1;
        }
        Ok(())
    }

    /// Re-run the line-bold rule of the style block `index` names
    pub fn apply_line_bold(&self, tx: &mut Transaction, index: usize) -> Result<bool, StepError> {
        let Some(block) = tx.doc().blocks.get(index) else {
            return Err(StepError::BlockNotFound(index));
        };
        if !block.is_paragraph() {
            return Ok(false);
        }
        let rule = self
            .styles
            .get_by_name(&block.attrs.style_name)
            .and_then(|style| style.styles.line_bold());
        match rule {
            Some(rule) => self.apply_line_bold_rule(tx, index, rule),
            None => Ok(false),
        }
    }

    fn apply_to_block(
        &self,
        tx: &mut Transaction,
        index: usize,
        style_name: &str,
        mode: ApplyMode,
    ) -> Result<usize, StepError> {
        let Some(block) = tx.doc().blocks.get(index) else {
            return Err(StepError::BlockNotFound(index));
        };
        if !block.is_paragraph() {
            return Ok(0);
        }

        // Unknown names resolve to "None" (strip only) for explicit apply;
        // reconcile leaves the paragraph and its unflagged marks untouched.
        let style = self.styles.get_by_name(style_name);
        if style.is_none() && mode == ApplyMode::Reconcile {
            return Ok(0);
        }
        let current = block.attrs.clone();

        // 1. Strip
        let content = tx.doc().content_range(index);
        if !content.is_empty() {
            let filter = match mode {
                ApplyMode::Explicit => MarkFilter::StyleOwned,
                ApplyMode::Reconcile => MarkFilter::NotOverridden,
            };
            tx.step(Step::RemoveMark {
                from: content.start,
                to: content.end,
                filter,
            })?;
        }

        // 2. Attributes
        let attrs = match style.as_deref() {
            Some(style) => attrs_for_style(style),
            None => ParagraphAttrs {
                style_name: canonical_name(style_name),
                style_level: None,
                ..current
            },
        };
        let level = attrs.style_level;
        let pos = tx.doc().block_start(index);
        tx.step(Step::SetBlockAttrs { pos, attrs })?;

        // 3-4. Marks
        if let Some(style) = style.as_deref() {
            if !content.is_empty() {
                for mark in style.styles.prescribed_marks() {
                    match mode {
                        ApplyMode::Explicit => {
                            tx.step(Step::AddMark {
                                from: content.start,
                                to: content.end,
                                mark,
                            })?;
                        }
                        ApplyMode::Reconcile => self.add_where_not_overridden(tx, index, mark)?,
                    }
                }
                if let Some(rule) = style.styles.line_bold() {
                    self.apply_line_bold_rule(tx, index, rule)?;
                }
            }
        }

        // 5. Hierarchy
        let inserted = match level {
            Some(level) if self.repair => self.repairer().repair_before(tx, index, level)?,
            _ => 0,
        };

        debug!(index, style = style_name, ?mode, inserted, "Applied style to paragraph");
        Ok(inserted)
    }

    fn add_where_not_overridden(
        &self,
        tx: &mut Transaction,
        index: usize,
        mark: Mark,
    ) -> Result<(), StepError> {
        let content_start = tx.doc().content_range(index).start;
        let targets: Vec<_> = tx.doc().blocks[index]
            .runs()
            .filter(|(_, _, run)| {
                !run.marks
                    .get(mark.mark_type)
                    .is_some_and(Mark::is_overridden)
            })
            .map(|(from, to, _)| (content_start + from, content_start + to))
            .collect();

        for (from, to) in targets {
            tx.step(Step::AddMark {
                from,
                to,
                mark: mark.clone(),
            })?;
        }
        Ok(())
    }

    fn apply_line_bold_rule(
        &self,
        tx: &mut Transaction,
        index: usize,
        rule: LineBold,
    ) -> Result<bool, StepError> {
        let span = rule.span(&tx.doc().blocks[index].text());
        let content = tx.doc().content_range(index);
        if content.is_empty() {
            return Ok(false);
        }

        let filter = MarkFilter::NotOverriddenOfType(MarkType::Strong);
        let bold_from = content.start + span.start;
        let bold_to = content.start + span.end;

        let mut changed = false;
        if bold_from > content.start {
            changed |= tx.step(Step::RemoveMark {
                from: content.start,
                to: bold_from,
                filter,
            })?;
        }
        if bold_to < content.end {
            changed |= tx.step(Step::RemoveMark {
                from: bold_to,
                to: content.end,
                filter,
            })?;
        }
        if bold_from < bold_to {
            changed |= tx.step(Step::AddMark {
                from: bold_from,
                to: bold_to,
                mark: Mark::strong(),
            })?;
        }
        Ok(changed)
    }

    fn repairer(&self) -> HierarchyRepairer<'a> {
        HierarchyRepairer::new(self.styles, self.config)
    }
}

/// Paragraph attributes a style prescribes
pub fn attrs_for_style(style: &StyleDefinition) -> ParagraphAttrs {
    let props = &style.styles;
    ParagraphAttrs {
        style_name: style.style_name.clone(),
        style_level: props.outline_level(),
        indent: props.indent_level(),
        align: props.align.clone(),
        line_spacing: props.line_spacing(),
        paragraph_spacing_before: props.paragraph_spacing_before.clone(),
        paragraph_spacing_after: props.paragraph_spacing_after.clone(),
    }
}

fn canonical_name(style_name: &str) -> String {
    if style_name.trim().eq_ignore_ascii_case(RESERVED_STYLE_NONE) {
        RESERVED_STYLE_NONE.to_string()
    } else {
        style_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StyleRegistry;
    use crate::style::StyleProps;
    use stylecascade_document::{Block, Document, TextRun};

    fn registry() -> StyleRegistry {
        StyleRegistry::with_styles(vec![
            StyleDefinition::new(
                "Heading1",
                StyleProps {
                    strong: true,
                    font_size: Some("16".into()),
                    has_numbering: true,
                    style_level: Some(1),
                    align: Some("left".into()),
                    line_height: Some("Single".into()),
                    ..Default::default()
                },
            ),
            StyleDefinition::new(
                "Quote",
                StyleProps {
                    em: true,
                    indent: Some("2".into()),
                    ..Default::default()
                },
            ),
        ])
        .unwrap()
    }

    fn apply(doc: Document, name: &str, mode: ApplyMode) -> Document {
        let registry = registry();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();
        let mut tx = Transaction::new(doc);
        let size = tx.doc().content_size();
        StyleApplier::new(&snapshot, &config)
            .apply_style(&mut tx, name, 0, size, mode)
            .unwrap();
        tx.into_document()
    }

    #[test]
    fn test_explicit_apply_sets_attrs_and_marks() {
        let doc = apply(
            Document::new(vec![Block::paragraph("Title")]),
            "Heading1",
            ApplyMode::Explicit,
        );

        let block = &doc.blocks[0];
        assert_eq!(block.attrs.style_name, "Heading1");
        assert_eq!(block.attrs.style_level, Some(1));
        assert_eq!(block.attrs.line_spacing.as_deref(), Some("125%"));
        assert_eq!(block.attrs.align.as_deref(), Some("left"));

        let marks = &block.content[0].marks;
        assert!(marks.contains_type(MarkType::Strong));
        assert_eq!(marks.get(MarkType::FontSize).unwrap().value(), Some("16"));
    }

    #[test]
    fn test_explicit_apply_strips_manual_formatting_but_keeps_links() {
        let block = Block::paragraph("").with_runs(vec![TextRun::marked(
            "Text",
            [
                Mark::new(MarkType::Underline).with_overridden(true),
                Mark::link("https://example.com"),
            ],
        )]);

        let doc = apply(Document::new(vec![block]), "Quote", ApplyMode::Explicit);

        let marks = &doc.blocks[0].content[0].marks;
        assert!(!marks.contains_type(MarkType::Underline));
        assert!(marks.contains_type(MarkType::Link));
        assert!(marks.contains_type(MarkType::Em));
        assert_eq!(doc.blocks[0].attrs.indent, Some(2));
    }

    #[test]
    fn test_reconcile_keeps_overridden_marks() {
        let block = Block::styled("Heading1", "").with_runs(vec![TextRun::marked(
            "Text",
            [Mark::with_value(MarkType::FontSize, "30").with_overridden(true)],
        )]);

        let doc = apply(Document::new(vec![block]), "Heading1", ApplyMode::Reconcile);

        let marks = &doc.blocks[0].content[0].marks;
        assert_eq!(marks.get(MarkType::FontSize).unwrap().value(), Some("30"));
        assert!(marks.contains_type(MarkType::Strong));
    }

    #[test]
    fn test_empty_paragraph_gets_attrs_only() {
        let doc = apply(
            Document::new(vec![Block::paragraph("")]),
            "Heading1",
            ApplyMode::Explicit,
        );
        assert_eq!(doc.blocks[0].attrs.style_level, Some(1));
        assert!(doc.blocks[0].content.is_empty());
    }

    #[test]
    fn test_clear_style_with_reserved_name() {
        let styled = apply(
            Document::new(vec![Block::paragraph("Title")]),
            "Heading1",
            ApplyMode::Explicit,
        );
        let cleared = apply(styled, "none", ApplyMode::Explicit);

        let block = &cleared.blocks[0];
        assert_eq!(block.attrs.style_name, RESERVED_STYLE_NONE);
        assert_eq!(block.attrs.style_level, None);
        assert!(block.content[0].marks.is_empty());
    }

    #[test]
    fn test_reconcile_of_unknown_style_is_a_no_op() {
        let block = Block::styled("Gone", "").with_runs(vec![TextRun::marked(
            "Text",
            [Mark::new(MarkType::Super)],
        )]);
        let doc = Document::new(vec![block]);

        assert_eq!(apply(doc.clone(), "Gone", ApplyMode::Reconcile), doc);
    }

    #[test]
    fn test_explicit_apply_of_unknown_style_strips_only() {
        let block = Block::paragraph("").with_runs(vec![TextRun::marked(
            "Text",
            [Mark::new(MarkType::Super), Mark::link("https://example.com")],
        )]);

        let doc = apply(Document::new(vec![block]), "Gone", ApplyMode::Explicit);

        let block = &doc.blocks[0];
        assert_eq!(block.attrs.style_name, "Gone");
        assert_eq!(block.attrs.style_level, None);
        let marks = &block.content[0].marks;
        assert_eq!(marks.len(), 1);
        assert!(marks.contains_type(MarkType::Link));
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let doc = Document::new(vec![
            Block::paragraph("First paragraph"),
            Block::paragraph("Second"),
        ]);

        let once = apply(doc, "Heading1", ApplyMode::Explicit);
        let twice = apply(once.clone(), "Heading1", ApplyMode::Explicit);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_line_bold_pass_is_quiet_when_already_applied() {
        let registry = StyleRegistry::with_styles(vec![StyleDefinition::new(
            "Lead",
            StyleProps {
                bold_partial: true,
                ..Default::default()
            },
        )])
        .unwrap();
        let snapshot = registry.snapshot();
        let config = EngineConfig::default();
        let applier = StyleApplier::new(&snapshot, &config);

        let mut tx = Transaction::new(Document::new(vec![Block::paragraph("Hello world")]));
        applier.apply_style(&mut tx, "Lead", 1, 1, ApplyMode::Explicit).unwrap();

        let mut again = Transaction::new(tx.into_document());
        assert!(!applier.apply_line_bold(&mut again, 0).unwrap());
        assert!(again.steps().is_empty());
    }
}
