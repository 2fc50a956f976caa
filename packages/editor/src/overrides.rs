//! # Override Tracking
//!
//! Every style-governed mark records whether the user deviated from what
//! the paragraph's style prescribes. The flag is recomputed from scratch by
//! comparing the live mark against the style; it is never toggled
//! incrementally.
//!
//! Superscript and highlight marks carry a flag too, but it is never
//! computed here: those types are left exactly as they are.

use crate::registry::StyleSnapshot;
use crate::style::StyleDefinition;
use std::ops::Range;
use stylecascade_document::{Mark, MarkType, Step, StepError, Transaction};
use tracing::debug;

/// Mark types whose override flag is computed
pub const COMPARED_MARK_TYPES: [MarkType; 7] = [
    MarkType::Strong,
    MarkType::Em,
    MarkType::TextColor,
    MarkType::FontSize,
    MarkType::FontType,
    MarkType::Strike,
    MarkType::Underline,
];

/// Recomputes override flags against one registry snapshot
#[derive(Debug, Clone, Copy)]
pub struct OverrideTracker<'a> {
    styles: &'a StyleSnapshot,
}

impl<'a> OverrideTracker<'a> {
    pub fn new(styles: &'a StyleSnapshot) -> Self {
        Self { styles }
    }

    /// Recompute the flags of every compared mark in block `index`
    ///
    /// `style_name` is resolved against the snapshot; an unknown name
    /// prescribes nothing, so every compared mark ends up overridden.
    /// Returns whether any flag changed.
    pub fn update_override_flags(
        &self,
        tx: &mut Transaction,
        style_name: &str,
        index: usize,
    ) -> Result<bool, StepError> {
        let Some(block) = tx.doc().blocks.get(index) else {
            return Err(StepError::BlockNotFound(index));
        };
        if !block.is_paragraph() {
            return Ok(false);
        }

        let style = self.styles.get_by_name(style_name);
        let content_start = tx.doc().content_range(index).start;
        let bold_span = style
            .as_deref()
            .and_then(|s| s.styles.line_bold())
            .map(|rule| rule.span(&block.text()));

        let mut flips = Vec::new();
        for (from, to, run) in block.runs() {
            for mark in run.marks.iter() {
                if !COMPARED_MARK_TYPES.contains(&mark.mark_type) {
                    continue;
                }
                let Some(same) = prescribes(style.as_deref(), mark, from..to, bold_span.as_ref())
                else {
                    continue;
                };
                if mark.is_overridden() == same {
                    flips.push(Step::AddMark {
                        from: content_start + from,
                        to: content_start + to,
                        mark: mark.with_overridden(!same),
                    });
                }
            }
        }

        let mut changed = false;
        for step in flips {
            changed |= tx.step(step)?;
        }
        if changed {
            debug!(index, style = style_name, "Override flags updated");
        }
        Ok(changed)
    }

    /// Recompute flags for every paragraph in the document
    pub fn update_document(&self, tx: &mut Transaction) -> Result<bool, StepError> {
        let mut changed = false;
        for index in 0..tx.doc().blocks.len() {
            let style_name = tx.doc().blocks[index].attrs.style_name.clone();
            changed |= self.update_override_flags(tx, &style_name, index)?;
        }
        Ok(changed)
    }
}

/// Whether `style` prescribes `mark` over the run `run`
///
/// `None` means the answer is undecided: a run straddling the edge of the
/// line-bold span keeps its flag until the line-bold pass splits it.
fn prescribes(
    style: Option<&StyleDefinition>,
    mark: &Mark,
    run: Range<usize>,
    bold_span: Option<&Range<usize>>,
) -> Option<bool> {
    let Some(style) = style else {
        return Some(false);
    };

    if mark.mark_type == MarkType::Strong {
        if let Some(span) = bold_span {
            if run.start >= span.start && run.end <= span.end {
                return Some(true);
            }
            if run.end <= span.start || run.start >= span.end {
                return Some(false);
            }
            return None;
        }
    }

    Some(match style.styles.prescribed_mark(mark.mark_type) {
        Some(expected) => values_match(mark.mark_type, mark.value(), expected.value()),
        None => false,
    })
}

fn values_match(mark_type: MarkType, actual: Option<&str>, expected: Option<&str>) -> bool {
    match (actual, expected) {
        (None, None) => true,
        (Some(actual), Some(expected)) => match mark_type {
            MarkType::FontSize => same_size(actual, expected),
            _ => actual.trim().eq_ignore_ascii_case(expected.trim()),
        },
        _ => false,
    }
}

fn same_size(a: &str, b: &str) -> bool {
    let parse = |v: &str| {
        v.trim()
            .trim_end_matches("pt")
            .trim_end_matches("px")
            .trim()
            .parse::<f64>()
            .ok()
    };
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => a.trim() == b.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StyleRegistry;
    use crate::style::StyleProps;
    use stylecascade_document::{Block, Document, TextRun};

    fn registry() -> StyleRegistry {
        StyleRegistry::with_styles(vec![StyleDefinition::new(
            "Body",
            StyleProps {
                em: true,
                font_size: Some("12".into()),
                color: Some("#FF0000".into()),
                ..Default::default()
            },
        )])
        .unwrap()
    }

    fn body(runs: Vec<TextRun>) -> Document {
        Document::new(vec![Block::styled("Body", "").with_runs(runs)])
    }

    fn marks(doc: &Document) -> Vec<Mark> {
        doc.blocks[0].content[0].marks.iter().cloned().collect()
    }

    #[test]
    fn test_matching_marks_are_not_overridden() {
        let registry = registry();
        let snapshot = registry.snapshot();
        let doc = body(vec![TextRun::marked(
            "Text",
            [
                Mark::new(MarkType::Em),
                Mark::with_value(MarkType::FontSize, "12pt"),
                Mark::with_value(MarkType::TextColor, "#ff0000"),
            ],
        )]);

        let mut tx = Transaction::new(doc);
        let changed = OverrideTracker::new(&snapshot)
            .update_override_flags(&mut tx, "Body", 0)
            .unwrap();

        assert!(!changed);
        assert!(tx.steps().is_empty());
    }

    #[test]
    fn test_loaded_marks_keep_one_mark_per_type() {
        let registry = registry();
        let snapshot = registry.snapshot();
        let doc = Document::from_json(
            r#"{ "blocks": [{
                "attrs": { "styleName": "Body" },
                "content": [{ "text": "Text", "marks": [
                    { "type": "fontSize", "attrs": { "value": "18" } },
                    { "type": "em" },
                    { "type": "strong", "attrs": { "overridden": true } }
                ] }]
            }] }"#,
        )
        .unwrap();

        let mut tx = Transaction::new(doc);
        OverrideTracker::new(&snapshot).update_document(&mut tx).unwrap();

        let marks = marks(tx.doc());
        let types: Vec<_> = marks.iter().map(|m| m.mark_type).collect();
        assert_eq!(types, vec![MarkType::Strong, MarkType::Em, MarkType::FontSize]);
        assert!(marks[0].is_overridden());
        assert!(!marks[1].is_overridden());
        assert!(marks[2].is_overridden());
    }

    #[test]
    fn test_deviation_sets_flag_and_match_clears_it() {
        let registry = registry();
        let snapshot = registry.snapshot();
        let tracker = OverrideTracker::new(&snapshot);
        let doc = body(vec![TextRun::marked(
            "Text",
            [Mark::with_value(MarkType::FontSize, "18")],
        )]);

        let mut tx = Transaction::new(doc);
        assert!(tracker.update_override_flags(&mut tx, "Body", 0).unwrap());
        assert!(marks(tx.doc())[0].is_overridden());

        // Put the prescribed value back
        let mut doc = tx.into_document();
        doc.blocks[0].add_mark(0, 4, &Mark::with_value(MarkType::FontSize, "12").with_overridden(true));

        let mut tx = Transaction::new(doc);
        assert!(tracker.update_override_flags(&mut tx, "Body", 0).unwrap());
        assert!(!marks(tx.doc())[0].is_overridden());
    }

    #[test]
    fn test_unknown_style_overrides_everything_compared() {
        let registry = registry();
        let snapshot = registry.snapshot();
        let doc = body(vec![TextRun::marked(
            "Text",
            [Mark::new(MarkType::Em), Mark::new(MarkType::Super)],
        )]);

        let mut tx = Transaction::new(doc);
        OverrideTracker::new(&snapshot)
            .update_override_flags(&mut tx, "Missing", 0)
            .unwrap();

        let marks = marks(tx.doc());
        let em = marks.iter().find(|m| m.mark_type == MarkType::Em).unwrap();
        let sup = marks.iter().find(|m| m.mark_type == MarkType::Super).unwrap();
        assert!(em.is_overridden());
        assert!(!sup.is_overridden());
    }

    #[test]
    fn test_bold_inside_line_bold_span_is_prescribed() {
        let registry = StyleRegistry::with_styles(vec![StyleDefinition::new(
            "Lead",
            StyleProps {
                bold_partial: true,
                ..Default::default()
            },
        )])
        .unwrap();
        let snapshot = registry.snapshot();

        let block = Block::styled("Lead", "").with_runs(vec![
            TextRun::marked("Hello", [Mark::strong()]),
            TextRun::plain(" big "),
            TextRun::marked("world", [Mark::strong()]),
        ]);

        let mut tx = Transaction::new(Document::new(vec![block]));
        OverrideTracker::new(&snapshot)
            .update_override_flags(&mut tx, "Lead", 0)
            .unwrap();

        let block = &tx.doc().blocks[0];
        let first = block.content[0].marks.get(MarkType::Strong).unwrap();
        let last = block.content[2].marks.get(MarkType::Strong).unwrap();
        assert!(!first.is_overridden());
        assert!(last.is_overridden());
    }

    #[test]
    fn test_links_are_ignored() {
        let registry = registry();
        let snapshot = registry.snapshot();
        let doc = body(vec![TextRun::marked("Text", [Mark::link("https://a.b")])]);

        let mut tx = Transaction::new(doc);
        let changed = OverrideTracker::new(&snapshot)
            .update_document(&mut tx)
            .unwrap();
        assert!(!changed);
    }
}
