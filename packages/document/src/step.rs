//! # Edit Steps
//!
//! Atomic, position-addressed edits on a [`Document`]. An edit batch is an
//! ordered list of steps; each step is computed against the document as
//! left by the steps before it, so replaying a batch in order on the
//! original document reproduces the result.
//!
//! ## Step Semantics
//!
//! ### DeleteRange
//! - Both ends on block boundaries: removes the whole blocks in between
//! - Both ends inside text: removes the text and joins the end blocks,
//!   keeping the attributes of the first one
//!
//! ### SplitBlock
//! - In the middle of a block: the new block copies kind and attributes
//! - At the end of a block: the new block is a plain paragraph
//!
//! ### AddMark
//! - Replaces any mark of the same type over the range
//! - Clipped to the content of every block the range touches

use crate::document::{DocAttrs, Document};
use crate::error::StepError;
use crate::mark::{Mark, MarkSet, MarkType};
use crate::node::{Block, ParagraphAttrs};
use serde::{Deserialize, Serialize};

/// Selects which marks a [`Step::RemoveMark`] removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkFilter {
    /// Every mark, hyperlinks included
    All,
    /// Every mark a style may own; hyperlinks survive
    StyleOwned,
    /// Style-owned marks that were not manually overridden
    NotOverridden,
    /// Marks of one type
    OfType(MarkType),
    /// Marks of one type that were not manually overridden
    NotOverriddenOfType(MarkType),
}

impl MarkFilter {
    /// Whether `mark` is removed by this filter
    pub fn matches(&self, mark: &Mark) -> bool {
        match self {
            MarkFilter::All => true,
            MarkFilter::StyleOwned => mark.mark_type.is_style_governed(),
            MarkFilter::NotOverridden => {
                mark.mark_type.is_style_governed() && !mark.is_overridden()
            }
            MarkFilter::OfType(mark_type) => mark.mark_type == *mark_type,
            MarkFilter::NotOverriddenOfType(mark_type) => {
                mark.mark_type == *mark_type && !mark.is_overridden()
            }
        }
    }
}

/// How a step moved positions: `deleted` units at `pos` replaced by `inserted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pub pos: usize,
    pub deleted: usize,
    pub inserted: usize,
}

impl StepMap {
    /// Where `pos` ends up after the step
    ///
    /// Positions inside a deleted range collapse to its end; a position at
    /// an insertion point moves past the inserted content.
    pub fn map(&self, pos: usize) -> usize {
        if pos < self.pos {
            pos
        } else if pos < self.pos + self.deleted {
            self.pos + self.inserted
        } else {
            pos - self.deleted + self.inserted
        }
    }
}

/// Position-addressed document edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    /// Insert text at a text position
    InsertText {
        pos: usize,
        text: String,
        #[serde(default)]
        marks: MarkSet,
    },

    /// Delete a range (see module docs)
    DeleteRange { from: usize, to: usize },

    /// Split the block at a text position
    SplitBlock { pos: usize },

    /// Insert a block at a block boundary
    InsertBlock { pos: usize, block: Block },

    /// Remove the block starting at `pos`
    RemoveBlock { pos: usize },

    /// Replace the attributes of the block starting at `pos`
    SetBlockAttrs { pos: usize, attrs: ParagraphAttrs },

    /// Add a mark over a range
    AddMark { from: usize, to: usize, mark: Mark },

    /// Remove marks matching a filter over a range
    RemoveMark {
        from: usize,
        to: usize,
        filter: MarkFilter,
    },

    /// Replace document-level attributes
    SetDocAttrs { attrs: DocAttrs },
}

impl Step {
    /// Apply step to the document with validation
    ///
    /// Returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, StepError> {
        // Validate first
        self.validate(doc)?;

        match self {
            Step::InsertText { pos, text, marks } => Self::apply_insert_text(doc, *pos, text, marks),
            Step::DeleteRange { from, to } => Self::apply_delete(doc, *from, *to),
            Step::SplitBlock { pos } => Self::apply_split(doc, *pos),
            Step::InsertBlock { pos, block } => {
                let index = doc.boundary_index(*pos)?;
                doc.blocks.insert(index, block.clone());
                Ok(true)
            }
            Step::RemoveBlock { pos } => {
                let index = doc.boundary_index(*pos)?;
                doc.blocks.remove(index);
                Ok(true)
            }
            Step::SetBlockAttrs { pos, attrs } => {
                let index = doc.boundary_index(*pos)?;
                let block = &mut doc.blocks[index];
                if block.attrs == *attrs {
                    return Ok(false);
                }
                block.attrs = attrs.clone();
                Ok(true)
            }
            Step::AddMark { from, to, mark } => {
                Ok(Self::for_each_clipped(doc, *from, *to, |block, start, end| {
                    block.add_mark(start, end, mark)
                }))
            }
            Step::RemoveMark { from, to, filter } => {
                Ok(Self::for_each_clipped(doc, *from, *to, |block, start, end| {
                    block.remove_marks(start, end, |m| filter.matches(m))
                }))
            }
            Step::SetDocAttrs { attrs } => {
                if doc.attrs == *attrs {
                    return Ok(false);
                }
                doc.attrs = attrs.clone();
                Ok(true)
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), StepError> {
        let size = doc.content_size();
        let check_range = |from: usize, to: usize| {
            if from > to {
                Err(StepError::InvalidRange { from, to })
            } else if to > size {
                Err(StepError::PositionOutOfRange { pos: to, size })
            } else {
                Ok(())
            }
        };

        match self {
            Step::InsertText { pos, .. } | Step::SplitBlock { pos } => {
                doc.resolve(*pos)?;
                Ok(())
            }

            Step::DeleteRange { from, to } => {
                check_range(*from, *to)?;
                let boundaries = doc.boundary_index(*from).is_ok() && doc.boundary_index(*to).is_ok();
                if !boundaries {
                    doc.resolve(*from)?;
                    doc.resolve(*to)?;
                }
                Ok(())
            }

            Step::InsertBlock { pos, .. } => {
                doc.boundary_index(*pos)?;
                Ok(())
            }

            Step::RemoveBlock { pos } | Step::SetBlockAttrs { pos, .. } => {
                let index = doc.boundary_index(*pos)?;
                if index >= doc.blocks.len() {
                    return Err(StepError::BlockNotFound(index));
                }
                Ok(())
            }

            Step::AddMark { from, to, .. } | Step::RemoveMark { from, to, .. } => {
                check_range(*from, *to)
            }

            Step::SetDocAttrs { .. } => Ok(()),
        }
    }

    /// Position mapping of the step against the document it applies to
    ///
    /// `None` for steps that leave positions unchanged.
    pub fn step_map(&self, doc: &Document) -> Result<Option<StepMap>, StepError> {
        let map = |pos, deleted, inserted| {
            Some(StepMap {
                pos,
                deleted,
                inserted,
            })
        };
        Ok(match self {
            Step::InsertText { pos, text, .. } => map(*pos, 0, text.chars().count()),
            Step::DeleteRange { from, to } => map(*from, to.saturating_sub(*from), 0),
            Step::SplitBlock { pos } => map(*pos, 0, 2),
            Step::InsertBlock { pos, block } => map(*pos, 0, block.node_size()),
            Step::RemoveBlock { pos } => {
                let index = doc.boundary_index(*pos)?;
                map(*pos, doc.block_range(index).len(), 0)
            }
            Step::SetBlockAttrs { .. }
            | Step::AddMark { .. }
            | Step::RemoveMark { .. }
            | Step::SetDocAttrs { .. } => None,
        })
    }

    /// Whether the step alters block structure or text rather than formatting
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Step::InsertText { .. }
                | Step::DeleteRange { .. }
                | Step::SplitBlock { .. }
                | Step::InsertBlock { .. }
                | Step::RemoveBlock { .. }
        )
    }

    fn apply_insert_text(
        doc: &mut Document,
        pos: usize,
        text: &str,
        marks: &MarkSet,
    ) -> Result<bool, StepError> {
        let resolved = doc.resolve(pos)?;
        doc.blocks[resolved.index].insert_text(resolved.offset, text, marks.clone());
        Ok(!text.is_empty())
    }

    fn apply_delete(doc: &mut Document, from: usize, to: usize) -> Result<bool, StepError> {
        if from == to {
            return Ok(false);
        }

        if let (Ok(first), Ok(last)) = (doc.boundary_index(from), doc.boundary_index(to)) {
            doc.blocks.drain(first..last);
            return Ok(true);
        }

        let start = doc.resolve(from)?;
        let end = doc.resolve(to)?;

        if start.index == end.index {
            doc.blocks[start.index].delete_text(start.offset, end.offset);
            return Ok(true);
        }

        let tail = doc.blocks[end.index].split_off(end.offset);
        doc.blocks.drain(start.index + 1..=end.index);

        let head = &mut doc.blocks[start.index];
        head.split_off(start.offset);
        head.append_content(tail);
        Ok(true)
    }

    fn apply_split(doc: &mut Document, pos: usize) -> Result<bool, StepError> {
        let resolved = doc.resolve(pos)?;
        let block = &mut doc.blocks[resolved.index];
        let at_end = resolved.offset == block.text_len();
        let tail = block.split_off(resolved.offset);

        let new_block = if at_end {
            Block::default()
        } else {
            Block {
                kind: block.kind,
                attrs: block.attrs.clone(),
                content: Vec::new(),
            }
            .with_runs(tail)
        };

        doc.blocks.insert(resolved.index + 1, new_block);
        Ok(true)
    }

    /// Run `edit` on every block touched by `[from, to)`, clipped to content
    fn for_each_clipped(
        doc: &mut Document,
        from: usize,
        to: usize,
        mut edit: impl FnMut(&mut Block, usize, usize) -> bool,
    ) -> bool {
        let mut changed = false;
        let mut block_start = 0;
        for block in &mut doc.blocks {
            let size = block.node_size();
            let content_start = block_start + 1;
            let content_end = content_start + block.text_len();
            let start = from.max(content_start);
            let end = to.min(content_end);
            if start < end {
                changed |= edit(block, start - content_start, end - content_start);
            }
            block_start += size;
        }
        changed
    }
}
