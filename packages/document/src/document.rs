//! # Document
//!
//! A document is an ordered list of top-level blocks plus document-level
//! attributes.
//!
//! ## Positions
//!
//! Positions count tokens the way the host editor does: each block opens
//! with one token, contributes one token per character and closes with one
//! token.
//!
//! ```text
//!  0   1 2 3   4   5 6   7
//!  <p> H i </p> <p> ! </p>
//! ```
//!
//! So the content of block `i` starts at `block_start(i) + 1`, and splitting
//! a paragraph at its end moves the caret forward by two positions.

use crate::error::StepError;
use crate::node::Block;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Persisted numbering counter flags, keyed by counter name
pub type CounterFlags = BTreeMap<String, bool>;

/// Document-level attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_flags: Option<CounterFlags>,
}

/// Position resolved into a block and a content offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPos {
    /// Index of the block holding the position
    pub index: usize,
    /// Position of the block's opening token
    pub block_start: usize,
    /// Character offset inside the block's content
    pub offset: usize,
}

/// Tree-structured document: blocks with inline content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub attrs: DocAttrs,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            attrs: DocAttrs::default(),
            blocks,
        }
    }

    /// Parse a stored document, normalizing its text runs
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Document = serde_json::from_str(json)?;
        for block in &mut doc.blocks {
            block.normalize();
        }
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Total size in position units
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    /// Position of the opening token of block `index`
    ///
    /// `index == blocks.len()` yields the end of the document.
    pub fn block_start(&self, index: usize) -> usize {
        self.blocks[..index.min(self.blocks.len())]
            .iter()
            .map(Block::node_size)
            .sum()
    }

    /// Position range `[start, end)` covered by block `index`
    pub fn block_range(&self, index: usize) -> Range<usize> {
        let start = self.block_start(index);
        let size = self.blocks.get(index).map(Block::node_size).unwrap_or(0);
        start..start + size
    }

    /// Position range covered by the content of block `index`
    pub fn content_range(&self, index: usize) -> Range<usize> {
        let start = self.block_start(index) + 1;
        let len = self.blocks.get(index).map(Block::text_len).unwrap_or(0);
        start..start + len
    }

    /// Index of the block whose tokens include `pos`
    pub fn block_index_at(&self, pos: usize) -> Option<usize> {
        let mut start = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            let end = start + block.node_size();
            if pos >= start && pos < end {
                return Some(index);
            }
            start = end;
        }
        None
    }

    /// Resolve a text position (between the open and close token of a block)
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, StepError> {
        let mut start = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            let content_start = start + 1;
            let content_end = content_start + block.text_len();
            if pos >= content_start && pos <= content_end {
                return Ok(ResolvedPos {
                    index,
                    block_start: start,
                    offset: pos - content_start,
                });
            }
            start += block.node_size();
        }
        Err(StepError::PositionOutOfRange {
            pos,
            size: self.content_size(),
        })
    }

    /// Index of the block starting exactly at `pos` (or the end of document)
    pub fn boundary_index(&self, pos: usize) -> Result<usize, StepError> {
        let mut start = 0;
        for index in 0..=self.blocks.len() {
            if start == pos {
                return Ok(index);
            }
            match self.blocks.get(index) {
                Some(block) => start += block.node_size(),
                None => break,
            }
        }
        Err(StepError::NotABlockBoundary(pos))
    }

    /// Indices of blocks touched by the position range `[from, to]`
    ///
    /// A collapsed range selects the block containing it.
    pub fn blocks_between(&self, from: usize, to: usize) -> Range<usize> {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        let mut first = None;
        let mut last = None;
        let mut start = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            let end = start + block.node_size();
            let touched = if from == to {
                from >= start && from < end
            } else {
                start < to && end > from
            };
            if touched {
                first.get_or_insert(index);
                last = Some(index);
            }
            start = end;
        }
        match (first, last) {
            (Some(first), Some(last)) => first..last + 1,
            _ => 0..0,
        }
    }

    /// Level of the nearest numbered paragraph before block `index`
    pub fn previous_level(&self, index: usize) -> Option<u32> {
        self.blocks[..index.min(self.blocks.len())]
            .iter()
            .rev()
            .find_map(Block::level)
    }

    /// Nearest numbered paragraph after block `index`, with its index
    pub fn next_numbered(&self, index: usize) -> Option<(usize, u32)> {
        self.blocks
            .iter()
            .enumerate()
            .skip(index + 1)
            .find_map(|(i, block)| block.level().map(|level| (i, level)))
    }

    /// Levels of all numbered paragraphs in document order
    pub fn outline_levels(&self) -> Vec<u32> {
        self.blocks.iter().filter_map(Block::level).collect()
    }

    /// First place where the outline climbs by more than one level
    ///
    /// Returns the block index of the offending paragraph. The sequence is
    /// treated as starting from level 0, so the first numbered paragraph
    /// must be level 1.
    pub fn find_outline_gap(&self) -> Option<usize> {
        let mut previous = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            if let Some(level) = block.level() {
                if level > previous + 1 {
                    return Some(index);
                }
                previous = level;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(vec![Block::paragraph("Hi"), Block::paragraph("!")])
    }

    #[test]
    fn test_from_json_normalizes_runs_and_marks() {
        let json = r#"{
            "blocks": [{
                "attrs": { "styleName": "Body" },
                "content": [
                    { "text": "Hel", "marks": [{ "type": "em" }, { "type": "strong" }] },
                    { "text": "" },
                    { "text": "lo", "marks": [{ "type": "strong" }, { "type": "em" }, { "type": "em" }] }
                ]
            }]
        }"#;

        let doc = Document::from_json(json).unwrap();
        let block = &doc.blocks[0];
        assert_eq!(block.content.len(), 1);
        assert_eq!(block.content[0].text, "Hello");
        assert_eq!(block.content[0].marks.len(), 2);
    }

    #[test]
    fn test_position_arithmetic() {
        let doc = sample();
        assert_eq!(doc.content_size(), 7);
        assert_eq!(doc.block_start(1), 4);
        assert_eq!(doc.content_range(0), 1..3);
        assert_eq!(doc.block_range(1), 4..7);
    }

    #[test]
    fn test_resolve() {
        let doc = sample();
        let end_of_first = doc.resolve(3).unwrap();
        assert_eq!(end_of_first.index, 0);
        assert_eq!(end_of_first.offset, 2);

        let start_of_second = doc.resolve(5).unwrap();
        assert_eq!(start_of_second.index, 1);
        assert_eq!(start_of_second.offset, 0);

        assert!(doc.resolve(4).is_err());
        assert!(doc.resolve(99).is_err());
    }

    #[test]
    fn test_boundary_index() {
        let doc = sample();
        assert_eq!(doc.boundary_index(0).unwrap(), 0);
        assert_eq!(doc.boundary_index(4).unwrap(), 1);
        assert_eq!(doc.boundary_index(7).unwrap(), 2);
        assert!(doc.boundary_index(2).is_err());
    }

    #[test]
    fn test_blocks_between() {
        let doc = sample();
        assert_eq!(doc.blocks_between(2, 2), 0..1);
        assert_eq!(doc.blocks_between(1, 6), 0..2);
        assert_eq!(doc.blocks_between(5, 6), 1..2);
        assert_eq!(doc.blocks_between(50, 60), 0..0);
    }

    #[test]
    fn test_outline_gap() {
        let mut doc = Document::new(vec![
            Block::filler(1),
            Block::paragraph("body"),
            Block::filler(2),
            Block::filler(4),
        ]);
        assert_eq!(doc.find_outline_gap(), Some(3));

        doc.blocks[3].attrs.style_level = Some(1);
        assert_eq!(doc.find_outline_gap(), None);
        assert_eq!(doc.outline_levels(), vec![1, 2, 1]);
    }

    #[test]
    fn test_json_defaults() {
        let doc = Document::from_json(
            r#"{ "blocks": [ { "content": [ { "text": "Hello" } ] } ] }"#,
        )
        .unwrap();

        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].attrs.style_name, "None");
        assert_eq!(doc.blocks[0].text(), "Hello");
        assert!(doc.attrs.counter_flags.is_none());
    }
}
