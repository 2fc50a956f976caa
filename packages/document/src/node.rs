//! # Blocks and inline content
//!
//! A block is a paragraph-equivalent node: persisted attributes plus a
//! normalized list of text runs. All offsets handled here are character
//! offsets relative to the start of the block's content.

use crate::mark::{Mark, MarkSet};
use serde::{Deserialize, Serialize};

/// Style name meaning "no named style"
pub const RESERVED_STYLE_NONE: &str = "None";

fn default_style_name() -> String {
    RESERVED_STYLE_NONE.to_string()
}

/// Kind of top-level block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Blockquote,
    CodeBlock,
    HorizontalRule,
}

/// Persisted, style-governed attributes of a block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphAttrs {
    #[serde(default = "default_style_name")]
    pub style_name: String,

    /// Outline level; `None` when the paragraph is not numbered
    #[serde(default)]
    pub style_level: Option<u32>,

    #[serde(default)]
    pub indent: Option<u32>,

    #[serde(default)]
    pub align: Option<String>,

    #[serde(default)]
    pub line_spacing: Option<String>,

    #[serde(default)]
    pub paragraph_spacing_before: Option<String>,

    #[serde(default)]
    pub paragraph_spacing_after: Option<String>,
}

impl Default for ParagraphAttrs {
    fn default() -> Self {
        Self {
            style_name: default_style_name(),
            style_level: None,
            indent: None,
            align: None,
            line_spacing: None,
            paragraph_spacing_before: None,
            paragraph_spacing_after: None,
        }
    }
}

impl ParagraphAttrs {
    pub fn has_named_style(&self) -> bool {
        !self.style_name.is_empty() && self.style_name != RESERVED_STYLE_NONE
    }
}

/// Run of text sharing one mark set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,

    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::from_marks(marks),
        }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Top-level document node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,

    #[serde(default)]
    pub attrs: ParagraphAttrs,

    #[serde(default)]
    pub content: Vec<TextRun>,
}

impl Block {
    /// Plain paragraph with no named style
    pub fn paragraph(text: impl Into<String>) -> Self {
        let mut block = Self::default();
        let text = text.into();
        if !text.is_empty() {
            block.content.push(TextRun::plain(text));
        }
        block
    }

    /// Paragraph naming a style (attributes are filled in by a style pass)
    pub fn styled(style_name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut block = Self::paragraph(text);
        block.attrs.style_name = style_name.into();
        block
    }

    /// Empty placeholder paragraph holding an outline level
    pub fn filler(level: u32) -> Self {
        let mut block = Self::default();
        block.attrs.style_level = Some(level);
        block
    }

    pub fn with_runs(mut self, runs: Vec<TextRun>) -> Self {
        self.content = runs;
        self.normalize();
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.attrs.style_level = Some(level);
        self
    }

    pub fn is_paragraph(&self) -> bool {
        self.kind == BlockKind::Paragraph
    }

    /// Paragraph taking part in the outline sequence
    pub fn is_numbered(&self) -> bool {
        self.is_paragraph() && self.attrs.style_level.is_some()
    }

    pub fn level(&self) -> Option<u32> {
        if self.is_paragraph() {
            self.attrs.style_level
        } else {
            None
        }
    }

    /// Placeholder inserted to keep the outline contiguous
    pub fn is_filler(&self) -> bool {
        self.is_numbered() && !self.attrs.has_named_style() && self.content.is_empty()
    }

    /// Number of characters in the block
    pub fn text_len(&self) -> usize {
        self.content.iter().map(TextRun::len).sum()
    }

    /// Size in position units: open token, characters, close token
    pub fn node_size(&self) -> usize {
        self.text_len() + 2
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        self.content.iter().map(|r| r.text.as_str()).collect()
    }

    /// Runs with their `[from, to)` content offsets
    pub fn runs(&self) -> impl Iterator<Item = (usize, usize, &TextRun)> {
        let mut offset = 0;
        self.content.iter().map(move |run| {
            let from = offset;
            offset += run.len();
            (from, offset, run)
        })
    }

    /// Marks in effect at a content offset
    ///
    /// At a run boundary the marks of the run ending there win, so typing at
    /// the end of bold text stays bold.
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        let mut last = MarkSet::new();
        for (from, to, run) in self.runs() {
            if offset > from && offset <= to {
                return run.marks.clone();
            }
            if offset == from && from == 0 {
                return run.marks.clone();
            }
            last = run.marks.clone();
        }
        last
    }

    /// Apply `update` to the mark set of every character in `[from, to)`
    ///
    /// Returns whether the content changed.
    pub fn update_marks(
        &mut self,
        from: usize,
        to: usize,
        mut update: impl FnMut(&mut MarkSet),
    ) -> bool {
        let to = to.min(self.text_len());
        if from >= to {
            return false;
        }

        let before = self.content.clone();
        self.split_at(from);
        self.split_at(to);

        let mut offset = 0;
        for run in &mut self.content {
            let len = run.len();
            if offset >= from && offset + len <= to {
                update(&mut run.marks);
            }
            offset += len;
        }

        self.normalize();
        self.content != before
    }

    /// Add a mark over `[from, to)`, replacing marks of the same type
    pub fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> bool {
        self.update_marks(from, to, |marks| marks.insert(mark.clone()))
    }

    /// Remove every mark in `[from, to)` for which `remove` returns true
    pub fn remove_marks(
        &mut self,
        from: usize,
        to: usize,
        mut remove: impl FnMut(&Mark) -> bool,
    ) -> bool {
        self.update_marks(from, to, |marks| marks.retain(|m| !remove(m)))
    }

    /// Insert text at a content offset
    pub fn insert_text(&mut self, offset: usize, text: &str, marks: MarkSet) {
        if text.is_empty() {
            return;
        }
        self.split_at(offset);

        let mut index = 0;
        let mut pos = 0;
        for run in &self.content {
            if pos >= offset {
                break;
            }
            pos += run.len();
            index += 1;
        }

        self.content.insert(
            index,
            TextRun {
                text: text.to_string(),
                marks,
            },
        );
        self.normalize();
    }

    /// Delete the characters in `[from, to)`
    pub fn delete_text(&mut self, from: usize, to: usize) {
        let to = to.min(self.text_len());
        if from >= to {
            return;
        }
        self.split_at(from);
        self.split_at(to);

        let mut offset = 0;
        self.content.retain(|run| {
            let start = offset;
            offset += run.len();
            start < from || start >= to
        });
        self.normalize();
    }

    /// Detach the content after `offset` and return it
    pub fn split_off(&mut self, offset: usize) -> Vec<TextRun> {
        self.split_at(offset);

        let mut pos = 0;
        let mut index = self.content.len();
        for (i, run) in self.content.iter().enumerate() {
            if pos >= offset {
                index = i;
                break;
            }
            pos += run.len();
        }

        let tail = self.content.split_off(index);
        self.normalize();
        tail
    }

    /// Append runs to the end of the block
    pub fn append_content(&mut self, runs: Vec<TextRun>) {
        self.content.extend(runs);
        self.normalize();
    }

    /// Ensure a run boundary exists at `offset`
    fn split_at(&mut self, offset: usize) {
        let mut pos = 0;
        for i in 0..self.content.len() {
            let len = self.content[i].len();
            if offset > pos && offset < pos + len {
                let run = &mut self.content[i];
                let byte = byte_index(&run.text, offset - pos);
                let tail = run.text.split_off(byte);
                let marks = run.marks.clone();
                self.content.insert(i + 1, TextRun { text: tail, marks });
                return;
            }
            pos += len;
        }
    }

    /// Drop empty runs and merge neighbours with equal mark sets
    pub(crate) fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.content.len());
        for run in self.content.drain(..) {
            if run.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(prev) if prev.marks == run.marks => prev.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.content = merged;
    }
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
