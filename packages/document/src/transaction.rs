//! # Transactions and Edit Batches
//!
//! A [`Transaction`] owns a working copy of a document and records every
//! step that changed it. Dropping a transaction discards its work, so a
//! pass that fails halfway never leaks a partial edit.
//!
//! An [`EditBatch`] is what crosses the boundary with the host editor: the
//! recorded steps plus metadata about the input that produced them.

use crate::document::Document;
use crate::error::StepError;
use crate::mark::MarkSet;
use crate::step::{Step, StepMap};
use serde::{Deserialize, Serialize};

/// Last key the host saw before accepting a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    Character,
    Other,
}

/// Input metadata attached to a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMeta {
    #[serde(default)]
    pub last_key: Option<Key>,

    /// Caret position before the batch
    #[serde(default)]
    pub caret_before: Option<usize>,

    /// Caret position after the batch
    #[serde(default)]
    pub caret_after: Option<usize>,
}

/// Atomic set of steps accepted in one go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBatch {
    pub steps: Vec<Step>,

    #[serde(default)]
    pub meta: BatchMeta,

    /// Formatting the next typed character inherits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_marks: Option<MarkSet>,
}

impl EditBatch {
    pub fn new(steps: Vec<Step>, meta: BatchMeta) -> Self {
        Self {
            steps,
            meta,
            stored_marks: None,
        }
    }

    /// Whether the batch changed the document at all
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Whether any step changed structure or text rather than formatting
    pub fn changes_structure(&self) -> bool {
        self.steps.iter().any(Step::is_structural)
    }

    /// Whether the batch came from Backspace or Delete
    pub fn is_deletion(&self) -> bool {
        matches!(self.meta.last_key, Some(Key::Backspace) | Some(Key::Delete))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.stored_marks.is_none()
    }

    /// Replay the batch on a copy of `doc`
    pub fn apply_to(&self, doc: &Document) -> Result<Document, StepError> {
        let mut tx = Transaction::new(doc.clone());
        for step in &self.steps {
            tx.step(step.clone())?;
        }
        Ok(tx.into_document())
    }
}

/// Working copy of a document plus the steps applied to it
#[derive(Debug, Clone)]
pub struct Transaction {
    doc: Document,
    steps: Vec<Step>,
    maps: Vec<StepMap>,
    stored_marks: Option<MarkSet>,
}

impl Transaction {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            steps: Vec::new(),
            maps: Vec::new(),
            stored_marks: None,
        }
    }

    /// Current state of the working copy
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Apply a step, recording it when it changed the document
    pub fn step(&mut self, step: Step) -> Result<bool, StepError> {
        step.validate(&self.doc)?;
        let map = step.step_map(&self.doc)?;
        let changed = step.apply(&mut self.doc)?;
        if changed {
            self.maps.extend(map);
            self.steps.push(step);
        }
        Ok(changed)
    }

    /// Map a position in the starting document through every recorded step
    pub fn map_pos(&self, pos: usize) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos))
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn set_stored_marks(&mut self, marks: MarkSet) {
        self.stored_marks = Some(marks);
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    /// Package the recorded steps as a batch
    pub fn into_batch(self, meta: BatchMeta) -> EditBatch {
        EditBatch {
            steps: self.steps,
            meta,
            stored_marks: self.stored_marks,
        }
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Split into the final document and the batch that produced it
    pub fn finish(self, meta: BatchMeta) -> (Document, EditBatch) {
        let batch = EditBatch {
            steps: self.steps,
            meta,
            stored_marks: self.stored_marks,
        };
        (self.doc, batch)
    }
}
