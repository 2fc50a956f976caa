//! # Stylecascade Document
//!
//! Document tree model the style engine operates on.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Document                                    │
//! │  - DocAttrs (counter flags)                 │
//! │  - Block* (paragraph attrs + text runs)     │
//! │      - TextRun (text + MarkSet)             │
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ Step: position-addressed, validated edits   │
//! │ Transaction: working copy + recorded steps  │
//! │ EditBatch: steps + input metadata           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use stylecascade_document::{Block, Document, Mark, Step, Transaction};
//!
//! let doc = Document::new(vec![Block::paragraph("Hello world")]);
//! let mut tx = Transaction::new(doc);
//! tx.step(Step::AddMark { from: 1, to: 6, mark: Mark::strong() }).unwrap();
//!
//! assert_eq!(tx.doc().blocks[0].content[0].text, "Hello");
//! ```

mod document;
mod error;
mod mark;
mod node;
mod step;
mod transaction;

pub use document::{CounterFlags, DocAttrs, Document, ResolvedPos};
pub use error::StepError;
pub use mark::{Mark, MarkAttrs, MarkSet, MarkType};
pub use node::{Block, BlockKind, ParagraphAttrs, TextRun, RESERVED_STYLE_NONE};
pub use step::{MarkFilter, Step, StepMap};
pub use transaction::{BatchMeta, EditBatch, Key, Transaction};
