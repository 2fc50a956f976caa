//! # Stylecascade Editor
//!
//! Named-style cascade and outline consistency engine for a rich-text
//! document editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ StyleRegistry: shared snapshots of styles   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ DocumentChangeObserver (once per batch)     │
//! │  1. OverrideTracker                         │
//! │  2. HierarchyRepairer (delete path)         │
//! │  3. StyleApplier line bold                  │
//! │  4. Next-line style propagation             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Corrective EditBatch for the host editor    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Style names are references**: a paragraph's `styleName` is resolved
//!    against the registry at use time
//! 2. **Marks are values**: changing a mark means writing a new one
//! 3. **All or nothing**: every pass works on a [`Transaction`]; an error
//!    drops it and nothing is committed
//! 4. **Contiguous outline**: no numbered paragraph is more than one level
//!    deeper than the previous one
//!
//! ## Usage
//!
//! ```rust
//! use stylecascade_editor::{EngineConfig, StyleDefinition, StyleEngine, StyleProps, StyleRegistry};
//! use stylecascade_document::{Block, Document};
//!
//! let registry = StyleRegistry::with_styles(vec![StyleDefinition::new(
//!     "Heading2",
//!     StyleProps { has_numbering: true, style_level: Some(2), ..Default::default() },
//! )])?;
//! let engine = StyleEngine::new(registry, EngineConfig::default());
//!
//! let doc = Document::new(vec![Block::paragraph("Scope")]);
//! let (doc, _batch) = engine.apply_style(&doc, "Heading2", 1, 1)?;
//!
//! // A level-1 filler now precedes the heading
//! assert!(doc.blocks[0].is_filler());
//! assert_eq!(doc.blocks[1].attrs.style_level, Some(2));
//! # Ok::<(), stylecascade_editor::EngineError>(())
//! ```
//!
//! [`Transaction`]: stylecascade_document::Transaction

mod applier;
mod config;
mod counters;
mod engine;
mod errors;
mod hierarchy;
mod observer;
mod outline;
mod overrides;
mod registry;
mod style;

pub use applier::{attrs_for_style, ApplyMode, StyleApplier};
pub use config::{EngineConfig, DEFAULT_CONFIG_NAME};
pub use counters::CounterAllocator;
pub use engine::{Diagnostic, StyleEngine};
pub use errors::EngineError;
pub use hierarchy::HierarchyRepairer;
pub use observer::{
    BatchPass, DeleteRepairPass, DocumentChangeObserver, LineStylePass, NextLinePass,
    ObserverOutcome, OverridePass, PassContext, RenderPhase,
};
pub use outline::{render_outline, Outline, OutlineEntry};
pub use overrides::{OverrideTracker, COMPARED_MARK_TYPES};
pub use registry::{RegistryError, StyleRegistry, StyleSnapshot};
pub use style::{
    compute_marks_for_style, line_spacing_for, LineBold, StyleDefinition, StyleProperty,
    StyleProps, MAX_INDENT_LEVEL,
};
