//! # Outline Numbering
//!
//! Walks numbered paragraphs in document order and produces their labels
//! (`1.`, `1.1.`, `1.2.1.` ...). A level increments its own counter and
//! zeroes every deeper one. Fillers advance the counters like any numbered
//! paragraph but are not labelled.
//!
//! Counter resets are allocated through [`CounterAllocator`], seeded from the
//! flags persisted on the document. Levels deeper than `maxOutlineLevel` are
//! numbered like any other but never persist a reset flag.

use crate::config::EngineConfig;
use crate::counters::CounterAllocator;
use serde::Serialize;
use stylecascade_document::{CounterFlags, DocAttrs, Document, Step};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    /// Block index in the document
    pub index: usize,
    pub level: u32,
    /// `None` for fillers
    pub label: Option<String>,
    /// Whether this paragraph emits the reset of its level's counter
    pub resets_counter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
    pub counter_flags: Option<CounterFlags>,
}

impl Outline {
    /// Step persisting the counter flags, when they differ from the document's
    pub fn flags_step(&self, doc: &Document) -> Option<Step> {
        if doc.attrs.counter_flags == self.counter_flags {
            return None;
        }
        Some(Step::SetDocAttrs {
            attrs: DocAttrs {
                counter_flags: self.counter_flags.clone(),
            },
        })
    }
}

/// Number every outline paragraph of `doc`
pub fn render_outline(doc: &Document, config: &EngineConfig) -> Outline {
    let mut allocator = CounterAllocator::seeded(doc.attrs.counter_flags.as_ref(), config);
    let mut counters: Vec<u32> = Vec::new();
    let mut entries = Vec::new();

    for (index, block) in doc.blocks.iter().enumerate() {
        let Some(level) = block.level() else {
            continue;
        };
        if level == 0 {
            continue;
        }

        let depth = level as usize;
        if counters.len() < depth {
            counters.resize(depth, 0);
        }
        counters[depth - 1] += 1;
        for deeper in &mut counters[depth..] {
            *deeper = 0;
        }

        let label = (!block.is_filler()).then(|| {
            counters[..depth]
                .iter()
                .map(|n| format!("{n}."))
                .collect::<String>()
        });

        entries.push(OutlineEntry {
            index,
            level,
            label,
            resets_counter: level <= config.max_outline_level && allocator.needs_reset(level),
        });
    }

    Outline {
        entries,
        counter_flags: allocator.to_counter_flags(config),
    }
}
