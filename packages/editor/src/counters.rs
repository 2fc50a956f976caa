//! # Counter Allocation
//!
//! Numbered paragraphs are rendered with one counter per outline level. A
//! level's counter must be reset the first time the level shows up in a
//! render pass and never again during that pass.

use crate::config::EngineConfig;
use std::collections::BTreeMap;
use stylecascade_document::CounterFlags;

/// Per-pass record of which levels already had their counter reset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterAllocator {
    reset: BTreeMap<u32, bool>,
}

impl CounterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator seeded from the flags persisted on a document
    ///
    /// Unknown keys and levels beyond the configured maximum are ignored.
    pub fn seeded(flags: Option<&CounterFlags>, config: &EngineConfig) -> Self {
        let mut reset = BTreeMap::new();
        for (key, &value) in flags.into_iter().flatten() {
            if let Some(level) = config.level_of_counter_key(key) {
                reset.insert(level, value);
            }
        }
        Self { reset }
    }

    /// Whether `level` needs a counter reset, marking it as reset
    pub fn needs_reset(&mut self, level: u32) -> bool {
        let already = self.reset.entry(level).or_insert(false);
        if *already {
            false
        } else {
            *already = true;
            true
        }
    }

    pub fn is_reset(&self, level: u32) -> bool {
        self.reset.get(&level).copied().unwrap_or(false)
    }

    /// Flags to persist, or `None` when no level was reset
    pub fn to_counter_flags(&self, config: &EngineConfig) -> Option<CounterFlags> {
        let flags: CounterFlags = self
            .reset
            .iter()
            .filter(|(_, &reset)| reset)
            .map(|(&level, _)| (config.counter_key(level), true))
            .collect();

        if flags.is_empty() {
            None
        } else {
            Some(flags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_level_resets_once() {
        let mut counters = CounterAllocator::new();

        assert!(counters.needs_reset(1));
        assert!(counters.needs_reset(2));
        assert!(!counters.needs_reset(1));
        assert!(!counters.needs_reset(2));
        assert!(counters.is_reset(1));
        assert!(!counters.is_reset(3));
    }

    #[test]
    fn test_seeded_from_persisted_flags() {
        let config = EngineConfig::default();
        let mut flags = CounterFlags::new();
        flags.insert("set-cust-style-counter-2".into(), true);
        flags.insert("unrelated".into(), true);

        let mut counters = CounterAllocator::seeded(Some(&flags), &config);

        assert!(!counters.needs_reset(2));
        assert!(counters.needs_reset(1));
    }

    #[test]
    fn test_flags_round_trip_through_document_attrs() {
        let config = EngineConfig::default();
        let mut counters = CounterAllocator::new();
        assert_eq!(counters.to_counter_flags(&config), None);

        counters.needs_reset(1);
        counters.needs_reset(3);

        let flags = counters.to_counter_flags(&config).unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get("set-cust-style-counter-3"), Some(&true));
        assert_eq!(CounterAllocator::seeded(Some(&flags), &config), counters);
    }
}
