//! Per-word segmentation table populated during corpus ingestion.

use rustc_hash::{FxHashMap, FxHashSet};

/// One distinct corpus word with its current segmentation and occurrence count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    /// Ordered token sequence; concatenated it always reconstructs the word.
    pub segmentation: Vec<Vec<u8>>,
    /// Occurrences across the entire corpus.
    pub frequency: u64,
}

/// Table of distinct words keyed by their raw bytes.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    entries: FxHashMap<Vec<u8>, WordEntry>,
}

impl WordTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sighting of `word`.
    ///
    /// On first sighting the entry is created with a one-token-per-byte
    /// segmentation; the frequency is bumped unconditionally. Returns `true`
    /// when the entry was newly created.
    pub fn observe(&mut self, word: &[u8]) -> bool {
        match self.entries.get_mut(word) {
            Some(entry) => {
                entry.frequency += 1;
                false
            }
            None => {
                let segmentation = word.iter().map(|&b| vec![b]).collect();
                self.entries.insert(
                    word.to_vec(),
                    WordEntry {
                        segmentation,
                        frequency: 1,
                    },
                );
                true
            }
        }
    }

    /// Mutable access to one entry's segmentation state.
    pub fn entry_mut(&mut self, word: &[u8]) -> Option<&mut WordEntry> {
        self.entries.get_mut(word)
    }

    /// Iterates over all `(word, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &WordEntry)> {
        self.entries.iter()
    }

    /// Iterates mutably over all entries.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut WordEntry> {
        self.entries.values_mut()
    }

    /// Number of distinct words currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no word has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry whose frequency is below `threshold` and returns the
    /// number removed. Irreversible.
    pub fn prune_below(&mut self, threshold: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.frequency >= threshold);
        before - self.entries.len()
    }

    /// Set of tokens appearing in at least one surviving segmentation.
    #[must_use]
    pub fn used_tokens(&self) -> FxHashSet<Vec<u8>> {
        let mut used = FxHashSet::default();
        for entry in self.entries.values() {
            for token in &entry.segmentation {
                used.insert(token.clone());
            }
        }
        used
    }
}

/// Splits a line into whitespace-delimited words the way ingestion and
/// tokenization both do: surrounding whitespace is stripped, a single space
/// is the sole delimiter, and empty fragments from runs of spaces are
/// dropped. The delimiter itself is consumed, never tokenized.
pub(crate) fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.trim().split(' ').filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_builds_byte_segmentation_once() {
        let mut table = WordTable::new();
        assert!(table.observe(b"cat"));
        assert!(!table.observe(b"cat"));
        let entry = table.entry_mut(b"cat").unwrap();
        assert_eq!(entry.frequency, 2);
        assert_eq!(
            entry.segmentation,
            vec![b"c".to_vec(), b"a".to_vec(), b"t".to_vec()]
        );
    }

    #[test]
    fn segmentation_concatenation_reconstructs_word() {
        let mut table = WordTable::new();
        table.observe(b"tokenizer");
        for (word, entry) in table.iter() {
            let rebuilt: Vec<u8> = entry.segmentation.concat();
            assert_eq!(&rebuilt, word);
        }
    }

    #[test]
    fn prune_below_drops_rare_words() {
        let mut table = WordTable::new();
        table.observe(b"the");
        table.observe(b"the");
        table.observe(b"dog");
        let removed = table.prune_below(2);
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 1);
        assert!(table.entry_mut(b"dog").is_none());
    }

    #[test]
    fn used_tokens_reflects_segmentations() {
        let mut table = WordTable::new();
        table.observe(b"ab");
        table.observe(b"aa");
        let used = table.used_tokens();
        assert!(used.contains(&b"a".to_vec()));
        assert!(used.contains(&b"b".to_vec()));
        // "a" appears three times across segmentations but is held once.
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn split_words_trims_and_skips_empty_fragments() {
        let words: Vec<&str> = split_words("  the  cat sat \n").collect();
        assert_eq!(words, vec!["the", "cat", "sat"]);
        assert_eq!(split_words("   ").count(), 0);
    }
}
