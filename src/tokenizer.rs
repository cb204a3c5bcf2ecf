//! The tokenizer engine: corpus ingestion, merge learning, inference, pruning,
//! and persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::info;

use crate::config::TokenizerConfig;
use crate::error::{Result, SubtokError};
use crate::pairs::{self, Pair};
use crate::rules::{apply_rule, MergeRule, RuleTable};
use crate::serialization;
use crate::vocab::{TokenId, Vocabulary, UNKNOWN_ID};
use crate::words::{split_words, WordTable};

/// Result of one successful learning iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedMerge {
    /// The rule appended to the ordered sequence.
    pub rule: MergeRule,
    /// Weighted corpus frequency of the merged pair.
    pub frequency: u64,
}

/// Word-level BPE tokenizer.
///
/// A single instance owns its registry, word table, and rule sequence; it is
/// single-threaded and intended for exclusive use within one training or
/// inference session. The learning loop performs exactly one merge per call
/// to [`Tokenizer::run_learning_iteration`]; the caller owns the stopping
/// condition.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    cfg: TokenizerConfig,
    vocab: Vocabulary,
    words: WordTable,
    rules: RuleTable,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    /// Creates a tokenizer with the 256 single-byte base tokens pre-seeded.
    #[must_use]
    pub fn new(cfg: TokenizerConfig) -> Self {
        Self {
            cfg,
            vocab: Vocabulary::new(),
            words: WordTable::new(),
            rules: RuleTable::new(),
        }
    }

    /// Feeds one line of corpus text into the word table.
    ///
    /// Never fails: lines whose trimmed length is one byte or less, and words
    /// longer than the configured maximum, are silently skipped. Entries
    /// created here are immediately brought up to date by replaying every
    /// rule learned so far, so the word table never lags the rule sequence.
    pub fn ingest(&mut self, line: &str) {
        let line = line.trim();
        if line.len() <= 1 {
            return;
        }
        let mut created: Vec<Vec<u8>> = Vec::new();
        for word in split_words(line) {
            let bytes = word.as_bytes();
            if bytes.len() > self.cfg.max_word_len {
                continue;
            }
            if self.words.observe(bytes) {
                created.push(bytes.to_vec());
            }
        }
        for word in created {
            if let Some(entry) = self.words.entry_mut(&word) {
                self.rules.apply_all(&mut entry.segmentation);
            }
        }
    }

    /// Performs exactly one merge: recomputes pair frequencies, selects the
    /// best pair, registers the merged token, appends the rule, and rewrites
    /// every word segmentation.
    ///
    /// Returns `Ok(None)` without side effects when no pair exists. Fails
    /// only when the vocabulary id space is exhausted, in which case no
    /// partial state is committed.
    pub fn run_learning_iteration(&mut self) -> Result<Option<LearnedMerge>> {
        let counts = pairs::compute_pair_frequencies(&self.words);
        let Some(((left, right), frequency)) = pairs::find_best_pair(&counts) else {
            return Ok(None);
        };

        let rule = MergeRule::from_pair(left, right);
        self.vocab.register(&rule.merged)?;
        self.rules.push(rule.clone());
        for entry in self.words.entries_mut() {
            apply_rule(&rule, &mut entry.segmentation);
        }
        Ok(Some(LearnedMerge { rule, frequency }))
    }

    /// Maps raw text to token ids by replaying the full rule sequence against
    /// fresh per-word byte segmentations.
    ///
    /// Inference never mutates the vocabulary; tokens absent from the
    /// registry map to id 0. Word boundaries are not represented in the
    /// output.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<TokenId> {
        let mut segmentations: Vec<Vec<Vec<u8>>> = split_words(text)
            .map(|word| word.bytes().map(|b| vec![b]).collect())
            .collect();
        for segmentation in &mut segmentations {
            self.rules.apply_all(segmentation);
        }
        segmentations
            .iter()
            .flat_map(|segmentation| segmentation.iter())
            .map(|token| self.vocab.lookup(token))
            .collect()
    }

    /// Maps ids back to bytes and concatenates them.
    ///
    /// Lossy by design: inter-word spacing is discarded at training time, so
    /// `detokenize(tokenize(text))` does not reproduce the original spacing.
    /// Id 0 yields the sentinel token; an id that was never registered is an
    /// error.
    pub fn detokenize(&self, ids: &[TokenId]) -> Result<Vec<u8>> {
        let mut text = Vec::new();
        for &id in ids {
            let token = self
                .vocab
                .inverse_lookup(id)
                .ok_or(SubtokError::UnknownTokenId(id))?;
            text.extend_from_slice(token);
        }
        Ok(text)
    }

    /// Live vocabulary entry count.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of distinct words currently in the table.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Number of learned merge rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Merge rules in learning order.
    #[must_use]
    pub fn rules(&self) -> &[MergeRule] {
        self.rules.as_slice()
    }

    /// Looks up the rule learned for `pair`, if any.
    #[must_use]
    pub fn rule_for_pair(&self, pair: &Pair) -> Option<&MergeRule> {
        self.rules.get(pair)
    }

    /// The underlying vocabulary registry.
    #[must_use]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &TokenizerConfig {
        &self.cfg
    }

    /// Drops every word whose frequency is below `threshold` and returns the
    /// number removed.
    pub fn prune_word_list(&mut self, threshold: u64) -> usize {
        let before = self.words.len();
        let removed = self.words.prune_below(threshold);
        info!(
            "pruned word table from {} to {} entries (threshold {})",
            before,
            self.words.len(),
            threshold
        );
        removed
    }

    /// Removes vocabulary tokens that appear in no surviving word
    /// segmentation and returns the number removed.
    ///
    /// Built as one pass over the word table followed by a subtraction, which
    /// is observably identical to checking each token against the corpus.
    pub fn prune_redundant_tokens(&mut self) -> usize {
        let used = self.words.used_tokens();
        let doomed: Vec<Vec<u8>> = self
            .vocab
            .sorted_entries()
            .into_iter()
            .filter(|(token, _)| !used.contains(token))
            .map(|(token, _)| token)
            .collect();
        let before = self.vocab.len();
        for token in &doomed {
            self.vocab.remove(token);
        }
        info!(
            "pruned vocabulary from {} to {} entries",
            before,
            self.vocab.len()
        );
        doomed.len()
    }

    /// Writes the learned vocabulary and rule sequence to `path` as a binary
    /// artifact.
    ///
    /// The write is a single blocking pass; callers needing atomicity should
    /// write to a temporary path and rename.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?;
        let mut writer = BufWriter::new(file);
        serialization::write_artifact(&mut writer, &self.vocab, self.rules.as_slice())
    }

    /// Restores a tokenizer from a persisted artifact, with default engine
    /// configuration. The word table is not part of the artifact; a loaded
    /// tokenizer is ready for inference or further ingestion, not for
    /// resuming the exact training corpus.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, TokenizerConfig::default())
    }

    /// Restores a tokenizer from a persisted artifact with an explicit
    /// configuration.
    ///
    /// Persisted ids are re-applied verbatim; the id counter is restored from
    /// the header and raised past the highest persisted id so it stays a
    /// high-water mark even for artifacts saved after pruning.
    pub fn load_with_config<P: AsRef<Path>>(path: P, cfg: TokenizerConfig) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?;
        let mut reader = BufReader::new(file);
        let artifact = serialization::read_artifact(&mut reader)?;

        let mut vocab = Vocabulary::empty();
        vocab.restore_counter(artifact.counter);
        for (token, id) in &artifact.entries {
            vocab.register_with_id(token, *id)?;
            vocab.raise_counter_past(*id)?;
        }

        let mut rules = RuleTable::new();
        for rule in artifact.rules {
            rules.push(rule);
        }

        Ok(Self {
            cfg,
            vocab,
            words: WordTable::new(),
            rules,
        })
    }

    /// Returns `true` when `other` describes the same trained model: equal
    /// vocabulary bindings and an identical ordered rule sequence. The word
    /// table and configuration are not compared.
    #[must_use]
    pub fn same_model(&self, other: &Self) -> bool {
        self.vocab.sorted_entries() == other.vocab.sorted_entries()
            && self.rules.as_slice() == other.rules.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quiet() -> TokenizerConfig {
        TokenizerConfig::builder()
            .show_progress(false)
            .build()
            .unwrap()
    }

    fn example_corpus() -> Tokenizer {
        let mut tok = Tokenizer::new(quiet());
        tok.ingest("the cat sat");
        tok.ingest("the cat ran");
        tok.ingest("the dog sat");
        tok
    }

    fn assert_bijection(tok: &Tokenizer) {
        for (token, id) in tok.vocab().sorted_entries() {
            assert_eq!(tok.vocab().lookup(&token), id);
            assert_eq!(tok.vocab().inverse_lookup(id), Some(token.as_slice()));
        }
    }

    fn assert_segmentations_reconstruct(tok: &Tokenizer) {
        for (word, entry) in tok.words.iter() {
            assert_eq!(&entry.segmentation.concat(), word, "word lost bytes");
        }
    }

    #[test]
    fn ingest_skips_short_lines_and_long_words() {
        let mut tok = Tokenizer::new(quiet());
        tok.ingest("x");
        tok.ingest("  ");
        tok.ingest("");
        assert_eq!(tok.word_count(), 0);

        tok.ingest("ok averyveryverylongword");
        assert_eq!(tok.word_count(), 1);
        assert!(tok.words.entry_mut(b"ok").is_some());
    }

    #[test]
    fn ingest_counts_repeat_sightings() {
        let tok = example_corpus();
        assert_eq!(tok.word_count(), 5);
        let mut tok = tok;
        assert_eq!(tok.words.entry_mut(b"the").unwrap().frequency, 3);
        assert_eq!(tok.words.entry_mut(b"cat").unwrap().frequency, 2);
        assert_eq!(tok.words.entry_mut(b"dog").unwrap().frequency, 1);
    }

    #[test]
    fn first_merge_follows_weighted_pair_frequency() {
        let mut tok = example_corpus();
        let step = tok.run_learning_iteration().unwrap().unwrap();
        // 'a','t' appears in "cat" (2) and "sat" (2): weighted frequency 4,
        // ahead of 't','h' and 'h','e' at 3.
        assert_eq!(step.rule.left, b"a");
        assert_eq!(step.rule.right, b"t");
        assert_eq!(step.rule.merged, b"at");
        assert_eq!(step.frequency, 4);
        assert_eq!(tok.vocab_size(), 257);
        assert_eq!(tok.rule_count(), 1);
    }

    #[test]
    fn learning_preserves_engine_invariants() {
        let mut tok = example_corpus();
        for _ in 0..8 {
            tok.run_learning_iteration().unwrap();
            assert_bijection(&tok);
            assert_segmentations_reconstruct(&tok);
        }
    }

    #[test]
    fn iteration_without_pairs_is_a_noop() {
        let mut tok = Tokenizer::new(quiet());
        assert!(tok.run_learning_iteration().unwrap().is_none());
        assert_eq!(tok.vocab_size(), 256);
        assert_eq!(tok.rule_count(), 0);

        // Exhaust a tiny corpus down to single-token segmentations.
        tok.ingest("ab ab");
        assert!(tok.run_learning_iteration().unwrap().is_some());
        assert!(tok.run_learning_iteration().unwrap().is_none());
        assert_eq!(tok.rule_count(), 1);
    }

    #[test]
    fn late_ingest_replays_learned_rules() {
        let mut tok = example_corpus();
        tok.run_learning_iteration().unwrap();
        tok.run_learning_iteration().unwrap();

        tok.ingest("that cat");
        assert_segmentations_reconstruct(&tok);
        let entry = tok.words.entry_mut(b"that").unwrap();
        // "at" was merged in an earlier iteration; the new word must arrive
        // already segmented under every learned rule.
        assert!(entry.segmentation.contains(&b"at".to_vec()));
    }

    #[test]
    fn tokenize_round_trips_known_words() {
        let mut tok = example_corpus();
        for _ in 0..6 {
            tok.run_learning_iteration().unwrap();
        }
        let ids = tok.tokenize("the cat");
        assert!(!ids.is_empty());
        assert!(ids.iter().all(|&id| id != UNKNOWN_ID));
        let text = tok.detokenize(&ids).unwrap();
        // Lossy: the inter-word space is not reconstructed.
        assert_eq!(text, b"thecat");
    }

    #[test]
    fn tokenize_ids_stay_inside_the_registry_range() {
        let mut tok = example_corpus();
        for _ in 0..4 {
            tok.run_learning_iteration().unwrap();
        }
        let next = tok.vocab().next_id();
        for id in tok.tokenize("the quick brown fox") {
            assert!(id < next);
        }
    }

    #[test]
    fn tokenize_never_mutates_the_vocabulary() {
        let tok = example_corpus();
        let before = tok.vocab().sorted_entries();
        let _ = tok.tokenize("completely unseen words");
        assert_eq!(tok.vocab().sorted_entries(), before);
    }

    #[test]
    fn unknown_tokens_map_to_zero() {
        let mut tok = Tokenizer::new(quiet());
        // With an empty word table every token is redundant; pruning empties
        // the registry entirely.
        tok.prune_redundant_tokens();
        assert_eq!(tok.vocab_size(), 0);
        assert_eq!(tok.tokenize("ab"), vec![UNKNOWN_ID, UNKNOWN_ID]);
    }

    #[test]
    fn detokenize_rejects_never_registered_ids() {
        let tok = Tokenizer::new(quiet());
        assert_eq!(tok.detokenize(&[0]).unwrap(), b"_");
        let err = tok.detokenize(&[300]).unwrap_err();
        assert!(matches!(err, SubtokError::UnknownTokenId(300)));
    }

    #[test]
    fn prune_word_list_uses_frequency_threshold() {
        let mut tok = example_corpus();
        let removed = tok.prune_word_list(2);
        assert_eq!(removed, 2); // "ran" and "dog"
        assert_eq!(tok.word_count(), 3);
    }

    #[test]
    fn prune_redundant_tokens_is_idempotent() {
        let mut tok = example_corpus();
        for _ in 0..4 {
            tok.run_learning_iteration().unwrap();
        }
        tok.prune_word_list(2);
        let first = tok.prune_redundant_tokens();
        assert!(first > 0);
        assert_bijection(&tok);
        let second = tok.prune_redundant_tokens();
        assert_eq!(second, 0);
    }

    #[test]
    fn pruned_vocabulary_keeps_every_used_token() {
        let mut tok = example_corpus();
        for _ in 0..4 {
            tok.run_learning_iteration().unwrap();
        }
        tok.prune_word_list(2);
        tok.prune_redundant_tokens();
        for (_, entry) in tok.words.iter() {
            for token in &entry.segmentation {
                assert_ne!(tok.vocab().lookup(token), UNKNOWN_ID);
            }
        }
    }

    #[test]
    fn save_load_round_trip_is_exact() {
        let mut tok = example_corpus();
        for _ in 0..5 {
            tok.run_learning_iteration().unwrap();
        }
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        tok.save(&path).unwrap();

        let restored = Tokenizer::load(&path).unwrap();
        assert!(tok.same_model(&restored));
        assert_eq!(restored.rules(), tok.rules());
        assert_eq!(restored.tokenize("the cat sat"), tok.tokenize("the cat sat"));
    }

    #[test]
    fn round_trip_after_pruning_restores_counter_high_water() {
        let mut tok = example_corpus();
        for _ in 0..5 {
            tok.run_learning_iteration().unwrap();
        }
        tok.prune_word_list(2);
        tok.prune_redundant_tokens();

        let dir = tempdir().unwrap();
        let path = dir.path().join("pruned.bin");
        tok.save(&path).unwrap();
        let restored = Tokenizer::load(&path).unwrap();
        assert!(tok.same_model(&restored));

        // The counter stays past every persisted id, so new registrations
        // can never collide with restored ones.
        let max_id = restored
            .vocab()
            .sorted_entries()
            .last()
            .map(|&(_, id)| id)
            .unwrap();
        assert!(restored.vocab().next_id() > max_id);
    }

    #[test]
    fn load_rejects_id_collisions() {
        let mut artifact = Vec::new();
        artifact.extend_from_slice(&3u16.to_le_bytes()); // two entries
        for token in [b"a", b"b"] {
            artifact.extend_from_slice(&1u16.to_le_bytes());
            artifact.extend_from_slice(token);
            artifact.extend_from_slice(&7u16.to_le_bytes()); // same id twice
        }
        artifact.extend_from_slice(&0u16.to_le_bytes()); // no rules

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, &artifact).unwrap();
        let err = Tokenizer::load(&path).unwrap_err();
        assert!(matches!(err, SubtokError::CorruptArtifact(_)));
    }
}
