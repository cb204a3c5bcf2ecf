//! Configuration builders controlling the engine, training, and corpus ingestion.

use crate::error::{Result, SubtokError};
use serde::{Deserialize, Serialize};

/// Configuration for a single tokenizer instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Maximum word length in bytes; longer words are silently skipped
    /// during ingestion, never partially recorded.
    pub max_word_len: usize,
    /// Default frequency threshold for the word-table prune pass.
    pub prune_threshold: u64,
    /// Enables per-iteration logging through the `log` facade.
    pub show_progress: bool,
}

impl TokenizerConfig {
    /// Returns a builder initialised with [`TokenizerConfig::default`].
    #[must_use]
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// Validates the invariants required by the engine.
    pub fn validate(&self) -> Result<()> {
        if self.max_word_len == 0 {
            return Err(SubtokError::InvalidConfig(
                "max_word_len must be greater than zero".into(),
            ));
        }
        if self.prune_threshold == 0 {
            return Err(SubtokError::InvalidConfig(
                "prune_threshold must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_word_len: 15,
            prune_threshold: 2,
            show_progress: true,
        }
    }
}

/// Builder for [`TokenizerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TokenizerBuilder {
    cfg: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Creates a builder with [`TokenizerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum ingested word length in bytes.
    #[must_use]
    pub fn max_word_len(mut self, value: usize) -> Self {
        self.cfg.max_word_len = value;
        self
    }

    /// Sets the default word-frequency prune threshold.
    #[must_use]
    pub fn prune_threshold(mut self, value: u64) -> Self {
        self.cfg.prune_threshold = value;
        self
    }

    /// Enables or disables per-iteration logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`TokenizerConfig`].
    pub fn build(self) -> Result<TokenizerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration for a complete training run driven by [`crate::Trainer`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainerConfig {
    /// Target live vocabulary size; training stops once reached.
    pub target_vocab_size: usize,
    /// Hard cap on merge iterations; `None` relies on the target size alone.
    pub max_merge_iterations: Option<usize>,
    /// Runs both prune passes (rare words, then unused tokens) after training.
    pub prune_after_training: bool,
    /// Engine configuration handed to the tokenizer being trained.
    pub tokenizer: TokenizerConfig,
}

impl TrainerConfig {
    /// Returns a builder initialised with [`TrainerConfig::default`].
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::default()
    }

    /// Validates the invariants required for training.
    pub fn validate(&self) -> Result<()> {
        if self.target_vocab_size <= 256 {
            return Err(SubtokError::InvalidConfig(format!(
                "target_vocab_size ({}) must exceed the 256 base byte tokens",
                self.target_vocab_size
            )));
        }
        let max_vocab = usize::from(u16::MAX - 1);
        if self.target_vocab_size > max_vocab {
            return Err(SubtokError::InvalidConfig(format!(
                "target_vocab_size ({}) exceeds {max_vocab}, the 16-bit id range",
                self.target_vocab_size
            )));
        }
        self.tokenizer.validate()
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            target_vocab_size: 4096,
            max_merge_iterations: None,
            prune_after_training: true,
            tokenizer: TokenizerConfig::default(),
        }
    }
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TrainerBuilder {
    cfg: TrainerConfig,
}

impl TrainerBuilder {
    /// Creates a builder with [`TrainerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target live vocabulary size.
    #[must_use]
    pub fn target_vocab_size(mut self, value: usize) -> Self {
        self.cfg.target_vocab_size = value;
        self
    }

    /// Sets a hard merge iteration limit.
    #[must_use]
    pub fn max_merge_iterations(mut self, value: Option<usize>) -> Self {
        self.cfg.max_merge_iterations = value;
        self
    }

    /// Enables or disables the post-training prune passes.
    #[must_use]
    pub fn prune_after_training(mut self, enabled: bool) -> Self {
        self.cfg.prune_after_training = enabled;
        self
    }

    /// Sets the maximum ingested word length in bytes.
    #[must_use]
    pub fn max_word_len(mut self, value: usize) -> Self {
        self.cfg.tokenizer.max_word_len = value;
        self
    }

    /// Sets the word-frequency prune threshold.
    #[must_use]
    pub fn prune_threshold(mut self, value: u64) -> Self {
        self.cfg.tokenizer.prune_threshold = value;
        self
    }

    /// Enables or disables per-iteration logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.tokenizer.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`TrainerConfig`].
    pub fn build(self) -> Result<TrainerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration controlling how text corpora are read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Enables recursive directory traversal.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
    /// Number of leading lines skipped in every corpus file (header rows).
    pub skip_header_lines: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            skip_header_lines: 2,
        }
    }
}

impl IngestConfig {
    /// Returns a builder initialised with [`IngestConfig::default`].
    #[must_use]
    pub fn builder() -> IngestBuilder {
        IngestBuilder::default()
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug, Default, Clone)]
pub struct IngestBuilder {
    cfg: IngestConfig,
}

impl IngestBuilder {
    /// Creates a new builder with [`IngestConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Sets the number of header lines skipped per corpus file.
    #[must_use]
    pub fn skip_header_lines(mut self, count: usize) -> Self {
        self.cfg.skip_header_lines = count;
        self
    }

    /// Finalises the builder, returning the [`IngestConfig`].
    pub fn build(self) -> IngestConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_defaults_match_engine_contract() {
        let cfg = TokenizerConfig::default();
        assert_eq!(cfg.max_word_len, 15);
        assert_eq!(cfg.prune_threshold, 2);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn validate_rejects_zero_word_length() {
        let cfg = TokenizerConfig {
            max_word_len: 0,
            ..TokenizerConfig::default()
        };
        let err = cfg.validate().expect_err("validation should fail");
        assert!(matches!(
            err,
            SubtokError::InvalidConfig(message) if message.contains("max_word_len")
        ));
    }

    #[test]
    fn trainer_target_must_exceed_base_vocabulary() {
        let err = TrainerConfig::builder()
            .target_vocab_size(256)
            .build()
            .expect_err("validation should fail");
        assert!(matches!(err, SubtokError::InvalidConfig(_)));
    }

    #[test]
    fn trainer_target_must_fit_id_range() {
        let err = TrainerConfig::builder()
            .target_vocab_size(usize::from(u16::MAX))
            .build()
            .expect_err("validation should fail");
        assert!(matches!(err, SubtokError::InvalidConfig(_)));
    }

    #[test]
    fn ingest_builder_overrides_defaults() {
        let cfg = IngestConfig::builder()
            .recursive(false)
            .follow_symlinks(true)
            .skip_header_lines(0)
            .build();
        assert!(!cfg.recursive);
        assert!(cfg.follow_symlinks);
        assert_eq!(cfg.skip_header_lines, 0);
    }
}
