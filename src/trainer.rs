//! High-level training driver looping the engine's single-merge iterations.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use log::info;

use crate::config::{IngestConfig, TrainerBuilder, TrainerConfig};
use crate::corpus;
use crate::error::Result;
use crate::metrics::{sample_rss_kb, IterationMetrics, StopReason, TrainingMetrics};
use crate::tokenizer::Tokenizer;

/// High-level façade configuring and executing BPE training runs.
///
/// The engine itself performs exactly one merge per call; the trainer owns
/// the stopping condition (target vocabulary size, optional iteration cap,
/// pair exhaustion) and the optional post-training prune passes.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainerConfig,
}

/// Artifacts returned after a training session completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct TrainerArtifacts {
    /// Trained tokenizer, ready to save or use for inference.
    pub tokenizer: Tokenizer,
    /// Detailed metrics captured during training.
    pub metrics: TrainingMetrics,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: TrainerConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`TrainerBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    /// Trains a tokenizer by walking files from disk according to
    /// [`IngestConfig`] and feeding them line by line.
    pub fn train_from_paths<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        ingest: &IngestConfig,
    ) -> Result<TrainerArtifacts> {
        self.cfg.validate()?;
        let mut tokenizer = Tokenizer::new(self.cfg.tokenizer.clone());
        let files = corpus::collect_paths(inputs, ingest)?;
        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            let start = Instant::now();
            let lines = corpus::ingest_file(&mut tokenizer, file, ingest)?;
            if self.cfg.tokenizer.show_progress {
                info!(
                    "file {}/{} ({:?}): {} lines in {:.2?}, {} distinct words",
                    index + 1,
                    total,
                    file,
                    lines,
                    start.elapsed(),
                    tokenizer.word_count()
                );
            }
        }
        self.train_tokenizer(tokenizer)
    }

    /// Trains a tokenizer from in-memory corpus lines.
    pub fn train_from_lines<I, S>(&self, lines: I) -> Result<TrainerArtifacts>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cfg.validate()?;
        let mut tokenizer = Tokenizer::new(self.cfg.tokenizer.clone());
        for line in lines {
            tokenizer.ingest(line.as_ref());
        }
        self.train_tokenizer(tokenizer)
    }

    /// Runs the learning loop against an already-populated tokenizer, then
    /// the optional prune passes. Useful when the caller drives ingestion
    /// itself (for progress reporting, say) before handing over.
    pub fn train_tokenizer(&self, mut tokenizer: Tokenizer) -> Result<TrainerArtifacts> {
        self.cfg.validate()?;
        let target = self.cfg.target_vocab_size;
        let mut metrics = TrainingMetrics::new(target.saturating_sub(256).min(16_384));
        let training_start = Instant::now();
        let mut iteration = 0usize;

        while tokenizer.vocab_size() < target {
            if let Some(max_iters) = self.cfg.max_merge_iterations {
                if iteration >= max_iters {
                    metrics.stop_reason = StopReason::MaxIterationsReached;
                    break;
                }
            }

            let iteration_start = Instant::now();
            let Some(step) = tokenizer.run_learning_iteration()? else {
                metrics.stop_reason = StopReason::NoEligiblePairs;
                break;
            };
            iteration += 1;

            if self.cfg.tokenizer.show_progress {
                info!(
                    "iter {:>6} freq {:>8} rule {} vocab {:>6}",
                    iteration,
                    step.frequency,
                    step.rule,
                    tokenizer.vocab_size()
                );
            }
            metrics.iterations.push(IterationMetrics {
                iteration,
                best_frequency: step.frequency,
                vocab_size: tokenizer.vocab_size(),
                elapsed_iteration: iteration_start.elapsed(),
                elapsed_total: training_start.elapsed(),
                rss_kb: sample_rss_kb(),
            });
        }

        if self.cfg.prune_after_training {
            metrics.words_pruned = tokenizer.prune_word_list(self.cfg.tokenizer.prune_threshold);
            metrics.tokens_pruned = tokenizer.prune_redundant_tokens();
        }
        metrics.total_duration = training_start.elapsed();

        if self.cfg.tokenizer.show_progress {
            info!(
                "completed {} merges in {:.2?}; vocab size {}",
                tokenizer.rule_count(),
                metrics.total_duration,
                tokenizer.vocab_size()
            );
        }

        Ok(TrainerArtifacts { tokenizer, metrics })
    }
}

impl fmt::Display for TrainerArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BPE model with vocab size {}", self.tokenizer.vocab_size())?;
        writeln!(f, "Merge rules: {}", self.tokenizer.rule_count())?;
        writeln!(f, "Stop reason: {:?}", self.metrics.stop_reason)?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn trainer(target: usize) -> Trainer {
        let cfg = TrainerConfig::builder()
            .target_vocab_size(target)
            .prune_after_training(false)
            .show_progress(false)
            .build()
            .unwrap();
        Trainer::new(cfg)
    }

    #[test]
    fn training_stops_at_target_vocab_size() {
        let lines = ["the cat sat", "the cat ran", "the dog sat"];
        let artifacts = trainer(260).train_from_lines(lines).unwrap();
        assert_eq!(artifacts.tokenizer.vocab_size(), 260);
        assert_eq!(artifacts.tokenizer.rule_count(), 4);
        assert_eq!(artifacts.metrics.stop_reason, StopReason::TargetVocabReached);
    }

    #[test]
    fn training_stops_when_pairs_run_out() {
        let artifacts = trainer(1000).train_from_lines(["ab ab ab"]).unwrap();
        assert_eq!(artifacts.metrics.stop_reason, StopReason::NoEligiblePairs);
        assert_eq!(artifacts.tokenizer.rule_count(), 1);
    }

    #[test]
    fn iteration_cap_is_honored() {
        let cfg = TrainerConfig::builder()
            .target_vocab_size(1000)
            .max_merge_iterations(Some(2))
            .prune_after_training(false)
            .show_progress(false)
            .build()
            .unwrap();
        let artifacts = Trainer::new(cfg)
            .train_from_lines(["the cat sat", "the cat ran"])
            .unwrap();
        assert_eq!(artifacts.metrics.iterations.len(), 2);
        assert_eq!(
            artifacts.metrics.stop_reason,
            StopReason::MaxIterationsReached
        );
    }

    #[test]
    fn post_training_prune_reports_counts() {
        let cfg = TrainerConfig::builder()
            .target_vocab_size(262)
            .show_progress(false)
            .build()
            .unwrap();
        let artifacts = Trainer::new(cfg)
            .train_from_lines(["the cat sat", "the cat ran", "the dog sat"])
            .unwrap();
        // "ran" and "dog" fall below the default threshold of 2.
        assert_eq!(artifacts.metrics.words_pruned, 2);
        assert!(artifacts.metrics.tokens_pruned > 0);
    }

    #[test]
    fn train_from_paths_walks_the_corpus() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("corpus.txt"),
            "header one\nheader two\nthe cat sat\nthe cat ran\nthe dog sat\n",
        )
        .unwrap();
        let ingest = IngestConfig::default();
        let artifacts = trainer(258)
            .train_from_paths(&[dir.path()], &ingest)
            .unwrap();
        assert_eq!(artifacts.tokenizer.vocab_size(), 258);
        let rendered = artifacts.to_string();
        assert!(rendered.contains("vocab size 258"));
    }
}
