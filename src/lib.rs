//! Word-level byte pair encoding (BPE) training library and CLI.
//!
//! The crate exposes both a library API and a `subtok` command line interface
//! for learning subword vocabularies from text corpora.  Typical usage feeds
//! corpus lines into a [`Tokenizer`], runs merge iterations up to a target
//! vocabulary size, and persists the resulting binary artifact.
//!
//! ```no_run
//! use subtok::{IngestConfig, Trainer, TrainerConfig};
//!
//! # fn main() -> subtok::Result<()> {
//! let cfg = TrainerConfig::builder()
//!     .target_vocab_size(4096)
//!     .prune_threshold(2)
//!     .show_progress(false)
//!     .build()?;
//! let trainer = Trainer::new(cfg);
//! let ingest = IngestConfig::default();
//! let artifacts = trainer.train_from_paths(&["/path/to/corpus"], &ingest)?;
//! artifacts.tokenizer.save("tokenizer.bin")?;
//! # Ok(())
//! # }
//! ```
//!
//! Encoding is lossy with respect to whitespace: the space delimiter is
//! consumed during training and never tokenized, so decoding a token
//! sequence concatenates words without reconstructing the original spacing.
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting
//! the library portion only can disable default features to avoid the CLI
//! dependencies: `subtok = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod pairs;
pub mod rules;
pub mod serialization;
pub mod tokenizer;
pub mod trainer;
pub mod vocab;
pub mod words;

pub use config::{
    IngestBuilder, IngestConfig, TokenizerBuilder, TokenizerConfig, TrainerBuilder, TrainerConfig,
};
pub use error::{Result, SubtokError};
pub use metrics::{IterationMetrics, StopReason, TrainingMetrics};
pub use rules::MergeRule;
pub use tokenizer::{LearnedMerge, Tokenizer};
pub use trainer::{Trainer, TrainerArtifacts};
pub use vocab::{TokenId, Vocabulary, UNKNOWN_ID};
