//! Persistence of trained tokenizer state.

mod binary;

pub use binary::{read_artifact, write_artifact, Artifact};
