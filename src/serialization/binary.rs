//! Binary artifact codec for the learned vocabulary and merge rules.
//!
//! Layout, all integers little-endian u16:
//!
//! ```text
//! header:  vocabularySize (live entries + 1)
//! repeat (vocabularySize - 1) times:
//!   tokenLen, tokenBytes, tokenId
//! mergeRuleCount
//! repeat mergeRuleCount times:
//!   leftLen, leftBytes, rightLen, rightBytes, mergedLen, mergedBytes
//! ```
//!
//! Vocabulary entries are written sorted by id; merge rules are written in
//! learning order, which the loader must preserve verbatim.

use std::io::{Read, Write};

use crate::error::{Result, SubtokError};
use crate::rules::MergeRule;
use crate::vocab::{TokenId, Vocabulary};

/// Decoded artifact contents, not yet applied to a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Persisted header: live vocabulary entries + 1, restored as the
    /// registry's id counter.
    pub counter: u16,
    /// `(token, id)` pairs in file order.
    pub entries: Vec<(Vec<u8>, TokenId)>,
    /// Merge rules in learning order.
    pub rules: Vec<MergeRule>,
}

fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer
        .write_all(&value.to_le_bytes())
        .map_err(|err| SubtokError::io(err, None))
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| SubtokError::Internal("token length exceeds artifact range".into()))?;
    write_u16(writer, len)?;
    writer
        .write_all(bytes)
        .map_err(|err| SubtokError::io(err, None))
}

fn read_u16<R: Read>(reader: &mut R, what: &str) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf, what)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_bytes<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let len = usize::from(read_u16(reader, what)?);
    let mut bytes = vec![0u8; len];
    read_exact(reader, &mut bytes, what)?;
    Ok(bytes)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            SubtokError::CorruptArtifact(format!("truncated stream while reading {what}"))
        } else {
            SubtokError::io(err, None)
        }
    })
}

/// Serialises the registry and the ordered rule list to `writer`.
pub fn write_artifact<W: Write>(
    writer: &mut W,
    vocab: &Vocabulary,
    rules: &[MergeRule],
) -> Result<()> {
    let counter = u16::try_from(vocab.len() + 1)
        .map_err(|_| SubtokError::Internal("vocabulary exceeds artifact range".into()))?;
    write_u16(writer, counter)?;
    for (token, id) in vocab.sorted_entries() {
        write_bytes(writer, &token)?;
        write_u16(writer, id)?;
    }

    let rule_count = u16::try_from(rules.len())
        .map_err(|_| SubtokError::Internal("merge rule count exceeds artifact range".into()))?;
    write_u16(writer, rule_count)?;
    for rule in rules {
        write_bytes(writer, &rule.left)?;
        write_bytes(writer, &rule.right)?;
        write_bytes(writer, &rule.merged)?;
    }
    Ok(())
}

/// Parses a complete artifact from `reader`.
///
/// Fails with [`SubtokError::CorruptArtifact`] on a truncated stream or a
/// token length that overruns the remaining bytes. Id conflicts are detected
/// later, when the entries are re-registered.
pub fn read_artifact<R: Read>(reader: &mut R) -> Result<Artifact> {
    let counter = read_u16(reader, "header")?;
    if counter == 0 {
        return Err(SubtokError::CorruptArtifact(
            "header vocabulary count is zero".into(),
        ));
    }

    let entry_count = usize::from(counter) - 1;
    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let token = read_bytes(reader, "vocabulary entry")?;
        let id = read_u16(reader, "vocabulary entry id")?;
        entries.push((token, id));
    }

    let rule_count = usize::from(read_u16(reader, "merge rule count")?);
    let mut rules = Vec::with_capacity(rule_count);
    for _ in 0..rule_count {
        let left = read_bytes(reader, "merge rule")?;
        let right = read_bytes(reader, "merge rule")?;
        let merged = read_bytes(reader, "merge rule")?;
        rules.push(MergeRule {
            left,
            right,
            merged,
        });
    }

    Ok(Artifact {
        counter,
        entries,
        rules,
    })
}
