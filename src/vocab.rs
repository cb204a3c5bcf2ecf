//! Bidirectional token/id registry backing the tokenizer.

use rustc_hash::FxHashMap;

use crate::error::{Result, SubtokError};

/// Token identifier used throughout the crate.
pub type TokenId = u16;

/// Reserved id meaning "unknown / not yet assigned".
pub const UNKNOWN_ID: TokenId = 0;

/// Sentinel token permanently bound to [`UNKNOWN_ID`].
pub const UNKNOWN_TOKEN: &[u8] = b"_";

/// Bijective token/id table with a monotonic high-water id counter.
///
/// Ids are handed out in strictly increasing insertion order starting at 1;
/// id 0 is never assigned. Removing a token shrinks the live entry count but
/// never rewinds the counter, so freed ids are not reused.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: FxHashMap<Vec<u8>, TokenId>,
    id_to_token: FxHashMap<TokenId, Vec<u8>>,
    next_id: TokenId,
}

impl Default for Vocabulary {
    /// Equivalent to [`Vocabulary::new`]; a derived default would start the
    /// id counter at 0 and hand out the reserved sentinel id.
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Creates a registry pre-seeded with the 256 single-byte base tokens (ids 1..=256).
    #[must_use]
    pub fn new() -> Self {
        let mut vocab = Self::empty();
        for byte in 0u8..=u8::MAX {
            vocab
                .register(&[byte])
                .expect("base vocabulary fits the id range");
        }
        vocab
    }

    /// Creates a registry holding only the reserved sentinel; used when
    /// restoring a persisted artifact, which carries its own base tokens.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            token_to_id: FxHashMap::default(),
            id_to_token: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Registers `token`, assigning the next free id, and returns its id.
    ///
    /// Idempotent: an already-registered token keeps its existing id.
    pub fn register(&mut self, token: &[u8]) -> Result<TokenId> {
        if let Some(&id) = self.token_to_id.get(token) {
            return Ok(id);
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(SubtokError::VocabularyFull)?;
        self.token_to_id.insert(token.to_vec(), id);
        self.id_to_token.insert(id, token.to_vec());
        Ok(id)
    }

    /// Registers `token` under an explicitly supplied id without touching the
    /// high-water counter. Used only while loading a persisted artifact.
    ///
    /// A token that is already present is left untouched. Binding an id that
    /// already belongs to a different token is a corrupt-artifact error.
    pub fn register_with_id(&mut self, token: &[u8], id: TokenId) -> Result<()> {
        if id == UNKNOWN_ID {
            return Err(SubtokError::CorruptArtifact(
                "artifact binds a token to the reserved id 0".into(),
            ));
        }
        if self.token_to_id.contains_key(token) {
            return Ok(());
        }
        if let Some(existing) = self.id_to_token.get(&id) {
            if existing.as_slice() != token {
                return Err(SubtokError::CorruptArtifact(format!(
                    "id {id} is bound to two different tokens"
                )));
            }
        }
        self.token_to_id.insert(token.to_vec(), id);
        self.id_to_token.insert(id, token.to_vec());
        Ok(())
    }

    /// Looks up the id of `token`, or [`UNKNOWN_ID`] when absent.
    #[must_use]
    pub fn lookup(&self, token: &[u8]) -> TokenId {
        self.token_to_id.get(token).copied().unwrap_or(UNKNOWN_ID)
    }

    /// Looks up the token bound to `id`. Id 0 always resolves to the sentinel.
    #[must_use]
    pub fn inverse_lookup(&self, id: TokenId) -> Option<&[u8]> {
        if id == UNKNOWN_ID {
            return Some(UNKNOWN_TOKEN);
        }
        self.id_to_token.get(&id).map(Vec::as_slice)
    }

    /// Returns `true` when `token` is registered.
    #[must_use]
    pub fn contains(&self, token: &[u8]) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Erases `token` from both directions of the table.
    ///
    /// The high-water counter is deliberately left untouched so the freed id
    /// is never handed out again.
    pub fn remove(&mut self, token: &[u8]) {
        if let Some(id) = self.token_to_id.remove(token) {
            self.id_to_token.remove(&id);
        }
    }

    /// Number of live entries (the sentinel is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    /// Returns `true` when no token beyond the sentinel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    /// Next id the registry would hand out.
    #[must_use]
    pub fn next_id(&self) -> TokenId {
        self.next_id
    }

    /// Restores the counter from a persisted artifact header.
    pub(crate) fn restore_counter(&mut self, counter: TokenId) {
        self.next_id = self.next_id.max(counter);
    }

    /// Raises the counter so the invariant `next_id == max(id) + 1` holds
    /// after re-registering a persisted entry.
    pub(crate) fn raise_counter_past(&mut self, id: TokenId) -> Result<()> {
        let floor = id.checked_add(1).ok_or(SubtokError::VocabularyFull)?;
        self.next_id = self.next_id.max(floor);
        Ok(())
    }

    /// Live entries sorted by id; the deterministic iteration order used by
    /// the persistence codec.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<(Vec<u8>, TokenId)> {
        let mut entries: Vec<(Vec<u8>, TokenId)> = self
            .token_to_id
            .iter()
            .map(|(token, &id)| (token.clone(), id))
            .collect();
        entries.sort_by_key(|&(_, id)| id);
        entries
    }
}
