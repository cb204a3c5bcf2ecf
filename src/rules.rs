//! Ordered merge-rule storage and the shared rule application pass.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::pairs::Pair;

/// One learned merge: wherever `left` is immediately followed by `right`,
/// the pair is replaced with `merged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRule {
    /// Left token of the pair.
    pub left: Vec<u8>,
    /// Right token of the pair.
    pub right: Vec<u8>,
    /// Concatenation of `left` and `right`.
    pub merged: Vec<u8>,
}

impl MergeRule {
    /// Builds the rule for `pair`, synthesizing the merged token by raw
    /// concatenation.
    #[must_use]
    pub fn from_pair(left: Vec<u8>, right: Vec<u8>) -> Self {
        let mut merged = Vec::with_capacity(left.len() + right.len());
        merged.extend_from_slice(&left);
        merged.extend_from_slice(&right);
        Self {
            left,
            right,
            merged,
        }
    }
}

impl fmt::Display for MergeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) -> {}",
            String::from_utf8_lossy(&self.left),
            String::from_utf8_lossy(&self.right),
            String::from_utf8_lossy(&self.merged)
        )
    }
}

/// Append-only rule sequence with a pair index for lookup.
///
/// Replay order is the learning order; applying rules out of order can
/// produce a different segmentation, because a later rule may only become
/// applicable after an earlier one fires.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<MergeRule>,
    by_pair: FxHashMap<Pair, usize>,
}

impl RuleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rule` unless its pair is already present; returns whether it
    /// was appended.
    pub fn push(&mut self, rule: MergeRule) -> bool {
        let pair = (rule.left.clone(), rule.right.clone());
        if self.by_pair.contains_key(&pair) {
            return false;
        }
        self.by_pair.insert(pair, self.rules.len());
        self.rules.push(rule);
        true
    }

    /// Looks up the rule learned for `pair`, if any.
    #[must_use]
    pub fn get(&self, pair: &Pair) -> Option<&MergeRule> {
        self.by_pair.get(pair).map(|&idx| &self.rules[idx])
    }

    /// Rules in learning order.
    #[must_use]
    pub fn as_slice(&self) -> &[MergeRule] {
        &self.rules
    }

    /// Iterates over rules in learning order.
    pub fn iter(&self) -> impl Iterator<Item = &MergeRule> {
        self.rules.iter()
    }

    /// Number of learned rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rule has been learned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replays every rule, in learning order, against `tokens`. One full
    /// pass per rule; a token produced by rule `k` is only revisited by
    /// rules `k+1..`, never re-scanned against earlier rules.
    pub fn apply_all(&self, tokens: &mut Vec<Vec<u8>>) {
        for rule in &self.rules {
            apply_rule(rule, tokens);
        }
    }
}

/// Applies one rule to `tokens` with a single left-to-right, non-overlapping
/// scan. Matched pairs are replaced in place via read/write compaction; a
/// freshly merged token is never re-matched within the same pass. No-op for
/// sequences of one token or fewer.
pub fn apply_rule(rule: &MergeRule, tokens: &mut Vec<Vec<u8>>) {
    if tokens.len() <= 1 {
        return;
    }
    let len = tokens.len();
    let mut read = 0;
    let mut write = 0;
    while read < len {
        if read + 1 < len && tokens[read] == rule.left && tokens[read + 1] == rule.right {
            tokens[write] = rule.merged.clone();
            read += 2;
        } else {
            tokens.swap(write, read);
            read += 1;
        }
        write += 1;
    }
    tokens.truncate(write);
}
