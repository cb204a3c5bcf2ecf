//! Adjacent-pair frequency analysis over the word table.

use rustc_hash::FxHashMap;

use crate::words::WordTable;

/// Adjacent token pair, ordered.
pub type Pair = (Vec<u8>, Vec<u8>);

/// Pair occurrence counts weighted by word frequency. Fully recomputed each
/// learning iteration, never maintained incrementally.
pub type PairCounts = FxHashMap<Pair, u64>;

/// Counts every adjacent token pair across all word segmentations, weighting
/// each occurrence by the word's corpus frequency. Single-token words
/// contribute nothing.
#[must_use]
pub fn compute_pair_frequencies(words: &WordTable) -> PairCounts {
    let mut counts = PairCounts::default();
    for (_, entry) in words.iter() {
        for window in entry.segmentation.windows(2) {
            let pair = (window[0].clone(), window[1].clone());
            *counts.entry(pair).or_insert(0) += entry.frequency;
        }
    }
    counts
}

/// Picks the pair with the strictly greatest frequency.
///
/// Ties are broken deterministically in favour of the lexicographically
/// smallest `(left, right)` pair, so training is reproducible regardless of
/// hash-map iteration order. Returns `None` when the table is empty.
#[must_use]
pub fn find_best_pair(counts: &PairCounts) -> Option<(Pair, u64)> {
    let mut best: Option<(&Pair, u64)> = None;
    for (pair, &count) in counts {
        if count == 0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_pair, best_count)) => {
                count > best_count || (count == best_count && pair < best_pair)
            }
        };
        if better {
            best = Some((pair, count));
        }
    }
    best.map(|(pair, count)| (pair.clone(), count))
}
