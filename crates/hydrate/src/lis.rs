//! Longest non-decreasing subsequence over claim orders.
//!
//! The nodes that a reorder leaves untouched keep their relative order, so
//! they always form a non-decreasing subsequence of the original claim
//! orders. Keeping the longest such subsequence in place therefore gives the
//! smallest possible number of moves.
//!
//! Complexity: O(n log n) time, O(n) space.

/// One longest non-decreasing subsequence of an input sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subsequence {
    /// Indices into the input, ascending.
    pub indices: Vec<usize>,
    /// For every input item, the index of the item before it in the best run
    /// ending at that item.
    pub predecessors: Vec<Option<usize>>,
}

impl Subsequence {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }
}

/// First index in `[low, high)` whose key is strictly greater than `value`,
/// or `high` when there is none. Keys must be non-decreasing over the range.
pub fn upper_bound<K: Ord>(
    mut low: usize,
    mut high: usize,
    key_at: impl Fn(usize) -> K,
    value: &K,
) -> usize {
    while low < high {
        let mid = low + (high - low) / 2;
        if key_at(mid) <= *value {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// Find one longest non-decreasing subsequence of `keys`.
///
/// Equal keys extend a run instead of replacing its tail.
pub fn longest_non_decreasing<K: Ord>(keys: &[K]) -> Subsequence {
    // tails[len - 1] = index of the smallest key ending a run of length `len`.
    let mut tails: Vec<usize> = Vec::with_capacity(keys.len());
    let mut predecessors = vec![None; keys.len()];

    for (i, key) in keys.iter().enumerate() {
        let extends = match tails.last() {
            // Append-only input never needs the binary search.
            Some(&tail) if keys[tail] <= *key => tails.len(),
            Some(_) => upper_bound(0, tails.len(), |len| &keys[tails[len]], &key),
            None => 0,
        };
        predecessors[i] = extends.checked_sub(1).map(|len| tails[len]);
        if extends == tails.len() {
            tails.push(i);
        } else {
            tails[extends] = i;
        }
    }

    let mut indices = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        indices.push(index);
        cursor = predecessors[index];
    }
    indices.reverse();

    Subsequence {
        indices,
        predecessors,
    }
}
