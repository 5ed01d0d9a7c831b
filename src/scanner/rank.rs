//! Bounded largest-N selection.
//!
//! Capacities are small (≤500), so a sorted vector with linear insertion
//! beats a heap on simplicity and is plenty fast.

/// Anything rankable by a byte size.
pub trait SizeRanked {
    /// Ranking key, descending.
    fn size_bytes(&self) -> u64;
}

/// Fixed-capacity list of the largest items seen so far, descending by size.
#[derive(Debug, Clone)]
pub struct TopList<T> {
    limit: usize,
    entries: Vec<T>,
}

impl<T: SizeRanked> TopList<T> {
    /// Empty list that will retain at most `limit` items.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::with_capacity(limit.min(64)),
        }
    }

    /// Offer a candidate; the smallest retained item is evicted when a
    /// larger one arrives at capacity.
    pub fn offer(&mut self, candidate: T) {
        if self.limit == 0 {
            return;
        }
        let size = candidate.size_bytes();
        if self.entries.len() == self.limit
            && self
                .entries
                .last()
                .is_some_and(|tail| tail.size_bytes() >= size)
        {
            return;
        }
        let position = self
            .entries
            .iter()
            .position(|existing| existing.size_bytes() < size)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, candidate);
        if self.entries.len() > self.limit {
            self.entries.pop();
        }
    }

    /// Number of retained items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume into the retained items, largest first.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.entries
    }
}
