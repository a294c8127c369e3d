//! Candidate ranges and the per-range hashing loop.

use crate::digest::{TargetSet, id_digest};
use crate::search::result::ResultMap;

/// Half-open interval `[start, end)` of candidate identifiers handled by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub start: u64,
    pub end: u64,
}

impl SearchRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of candidates in the range.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into consecutive blocks of at most `block` candidates.
    pub fn blocks(self, block: u64) -> impl Iterator<Item = SearchRange> {
        let block = block.max(1);
        let mut next = self.start;
        std::iter::from_fn(move || {
            if next >= self.end {
                return None;
            }
            let end = next.saturating_add(block).min(self.end);
            let range = SearchRange::new(next, end);
            next = end;
            Some(range)
        })
    }
}

impl std::fmt::Display for SearchRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Split `[1, max_id]` into `parts` contiguous ranges.
///
/// Every range but the last holds `max_id / parts` candidates; the last one
/// absorbs the remainder. When `max_id < parts` the leading ranges are empty.
/// `parts == 0` is treated as a single range.
pub fn partition(max_id: u64, parts: usize) -> Vec<SearchRange> {
    let parts = parts.max(1) as u64;
    let step = max_id / parts;

    (0..parts)
        .map(|i| {
            let start = i * step + 1;
            let end = if i == parts - 1 {
                max_id + 1
            } else {
                (i + 1) * step + 1
            };
            SearchRange::new(start, end)
        })
        .collect()
}

/// Hash every identifier in `range` and keep those whose digest is a target.
pub fn search_range(range: SearchRange, targets: &TargetSet) -> ResultMap {
    let mut found = ResultMap::new();
    if targets.is_empty() {
        return found;
    }

    for id in range.start..range.end {
        let digest = id_digest(id);
        if targets.contains(&digest) {
            found.insert(hex::encode(digest), id);
        }
    }

    found
}
