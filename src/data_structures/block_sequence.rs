use num_traits::Float;
use std::cmp::Ordering;

/// A single block of `(key, value)` pairs tagged with an upper bound on every
/// value it contains. Items are not kept sorted internally; sorting happens
/// lazily on `pull`.
#[derive(Debug)]
struct Block<W> {
    items: Vec<(usize, W)>,
    upper_bound: W,
}

/// The block-based priority queue from §4.2: supports `insert`,
/// `batch_prepend`, and `pull`-the-M-smallest, each cheaper than a
/// general-purpose binary heap for the access pattern `BMSSP` needs.
///
/// `D0` holds batch-prepended blocks, every item of which is guaranteed
/// smaller than every item in `D1`. `D1` holds individually inserted items,
/// partitioned into blocks ordered by `upper_bound` so `pull` can take a
/// smallest-first prefix without touching the whole structure.
#[derive(Debug)]
pub struct BlockSequence<W> {
    capacity: usize,
    bound: W,
    d0: std::collections::VecDeque<Block<W>>,
    /// Sorted ascending by `upper_bound`; always has at least one block, whose
    /// last entry's `upper_bound` equals `bound`.
    d1: Vec<Block<W>>,
}

impl<W> BlockSequence<W>
where
    W: Float + Copy + Ord,
{
    /// Creates an empty sequence with the given block capacity and external bound.
    pub fn new(capacity: usize, bound: W) -> Self {
        assert!(capacity >= 1, "block capacity must be positive");
        BlockSequence {
            capacity,
            bound,
            d0: std::collections::VecDeque::new(),
            d1: vec![Block {
                items: Vec::new(),
                upper_bound: bound,
            }],
        }
    }

    /// Current number of items across both `D0` and `D1`.
    pub fn count(&self) -> usize {
        self.d0.iter().map(|b| b.items.len()).sum::<usize>()
            + self.d1.iter().map(|b| b.items.len()).sum::<usize>()
    }

    /// True if no items remain.
    pub fn is_empty(&self) -> bool {
        self.d0.iter().all(|b| b.items.is_empty()) && self.d1.iter().all(|b| b.items.is_empty())
    }

    /// Inserts `(key, value)`. `value` must be `< bound`.
    pub fn insert(&mut self, key: usize, value: W) {
        debug_assert!(value < self.bound, "insert value must be below the bound");
        let idx = self.find_block(value);
        self.d1[idx].items.push((key, value));
        if self.d1[idx].items.len() > self.capacity {
            self.split(idx);
        }
    }

    /// Finds the first `D1` block whose `upper_bound >= value`.
    fn find_block(&self, value: W) -> usize {
        match self
            .d1
            .binary_search_by(|b| if b.upper_bound < value { Ordering::Less } else { Ordering::Greater })
        {
            Ok(i) | Err(i) => i.min(self.d1.len() - 1),
        }
    }

    /// Splits an overflowing `D1` block at its median.
    fn split(&mut self, idx: usize) {
        let block = &mut self.d1[idx];
        let mid = block.items.len() / 2;
        block
            .items
            .select_nth_unstable_by(mid, |a, b| a.1.cmp(&b.1));

        let old_upper = block.upper_bound;
        let upper_half = block.items.split_off(mid);
        let lower_max = block
            .items
            .iter()
            .map(|(_, v)| *v)
            .fold(block.items[0].1, |acc, v| if v > acc { v } else { acc });
        block.upper_bound = lower_max;

        self.d1.insert(
            idx + 1,
            Block {
                items: upper_half,
                upper_bound: old_upper,
            },
        );
    }

    /// Inserts a batch of items every one of which is strictly smaller than
    /// anything currently in the sequence. Caller is responsible for that
    /// precondition; it is not checked.
    pub fn batch_prepend(&mut self, mut items: Vec<(usize, W)>) {
        if items.is_empty() {
            return;
        }
        items.sort_by(|a, b| a.1.cmp(&b.1));

        let mut new_blocks = Vec::new();
        for chunk in items.chunks(self.capacity) {
            let upper = chunk
                .iter()
                .map(|(_, v)| *v)
                .fold(chunk[0].1, |acc, v| if v > acc { v } else { acc });
            new_blocks.push(Block {
                items: chunk.to_vec(),
                upper_bound: upper,
            });
        }
        // Prepend in sorted order: smallest chunk ends up at the front of D0.
        for block in new_blocks.into_iter().rev() {
            self.d0.push_front(block);
        }
    }

    /// Removes and returns up to `capacity` items of smallest value, along
    /// with the smallest value remaining afterward (or `+inf` if empty).
    pub fn pull(&mut self) -> (Vec<usize>, W) {
        let mut drained = Vec::with_capacity(self.capacity);

        // D0 items are already sorted ascending within each block (batch_prepend
        // sorts before chunking), so a prefix take is a valid smallest-first take.
        while drained.len() < self.capacity {
            let Some(block) = self.d0.front_mut() else {
                break;
            };
            let take = (self.capacity - drained.len()).min(block.items.len());
            drained.extend(block.items.drain(0..take));
            if block.items.is_empty() {
                self.d0.pop_front();
            }
        }

        // Then D1, block by block from the front, sorting each on demand.
        let mut d1_idx = 0;
        while drained.len() < self.capacity && d1_idx < self.d1.len() {
            let block = &mut self.d1[d1_idx];
            if block.items.is_empty() {
                d1_idx += 1;
                continue;
            }
            block.items.sort_by(|a, b| a.1.cmp(&b.1));
            let take = (self.capacity - drained.len()).min(block.items.len());
            drained.extend(block.items.drain(0..take));
            if block.items.is_empty() {
                d1_idx += 1;
            }
        }

        let boundary = self.min_remaining().unwrap_or_else(W::infinity);
        let keys = drained.into_iter().map(|(k, _)| k).collect();
        (keys, boundary)
    }

    /// Smallest value still present, relying on the cross-block/cross-sequence
    /// order invariants to avoid scanning past the first non-empty block.
    fn min_remaining(&self) -> Option<W> {
        for block in &self.d0 {
            if let Some(min) = block.items.iter().map(|(_, v)| *v).min() {
                return Some(min);
            }
        }
        for block in &self.d1 {
            if let Some(min) = block.items.iter().map(|(_, v)| *v).min() {
                return Some(min);
            }
        }
        None
    }
}
