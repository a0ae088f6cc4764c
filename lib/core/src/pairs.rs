//! Unordered index pairs
//!
//! [`Pairs`] enumerates `{(i, j) : 0 <= i < j < n}` in row-major order. It is
//! lazy, finite and restartable (clone it or call [`pairs`] again), and it
//! can be restricted to a range of first indices, which is how block mode and
//! parallel partitioning split the work.
//!
//! ```text
//!        j: 0  1  2  3
//!  i = 0    .  0  1  2
//!  i = 1       .  3  4
//!  i = 2          .  5
//! ```
//!
//! The number in each cell is the pair's condensed index.

use std::ops::Range;

/// Number of unordered pairs among `n` items
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Position of pair `(i, j)`, `i < j < n`, in the condensed upper triangle
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    // pairs before row i: sum_{r < i} (n - 1 - r)
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

/// All unordered pairs among `n` items
pub fn pairs(n: usize) -> Pairs {
    Pairs::rows(n, 0..n)
}

/// Lazy iterator over unordered index pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairs {
    n: usize,
    end_row: usize,
    i: usize,
    j: usize,
}

impl Pairs {
    /// Pairs `(i, j)` with `i` in `rows` and `i < j < n`
    pub fn rows(n: usize, rows: Range<usize>) -> Self {
        let end_row = rows.end.min(n);
        let i = rows.start.min(end_row);
        Self {
            n,
            end_row,
            i,
            j: i + 1,
        }
    }

    fn remaining(&self) -> usize {
        if self.i >= self.end_row {
            return 0;
        }
        let current_row = self.n.saturating_sub(self.j);
        let later_rows: usize = (self.i + 1..self.end_row).map(|r| self.n - 1 - r).sum();
        current_row + later_rows
    }
}

impl Iterator for Pairs {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.i < self.end_row {
            if self.j < self.n {
                let pair = (self.i, self.j);
                self.j += 1;
                return Some(pair);
            }
            self.i += 1;
            self.j = self.i + 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pairs {}

impl std::iter::FusedIterator for Pairs {}

/// Split `0..n` into consecutive row blocks of at most `block_rows` rows
pub fn row_blocks(n: usize, block_rows: usize) -> impl Iterator<Item = Range<usize>> + Clone {
    let step = block_rows.max(1);
    (0..n).step_by(step).map(move |start| start..(start + step).min(n))
}
