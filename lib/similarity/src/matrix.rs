//! Distance matrix construction
//!
//! [`MatrixBuilder`] evaluates every unordered pair `(i, j), i < j` exactly once
//! and mirrors it, so the result is symmetric bit for bit. The diagonal is
//! fixed at 0 without consulting the aggregator.
//!
//! Rows are processed in blocks of `block_rows`. Only one block's upper
//! triangle rows (at most `block_rows * n` values) are materialised at a time,
//! and blocks are delivered in index order, so the assembled matrix does not
//! depend on the block size. Within a block, rows may be evaluated on a rayon
//! pool; a cancellation token is checked between blocks.

use crate::aggregate::Aggregator;
use crate::preprocess::PreprocessedTable;
use mixdist_core::{
    pairs::Pairs, row_blocks, ConfigError, DistanceConfig, Error, Parallelism, Result,
    VariableDescriptor,
};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Square, symmetric, zero-diagonal distance matrix (row-major)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Number of observations
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Upper triangle in row-major order, see [`mixdist_core::condensed_index`]
    pub fn condensed(&self) -> Vec<f64> {
        mixdist_core::pairs(self.n).map(|(i, j)| self.get(i, j)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n).map(|i| self.row(i).to_vec()).collect()
    }
}

/// Upper-triangle distances of a contiguous range of rows
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    pub rows: Range<usize>,
    n: usize,
    upper: Vec<Vec<f64>>,
}

impl RowBlock {
    /// Distances from row `i` to rows `i + 1..n`
    pub fn distances(&self, i: usize) -> &[f64] {
        &self.upper[i - self.rows.start]
    }

    /// Every pair of the block with its distance
    pub fn pairs(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        Pairs::rows(self.n, self.rows.clone())
            .zip(self.upper.iter().flatten().copied())
    }
}

/// Cooperative cancellation flag shared with a running build
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Builds distance matrices from a preprocessed table
#[derive(Debug, Clone)]
pub struct MatrixBuilder<'a> {
    table: &'a PreprocessedTable,
    aggregator: Aggregator,
    block_rows: Option<usize>,
    parallelism: Parallelism,
    cancel: Option<CancelToken>,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(table: &'a PreprocessedTable, aggregator: Aggregator) -> Self {
        Self {
            table,
            aggregator,
            block_rows: None,
            parallelism: Parallelism::Sequential,
            cancel: None,
        }
    }

    /// Builder configured from `config` (weights, combination, missing policy,
    /// block size and threads)
    pub fn from_config(
        table: &'a PreprocessedTable,
        descriptors: &[VariableDescriptor],
        config: &DistanceConfig,
    ) -> Result<Self> {
        let aggregator = Aggregator::from_config(config, descriptors)?;
        let mut builder = Self::new(table, aggregator).parallelism(config.parallelism());
        if let Some(rows) = config.block_rows {
            builder = builder.block_rows(rows);
        }
        Ok(builder)
    }

    pub fn block_rows(mut self, rows: usize) -> Self {
        self.block_rows = Some(rows);
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Evaluate all pairs block by block, handing each finished block to
    /// `on_block` in row order. Stops at the first error.
    pub fn stream<F>(&self, mut on_block: F) -> Result<()>
    where
        F: FnMut(RowBlock) -> Result<()>,
    {
        let n = self.table.n_rows();
        if self.aggregator.weights().len() != self.table.n_columns() {
            return Err(ConfigError::WeightCount {
                expected: self.table.n_columns(),
                found: self.aggregator.weights().len(),
            }
            .into());
        }
        let block_rows = match self.block_rows {
            Some(0) => {
                return Err(ConfigError::InvalidParameter {
                    name: "block_rows",
                    message: "must be at least 1".to_string(),
                }
                .into())
            }
            Some(rows) => rows,
            None => n.max(1),
        };

        let pool = if self.parallelism.allows_parallel() {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.parallelism.n_threads())
                    .build()
                    .map_err(|e| Error::ThreadPool(e.to_string()))?,
            )
        } else {
            None
        };

        info!(
            rows = n,
            columns = self.table.n_columns(),
            block_rows,
            threads = self.parallelism.n_threads(),
            "building distance matrix"
        );

        for block in row_blocks(n, block_rows) {
            if self.cancel.as_ref().map_or(false, CancelToken::is_cancelled) {
                debug!(completed_rows = block.start, "matrix build cancelled");
                return Err(Error::Cancelled {
                    completed_rows: block.start,
                    total_rows: n,
                });
            }

            let upper = match &pool {
                Some(pool) => pool.install(|| {
                    block
                        .clone()
                        .into_par_iter()
                        .map(|i| self.row_distances(i))
                        .collect::<Result<Vec<_>>>()
                })?,
                None => block
                    .clone()
                    .map(|i| self.row_distances(i))
                    .collect::<Result<Vec<_>>>()?,
            };

            debug!(start = block.start, end = block.end, "block done");
            on_block(RowBlock {
                rows: block,
                n,
                upper,
            })?;
        }

        Ok(())
    }

    /// Assemble the full matrix
    pub fn build(&self) -> Result<DistanceMatrix> {
        let n = self.table.n_rows();
        let mut data = vec![0.0; n * n];

        self.stream(|block| {
            for ((i, j), d) in block.pairs() {
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
            Ok(())
        })?;

        Ok(DistanceMatrix { n, data })
    }

    fn row_distances(&self, i: usize) -> Result<Vec<f64>> {
        let n = self.table.n_rows();
        Pairs::rows(n, i..i + 1)
            .map(|(i, j)| self.aggregator.distance(self.table, i, j))
            .collect()
    }
}
