//! Explainability for pairwise distances
//!
//! Breaks a pair's distance down into per-column contributions, and
//! summarises a finished matrix.

use crate::aggregate::Aggregator;
use crate::matrix::DistanceMatrix;
use crate::preprocess::PreprocessedTable;
use mixdist_core::{Combination, ContinuousFamily, Result};
use serde::Serialize;

/// A column's share of one pair's distance
#[derive(Debug, Clone, Serialize)]
pub struct ColumnContribution {
    pub column: String,
    pub weight: f64,
    /// `None` when the column was excluded for this pair
    pub dissimilarity: Option<f64>,
    /// Additive contribution. Sums to `distance^r`, `r` being the
    /// aggregator's exponent (see [`Aggregator::exponent`]).
    pub contribution: f64,
    /// Fraction of the total contribution (0 when the distance is 0)
    pub share: f64,
}

/// Distance of one pair with its per-column breakdown
#[derive(Debug, Clone, Serialize)]
pub struct PairExplanation {
    pub row_a: usize,
    pub row_b: usize,
    pub distance: f64,
    pub combination: Combination,
    pub family: ContinuousFamily,
    pub columns: Vec<ColumnContribution>,
}

impl PairExplanation {
    pub fn compute(table: &PreprocessedTable, aggregator: &Aggregator, i: usize, j: usize) -> Result<Self> {
        let combination = aggregator.combination();
        let family = aggregator.family();

        if i == j {
            let columns = (0..table.n_columns())
                .map(|column| ColumnContribution {
                    column: table.name(column).to_string(),
                    weight: aggregator.weights().get(column),
                    dissimilarity: Some(0.0),
                    contribution: 0.0,
                    share: 0.0,
                })
                .collect();
            return Ok(Self {
                row_a: i,
                row_b: j,
                distance: 0.0,
                combination,
                family,
                columns,
            });
        }

        let (distance, terms) = aggregator.distance_with_terms(table, i, j)?;

        let used_weight: f64 = terms
            .iter()
            .filter(|t| t.dissimilarity.value().is_some())
            .map(|t| t.weight)
            .sum();
        let factor = match combination {
            Combination::WeightedMean => 1.0 / used_weight,
            Combination::WeightedEuclidean => aggregator.weights().total() / used_weight,
        };

        let exponent = aggregator.exponent();
        let contributions: Vec<f64> = terms
            .iter()
            .map(|t| t.magnitude(exponent).map_or(0.0, |m| t.weight * m * factor))
            .collect();
        let total: f64 = contributions.iter().sum();

        let columns = terms
            .iter()
            .zip(contributions)
            .map(|(term, contribution)| ColumnContribution {
                column: table.name(term.column).to_string(),
                weight: term.weight,
                dissimilarity: term.dissimilarity.value(),
                contribution,
                share: if total > 0.0 { contribution / total } else { 0.0 },
            })
            .collect();

        Ok(Self {
            row_a: i,
            row_b: j,
            distance,
            combination,
            family,
            columns,
        })
    }

    /// Column that contributed most to the distance
    pub fn top_contributor(&self) -> Option<&ColumnContribution> {
        self.columns
            .iter()
            .filter(|c| c.contribution > 0.0)
            .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
    }
}

/// Summary statistics over the off-diagonal entries of a matrix
#[derive(Debug, Clone, Serialize)]
pub struct MatrixStats {
    pub n: usize,
    pub pairs: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Pair with the largest distance
    pub farthest_pair: Option<(usize, usize)>,
}

impl MatrixStats {
    pub fn compute(matrix: &DistanceMatrix) -> Self {
        let n = matrix.n();
        let mut stats = Self {
            n,
            pairs: 0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            farthest_pair: None,
        };

        let mut sum = 0.0;
        for (i, j) in mixdist_core::pairs(n) {
            let d = matrix.get(i, j);
            if stats.pairs == 0 || d < stats.min {
                stats.min = d;
            }
            if stats.pairs == 0 || d > stats.max {
                stats.max = d;
                stats.farthest_pair = Some((i, j));
            }
            sum += d;
            stats.pairs += 1;
        }
        if stats.pairs > 0 {
            stats.mean = sum / stats.pairs as f64;
        }
        stats
    }

    /// `max / min`, `None` when there are no pairs or the closest pair has
    /// distance 0
    pub fn spread_ratio(&self) -> Option<f64> {
        (self.pairs > 0 && self.min > 0.0).then(|| self.max / self.min)
    }
}
