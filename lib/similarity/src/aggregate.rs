//! Aggregation of per-column dissimilarities
//!
//! Combines the column dissimilarities of one observation pair into a single
//! distance:
//!
//! ```text
//! weighted_mean:      d(i, j) = ( Σ w_k d_k^r / Σ' w_k )^(1/r)
//! weighted_euclidean: d(i, j) = sqrt( Σ w_k d_k² · W / Σ' w_k )
//! ```
//!
//! where `Σ'` runs over the columns usable for the pair (excluded columns drop
//! out of both sums), `W` is the total weight and `r` is `p` for the Minkowski
//! family and 1 otherwise. Continuous differences computed in a squared or
//! Minkowski family already carry the exponent and are not raised again.
//! Sentinel terms are raised like categorical ones, whatever the column kind.

use crate::dissimilarity::{column_dissimilarity, Dissimilarity};
use crate::preprocess::{PreprocessedColumn, PreprocessedTable};
use mixdist_core::{
    Combination, ConfigError, ContinuousFamily, DistanceConfig, MissingPolicy, Result,
    VariableDescriptor, WeightVector,
};

/// One column's part in a pair's distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTerm {
    pub column: usize,
    pub weight: f64,
    pub dissimilarity: Dissimilarity,
    /// The dissimilarity is a computed continuous difference that already
    /// carries the combination exponent
    pub powered: bool,
}

impl PairTerm {
    /// Value entering the weighted sum when terms are raised to `exponent`
    pub fn magnitude(&self, exponent: f64) -> Option<f64> {
        let d = self.dissimilarity.value()?;
        Some(if self.powered || exponent == 1.0 {
            d
        } else if exponent == 2.0 {
            d * d
        } else {
            d.powf(exponent)
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Sums {
    weighted: f64,
    used_weight: f64,
    joint_absent_weight: f64,
}

/// Combines per-column dissimilarities into one distance per pair
#[derive(Debug, Clone)]
pub struct Aggregator {
    weights: WeightVector,
    combination: Combination,
    family: ContinuousFamily,
    missing: MissingPolicy,
}

impl Aggregator {
    pub fn new(
        weights: WeightVector,
        combination: Combination,
        family: ContinuousFamily,
        missing: MissingPolicy,
    ) -> Self {
        Self {
            weights,
            combination,
            family,
            missing,
        }
    }

    /// Validate `config` and build the aggregator it describes
    pub fn from_config(config: &DistanceConfig, descriptors: &[VariableDescriptor]) -> Result<Self> {
        let weights = config.validate(descriptors)?;
        Ok(Self::new(
            weights,
            config.combination,
            config.continuous_family(),
            config.missing,
        ))
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn combination(&self) -> Combination {
        self.combination
    }

    pub fn family(&self) -> ContinuousFamily {
        self.family
    }

    /// Power each term is raised to before weighting
    pub fn exponent(&self) -> f64 {
        match (self.combination, self.family) {
            (Combination::WeightedEuclidean, _) => 2.0,
            (Combination::WeightedMean, ContinuousFamily::Minkowski { p }) => p,
            (Combination::WeightedMean, _) => 1.0,
        }
    }

    /// Distance between rows `i` and `j`
    pub fn distance(&self, table: &PreprocessedTable, i: usize, j: usize) -> Result<f64> {
        let sums = self.accumulate(table, i, j, |_| {})?;
        Ok(self.finish(sums, i, j)?)
    }

    /// Distance between rows `i` and `j` together with every column's term
    pub fn distance_with_terms(
        &self,
        table: &PreprocessedTable,
        i: usize,
        j: usize,
    ) -> Result<(f64, Vec<PairTerm>)> {
        let mut terms = Vec::with_capacity(table.n_columns());
        let sums = self.accumulate(table, i, j, |term| terms.push(term))?;
        Ok((self.finish(sums, i, j)?, terms))
    }

    fn accumulate(
        &self,
        table: &PreprocessedTable,
        i: usize,
        j: usize,
        mut visit: impl FnMut(PairTerm),
    ) -> Result<Sums> {
        let exponent = self.exponent();
        let mut sums = Sums::default();

        for column in 0..table.n_columns() {
            let dissimilarity = column_dissimilarity(table, column, i, j, self.family, self.missing)?;
            let term = PairTerm {
                column,
                weight: self.weights.get(column),
                dissimilarity,
                powered: self.family.is_powered()
                    && matches!(dissimilarity, Dissimilarity::Value(_))
                    && matches!(table.column(column), PreprocessedColumn::Continuous(_)),
            };
            match term.magnitude(exponent) {
                Some(magnitude) => {
                    sums.weighted += term.weight * magnitude;
                    sums.used_weight += term.weight;
                }
                None if dissimilarity == Dissimilarity::JointAbsence => {
                    sums.joint_absent_weight += term.weight;
                }
                None => {}
            }
            visit(term);
        }

        Ok(sums)
    }

    fn finish(&self, sums: Sums, i: usize, j: usize) -> std::result::Result<f64, ConfigError> {
        if sums.used_weight <= 0.0 {
            // rows that agree only on jointly absent attributes are not apart
            if sums.joint_absent_weight > 0.0 {
                return Ok(0.0);
            }
            return Err(ConfigError::ZeroPairWeight { row_a: i, row_b: j });
        }
        let distance = match self.combination {
            Combination::WeightedMean => {
                let mean = sums.weighted / sums.used_weight;
                match self.exponent() {
                    r if r == 1.0 => mean,
                    r => mean.powf(1.0 / r),
                }
            }
            Combination::WeightedEuclidean => {
                (sums.weighted * self.weights.total() / sums.used_weight).sqrt()
            }
        };
        Ok(distance.max(0.0))
    }
}
