//! Entry points of the distance engine
//!
//! `validate_schema` → [`preprocess`] → [`build_matrix`], or all three at once
//! through [`MixedDistance`].

use crate::aggregate::Aggregator;
use crate::explain::PairExplanation;
use crate::matrix::{DistanceMatrix, MatrixBuilder};
use crate::preprocess::{PreprocessSettings, PreprocessedTable};
use mixdist_core::{
    validate_schema, ColumnKind, ConfigError, Dataset, DistanceConfig, Result, SchemaError,
    VariableDescriptor,
};

pub use crate::preprocess::preprocess;

/// Build the full distance matrix for `dataset`.
///
/// `preprocessed` must come from [`preprocess`] on the same dataset and
/// descriptors, with the same preprocessing options as `config`. Any error
/// aborts the run; no partial matrix is returned.
pub fn build_matrix(
    dataset: &Dataset,
    descriptors: &[VariableDescriptor],
    preprocessed: &PreprocessedTable,
    config: &DistanceConfig,
) -> Result<DistanceMatrix> {
    if preprocessed.n_rows() != dataset.n_rows() {
        return Err(ConfigError::RowCountMismatch {
            expected: dataset.n_rows(),
            found: preprocessed.n_rows(),
        }
        .into());
    }
    if preprocessed.n_columns() != descriptors.len() {
        return Err(SchemaError::ColumnCountMismatch {
            expected: descriptors.len(),
            found: preprocessed.n_columns(),
        }
        .into());
    }

    if let Some(option) = preprocessed
        .settings()
        .first_difference(&PreprocessSettings::from_config(config))
    {
        return Err(ConfigError::PreprocessMismatch(option).into());
    }

    MatrixBuilder::from_config(preprocessed, descriptors, config)?.build()
}

/// A validated, preprocessed dataset ready for distance queries
#[derive(Debug, Clone)]
pub struct MixedDistance {
    config: DistanceConfig,
    descriptors: Vec<VariableDescriptor>,
    table: PreprocessedTable,
    aggregator: Aggregator,
}

impl MixedDistance {
    /// Validate the schema and configuration, then preprocess once
    pub fn new(dataset: &Dataset, kinds: &[ColumnKind], config: DistanceConfig) -> Result<Self> {
        let descriptors = validate_schema(dataset, kinds)?;
        let table = preprocess(dataset, &descriptors, &config)?;
        let aggregator = Aggregator::from_config(&config, &descriptors)?;
        Ok(Self {
            config,
            descriptors,
            table,
            aggregator,
        })
    }

    pub fn config(&self) -> &DistanceConfig {
        &self.config
    }

    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    pub fn table(&self) -> &PreprocessedTable {
        &self.table
    }

    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }

    fn check_rows(&self, i: usize, j: usize) -> Result<()> {
        let n = self.table.n_rows();
        if i >= n || j >= n {
            return Err(ConfigError::InvalidParameter {
                name: "row",
                message: format!("pair ({}, {}) is out of range for {} rows", i, j, n),
            }
            .into());
        }
        Ok(())
    }

    /// Distance between rows `i` and `j` (0 when `i == j`)
    pub fn distance(&self, i: usize, j: usize) -> Result<f64> {
        self.check_rows(i, j)?;
        if i == j {
            return Ok(0.0);
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        self.aggregator.distance(&self.table, a, b)
    }

    pub fn explain(&self, i: usize, j: usize) -> Result<PairExplanation> {
        self.check_rows(i, j)?;
        let (a, b) = if i <= j { (i, j) } else { (j, i) };
        PairExplanation::compute(&self.table, &self.aggregator, a, b)
    }

    /// Matrix builder preconfigured from this run's configuration
    pub fn builder(&self) -> MatrixBuilder<'_> {
        let mut builder = MatrixBuilder::new(&self.table, self.aggregator.clone())
            .parallelism(self.config.parallelism());
        if let Some(rows) = self.config.block_rows {
            builder = builder.block_rows(rows);
        }
        builder
    }

    pub fn build(&self) -> Result<DistanceMatrix> {
        self.builder().build()
    }
}
