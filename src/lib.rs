//! # mixdist
//!
//! Robust pairwise distances for tables of mixed-type variables.
//!
//! mixdist computes a symmetric, zero-diagonal distance matrix over rows
//! described by continuous, binary, nominal and ordinal columns. Continuous
//! columns can be scaled with robust estimators (median and MAD or IQR) and
//! winsorized, so a single extreme value no longer dominates the distances
//! among the other rows.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! mixdist job.json --scale robust --outlier winsorize:3 --output distances.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use mixdist::prelude::*;
//!
//! let dataset = Dataset::new(
//!     vec!["x".to_string()],
//!     vec![vec![1.0.into()], vec![2.0.into()], vec![3.0.into()], vec![100.0.into()]],
//! )
//! .unwrap();
//!
//! let engine = MixedDistance::new(&dataset, &[ColumnKind::Continuous], DistanceConfig::robust(3.0)).unwrap();
//! let matrix = engine.build().unwrap();
//! assert_eq!(matrix.get(1, 1), 0.0);
//! ```
//!
//! ## Crate Structure
//!
//! - `mixdist-core` - Values, datasets, variable descriptors, configuration, pair indexing
//! - `mixdist-similarity` - Preprocessing, dissimilarities, aggregation, matrix builder, explanations
//! - `mixdist` - JSON jobs and the command line tool

pub mod job;

pub use job::{ColumnSpec, Job, JobError, JobOutput};

// Re-export core types
pub use mixdist_core::{
    ColumnKind, Combination, ConfigError, ContinuousFamily, Dataset, DistanceConfig, Error,
    MissingPolicy, NumericError, OutlierPolicy, Parallelism, Result, RobustSpread, Scale,
    SchemaError, Value, VariableDescriptor, VariableKind,
};

// Re-export the engine
pub use mixdist_similarity::{
    build_matrix, preprocess, validate_schema, CancelToken, DistanceMatrix, MatrixBuilder,
    MatrixStats, MixedDistance, PairExplanation, PreprocessSettings, PreprocessedTable,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        build_matrix, preprocess, validate_schema, CancelToken, ColumnKind, Combination,
        ContinuousFamily, Dataset, DistanceConfig, DistanceMatrix, Error, Job, MatrixBuilder,
        MatrixStats, MissingPolicy, MixedDistance, OutlierPolicy, PairExplanation, Parallelism,
        Result, Scale, Value,
    };
}
