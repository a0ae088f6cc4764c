//! # mixdist similarity
//!
//! Pairwise dissimilarity for tables of mixed-type variables.
//!
//! Continuous columns are scaled (standard, robust or range) with optional
//! winsorizing or trimming, categorical columns are coded once, and every
//! pair of rows is compared column by column before the per-column
//! dissimilarities are combined into one distance.
//!
//! ## Example
//!
//! ```rust
//! use mixdist_core::{ColumnKind, Dataset, DistanceConfig};
//! use mixdist_similarity::MixedDistance;
//!
//! let dataset = Dataset::new(
//!     vec!["income".to_string(), "owner".to_string()],
//!     vec![
//!         vec![1.0.into(), "yes".into()],
//!         vec![2.0.into(), "no".into()],
//!         vec![100.0.into(), "yes".into()],
//!     ],
//! )
//! .unwrap();
//!
//! let engine = MixedDistance::new(
//!     &dataset,
//!     &[ColumnKind::Continuous, ColumnKind::Binary],
//!     DistanceConfig::robust(3.0),
//! )
//! .unwrap();
//! let matrix = engine.build().unwrap();
//! assert_eq!(matrix.get(0, 2), matrix.get(2, 0));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Dataset   │────>│ Preprocess  │────>│ Dissimilar- │
//! │ + kinds     │     │ (scale/code)│     │ ity per col │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                      ┌─────────────┐     ┌─────────────┐
//!                      │   Matrix    │<────│ Aggregator  │
//!                      │  (blocks)   │     │ (weights)   │
//!                      └─────────────┘     └─────────────┘
//!                             │
//!                      ┌─────────────┐
//!                      │  Explain    │
//!                      └─────────────┘
//! ```

pub mod aggregate;
pub mod dissimilarity;
pub mod engine;
pub mod explain;
pub mod matrix;
pub mod preprocess;
pub mod stats;

pub use aggregate::{Aggregator, PairTerm};
pub use dissimilarity::{column_dissimilarity, Dissimilarity};
pub use engine::{build_matrix, MixedDistance};
pub use explain::{ColumnContribution, MatrixStats, PairExplanation};
pub use matrix::{CancelToken, DistanceMatrix, MatrixBuilder, RowBlock};
pub use mixdist_core::validate_schema;
pub use preprocess::{
    preprocess, scale_continuous, ContinuousColumn, PreprocessSettings, PreprocessedColumn,
    PreprocessedTable,
};
