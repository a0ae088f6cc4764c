//! # mixdist Core
//!
//! Core types for mixed-data distance computation.
//!
//! This crate provides the configuration-time artifacts of a distance run:
//!
//! - [`Dataset`] - Rows of typed [`Value`]s over named columns
//! - [`ColumnKind`] / [`VariableDescriptor`] - Declared and validated column kinds
//! - [`DistanceConfig`] - Every option of a run, validated before computation
//! - [`WeightVector`] - Per-column weights
//! - [`Pairs`] - Lazy generator over unordered observation pairs
//!
//! ## Example
//!
//! ```rust
//! use mixdist_core::{validate_schema, ColumnKind, Dataset, DistanceConfig, Value};
//!
//! let dataset = Dataset::new(
//!     vec!["income".to_string(), "owner".to_string()],
//!     vec![
//!         vec![Value::from(2400.0), Value::from("yes")],
//!         vec![Value::from(3100.0), Value::from("no")],
//!     ],
//! )
//! .unwrap();
//!
//! let descriptors = validate_schema(&dataset, &[ColumnKind::Continuous, ColumnKind::Binary]).unwrap();
//! let weights = DistanceConfig::default().validate(&descriptors).unwrap();
//! assert_eq!(weights.len(), 2);
//! ```

pub mod config;
pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod pairs;
pub mod value;

pub use config::{
    Combination, ContinuousFamily, DistanceConfig, MissingPolicy, OutlierPolicy, Parallelism,
    RobustSpread, Scale, WeightVector, DEFAULT_WINSORIZE_LIMIT, MAD_SCALE,
};
pub use dataset::Dataset;
pub use descriptor::{validate_schema, ColumnKind, VariableDescriptor, VariableKind};
pub use error::{ConfigError, Error, NumericError, Result, SchemaError};
pub use pairs::{condensed_index, pair_count, pairs, row_blocks, Pairs};
pub use value::Value;
