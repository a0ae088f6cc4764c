//! JSON job files
//!
//! A job bundles the column declarations, the rows and the distance
//! configuration of one run:
//!
//! ```json
//! {
//!   "columns": [
//!     {"name": "income", "kind": "continuous"},
//!     {"name": "grade", "kind": "ordinal", "levels": ["low", "mid", "high"]}
//!   ],
//!   "rows": [[1200.5, "low"], [null, "high"]],
//!   "config": {"scale": "robust", "outlier_policy": {"policy": "winsorize", "limit": 3.0}}
//! }
//! ```

use mixdist_core::{ColumnKind, Dataset, DistanceConfig, SchemaError, Value};
use mixdist_similarity::{DistanceMatrix, MatrixStats, MixedDistance};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read job file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] SchemaError),

    #[error(transparent)]
    Distance(#[from] mixdist_core::Error),
}

/// Declared column of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub config: DistanceConfig,
}

/// Result of running a job
#[derive(Debug, Clone, Serialize)]
pub struct JobOutput {
    pub columns: Vec<String>,
    pub matrix: DistanceMatrix,
    pub stats: MatrixStats,
}

impl Job {
    pub fn from_json_str(json: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn dataset(&self) -> Result<Dataset, SchemaError> {
        let names = self.columns.iter().map(|c| c.name.clone()).collect();
        Dataset::new(names, self.rows.clone())
    }

    pub fn kinds(&self) -> Vec<ColumnKind> {
        self.columns.iter().map(|c| c.kind.clone()).collect()
    }

    /// Validate, preprocess and build the full matrix
    pub fn run(&self) -> Result<JobOutput, JobError> {
        let dataset = self.dataset()?;
        let engine = MixedDistance::new(&dataset, &self.kinds(), self.config.clone())?;
        let matrix = engine.build()?;
        let stats = MatrixStats::compute(&matrix);

        info!(
            rows = stats.n,
            pairs = stats.pairs,
            min = stats.min,
            max = stats.max,
            mean = stats.mean,
            "job finished"
        );

        Ok(JobOutput {
            columns: dataset.column_names().to_vec(),
            matrix,
            stats,
        })
    }
}
