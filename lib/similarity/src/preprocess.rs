//! Robust preprocessing
//!
//! Puts every continuous column on a comparable scale before dissimilarities
//! are computed, and encodes categorical columns as integer codes so that
//! pairwise comparisons never touch strings.
//!
//! For a continuous column the steps are:
//!
//! 1. take the finite, non-missing values as the estimation sample
//! 2. with [`OutlierPolicy::Trim`], drop a fraction of each tail from the sample
//! 3. estimate location and spread ([`Scale`], [`RobustSpread`])
//! 4. with [`OutlierPolicy::Winsorize`], clip values to `location ± limit * spread`
//! 5. scale: `(x - location) / spread`
//!
//! A column with zero spread is marked constant and contributes dissimilarity
//! 0 to every pair.

use crate::stats;
use mixdist_core::{
    Dataset, DistanceConfig, OutlierPolicy, Result, RobustSpread, Scale, SchemaError, Value,
    VariableDescriptor, VariableKind,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Scaled continuous column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousColumn {
    /// Scaled value per row, `None` when missing. Non-finite inputs are kept
    /// as-is.
    pub values: Vec<Option<f64>>,
    pub location: f64,
    pub spread: f64,
    /// Number of values clipped by winsorizing
    pub clipped: usize,
    /// Zero spread: every pair has dissimilarity 0
    pub constant: bool,
}

/// Derived per-column data consumed by the dissimilarity functions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PreprocessedColumn {
    Continuous(ContinuousColumn),
    Binary {
        codes: Vec<Option<u32>>,
        /// Code of the "absent" level for asymmetric columns
        negative: Option<u32>,
    },
    Nominal {
        codes: Vec<Option<u32>>,
    },
    Ordinal {
        ranks: Vec<Option<u32>>,
        levels: usize,
    },
}

impl PreprocessedColumn {
    pub fn len(&self) -> usize {
        match self {
            PreprocessedColumn::Continuous(c) => c.values.len(),
            PreprocessedColumn::Binary { codes, .. } | PreprocessedColumn::Nominal { codes } => {
                codes.len()
            }
            PreprocessedColumn::Ordinal { ranks, .. } => ranks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_continuous(&self) -> Option<&ContinuousColumn> {
        match self {
            PreprocessedColumn::Continuous(c) => Some(c),
            _ => None,
        }
    }
}

/// The configuration options a preprocessed table depends on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessSettings {
    pub scale: Scale,
    pub robust_spread: RobustSpread,
    pub outlier_policy: OutlierPolicy,
    pub asymmetric_binary: BTreeMap<String, String>,
}

impl PreprocessSettings {
    pub fn from_config(config: &DistanceConfig) -> Self {
        Self {
            scale: config.scale,
            robust_spread: config.robust_spread,
            outlier_policy: config.outlier_policy,
            asymmetric_binary: config.asymmetric_binary.clone(),
        }
    }

    /// Name of the first option that differs from `other`
    pub fn first_difference(&self, other: &Self) -> Option<&'static str> {
        if self.scale != other.scale {
            Some("scale")
        } else if self.robust_spread != other.robust_spread {
            Some("robust_spread")
        } else if self.outlier_policy != other.outlier_policy {
            Some("outlier_policy")
        } else if self.asymmetric_binary != other.asymmetric_binary {
            Some("asymmetric_binary")
        } else {
            None
        }
    }
}

/// All preprocessed columns of a dataset, read-only during matrix construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessedTable {
    names: Vec<String>,
    columns: Vec<PreprocessedColumn>,
    n_rows: usize,
    settings: PreprocessSettings,
}

impl PreprocessedTable {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[PreprocessedColumn] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &PreprocessedColumn {
        &self.columns[index]
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Options the table was preprocessed with
    pub fn settings(&self) -> &PreprocessSettings {
        &self.settings
    }
}

/// Preprocess every column of `dataset` according to `config`.
///
/// Pure function of its inputs: calling it twice yields equal tables.
pub fn preprocess(
    dataset: &Dataset,
    descriptors: &[VariableDescriptor],
    config: &DistanceConfig,
) -> Result<PreprocessedTable> {
    if descriptors.len() != dataset.n_columns() {
        return Err(SchemaError::ColumnCountMismatch {
            expected: dataset.n_columns(),
            found: descriptors.len(),
        }
        .into());
    }
    for descriptor in descriptors {
        if descriptor.index >= dataset.n_columns() {
            return Err(SchemaError::ColumnIndex {
                column: descriptor.name.clone(),
                index: descriptor.index,
                n_columns: dataset.n_columns(),
            }
            .into());
        }
    }
    config.validate(descriptors)?;

    let columns = descriptors
        .iter()
        .map(|descriptor| preprocess_column(dataset, descriptor, config))
        .collect();

    Ok(PreprocessedTable {
        names: descriptors.iter().map(|d| d.name.clone()).collect(),
        columns,
        n_rows: dataset.n_rows(),
        settings: PreprocessSettings::from_config(config),
    })
}

fn preprocess_column(
    dataset: &Dataset,
    descriptor: &VariableDescriptor,
    config: &DistanceConfig,
) -> PreprocessedColumn {
    match &descriptor.kind {
        VariableKind::Continuous { .. } => {
            let raw: Vec<Option<f64>> = dataset.column(descriptor.index).map(Value::as_f64).collect();
            let column = scale_continuous(&raw, config);
            if column.constant {
                warn!(column = %descriptor.name, "continuous column has zero spread, it contributes nothing");
            }
            debug!(
                column = %descriptor.name,
                location = column.location,
                spread = column.spread,
                clipped = column.clipped,
                "scaled continuous column"
            );
            PreprocessedColumn::Continuous(column)
        }
        VariableKind::Binary { .. } => {
            let negative = config
                .asymmetric_binary
                .get(&descriptor.name)
                .and_then(|level| descriptor.level_code(level))
                .map(|code| code as u32);
            PreprocessedColumn::Binary {
                codes: encode(dataset, descriptor),
                negative,
            }
        }
        VariableKind::Nominal { .. } => PreprocessedColumn::Nominal {
            codes: encode(dataset, descriptor),
        },
        VariableKind::Ordinal { levels } => PreprocessedColumn::Ordinal {
            ranks: encode(dataset, descriptor),
            levels: levels.len(),
        },
    }
}

fn encode(dataset: &Dataset, descriptor: &VariableDescriptor) -> Vec<Option<u32>> {
    dataset
        .column(descriptor.index)
        .map(|value| {
            value
                .category_key()
                .and_then(|key| descriptor.level_code(&key))
                .map(|code| code as u32)
        })
        .collect()
}

/// Scale one continuous column given its raw values (`None` = missing)
pub fn scale_continuous(raw: &[Option<f64>], config: &DistanceConfig) -> ContinuousColumn {
    let mut sample: Vec<f64> = raw.iter().flatten().copied().filter(|x| x.is_finite()).collect();
    stats::sort_values(&mut sample);

    let sample = match config.outlier_policy {
        OutlierPolicy::Trim { fraction } => stats::trim_sorted(&sample, fraction),
        _ => &sample[..],
    };

    let (location, spread) = estimate(sample, config.scale, config.robust_spread);
    let constant = !(spread.is_finite() && spread > 0.0);

    let bounds = match config.outlier_policy {
        OutlierPolicy::Winsorize { limit } if !constant => {
            Some((location - limit * spread, location + limit * spread))
        }
        _ => None,
    };

    let mut clipped = 0;
    let values = raw
        .iter()
        .map(|value| {
            value.map(|x| {
                if !x.is_finite() {
                    return x;
                }
                let mut x = x;
                if let Some((lo, hi)) = bounds {
                    if x < lo || x > hi {
                        clipped += 1;
                        x = x.clamp(lo, hi);
                    }
                }
                if constant {
                    x - location
                } else {
                    (x - location) / spread
                }
            })
        })
        .collect();

    ContinuousColumn {
        values,
        location,
        spread: if constant { 0.0 } else { spread },
        clipped,
        constant,
    }
}

/// Location and spread of a sorted, finite sample
fn estimate(sorted: &[f64], scale: Scale, robust_spread: RobustSpread) -> (f64, f64) {
    if sorted.is_empty() {
        return (0.0, 0.0);
    }
    match scale {
        Scale::Standard => (
            stats::mean(sorted).unwrap_or(0.0),
            stats::std_dev(sorted).unwrap_or(0.0),
        ),
        Scale::Robust => {
            let median = stats::median_sorted(sorted).unwrap_or(0.0);
            let spread = match robust_spread {
                RobustSpread::Mad => stats::mad(sorted, median),
                RobustSpread::Iqr => stats::iqr_sorted(sorted),
            };
            (median, spread.unwrap_or(0.0))
        }
        Scale::Range => {
            let min = sorted[0];
            let max = sorted[sorted.len() - 1];
            (min, max - min)
        }
    }
}
