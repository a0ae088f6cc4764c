//! Distance configuration
//!
//! [`DistanceConfig`] is an immutable record holding every option of a
//! distance run: continuous scaling, outlier handling, the combination rule,
//! the missing-value policy, weights, asymmetric binary columns, block size
//! and parallelism. [`DistanceConfig::validate`] rejects invalid or
//! contradictory settings before any pair is processed.

use crate::descriptor::{VariableDescriptor, VariableKind};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Consistency constant turning the MAD into a standard deviation estimate
/// under normality.
pub const MAD_SCALE: f64 = 1.4826;

/// Default winsorizing limit, in spread units
pub const DEFAULT_WINSORIZE_LIMIT: f64 = 3.0;

/// Location/spread estimator for continuous columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Scale {
    /// Mean and sample standard deviation
    #[default]
    Standard,
    /// Median and a robust spread (see [`RobustSpread`])
    Robust,
    /// Minimum and range (Gower scaling, values land in `[0, 1]`)
    Range,
}

/// Spread estimator used by [`Scale::Robust`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum RobustSpread {
    /// Median absolute deviation times [`MAD_SCALE`]
    #[default]
    Mad,
    /// Inter-quartile range
    Iqr,
}

/// Outlier handling for continuous columns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OutlierPolicy {
    #[default]
    None,
    /// Clip values beyond `limit` spread units from the location
    Winsorize { limit: f64 },
    /// Ignore `fraction` of the values in each tail when estimating
    /// location and spread. No observation is removed from the output.
    Trim { fraction: f64 },
}

/// How per-column dissimilarities are combined into one distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Combination {
    /// Weighted mean over the columns usable for a pair (Gower family)
    #[default]
    WeightedMean,
    /// Square root of the weighted sum of squared dissimilarities
    WeightedEuclidean,
}

/// Form of the continuous per-column dissimilarity, computed on scaled values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContinuousFamily {
    /// `|a - b|`
    Absolute,
    /// `(a - b)^2`
    Squared,
    /// `|a - b|^p`. The weighted mean over Minkowski terms takes the p-th
    /// root of the result.
    Minkowski { p: f64 },
    /// `|a - b| / (|a| + |b|)`, 0 when both values are 0. Meant for
    /// non-negative values such as range-scaled columns.
    Canberra,
}

impl ContinuousFamily {
    /// Terms of this family already carry the combination exponent and are
    /// not raised again by the aggregator
    pub fn is_powered(self) -> bool {
        matches!(self, ContinuousFamily::Squared | ContinuousFamily::Minkowski { .. })
    }
}

impl Combination {
    /// Family used when the configuration does not name one
    pub fn continuous_family(self) -> ContinuousFamily {
        match self {
            Combination::WeightedMean => ContinuousFamily::Absolute,
            Combination::WeightedEuclidean => ContinuousFamily::Squared,
        }
    }
}

/// What a dissimilarity function does when either value is missing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Drop the column from this pair and renormalize the weight sum
    #[default]
    Exclude,
    /// Use a fixed dissimilarity
    Sentinel { value: f64 },
}

/// Parallelism hint for the matrix builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Single-threaded evaluation
    #[default]
    Sequential,
    /// Up to `n` rayon worker threads
    Parallel(usize),
}

impl Parallelism {
    /// - `0` → rayon's current thread count
    /// - `1` → sequential
    /// - `n > 1` → parallel with n threads
    pub fn from_threads(n_threads: usize) -> Self {
        match n_threads {
            0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n),
        }
    }

    pub fn allows_parallel(self) -> bool {
        matches!(self, Self::Parallel(n) if n > 1)
    }

    pub fn n_threads(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => n.max(1),
        }
    }
}

/// Complete configuration of a distance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistanceConfig {
    pub scale: Scale,
    pub robust_spread: RobustSpread,
    pub outlier_policy: OutlierPolicy,
    pub combination: Combination,
    /// Continuous dissimilarity; derived from `combination` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<ContinuousFamily>,
    pub missing: MissingPolicy,
    /// One weight per column; uniform `1/p` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
    /// Binary columns using the asymmetric convention, mapped to the level
    /// that means "absent"
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub asymmetric_binary: BTreeMap<String, String>,
    /// Rows per block in block mode; the whole matrix is one block when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_rows: Option<usize>,
    /// Worker threads: 1 sequential, 0 all available
    pub threads: usize,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            robust_spread: RobustSpread::default(),
            outlier_policy: OutlierPolicy::default(),
            combination: Combination::default(),
            family: None,
            missing: MissingPolicy::default(),
            weights: None,
            asymmetric_binary: BTreeMap::new(),
            block_rows: None,
            threads: 1,
        }
    }
}

impl DistanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gower's classic setup: range scaling, weighted mean
    pub fn gower() -> Self {
        Self {
            scale: Scale::Range,
            ..Self::default()
        }
    }

    /// Median/MAD scaling with winsorizing at `limit` spread units
    pub fn robust(limit: f64) -> Self {
        Self {
            scale: Scale::Robust,
            outlier_policy: OutlierPolicy::Winsorize { limit },
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_robust_spread(mut self, spread: RobustSpread) -> Self {
        self.robust_spread = spread;
        self
    }

    pub fn with_outlier_policy(mut self, policy: OutlierPolicy) -> Self {
        self.outlier_policy = policy;
        self
    }

    pub fn with_combination(mut self, combination: Combination) -> Self {
        self.combination = combination;
        self
    }

    pub fn with_family(mut self, family: ContinuousFamily) -> Self {
        self.family = Some(family);
        self
    }

    pub fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Mark a binary column as asymmetric, `negative` being its absence level
    pub fn with_asymmetric(mut self, column: impl Into<String>, negative: impl Into<String>) -> Self {
        self.asymmetric_binary.insert(column.into(), negative.into());
        self
    }

    pub fn with_block_rows(mut self, rows: usize) -> Self {
        self.block_rows = Some(rows);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn continuous_family(&self) -> ContinuousFamily {
        self.family.unwrap_or_else(|| self.combination.continuous_family())
    }

    pub fn parallelism(&self) -> Parallelism {
        Parallelism::from_threads(self.threads)
    }

    /// Check every option against the descriptors and resolve the weights.
    pub fn validate(&self, descriptors: &[VariableDescriptor]) -> Result<WeightVector, ConfigError> {
        match self.outlier_policy {
            OutlierPolicy::None => {}
            OutlierPolicy::Winsorize { limit } => {
                if !limit.is_finite() || limit <= 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        name: "winsorize.limit",
                        message: format!("must be positive and finite, got {}", limit),
                    });
                }
                if self.scale == Scale::Range {
                    return Err(ConfigError::Contradictory(
                        "winsorizing is measured in spread units around a location; range scaling anchors at the minimum".to_string(),
                    ));
                }
            }
            OutlierPolicy::Trim { fraction } => {
                if !(0.0..0.5).contains(&fraction) {
                    return Err(ConfigError::InvalidParameter {
                        name: "trim.fraction",
                        message: format!("must lie in [0, 0.5), got {}", fraction),
                    });
                }
            }
        }

        match (self.continuous_family(), self.combination) {
            (ContinuousFamily::Minkowski { p }, _) if !p.is_finite() || p < 1.0 => {
                return Err(ConfigError::InvalidParameter {
                    name: "minkowski.p",
                    message: format!("must be finite and at least 1, got {}", p),
                });
            }
            (ContinuousFamily::Minkowski { .. }, Combination::WeightedEuclidean) => {
                return Err(ConfigError::Contradictory(
                    "minkowski terms carry their own exponent; combine them with weighted_mean".to_string(),
                ));
            }
            _ => {}
        }

        if let MissingPolicy::Sentinel { value } = self.missing {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "missing.value",
                    message: format!("must be non-negative and finite, got {}", value),
                });
            }
        }

        if self.block_rows == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "block_rows",
                message: "must be at least 1".to_string(),
            });
        }

        for column in self.asymmetric_binary.keys() {
            let descriptor = descriptors
                .iter()
                .find(|d| &d.name == column)
                .ok_or_else(|| ConfigError::UnknownColumn(column.clone()))?;
            if !matches!(descriptor.kind, VariableKind::Binary { .. }) {
                return Err(ConfigError::NotBinary(column.clone()));
            }
        }

        match &self.weights {
            Some(weights) => WeightVector::from_weights(descriptors, weights.clone()),
            None => WeightVector::uniform(descriptors.len()),
        }
    }
}

/// Non-negative weight per column with a positive sum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector {
    weights: Vec<f64>,
    total: f64,
}

impl WeightVector {
    /// `1/p` for each of `p` columns
    pub fn uniform(n_columns: usize) -> Result<Self, ConfigError> {
        if n_columns == 0 {
            return Err(ConfigError::ZeroTotalWeight);
        }
        let w = 1.0 / n_columns as f64;
        Ok(Self {
            weights: vec![w; n_columns],
            total: w * n_columns as f64,
        })
    }

    pub fn from_weights(
        descriptors: &[VariableDescriptor],
        weights: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        if weights.len() != descriptors.len() {
            return Err(ConfigError::WeightCount {
                expected: descriptors.len(),
                found: weights.len(),
            });
        }
        for (descriptor, &weight) in descriptors.iter().zip(&weights) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    column: descriptor.name.clone(),
                    weight,
                });
            }
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ConfigError::ZeroTotalWeight);
        }
        Ok(Self { weights, total })
    }

    /// Replace the weights of named columns. Unknown names are an error.
    pub fn with_overrides(
        &self,
        descriptors: &[VariableDescriptor],
        overrides: &HashMap<String, f64>,
    ) -> Result<Self, ConfigError> {
        let mut weights = self.weights.clone();
        for (name, &weight) in overrides {
            let descriptor = descriptors
                .iter()
                .find(|d| &d.name == name)
                .ok_or_else(|| ConfigError::UnknownColumn(name.clone()))?;
            let slot = weights
                .get_mut(descriptor.index)
                .ok_or_else(|| ConfigError::UnknownColumn(name.clone()))?;
            *slot = weight;
        }
        Self::from_weights(descriptors, weights)
    }

    pub fn get(&self, column: usize) -> f64 {
        self.weights[column]
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}

fn unknown(option: &'static str, value: &str) -> ConfigError {
    ConfigError::UnknownOption {
        option,
        value: value.to_string(),
    }
}

fn parse_number(name: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidParameter {
            name,
            message: format!("'{}' is not a number", raw),
        })
}

impl FromStr for Scale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Scale::Standard),
            "robust" => Ok(Scale::Robust),
            "range" | "gower" => Ok(Scale::Range),
            _ => Err(unknown("scale", s)),
        }
    }
}

impl FromStr for RobustSpread {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mad" => Ok(RobustSpread::Mad),
            "iqr" => Ok(RobustSpread::Iqr),
            _ => Err(unknown("robust_spread", s)),
        }
    }
}

impl FromStr for Combination {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "weighted_mean" => Ok(Combination::WeightedMean),
            "weighted_euclidean" => Ok(Combination::WeightedEuclidean),
            _ => Err(unknown("combination", s)),
        }
    }
}

/// Accepts `none`, `winsorize`, `winsorize:<limit>` and `trim:<fraction>`
impl FromStr for OutlierPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (lower.as_str(), None),
        };
        match (name, arg) {
            ("none", None) => Ok(OutlierPolicy::None),
            ("winsorize", None) => Ok(OutlierPolicy::Winsorize {
                limit: DEFAULT_WINSORIZE_LIMIT,
            }),
            ("winsorize", Some(limit)) => Ok(OutlierPolicy::Winsorize {
                limit: parse_number("winsorize.limit", limit)?,
            }),
            ("trim", Some(fraction)) => Ok(OutlierPolicy::Trim {
                fraction: parse_number("trim.fraction", fraction)?,
            }),
            _ => Err(unknown("outlier_policy", s)),
        }
    }
}

/// Accepts `absolute`, `squared`, `minkowski:<p>` and `canberra`
impl FromStr for ContinuousFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.split_once(':') {
            None if lower == "absolute" || lower == "manhattan" => Ok(ContinuousFamily::Absolute),
            None if lower == "squared" => Ok(ContinuousFamily::Squared),
            None if lower == "canberra" => Ok(ContinuousFamily::Canberra),
            Some(("minkowski", p)) => Ok(ContinuousFamily::Minkowski {
                p: parse_number("minkowski.p", p)?,
            }),
            _ => Err(unknown("family", s)),
        }
    }
}

/// Accepts `exclude` and `sentinel:<value>`
impl FromStr for MissingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.split_once(':') {
            None if lower == "exclude" => Ok(MissingPolicy::Exclude),
            Some(("sentinel", value)) => Ok(MissingPolicy::Sentinel {
                value: parse_number("missing.value", value)?,
            }),
            _ => Err(unknown("missing", s)),
        }
    }
}

impl TryFrom<String> for Scale {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for RobustSpread {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for Combination {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for ContinuousFamily {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContinuousFamily> for String {
    fn from(family: ContinuousFamily) -> Self {
        family.to_string()
    }
}

impl fmt::Display for ContinuousFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuousFamily::Absolute => f.write_str("absolute"),
            ContinuousFamily::Squared => f.write_str("squared"),
            ContinuousFamily::Minkowski { p } => write!(f, "minkowski:{}", p),
            ContinuousFamily::Canberra => f.write_str("canberra"),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scale::Standard => "standard",
            Scale::Robust => "robust",
            Scale::Range => "range",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Combination::WeightedMean => "weighted_mean",
            Combination::WeightedEuclidean => "weighted_euclidean",
        };
        f.write_str(name)
    }
}
