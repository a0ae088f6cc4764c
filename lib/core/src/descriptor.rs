//! Variable descriptors
//!
//! Declares which kind of variable each column holds and validates that the
//! declaration is consistent with the observed data. The resulting
//! [`VariableDescriptor`]s are created once per dataset and never mutated.

use crate::dataset::Dataset;
use crate::error::SchemaError;
use crate::value::Value;
use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Declared kind of a column, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnKind {
    /// Real-valued variable
    Continuous,
    /// Two-level variable (presence/absence, yes/no)
    Binary,
    /// Unordered categories
    Nominal,
    /// Ordered categories. Without explicit levels the order is inferred
    /// from the observed values.
    Ordinal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        levels: Option<Vec<String>>,
    },
}

impl ColumnKind {
    /// Create an ordinal kind with an explicit level order
    pub fn ordinal<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnKind::Ordinal {
            levels: Some(levels.into_iter().map(Into::into).collect()),
        }
    }

    /// Create an ordinal kind whose order is inferred from the data
    pub fn ordinal_inferred() -> Self {
        ColumnKind::Ordinal { levels: None }
    }
}

/// Validated kind of a column together with its kind-specific metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VariableKind {
    Continuous {
        /// Smallest finite observed value, `None` when no finite value exists
        min: Option<f64>,
        max: Option<f64>,
        /// Number of non-missing values
        observed: usize,
    },
    Binary {
        /// Observed levels in first-seen order (at most two)
        levels: Vec<String>,
    },
    Nominal {
        categories: Vec<String>,
    },
    Ordinal {
        /// Levels from lowest to highest rank
        levels: Vec<String>,
    },
}

impl VariableKind {
    pub fn name(&self) -> &'static str {
        match self {
            VariableKind::Continuous { .. } => "continuous",
            VariableKind::Binary { .. } => "binary",
            VariableKind::Nominal { .. } => "nominal",
            VariableKind::Ordinal { .. } => "ordinal",
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, VariableKind::Continuous { .. })
    }

    /// Category levels for categorical kinds, in code order
    pub fn levels(&self) -> Option<&[String]> {
        match self {
            VariableKind::Continuous { .. } => None,
            VariableKind::Binary { levels } => Some(levels),
            VariableKind::Nominal { categories } => Some(categories),
            VariableKind::Ordinal { levels } => Some(levels),
        }
    }
}

/// Validated description of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDescriptor {
    pub name: String,
    pub index: usize,
    pub kind: VariableKind,
}

impl VariableDescriptor {
    /// Code of a category key within this column's levels
    pub fn level_code(&self, key: &str) -> Option<usize> {
        self.kind.levels()?.iter().position(|l| l == key)
    }
}

/// Validate `kinds` against `dataset` and build one descriptor per column.
///
/// Fails with [`SchemaError`] when a column's values contradict its declared
/// kind: non-numeric values in a continuous column, more than two levels in a
/// binary column, or an ordinal value outside the declared order.
pub fn validate_schema(
    dataset: &Dataset,
    kinds: &[ColumnKind],
) -> Result<Vec<VariableDescriptor>, SchemaError> {
    if kinds.len() != dataset.n_columns() {
        return Err(SchemaError::ColumnCountMismatch {
            expected: dataset.n_columns(),
            found: kinds.len(),
        });
    }

    let descriptors = dataset
        .column_names()
        .iter()
        .zip(kinds)
        .enumerate()
        .map(|(index, (name, kind))| {
            let kind = describe_column(dataset, index, name, kind)?;
            debug!(column = %name, kind = kind.name(), "validated column");
            Ok(VariableDescriptor {
                name: name.clone(),
                index,
                kind,
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;

    Ok(descriptors)
}

fn describe_column(
    dataset: &Dataset,
    index: usize,
    name: &str,
    kind: &ColumnKind,
) -> Result<VariableKind, SchemaError> {
    match kind {
        ColumnKind::Continuous => describe_continuous(dataset, index, name),
        ColumnKind::Binary => {
            let levels = observed_levels(dataset, index, name)?;
            if levels.len() > 2 {
                return Err(SchemaError::TooManyBinaryLevels {
                    column: name.to_string(),
                    levels: levels.len(),
                });
            }
            Ok(VariableKind::Binary { levels })
        }
        ColumnKind::Nominal => Ok(VariableKind::Nominal {
            categories: observed_levels(dataset, index, name)?,
        }),
        ColumnKind::Ordinal { levels: Some(declared) } => {
            check_declared_levels(name, declared)?;
            let declared_set: AHashSet<&str> = declared.iter().map(String::as_str).collect();
            for level in observed_levels(dataset, index, name)? {
                if !declared_set.contains(level.as_str()) {
                    return Err(SchemaError::UndeclaredLevel {
                        column: name.to_string(),
                        level,
                    });
                }
            }
            Ok(VariableKind::Ordinal {
                levels: declared.clone(),
            })
        }
        ColumnKind::Ordinal { levels: None } => Ok(VariableKind::Ordinal {
            levels: inferred_order(dataset, index, name)?,
        }),
    }
}

fn describe_continuous(
    dataset: &Dataset,
    index: usize,
    name: &str,
) -> Result<VariableKind, SchemaError> {
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    let mut observed = 0;

    for (row, value) in dataset.column(index).enumerate() {
        match value {
            Value::Missing => {}
            Value::Number(x) => {
                observed += 1;
                if x.is_finite() {
                    min = Some(min.map_or(*x, |m| m.min(*x)));
                    max = Some(max.map_or(*x, |m| m.max(*x)));
                }
            }
            _ => {
                return Err(SchemaError::TypeMismatch {
                    column: name.to_string(),
                    row,
                    expected: "numeric",
                })
            }
        }
    }

    Ok(VariableKind::Continuous { min, max, observed })
}

/// Distinct category keys in first-seen order
fn observed_levels(dataset: &Dataset, index: usize, name: &str) -> Result<Vec<String>, SchemaError> {
    let mut seen = AHashSet::new();
    let mut levels = Vec::new();

    for (row, value) in dataset.column(index).enumerate() {
        if let Value::Number(x) = value {
            if !x.is_finite() {
                return Err(SchemaError::NonFiniteCategory {
                    column: name.to_string(),
                    row,
                });
            }
        }
        if let Some(key) = value.category_key() {
            if seen.insert(key.clone()) {
                levels.push(key);
            }
        }
    }

    Ok(levels)
}

fn check_declared_levels(name: &str, declared: &[String]) -> Result<(), SchemaError> {
    if declared.is_empty() {
        return Err(SchemaError::EmptyLevels {
            column: name.to_string(),
        });
    }
    let mut seen = AHashSet::with_capacity(declared.len());
    for level in declared {
        if !seen.insert(level.as_str()) {
            return Err(SchemaError::DuplicateLevel {
                column: name.to_string(),
                level: level.clone(),
            });
        }
    }
    Ok(())
}

/// Numeric order when every observed value is a number, lexical otherwise
fn inferred_order(dataset: &Dataset, index: usize, name: &str) -> Result<Vec<String>, SchemaError> {
    let levels = observed_levels(dataset, index, name)?;

    let all_numeric = dataset
        .column(index)
        .all(|v| matches!(v, Value::Missing | Value::Number(_)));

    if all_numeric {
        let mut by_number: AHashMap<String, f64> = AHashMap::new();
        for x in dataset.column(index).filter_map(Value::as_f64) {
            by_number.entry(Value::Number(x).category_key().unwrap_or_default()).or_insert(x);
        }
        let mut levels = levels;
        levels.sort_by_key(|level| OrderedFloat(by_number.get(level).copied().unwrap_or(0.0)));
        Ok(levels)
    } else {
        let mut levels = levels;
        levels.sort();
        Ok(levels)
    }
}
