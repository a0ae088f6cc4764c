//! Per-kind dissimilarity functions
//!
//! One function per variable kind, each comparing two values of a single
//! column. Categorical kinds return values in `[0, 1]`; continuous
//! dissimilarities are unbounded (Canberra excepted) and take the form given by
//! the [`ContinuousFamily`].
//!
//! [`column_dissimilarity`] is the fixed dispatch over the closed set of
//! preprocessed column kinds.

use crate::preprocess::{ContinuousColumn, PreprocessedColumn, PreprocessedTable};
use mixdist_core::{ContinuousFamily, MissingPolicy, NumericError};

/// Outcome of comparing two values of one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dissimilarity {
    /// Non-negative dissimilarity computed from both values
    Value(f64),
    /// Fixed dissimilarity standing in for a comparison with a missing value
    Sentinel(f64),
    /// A value is missing; the column is left out of this pair
    Missing,
    /// Both values are the negative level of an asymmetric binary column;
    /// the column is left out of this pair
    JointAbsence,
}

impl Dissimilarity {
    pub fn value(self) -> Option<f64> {
        match self {
            Dissimilarity::Value(d) | Dissimilarity::Sentinel(d) => Some(d),
            Dissimilarity::Missing | Dissimilarity::JointAbsence => None,
        }
    }

    pub fn is_excluded(self) -> bool {
        self.value().is_none()
    }
}

fn missing(policy: MissingPolicy) -> Dissimilarity {
    match policy {
        MissingPolicy::Exclude => Dissimilarity::Missing,
        MissingPolicy::Sentinel { value } => Dissimilarity::Sentinel(value),
    }
}

/// Difference of two scaled continuous values in the form `family` asks for.
///
/// Returns `Err(value)` with the offending operand when either value is not
/// finite.
pub fn continuous(
    a: Option<f64>,
    b: Option<f64>,
    constant: bool,
    family: ContinuousFamily,
    policy: MissingPolicy,
) -> Result<Dissimilarity, f64> {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(missing(policy)),
    };
    if !a.is_finite() {
        return Err(a);
    }
    if !b.is_finite() {
        return Err(b);
    }
    if constant {
        return Ok(Dissimilarity::Value(0.0));
    }
    let diff = (a - b).abs();
    Ok(Dissimilarity::Value(match family {
        ContinuousFamily::Absolute => diff,
        ContinuousFamily::Squared => diff * diff,
        ContinuousFamily::Minkowski { p } => diff.powf(p),
        ContinuousFamily::Canberra => {
            let denom = a.abs() + b.abs();
            if denom > 0.0 {
                diff / denom
            } else {
                0.0
            }
        }
    }))
}

/// Simple matching on two binary codes.
///
/// With `negative` set, a pair where both values equal the negative level is
/// a joint absence, which is not evidence of similarity.
pub fn binary(
    a: Option<u32>,
    b: Option<u32>,
    negative: Option<u32>,
    policy: MissingPolicy,
) -> Dissimilarity {
    match (a, b) {
        (Some(a), Some(b)) => {
            if a == b && negative == Some(a) {
                Dissimilarity::JointAbsence
            } else if a == b {
                Dissimilarity::Value(0.0)
            } else {
                Dissimilarity::Value(1.0)
            }
        }
        _ => missing(policy),
    }
}

/// 0 when the categories match, 1 otherwise
pub fn nominal(a: Option<u32>, b: Option<u32>, policy: MissingPolicy) -> Dissimilarity {
    match (a, b) {
        (Some(a), Some(b)) => Dissimilarity::Value(if a == b { 0.0 } else { 1.0 }),
        _ => missing(policy),
    }
}

/// `|rank(a) - rank(b)| / (levels - 1)`
pub fn ordinal(a: Option<u32>, b: Option<u32>, levels: usize, policy: MissingPolicy) -> Dissimilarity {
    match (a, b) {
        (Some(a), Some(b)) => {
            if levels < 2 {
                return Dissimilarity::Value(0.0);
            }
            let diff = (a as f64 - b as f64).abs();
            Dissimilarity::Value(diff / (levels - 1) as f64)
        }
        _ => missing(policy),
    }
}

/// Dissimilarity of rows `i` and `j` on column `column` of `table`.
pub fn column_dissimilarity(
    table: &PreprocessedTable,
    column: usize,
    i: usize,
    j: usize,
    family: ContinuousFamily,
    policy: MissingPolicy,
) -> Result<Dissimilarity, NumericError> {
    match table.column(column) {
        PreprocessedColumn::Continuous(ContinuousColumn {
            values, constant, ..
        }) => continuous(values[i], values[j], *constant, family, policy).map_err(|value| {
            let row = if values[i].map_or(false, |x| !x.is_finite()) { i } else { j };
            NumericError::NonFinite {
                column: table.name(column).to_string(),
                row,
                value,
            }
        }),
        PreprocessedColumn::Binary { codes, negative } => {
            Ok(binary(codes[i], codes[j], *negative, policy))
        }
        PreprocessedColumn::Nominal { codes } => Ok(nominal(codes[i], codes[j], policy)),
        PreprocessedColumn::Ordinal { ranks, levels } => {
            Ok(ordinal(ranks[i], ranks[j], *levels, policy))
        }
    }
}
