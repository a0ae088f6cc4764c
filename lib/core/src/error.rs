use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error of a distance computation run.
///
/// Validation errors ([`SchemaError`], [`ConfigError`]) and per-pair numeric
/// failures ([`NumericError`]) abort the whole run. No partial matrix is ever
/// returned alongside an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("Matrix build cancelled after {completed_rows} of {total_rows} rows")]
    Cancelled { completed_rows: usize, total_rows: usize },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Declared column kinds are inconsistent with the observed data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Expected {expected} column kinds, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("Row {row} has {found} values, expected {expected}")]
    RowLength { row: usize, expected: usize, found: usize },

    #[error("Column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("Column '{column}' row {row}: expected a {expected} value")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: &'static str,
    },

    #[error("Binary column '{column}' has {levels} distinct values")]
    TooManyBinaryLevels { column: String, levels: usize },

    #[error("Ordinal column '{column}' contains undeclared level '{level}'")]
    UndeclaredLevel { column: String, level: String },

    #[error("Ordinal column '{column}' declares level '{level}' twice")]
    DuplicateLevel { column: String, level: String },

    #[error("Ordinal column '{column}' declares no levels")]
    EmptyLevels { column: String },

    #[error("Categorical column '{column}' row {row} holds a non-finite number")]
    NonFiniteCategory { column: String, row: usize },

    #[error("Column '{column}' points at index {index}, dataset has {n_columns} columns")]
    ColumnIndex { column: String, index: usize, n_columns: usize },
}

/// Invalid configuration, or a pair without any usable evidence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown value '{value}' for option '{option}'")]
    UnknownOption { option: &'static str, value: String },

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Contradictory configuration: {0}")]
    Contradictory(String),

    #[error("Expected {expected} weights, got {found}")]
    WeightCount { expected: usize, found: usize },

    #[error("Column '{column}' has invalid weight {weight}")]
    InvalidWeight { column: String, weight: f64 },

    #[error("Total weight must be positive")]
    ZeroTotalWeight,

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("Column '{0}' is not binary")]
    NotBinary(String),

    #[error("Rows {row_a} and {row_b} share no usable column (zero weight sum)")]
    ZeroPairWeight { row_a: usize, row_b: usize },

    #[error("Expected {expected} rows, got {found}")]
    RowCountMismatch { expected: usize, found: usize },

    #[error("Preprocessed table was built with a different '{0}' setting")]
    PreprocessMismatch(&'static str),
}

/// A non-finite value reached a dissimilarity function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Column '{column}' row {row} holds non-finite value {value}")]
    NonFinite { column: String, row: usize, value: f64 },
}
