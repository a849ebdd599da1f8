use thiserror::Error;

/// Errors that can occur while fitting or tabulating IV regressions
#[derive(Error, Debug)]
pub enum StatsError {
    // Input validation errors
    #[error("Empty input: {field} cannot be empty")]
    EmptyInput { field: &'static str },

    #[error("Dimension mismatch: y has {y_len} elements, X has {x_rows} rows")]
    DimensionMismatch { y_len: usize, x_rows: usize },

    #[error("Length mismatch: column '{column}' has {len} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("Row width mismatch: row has {cells} cells, table has {columns} columns")]
    RowWidthMismatch { cells: usize, columns: usize },

    #[error("Insufficient data: {rows} rows, {cols} parameters (need rows > parameters)")]
    InsufficientData { rows: usize, cols: usize },

    #[error("All rows filtered due to missing or non-finite values")]
    NoValidData,

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Under-identified: {instruments} instruments for {endogenous} endogenous regressors")]
    UnderIdentified {
        instruments: usize,
        endogenous: usize,
    },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    // Numerical errors
    #[error("Matrix is singular or near-singular: {0}")]
    SingularMatrix(&'static str),

    #[error("Invalid reference distribution: {0}")]
    Distribution(String),

    // Output errors
    #[error("Failed to display table: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;
