use badea_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// The query returned no observation rows.
    #[error("query has no observations")]
    EmptyQuery,

    #[error("observation row {row} has {found} cells, expected {expected}")]
    RowShape {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// A dimension cell without a code path, or a measure cell with
    /// neither `val` nor `format`.
    #[error("observation row {row}: cell of '{column}' has no {field}")]
    MissingCellField {
        row: usize,
        column: String,
        field: &'static str,
    },

    #[error("no hierarchy table for dimension '{alias}'")]
    MissingHierarchy { alias: String },

    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("OBS_VALUE '{value}' is not numeric")]
    NonNumericValue { value: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
