//! Shared utilities for BADEA crates.
//!
//! Observation and hierarchy tables are handled as all-string Polars frames;
//! this crate holds the frame helpers and numeric text handling they share.

pub mod frame;
pub mod numeric;

pub use frame::{
    KeepOccurrence, column_names, concat_aligned, constant_column, distinct_rows, drop_null_rows,
    frame_from_columns, has_column, row_keys, string_values,
};
pub use numeric::{format_numeric, parse_f64};
