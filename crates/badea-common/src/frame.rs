//! Helpers for all-string frames.

use std::collections::HashSet;

use polars::prelude::*;

/// Which occurrence of a repeated row survives deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepOccurrence {
    First,
    Last,
}

/// Names of a frame's columns, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names()
        .into_iter()
        .any(|column| column.as_str() == name)
}

/// Values of a column as optional strings. Non-string columns are cast.
pub fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column.str()?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Build a string frame from named columns of equal length.
pub fn frame_from_columns(columns: Vec<(String, Vec<Option<String>>)>) -> PolarsResult<DataFrame> {
    let columns = columns
        .into_iter()
        .map(|(name, values)| Series::new(name.into(), values).into_column())
        .collect();
    DataFrame::new(columns)
}

/// A string column holding `value` on every row.
pub fn constant_column(name: &str, value: Option<&str>, len: usize) -> Column {
    let values: Vec<Option<String>> = vec![value.map(str::to_string); len];
    Series::new(name.into(), values).into_column()
}

/// Per-row keys over `columns`, as optional strings.
pub fn row_keys(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<Vec<Option<String>>>> {
    let mut keys = vec![Vec::with_capacity(columns.len()); df.height()];
    for name in columns {
        for (key, value) in keys.iter_mut().zip(string_values(df, name)?) {
            key.push(value);
        }
    }
    Ok(keys)
}

/// Drop rows that repeat an earlier (or later) row on `subset`, keeping
/// the surviving rows in their original order. Nulls compare equal.
pub fn distinct_rows(
    df: &DataFrame,
    subset: &[String],
    keep: KeepOccurrence,
) -> PolarsResult<DataFrame> {
    let keys = row_keys(df, subset)?;
    let mut seen = HashSet::with_capacity(keys.len());
    let mut mask = vec![false; keys.len()];
    match keep {
        KeepOccurrence::First => {
            for (idx, key) in keys.iter().enumerate() {
                mask[idx] = seen.insert(key);
            }
        }
        KeepOccurrence::Last => {
            for (idx, key) in keys.iter().enumerate().rev() {
                mask[idx] = seen.insert(key);
            }
        }
    }
    let mask = BooleanChunked::from_slice("keep".into(), &mask);
    df.filter(&mask)
}

/// Drop rows whose `column` is null.
pub fn drop_null_rows(df: &DataFrame, column: &str) -> PolarsResult<DataFrame> {
    let mask = df.column(column)?.is_not_null();
    df.filter(&mask)
}

/// Row-concatenate frames whose columns may differ.
///
/// The result has the union of all columns in first-seen order; cells of
/// columns a frame lacks are null. Every column is cast to string.
pub fn concat_aligned(frames: &[DataFrame]) -> PolarsResult<DataFrame> {
    let mut union: Vec<String> = Vec::new();
    for frame in frames {
        for name in column_names(frame) {
            if !union.contains(&name) {
                union.push(name);
            }
        }
    }

    let mut result: Option<DataFrame> = None;
    for frame in frames {
        let height = frame.height();
        let mut columns = Vec::with_capacity(union.len());
        for name in &union {
            let column = if has_column(frame, name) {
                frame.column(name)?.cast(&DataType::String)?
            } else {
                constant_column(name, None, height)
            };
            columns.push(column);
        }
        let aligned = DataFrame::new(columns)?;
        match result.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&aligned)?;
            }
            None => result = Some(aligned),
        }
    }

    Ok(result.unwrap_or_else(DataFrame::empty))
}
