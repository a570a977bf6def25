//! Unpivot of the wide table into one row per observation and indicator.

use polars::prelude::*;
use tracing::{debug, warn};

use badea_common::{column_names, constant_column, frame_from_columns, has_column};
use badea_model::Frequency;
use badea_model::columns::{FREQ, INDICATOR, OBS_STATUS, OBS_VALUE};

use crate::error::{Result, TransformError};

/// Unpivot the measure columns of a wide table.
///
/// The first measure listed in `status_measures` becomes the `OBS_STATUS`
/// dimension instead of an indicator. Every other measure not listed in
/// `excluded_measures` contributes one row per wide row, with columns
/// `[dimensions.., INDICATOR, OBS_VALUE]`, in measure order.
pub fn unpivot_measures(
    wide: &DataFrame,
    measures: &[String],
    status_measures: &[String],
    excluded_measures: &[String],
) -> Result<DataFrame> {
    for measure in measures {
        if !has_column(wide, measure) {
            return Err(TransformError::MissingColumn {
                column: measure.clone(),
            });
        }
    }

    let mut status: Option<&String> = None;
    let mut retained = Vec::new();
    for measure in measures {
        if status_measures.contains(measure) {
            if status.is_none() {
                status = Some(measure);
            } else {
                warn!(measure = %measure, "Only one status measure is kept, dropping");
            }
        } else if !excluded_measures.contains(measure) {
            retained.push(measure);
        }
    }

    let mut dimensions: Vec<Column> = Vec::new();
    for name in column_names(wide) {
        if measures.contains(&name) {
            continue;
        }
        dimensions.push(wide.column(&name)?.clone());
    }
    if let Some(measure) = status {
        let mut column = wide.column(measure)?.clone();
        column.rename(OBS_STATUS.into());
        dimensions.push(column);
    }

    let height = wide.height();
    let mut long: Option<DataFrame> = None;
    for measure in &retained {
        let mut columns = dimensions.clone();
        columns.push(constant_column(INDICATOR, Some(measure.as_str()), height));
        let mut value = wide.column(measure)?.cast(&DataType::String)?;
        value.rename(OBS_VALUE.into());
        columns.push(value);
        let projection = DataFrame::new(columns)?;
        match long.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&projection)?;
            }
            None => long = Some(projection),
        }
    }

    let long = match long {
        Some(long) => long,
        None => {
            let mut columns: Vec<(String, Vec<Option<String>>)> = dimensions
                .iter()
                .map(|column| (column.name().to_string(), Vec::new()))
                .collect();
            columns.push((INDICATOR.to_string(), Vec::new()));
            columns.push((OBS_VALUE.to_string(), Vec::new()));
            frame_from_columns(columns)?
        }
    };
    debug!(
        measures = retained.len(),
        rows = long.height(),
        "Unpivoted measures"
    );
    Ok(long)
}

/// Append the constant `FREQ` column.
pub fn insert_freq(long: &mut DataFrame, frequency: Frequency) -> Result<()> {
    let height = long.height();
    long.with_column(constant_column(FREQ, Some(frequency.sdmx_code()), height))?;
    Ok(())
}
