//! Wide observation table: one row per API observation.

use polars::prelude::*;
use tracing::{debug, warn};

use badea_common::{frame_from_columns, has_column, string_values};
use badea_model::{QueryResponse, is_sub_annual};

use crate::error::{Result, TransformError};
use crate::hierarchy::QueryHierarchy;

/// Split a concatenated period code after the year: `202003` becomes
/// `2020-03`. Codes of four characters or fewer are returned unchanged.
pub fn format_temporal_code(code: &str) -> String {
    match code.char_indices().nth(4) {
        Some((split, _)) => format!("{}-{}", &code[..split], &code[split..]),
        None => code.to_string(),
    }
}

/// Build the wide table of a query response.
///
/// Dimension columns hold the leaf code of each cell, measure columns the
/// cell value (or its display format when the value is empty). A dimension
/// cell without `cod` or a measure cell with neither `val` nor `format` is
/// an error. Sub-annual
/// periods are split after the year, and every non-temporal dimension is
/// resolved from positional code to hierarchy `ID`. Codes missing from their
/// hierarchy become null.
pub fn build_wide_table(
    response: &QueryResponse,
    hierarchies: &[QueryHierarchy],
    temporal_dimension: &str,
) -> Result<DataFrame> {
    if response.data.is_empty() {
        return Err(TransformError::EmptyQuery);
    }

    let dimension_count = response.hierarchies.len();
    let names: Vec<String> = response
        .hierarchies
        .iter()
        .map(|hierarchy| hierarchy.alias.clone())
        .chain(response.measures.iter().map(|measure| measure.des.clone()))
        .collect();
    let expected = names.len();
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(response.data.len()); expected];
    for (row_idx, row) in response.data.iter().enumerate() {
        if row.len() != expected {
            return Err(TransformError::RowShape {
                row: row_idx,
                found: row.len(),
                expected,
            });
        }
        for (idx, cell) in row.iter().enumerate() {
            let is_dimension = idx < dimension_count;
            let present = if is_dimension {
                cell.has_code_path()
            } else {
                cell.has_measure()
            };
            if !present {
                return Err(TransformError::MissingCellField {
                    row: row_idx,
                    column: names[idx].clone(),
                    field: if is_dimension { "cod" } else { "val or format" },
                });
            }
            let value = if is_dimension {
                cell.leaf_code()
            } else {
                cell.measure_value()
            };
            columns[idx].push(value);
        }
    }

    let mut wide = frame_from_columns(names.into_iter().zip(columns).collect())?;
    debug!(
        rows = wide.height(),
        columns = wide.width(),
        "Built wide observation table"
    );

    if has_column(&wide, temporal_dimension) && is_sub_annual(&response.metainfo.periodicity) {
        let periods: Vec<Option<String>> = string_values(&wide, temporal_dimension)?
            .into_iter()
            .map(|period| period.map(|code| format_temporal_code(&code)))
            .collect();
        wide.with_column(Series::new(temporal_dimension.into(), periods))?;
    }

    for meta in &response.hierarchies {
        if meta.alias == temporal_dimension {
            continue;
        }
        let hierarchy = hierarchies
            .iter()
            .find(|hierarchy| hierarchy.meta.alias == meta.alias)
            .ok_or_else(|| TransformError::MissingHierarchy {
                alias: meta.alias.clone(),
            })?;
        resolve_codes(&mut wide, &meta.alias, hierarchy)?;
    }

    Ok(wide)
}

fn resolve_codes(wide: &mut DataFrame, column: &str, hierarchy: &QueryHierarchy) -> Result<()> {
    let lookup = hierarchy.table.code_to_id()?;
    let mut unresolved = 0usize;
    let ids: Vec<Option<String>> = string_values(wide, column)?
        .into_iter()
        .map(|code| {
            let id = code.as_ref().and_then(|code| lookup.get(code).cloned().flatten());
            if id.is_none() {
                unresolved += 1;
            }
            id
        })
        .collect();
    if unresolved > 0 {
        warn!(
            dimension = column,
            hierarchy_id = %hierarchy.meta.hierarchy_id(),
            unresolved,
            "Dimension codes not found in hierarchy"
        );
    }
    wide.with_column(Series::new(column.into(), ids))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyTable;
    use badea_model::HierarchyMeta;
    use badea_model::columns::{COD, ID};
    use serde_json::json;

    fn response(periodicity: &str, data: serde_json::Value) -> QueryResponse {
        serde_json::from_value(json!({
            "metainfo": {"id": 1, "title": "Paro registrado", "periodicity": periodicity},
            "hierarchies": [
                {"alias": "D_TEMPORAL_0", "cod": "1", "des": "Periodo"},
                {"alias": "D_SEXO_0", "cod": "7", "des": "Sexo"}
            ],
            "measures": [{"id": 1, "des": "Personas"}],
            "data": data
        }))
        .expect("response")
    }

    fn sex_hierarchy() -> QueryHierarchy {
        let frame = frame_from_columns(vec![
            (ID.to_string(), vec![Some("10".into()), Some("11".into())]),
            (COD.to_string(), vec![Some("1".into()), Some("2".into())]),
        ])
        .unwrap();
        QueryHierarchy {
            meta: HierarchyMeta {
                alias: "D_SEXO_0".to_string(),
                cod: "7".to_string(),
                ..HierarchyMeta::default()
            },
            table: HierarchyTable::from_frame(frame).unwrap(),
        }
    }

    fn rows() -> serde_json::Value {
        json!([
            [{"cod": ["2020", "202003"]}, {"cod": ["0", "1"]}, {"val": 12, "format": "12"}],
            [{"cod": ["2020", "202003"]}, {"cod": ["0", "9"]}, {"val": "", "format": "-"}]
        ])
    }

    #[test]
    fn temporal_code_splits_after_year() {
        assert_eq!(format_temporal_code("202003"), "2020-03");
        assert_eq!(format_temporal_code("20201"), "2020-1");
        assert_eq!(format_temporal_code("2020"), "2020");
    }

    #[test]
    fn builds_wide_table_with_resolved_codes() {
        let wide = build_wide_table(&response("Mensual", rows()), &[sex_hierarchy()], "D_TEMPORAL_0")
            .unwrap();

        assert_eq!(wide.height(), 2);
        assert_eq!(
            string_values(&wide, "D_TEMPORAL_0").unwrap(),
            vec![Some("2020-03".to_string()); 2]
        );
        assert_eq!(
            string_values(&wide, "D_SEXO_0").unwrap(),
            vec![Some("10".to_string()), None]
        );
        assert_eq!(
            string_values(&wide, "Personas").unwrap(),
            vec![Some("12".to_string()), Some("-".to_string())]
        );
    }

    #[test]
    fn annual_periods_are_left_untouched() {
        let wide = build_wide_table(&response("Anual", rows()), &[sex_hierarchy()], "D_TEMPORAL_0")
            .unwrap();
        assert_eq!(
            string_values(&wide, "D_TEMPORAL_0").unwrap()[0].as_deref(),
            Some("202003")
        );
    }

    #[test]
    fn empty_query_is_an_error() {
        let err = build_wide_table(&response("Mensual", json!([])), &[sex_hierarchy()], "D_TEMPORAL_0")
            .unwrap_err();
        assert!(matches!(err, TransformError::EmptyQuery));
    }

    #[test]
    fn short_row_is_a_shape_error() {
        let data = json!([[{"cod": ["202003"]}, {"val": 1}]]);
        let err = build_wide_table(&response("Mensual", data), &[sex_hierarchy()], "D_TEMPORAL_0")
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::RowShape { row: 0, found: 2, expected: 3 }
        ));
    }

    #[test]
    fn dimension_cell_without_code_is_an_error() {
        let data = json!([[{"cod": ["202003"]}, {"label": "Hombres"}, {"val": 1}]]);
        let err = build_wide_table(&response("Mensual", data), &[sex_hierarchy()], "D_TEMPORAL_0")
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingCellField { row: 0, ref column, field: "cod" } if column == "D_SEXO_0"
        ));
    }

    #[test]
    fn measure_cell_without_value_or_format_is_an_error() {
        let data = json!([
            [{"cod": ["202003"]}, {"cod": ["1"]}, {"val": null}],
            [{"cod": ["202003"]}, {"cod": ["2"]}, {"label": "12"}]
        ]);
        let err = build_wide_table(&response("Mensual", data), &[sex_hierarchy()], "D_TEMPORAL_0")
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingCellField { row: 1, ref column, .. } if column == "Personas"
        ));
    }

    #[test]
    fn missing_hierarchy_table_is_an_error() {
        let err = build_wide_table(&response("Mensual", rows()), &[], "D_TEMPORAL_0").unwrap_err();
        assert!(matches!(err, TransformError::MissingHierarchy { alias } if alias == "D_SEXO_0"));
    }
}
