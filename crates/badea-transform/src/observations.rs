//! The long observation table and the operations applied to it after the
//! build.

use std::collections::{BTreeMap, HashSet};

use polars::prelude::*;
use tracing::{debug, error};

use badea_common::{
    KeepOccurrence, column_names, constant_column, distinct_rows, format_numeric, frame_from_columns,
    has_column, parse_f64, row_keys, string_values,
};
use badea_map::CodeMap;
use badea_model::columns::{NOT_APPLICABLE, OBS_VALUE, strip_column_affixes};

use crate::error::{Result, TransformError};

/// Observations in long format: dimension columns, `INDICATOR` and
/// `OBS_VALUE`, plus `OBS_STATUS`/`FREQ` when present.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    frame: DataFrame,
}

impl ObservationTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    pub fn has_column(&self, name: &str) -> bool {
        has_column(&self.frame, name)
    }

    /// Every column except `OBS_VALUE`.
    fn key_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| name != OBS_VALUE)
            .collect()
    }

    fn require(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(TransformError::MissingColumn {
                column: column.to_string(),
            })
        }
    }

    /// Number of rows that repeat an earlier row on every column except
    /// `OBS_VALUE`.
    pub fn duplicate_row_count(&self) -> Result<usize> {
        let keys = row_keys(&self.frame, &self.key_columns())?;
        let mut seen = HashSet::with_capacity(keys.len());
        Ok(keys.iter().filter(|key| !seen.insert(*key)).count())
    }

    /// Drop rows identical on every column except `OBS_VALUE`, keeping the
    /// last occurrence. Returns how many rows were dropped.
    pub fn drop_duplicate_rows(&mut self) -> Result<usize> {
        let before = self.height();
        self.frame = distinct_rows(&self.frame, &self.key_columns(), KeepOccurrence::Last)?;
        let dropped = before - self.height();
        debug!(dropped, rows = self.height(), "Dropped duplicate observations");
        Ok(dropped)
    }

    /// Collapse rows sharing every column except `OBS_VALUE` into one row
    /// whose value is the numeric sum.
    ///
    /// Groups come out sorted by their keys. Rows with a null key are
    /// dropped; null or empty values count as nothing. A value that does not
    /// parse as a number is an error. An empty result is logged, not raised.
    pub fn sum_duplicate_rows(&mut self) -> Result<()> {
        self.require(OBS_VALUE)?;
        let key_columns = self.key_columns();
        let keys = row_keys(&self.frame, &key_columns)?;
        let values = string_values(&self.frame, OBS_VALUE)?;

        let mut groups: BTreeMap<Vec<String>, f64> = BTreeMap::new();
        for (key, value) in keys.into_iter().zip(values) {
            let Some(key) = key.into_iter().collect::<Option<Vec<String>>>() else {
                continue;
            };
            let amount = match value.as_deref().map(str::trim) {
                None | Some("") => 0.0,
                Some(text) => parse_f64(text).ok_or_else(|| TransformError::NonNumericValue {
                    value: text.to_string(),
                })?,
            };
            *groups.entry(key).or_insert(0.0) += amount;
        }

        let names = self.column_names();
        let mut columns: Vec<(String, Vec<Option<String>>)> = names
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(groups.len())))
            .collect();
        for (key, sum) in &groups {
            let mut key_values = key.iter();
            for (name, values) in columns.iter_mut() {
                if name == OBS_VALUE {
                    values.push(Some(format_numeric(*sum)));
                } else {
                    values.push(key_values.next().cloned());
                }
            }
        }
        self.frame = frame_from_columns(columns)?;

        if self.height() == 0 {
            error!(
                columns = ?key_columns,
                "Summing duplicate observations produced an empty table"
            );
        } else {
            debug!(rows = self.height(), "Summed duplicate observations");
        }
        Ok(())
    }

    /// Remove the `D_` prefix and `_0` suffix from every column name.
    pub fn strip_column_affixes(&mut self) -> Result<()> {
        for name in self.column_names() {
            let stripped = strip_column_affixes(&name);
            if stripped != name {
                self.frame.rename(&name, stripped.into())?;
            }
        }
        Ok(())
    }

    /// Rename columns by `old -> new`. Names not present are ignored.
    pub fn rename_columns(&mut self, renames: &BTreeMap<String, String>) -> Result<()> {
        for (old, new) in renames {
            if self.has_column(old) {
                self.frame.rename(old, new.as_str().into())?;
            }
        }
        Ok(())
    }

    /// Delete rows whose `column` equals `value`. Null cells never match.
    /// Returns how many rows were deleted.
    pub fn delete_rows_matching(&mut self, column: &str, value: &str) -> Result<usize> {
        self.require(column)?;
        let mask: Vec<bool> = string_values(&self.frame, column)?
            .iter()
            .map(|cell| cell.as_deref() != Some(value))
            .collect();
        let before = self.height();
        self.frame = self
            .frame
            .filter(&BooleanChunked::from_slice("keep".into(), &mask))?;
        Ok(before - self.height())
    }

    /// A copy with every listed column this table lacks appended and filled
    /// with `_Z`. Columns already present are left untouched.
    pub fn extended_with_disjoint(&self, variables: &[String]) -> Result<ObservationTable> {
        let mut extended = self.frame.clone();
        let height = extended.height();
        for variable in variables {
            if !has_column(&extended, variable) {
                extended.with_column(constant_column(variable, Some(NOT_APPLICABLE), height))?;
            }
        }
        Ok(ObservationTable::new(extended))
    }

    /// Rewrite `column` through a code map. `_Z` is kept as is; values
    /// without a target become null. Returns how many values did not resolve.
    pub fn map_values(&mut self, column: &str, map: &CodeMap) -> Result<usize> {
        self.require(column)?;
        let mut unresolved = 0usize;
        let mapped: Vec<Option<String>> = string_values(&self.frame, column)?
            .into_iter()
            .map(|value| {
                let value = value?;
                if value == NOT_APPLICABLE {
                    return Some(value);
                }
                let target = map.resolve(&value).map(str::to_string);
                if target.is_none() {
                    unresolved += 1;
                }
                target
            })
            .collect();
        self.frame.with_column(Series::new(column.into(), mapped))?;
        Ok(unresolved)
    }

    /// Distinct non-null values of a column, in first-seen order.
    pub fn unique_values(&self, column: &str) -> Result<Vec<String>> {
        self.require(column)?;
        let mut seen = HashSet::new();
        Ok(string_values(&self.frame, column)?
            .into_iter()
            .flatten()
            .filter(|value| seen.insert(value.clone()))
            .collect())
    }

    pub fn null_count(&self, column: &str) -> Result<usize> {
        self.require(column)?;
        Ok(self.frame.column(column)?.null_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badea_map::CodeMapEntry;
    use badea_model::columns::INDICATOR;
    use proptest::prelude::*;

    fn table(columns: Vec<(&str, Vec<&str>)>) -> ObservationTable {
        let frame = frame_from_columns(
            columns
                .into_iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.into_iter().map(|v| Some(v.to_string())).collect(),
                    )
                })
                .collect(),
        )
        .expect("frame");
        ObservationTable::new(frame)
    }

    fn values(table: &ObservationTable, column: &str) -> Vec<Option<String>> {
        string_values(table.frame(), column).unwrap()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some((*v).to_string())).collect()
    }

    #[test]
    fn drop_duplicates_keeps_last_value() {
        let mut obs = table(vec![
            ("SEXO", vec!["H", "M", "H"]),
            ("INDICATOR", vec!["P", "P", "P"]),
            ("OBS_VALUE", vec!["1", "2", "3"]),
        ]);
        assert_eq!(obs.duplicate_row_count().unwrap(), 1);

        let dropped = obs.drop_duplicate_rows().unwrap();

        assert_eq!(dropped, 1);
        assert_eq!(values(&obs, "SEXO"), some(&["M", "H"]));
        assert_eq!(values(&obs, OBS_VALUE), some(&["2", "3"]));
    }

    #[test]
    fn sum_duplicates_adds_values_per_group() {
        let mut obs = table(vec![
            ("SEXO", vec!["M", "H", "M", "H"]),
            ("OBS_VALUE", vec!["1.5", "2", "2.5", ""]),
            ("INDICATOR", vec!["P", "P", "P", "P"]),
        ]);

        obs.sum_duplicate_rows().unwrap();

        assert_eq!(obs.column_names(), vec!["SEXO", "OBS_VALUE", "INDICATOR"]);
        assert_eq!(values(&obs, "SEXO"), some(&["H", "M"]));
        assert_eq!(values(&obs, OBS_VALUE), some(&["2", "4"]));
    }

    #[test]
    fn sum_duplicates_rejects_text_values() {
        let mut obs = table(vec![("SEXO", vec!["H"]), ("OBS_VALUE", vec!["n.d."])]);
        let err = obs.sum_duplicate_rows().unwrap_err();
        assert!(matches!(err, TransformError::NonNumericValue { value } if value == "n.d."));
    }

    #[test]
    fn sum_duplicates_of_null_keys_is_empty_not_an_error() {
        let frame = frame_from_columns(vec![
            ("SEXO".to_string(), vec![None]),
            ("OBS_VALUE".to_string(), vec![Some("1".to_string())]),
        ])
        .unwrap();
        let mut obs = ObservationTable::new(frame);
        obs.sum_duplicate_rows().unwrap();
        assert_eq!(obs.height(), 0);
    }

    #[test]
    fn strips_affixes_and_renames() {
        let mut obs = table(vec![
            ("D_SEXO_0", vec!["H"]),
            ("D_TEMPORAL_0", vec!["2020"]),
            ("OBS_VALUE", vec!["1"]),
        ]);
        obs.strip_column_affixes().unwrap();
        assert_eq!(obs.column_names(), vec!["SEXO", "TEMPORAL", "OBS_VALUE"]);

        let renames = BTreeMap::from([
            ("TEMPORAL".to_string(), "TIME_PERIOD".to_string()),
            ("MISSING".to_string(), "X".to_string()),
        ]);
        obs.rename_columns(&renames).unwrap();
        assert_eq!(obs.column_names(), vec!["SEXO", "TIME_PERIOD", "OBS_VALUE"]);
    }

    #[test]
    fn delete_rows_matching_keeps_nulls() {
        let frame = frame_from_columns(vec![
            ("SEXO".to_string(), vec![Some("H".into()), None, Some("T".into())]),
            ("OBS_VALUE".to_string(), some(&["1", "2", "3"])),
        ])
        .unwrap();
        let mut obs = ObservationTable::new(frame);

        assert_eq!(obs.delete_rows_matching("SEXO", "T").unwrap(), 1);
        assert_eq!(values(&obs, OBS_VALUE), some(&["1", "2"]));
        assert!(matches!(
            obs.delete_rows_matching("EDAD", "T"),
            Err(TransformError::MissingColumn { .. })
        ));
    }

    #[test]
    fn extension_pads_missing_dimensions() {
        let obs = table(vec![("SEXO", vec!["H", "M"]), ("OBS_VALUE", vec!["1", "2"])]);
        let variables = vec!["SEXO".to_string(), "EDAD".to_string()];

        let extended = obs.extended_with_disjoint(&variables).unwrap();

        assert_eq!(extended.column_names(), vec!["SEXO", "OBS_VALUE", "EDAD"]);
        assert_eq!(values(&extended, "EDAD"), some(&["_Z", "_Z"]));
        assert_eq!(obs.column_names(), vec!["SEXO", "OBS_VALUE"]);
    }

    #[test]
    fn extension_with_known_columns_is_a_no_op() {
        let obs = table(vec![("SEXO", vec!["H"]), ("OBS_VALUE", vec!["1"])]);
        let extended = obs.extended_with_disjoint(&["SEXO".to_string()]).unwrap();
        assert!(extended.frame().equals_missing(obs.frame()));
    }

    #[test]
    fn map_values_through_code_map() {
        let mut obs = table(vec![
            ("D_SEXO_0", vec!["1", "2", "_Z", "9"]),
            ("OBS_VALUE", vec!["1", "2", "3", "4"]),
        ]);
        let map = CodeMap::from_entries(
            "D_SEXO_0",
            [
                CodeMapEntry::new("1").with_target("H"),
                CodeMapEntry::new("2").with_target("M"),
            ],
        );

        let unresolved = obs.map_values("D_SEXO_0", &map).unwrap();

        assert_eq!(unresolved, 1);
        assert_eq!(
            values(&obs, "D_SEXO_0"),
            vec![Some("H".into()), Some("M".into()), Some("_Z".into()), None]
        );
        assert_eq!(obs.null_count("D_SEXO_0").unwrap(), 1);
    }

    #[test]
    fn unique_values_in_first_seen_order() {
        let obs = table(vec![("INDICATOR", vec!["Tasa", "Personas", "Tasa"])]);
        assert_eq!(obs.unique_values(INDICATOR).unwrap(), vec!["Tasa", "Personas"]);
    }

    proptest! {
        #[test]
        fn drop_duplicates_is_idempotent(
            rows in prop::collection::vec(("[HM]", "[ab]", "[0-9]"), 0..30)
        ) {
            let frame = frame_from_columns(vec![
                ("SEXO".to_string(), rows.iter().map(|r| Some(r.0.clone())).collect()),
                ("INDICATOR".to_string(), rows.iter().map(|r| Some(r.1.clone())).collect()),
                ("OBS_VALUE".to_string(), rows.iter().map(|r| Some(r.2.clone())).collect()),
            ])
            .unwrap();
            let mut once = ObservationTable::new(frame);
            once.drop_duplicate_rows().unwrap();
            let mut twice = once.clone();
            let dropped = twice.drop_duplicate_rows().unwrap();

            prop_assert_eq!(dropped, 0);
            prop_assert!(twice.frame().equals_missing(once.frame()));
        }
    }
}
