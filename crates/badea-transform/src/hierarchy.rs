//! Hierarchy trees as flat coded tables.

use std::collections::{HashMap, HashSet};

use polars::prelude::*;
use tracing::debug;

use badea_common::{
    KeepOccurrence, concat_aligned, distinct_rows, drop_null_rows, frame_from_columns, has_column,
    string_values,
};
use badea_map::CodeMap;
use badea_model::columns::{
    CODELIST_COLUMNS, COD, DESCRIPTION, ID, NAME, NOT_APPLICABLE, ORDER, PARENTCODE,
};
use badea_model::{HierarchyMeta, HierarchyNode, HierarchyProperty};

use crate::error::{Result, TransformError};

/// Flat table of a hierarchy: one row per unique `COD`, including the
/// synthetic `_Z` "not applicable" row.
#[derive(Debug, Clone)]
pub struct HierarchyTable {
    frame: DataFrame,
}

/// A hierarchy as used by one query: its summary and its expanded table.
#[derive(Debug, Clone)]
pub struct QueryHierarchy {
    pub meta: HierarchyMeta,
    pub table: HierarchyTable,
}

/// Expand a hierarchy tree into a [`HierarchyTable`].
///
/// Nodes are emitted batch by batch: the rows of a sibling list come first,
/// followed by the expansion of each node's children in order. Descent stops
/// once every node of a batch is terminal. A node lacking a projected
/// property is an error.
pub fn expand_hierarchy(
    roots: &[HierarchyNode],
    properties: &[HierarchyProperty],
) -> Result<HierarchyTable> {
    if !properties.contains(&HierarchyProperty::Cod) {
        return Err(TransformError::MissingColumn {
            column: COD.to_string(),
        });
    }

    let mut rows = Vec::new();
    collect_batch(roots, properties, &mut rows)?;
    rows.push(
        properties
            .iter()
            .map(|property| property.not_applicable_value().to_string())
            .collect(),
    );
    debug!(rows = rows.len(), "Expanded hierarchy tree");

    let columns = properties
        .iter()
        .enumerate()
        .map(|(idx, property)| {
            let values = rows.iter().map(|row| Some(row[idx].clone())).collect();
            (property.column_name().to_string(), values)
        })
        .collect();
    HierarchyTable::from_frame(frame_from_columns(columns)?)
}

fn collect_batch(
    batch: &[HierarchyNode],
    properties: &[HierarchyProperty],
    rows: &mut Vec<Vec<String>>,
) -> Result<()> {
    for node in batch {
        let row = properties
            .iter()
            .map(|property| node.property(*property))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    if batch.iter().all(HierarchyNode::is_terminal) {
        return Ok(());
    }
    for node in batch {
        collect_batch(&node.children, properties, rows)?;
    }
    Ok(())
}

impl HierarchyTable {
    /// Wrap a hierarchy frame, keeping the first row of every repeated `COD`.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        for column in [ID, COD] {
            if !has_column(&frame, column) {
                return Err(TransformError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        let frame = distinct_rows(&frame, &[COD.to_string()], KeepOccurrence::First)?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Lookup from positional code to stable identifier.
    pub fn code_to_id(&self) -> Result<HashMap<String, Option<String>>> {
        let codes = string_values(&self.frame, COD)?;
        let ids = string_values(&self.frame, ID)?;
        let mut lookup = HashMap::with_capacity(codes.len());
        for (code, id) in codes.into_iter().zip(ids) {
            if let Some(code) = code {
                lookup.entry(code).or_insert(id);
            }
        }
        Ok(lookup)
    }

    /// `COD` and `NAME` of every row, keyed by `ID`.
    pub fn attributes_by_id(&self) -> Result<HashMap<String, (Option<String>, Option<String>)>> {
        let ids = string_values(&self.frame, ID)?;
        let codes = string_values(&self.frame, COD)?;
        let names = if has_column(&self.frame, NAME) {
            string_values(&self.frame, NAME)?
        } else {
            vec![None; ids.len()]
        };
        let mut lookup = HashMap::with_capacity(ids.len());
        for ((id, code), name) in ids.into_iter().zip(codes).zip(names) {
            if let Some(id) = id {
                lookup.entry(id).or_insert((code, name));
            }
        }
        Ok(lookup)
    }

    /// The table without `COD`, ready to be published as a code list.
    ///
    /// With a code map, `ID` and `PARENTCODE` are rewritten to their targets
    /// (`_Z` is kept as is), rows whose `ID` has no target are dropped and
    /// the first row of every repeated `ID` wins. A `PARENTCODE` equal to the
    /// row's own `ID` is cleared.
    pub fn sdmx_view(&self, map: Option<&CodeMap>) -> Result<DataFrame> {
        let columns = CODELIST_COLUMNS
            .iter()
            .filter(|name| has_column(&self.frame, name))
            .map(|name| self.frame.column(name).cloned())
            .collect::<PolarsResult<Vec<Column>>>()?;
        let mut view = DataFrame::new(columns)?;

        if let Some(map) = map {
            let remap = |value: Option<String>| -> Option<String> {
                let value = value?;
                if value == NOT_APPLICABLE {
                    return Some(value);
                }
                map.resolve(&value).map(str::to_string)
            };
            let ids: Vec<Option<String>> =
                string_values(&view, ID)?.into_iter().map(remap).collect();
            view.with_column(Series::new(ID.into(), ids))?;
            if has_column(&view, PARENTCODE) {
                let parents: Vec<Option<String>> = string_values(&view, PARENTCODE)?
                    .into_iter()
                    .map(remap)
                    .collect();
                view.with_column(Series::new(PARENTCODE.into(), parents))?;
            }

            let before = view.height();
            view = drop_null_rows(&view, ID)?;
            view = distinct_rows(&view, &[ID.to_string()], KeepOccurrence::First)?;
            debug!(
                dimension = map.dimension(),
                dropped = before - view.height(),
                "Remapped hierarchy identifiers"
            );
        }

        if has_column(&view, PARENTCODE) {
            let ids = string_values(&view, ID)?;
            let parents: Vec<Option<String>> = string_values(&view, PARENTCODE)?
                .into_iter()
                .zip(&ids)
                .map(|(parent, id)| parent.filter(|parent| Some(parent) != id.as_ref()))
                .collect();
            view.with_column(Series::new(PARENTCODE.into(), parents))?;
        }
        Ok(view)
    }
}

/// `PARENTCODE` values that reference no `ID` of the same table, in
/// first-seen order. Empty parents mark roots and are not reported.
pub fn dangling_parents(frame: &DataFrame) -> Result<Vec<String>> {
    if !has_column(frame, PARENTCODE) {
        return Ok(Vec::new());
    }
    let ids: HashSet<String> = string_values(frame, ID)?.into_iter().flatten().collect();
    let mut seen = HashSet::new();
    let mut dangling = Vec::new();
    for parent in string_values(frame, PARENTCODE)?.into_iter().flatten() {
        if parent.is_empty() || ids.contains(&parent) {
            continue;
        }
        if seen.insert(parent.clone()) {
            dangling.push(parent);
        }
    }
    Ok(dangling)
}

/// Merge the code lists of one dimension across queries: rows without an
/// `ID` are dropped and the first row of every `ID` wins.
pub fn merge_codelists(frames: &[DataFrame]) -> Result<DataFrame> {
    let merged = concat_aligned(frames)?;
    if !has_column(&merged, ID) {
        return Ok(merged);
    }
    let merged = drop_null_rows(&merged, ID)?;
    Ok(distinct_rows(&merged, &[ID.to_string()], KeepOccurrence::First)?)
}

/// Code list of the `INDICATOR` dimension: one row per distinct target of
/// the indicator code map, named after its source label.
pub fn indicator_codelist(map: &CodeMap) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    let mut names = Vec::new();
    for entry in map.entries() {
        let Some(target) = entry.target() else {
            continue;
        };
        if seen.insert(target.to_string()) {
            ids.push(Some(target.to_string()));
            names.push(Some(entry.source.clone()));
        }
    }
    let len = ids.len();
    Ok(frame_from_columns(vec![
        (ID.to_string(), ids),
        (NAME.to_string(), names.clone()),
        (DESCRIPTION.to_string(), names),
        (PARENTCODE.to_string(), vec![None; len]),
        (ORDER.to_string(), vec![None; len]),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use badea_map::CodeMapEntry;
    use serde_json::json;

    fn node(value: serde_json::Value) -> HierarchyNode {
        serde_json::from_value(value).expect("node")
    }

    fn leaf(id: u32, cod: &str, parent: u32) -> serde_json::Value {
        json!({
            "id": id, "cod": cod, "label": cod, "des": cod,
            "parentId": parent, "order": id, "children": [], "isLastLevel": true
        })
    }

    fn sample_tree() -> HierarchyNode {
        node(json!({
            "id": 1, "cod": "00", "label": "Andalucía", "des": "Andalucía",
            "parentId": null, "order": 1, "isLastLevel": false,
            "children": [
                {
                    "id": 2, "cod": "04", "label": "Almería", "des": "null",
                    "parentId": 1, "order": 2, "isLastLevel": false,
                    "children": [leaf(5, "04001", 2)]
                },
                leaf(3, "11", 1),
                leaf(4, "04", 1)
            ]
        }))
    }

    #[test]
    fn expands_level_batches_and_appends_not_applicable() {
        let table = expand_hierarchy(&[sample_tree()], &HierarchyProperty::ALL).unwrap();
        let frame = table.frame();

        assert_eq!(
            string_values(frame, COD).unwrap(),
            vec![
                Some("00".to_string()),
                Some("04".to_string()),
                Some("11".to_string()),
                Some("04001".to_string()),
                Some("No aplica".to_string()),
            ]
        );
        let ids = string_values(frame, ID).unwrap();
        // The second "04" (id 4) lost to the first occurrence.
        assert_eq!(ids[1].as_deref(), Some("2"));
        assert_eq!(ids[4].as_deref(), Some(NOT_APPLICABLE));
        assert_eq!(string_values(frame, DESCRIPTION).unwrap()[1].as_deref(), Some(""));
        assert_eq!(string_values(frame, PARENTCODE).unwrap()[0].as_deref(), Some(""));
    }

    #[test]
    fn missing_property_aborts_expansion() {
        let broken = node(json!({"id": 1, "cod": "00", "children": []}));
        let err = expand_hierarchy(&[broken], &HierarchyProperty::ALL).unwrap_err();
        assert!(matches!(err, TransformError::Model(_)));
    }

    #[test]
    fn code_to_id_follows_deduplicated_table() {
        let table = expand_hierarchy(&[sample_tree()], &HierarchyProperty::ALL).unwrap();
        let lookup = table.code_to_id().unwrap();
        assert_eq!(lookup["04"].as_deref(), Some("2"));
        assert_eq!(lookup["04001"].as_deref(), Some("5"));
    }

    #[test]
    fn sdmx_view_remaps_and_keeps_not_applicable() {
        let table = expand_hierarchy(&[sample_tree()], &HierarchyProperty::ALL).unwrap();
        let map = CodeMap::from_entries(
            "D_TERRITORIO_0",
            [
                CodeMapEntry::new("1").with_target("AN"),
                CodeMapEntry::new("2").with_target("AL"),
                CodeMapEntry::new("5").with_target("AL"),
            ],
        );

        let view = table.sdmx_view(Some(&map)).unwrap();

        assert!(!has_column(&view, COD));
        assert_eq!(
            string_values(&view, ID).unwrap(),
            vec![
                Some("AN".to_string()),
                Some("AL".to_string()),
                Some("_Z".to_string())
            ]
        );
        assert_eq!(
            string_values(&view, PARENTCODE).unwrap()[1].as_deref(),
            Some("AN")
        );
    }

    #[test]
    fn sdmx_view_clears_self_parent() {
        let frame = frame_from_columns(vec![
            (ID.to_string(), vec![Some("A".into()), Some("B".into())]),
            (COD.to_string(), vec![Some("a".into()), Some("b".into())]),
            (PARENTCODE.to_string(), vec![Some("A".into()), Some("A".into())]),
        ])
        .unwrap();
        let view = HierarchyTable::from_frame(frame).unwrap().sdmx_view(None).unwrap();
        assert_eq!(
            string_values(&view, PARENTCODE).unwrap(),
            vec![None, Some("A".to_string())]
        );
    }

    #[test]
    fn reports_dangling_parents() {
        let frame = frame_from_columns(vec![
            (ID.to_string(), vec![Some("1".into()), Some("2".into()), Some("3".into())]),
            (
                PARENTCODE.to_string(),
                vec![Some("".into()), Some("9".into()), Some("9".into())],
            ),
        ])
        .unwrap();
        assert_eq!(dangling_parents(&frame).unwrap(), vec!["9"]);
    }

    #[test]
    fn merge_codelists_dedups_on_id() {
        let first = frame_from_columns(vec![
            (ID.to_string(), vec![Some("H".into()), Some("M".into())]),
            (NAME.to_string(), vec![Some("Hombres".into()), Some("Mujeres".into())]),
        ])
        .unwrap();
        let second = frame_from_columns(vec![
            (ID.to_string(), vec![Some("M".into()), None, Some("T".into())]),
            (NAME.to_string(), vec![Some("Otra".into()), Some("x".into()), Some("Total".into())]),
        ])
        .unwrap();

        let merged = merge_codelists(&[first, second]).unwrap();
        assert_eq!(
            string_values(&merged, NAME).unwrap(),
            vec![
                Some("Hombres".to_string()),
                Some("Mujeres".to_string()),
                Some("Total".to_string())
            ]
        );
    }

    #[test]
    fn indicator_codelist_uses_unique_targets() {
        let map = CodeMap::from_entries(
            "INDICATOR",
            [
                CodeMapEntry::new("Personas").with_target("PERS"),
                CodeMapEntry::new("Personas (miles)").with_target("PERS"),
                CodeMapEntry::new("Tasa"),
            ],
        );
        let codelist = indicator_codelist(&map).unwrap();
        assert_eq!(codelist.height(), 1);
        assert_eq!(
            string_values(&codelist, NAME).unwrap(),
            vec![Some("Personas".to_string())]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn tree_json(codes: &[(String, Vec<String>)]) -> serde_json::Value {
            let roots: Vec<serde_json::Value> = codes
                .iter()
                .enumerate()
                .map(|(idx, (cod, children))| {
                    let children: Vec<serde_json::Value> = children
                        .iter()
                        .map(|child| leaf(0, child, idx as u32))
                        .collect();
                    json!({
                        "id": idx, "cod": cod, "label": cod, "des": cod,
                        "parentId": "", "order": idx, "children": children
                    })
                })
                .collect();
            json!(roots)
        }

        proptest! {
            #[test]
            fn one_row_per_unique_code_plus_not_applicable(
                codes in prop::collection::vec(
                    ("[a-d]{1,2}", prop::collection::vec("[a-d]{1,2}", 0..4)),
                    1..6,
                )
            ) {
                let roots: Vec<HierarchyNode> =
                    serde_json::from_value(tree_json(&codes)).expect("tree");
                let table = expand_hierarchy(&roots, &HierarchyProperty::ALL).unwrap();

                let mut unique = HashSet::new();
                for (cod, children) in &codes {
                    unique.insert(cod.clone());
                    unique.extend(children.iter().cloned());
                }
                prop_assert_eq!(table.height(), unique.len() + 1);
            }
        }
    }
}
