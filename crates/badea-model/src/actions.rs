//! Closed sets of processing actions, selected and ordered by configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Actions applied to every hierarchy of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HierarchyAction {
    /// Persist the original and SDMX hierarchy tables.
    Save,
    /// Warn about parent codes that reference no row of the table.
    ReportDanglingParents,
}

/// Actions applied to a query's observation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DataAction {
    Save {
        #[serde(default = "default_save_class")]
        class: String,
    },
    MapValues,
    ExtendCodeMaps,
    DropDuplicateRows,
    SumDuplicateRows,
    StripColumnAffixes,
    RenameColumns {
        #[serde(default)]
        columns: BTreeMap<String, String>,
    },
    DeleteRows {
        rows: Vec<RowFilter>,
    },
    ReportDuplicates,
}

/// Actions applied once every query of an activity has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActivityAction {
    BuildConfiguration,
    ExtendWithDisjoint,
    MergeGroups,
    ExportCodelists,
}

/// Exact-match row filter: rows whose `column` equals `value` are removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

fn default_save_class() -> String {
    "procesados".to_string()
}

impl HierarchyAction {
    pub fn name(&self) -> &'static str {
        match self {
            HierarchyAction::Save => "save",
            HierarchyAction::ReportDanglingParents => "report_dangling_parents",
        }
    }
}

impl DataAction {
    pub fn name(&self) -> &'static str {
        match self {
            DataAction::Save { .. } => "save",
            DataAction::MapValues => "map_values",
            DataAction::ExtendCodeMaps => "extend_code_maps",
            DataAction::DropDuplicateRows => "drop_duplicate_rows",
            DataAction::SumDuplicateRows => "sum_duplicate_rows",
            DataAction::StripColumnAffixes => "strip_column_affixes",
            DataAction::RenameColumns { .. } => "rename_columns",
            DataAction::DeleteRows { .. } => "delete_rows",
            DataAction::ReportDuplicates => "report_duplicates",
        }
    }
}

impl ActivityAction {
    pub fn name(&self) -> &'static str {
        match self {
            ActivityAction::BuildConfiguration => "build_configuration",
            ActivityAction::ExtendWithDisjoint => "extend_with_disjoint",
            ActivityAction::MergeGroups => "merge_groups",
            ActivityAction::ExportCodelists => "export_codelists",
        }
    }
}
