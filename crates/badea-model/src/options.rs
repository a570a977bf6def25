//! Pipeline options, deserialized once from TOML and shared read-only.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::actions::{ActivityAction, DataAction, HierarchyAction};
use crate::api::HierarchyProperty;
use crate::columns::strip_column_affixes;
use crate::query_id::QueryId;

pub const DEFAULT_QUERY_URL: &str =
    "https://www.juntadeandalucia.es/institutodeestadisticaycartografia/intranet/admin/rest/v1.0/consulta";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub processing: ProcessingOptions,
    #[serde(default)]
    pub template: ActionPlan,
    #[serde(default)]
    pub activities: BTreeMap<String, ActivitySpec>,
}

impl PipelineConfig {
    /// Actions for an activity, with unset lists taken from the template.
    pub fn actions_for(&self, activity: &str) -> ActionPlan {
        match self.activities.get(activity) {
            Some(spec) => spec.resolved_actions(&self.template),
            None => self.template.clone(),
        }
    }
}

/// Root directories of every artifact the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub json_cache: PathBuf,
    pub hierarchies: PathBuf,
    pub data: PathBuf,
    pub sdmx_data: PathBuf,
    pub code_maps: PathBuf,
}

impl PathsConfig {
    /// All roots under a single base directory.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            json_cache: base.join("json"),
            hierarchies: base.join("jerarquias"),
            data: base.join("datos"),
            sdmx_data: base.join("sdmx"),
            code_maps: base.join("mapas"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub query_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            query_url: DEFAULT_QUERY_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Column alias of the temporal dimension.
    pub temporal_dimension: String,
    /// Node fields projected when a hierarchy is expanded.
    pub hierarchy_properties: Vec<HierarchyProperty>,
    /// Measures that carry an observation status instead of a value.
    pub status_measures: Vec<String>,
    /// Measures dropped before unpivoting.
    pub excluded_measures: Vec<String>,
    /// Dimension names whose codes go through a code map.
    pub mapped_dimensions: Vec<String>,
    /// Renames used by `rename_columns` when the action lists none.
    pub column_renames: BTreeMap<String, String>,
    /// Words dropped from long descriptions when generating identifiers.
    pub stopwords: Vec<String>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            temporal_dimension: "D_TEMPORAL_0".to_string(),
            hierarchy_properties: HierarchyProperty::ALL.to_vec(),
            status_measures: Vec::new(),
            excluded_measures: Vec::new(),
            mapped_dimensions: Vec::new(),
            column_renames: BTreeMap::new(),
            stopwords: ["A", "DE", "POR", "PARA", "EN"]
                .iter()
                .map(|word| (*word).to_string())
                .collect(),
        }
    }
}

impl ProcessingOptions {
    /// Whether a dimension has a code map. Both sides are compared without
    /// the `D_`/`_0` column affixes.
    pub fn is_mapped(&self, dimension: &str) -> bool {
        let dimension = strip_column_affixes(dimension);
        self.mapped_dimensions
            .iter()
            .any(|name| strip_column_affixes(name) == dimension)
    }

    /// Mapped dimensions under their stripped names, in configured order.
    pub fn mapped_dimension_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.mapped_dimensions.len());
        for name in &self.mapped_dimensions {
            let name = strip_column_affixes(name);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Ordered action lists for the three processing levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    pub hierarchy: Vec<HierarchyAction>,
    pub data: Vec<DataAction>,
    pub activity: Vec<ActivityAction>,
}

/// Per-activity replacement of template action lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlanOverride {
    pub hierarchy: Option<Vec<HierarchyAction>>,
    pub data: Option<Vec<DataAction>>,
    pub activity: Option<Vec<ActivityAction>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySpec {
    pub queries: Vec<QueryId>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub actions: ActionPlanOverride,
}

impl ActivitySpec {
    pub fn resolved_actions(&self, template: &ActionPlan) -> ActionPlan {
        ActionPlan {
            hierarchy: self
                .actions
                .hierarchy
                .clone()
                .unwrap_or_else(|| template.hierarchy.clone()),
            data: self
                .actions
                .data
                .clone()
                .unwrap_or_else(|| template.data.clone()),
            activity: self
                .actions
                .activity
                .clone()
                .unwrap_or_else(|| template.activity.clone()),
        }
    }
}
