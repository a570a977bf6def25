//! Where every artifact of a run lives on disk.

use std::path::{Path, PathBuf};

use badea_model::{PathsConfig, QueryId};

const ORIGINAL_DIR: &str = "original";
const SDMX_DIR: &str = "sdmx";
const EXTENDED_DIR: &str = "extension_disjuntos";
const CODELISTS_DIR: &str = "codelists";
const CONFIGURATION_FILE: &str = "configuracion.json";

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    paths: PathsConfig,
}

impl ArtifactLayout {
    pub fn new(paths: PathsConfig) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    pub fn code_maps(&self) -> &Path {
        &self.paths.code_maps
    }

    pub fn json_cache(&self) -> &Path {
        &self.paths.json_cache
    }

    /// `<hierarchies>/<activity>/original/<hierarchy_id>.csv`
    pub fn hierarchy_original(&self, activity: &str, hierarchy_id: &str) -> PathBuf {
        self.paths
            .hierarchies
            .join(activity)
            .join(ORIGINAL_DIR)
            .join(format!("{hierarchy_id}.csv"))
    }

    /// `<hierarchies>/sdmx/<hierarchy_id>.csv`, shared by all activities.
    pub fn hierarchy_sdmx(&self, hierarchy_id: &str) -> PathBuf {
        self.paths
            .hierarchies
            .join(SDMX_DIR)
            .join(format!("{hierarchy_id}.csv"))
    }

    /// `<data>/<activity>/<class>/<query_id>.csv`
    pub fn observations(&self, activity: &str, class: &str, query_id: &QueryId) -> PathBuf {
        self.paths
            .data
            .join(activity)
            .join(class)
            .join(format!("{query_id}.csv"))
    }

    pub fn activity_dir(&self, activity: &str) -> PathBuf {
        self.paths.sdmx_data.join(activity)
    }

    pub fn activity_configuration(&self, activity: &str) -> PathBuf {
        self.activity_dir(activity).join(CONFIGURATION_FILE)
    }

    pub fn merged_original(&self, activity: &str, group_id: &str) -> PathBuf {
        self.activity_dir(activity)
            .join(ORIGINAL_DIR)
            .join(format!("{group_id}.csv"))
    }

    pub fn merged_extended(&self, activity: &str, group_id: &str) -> PathBuf {
        self.activity_dir(activity)
            .join(EXTENDED_DIR)
            .join(format!("{group_id}.csv"))
    }

    pub fn codelist(&self, activity: &str, dimension: &str) -> PathBuf {
        self.activity_dir(activity)
            .join(CODELISTS_DIR)
            .join(format!("{dimension}.csv"))
    }
}
