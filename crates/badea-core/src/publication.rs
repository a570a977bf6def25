//! What the downstream repository client receives for an activity.

use std::path::PathBuf;

use serde::Serialize;

use badea_ingest::ArtifactLayout;
use badea_model::columns::{INDICATOR, strip_column_affixes};
use badea_model::{ActivityConfiguration, ActivitySpec};

/// One data cube: the extended table of a query group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedCube {
    pub title: String,
    pub group_id: String,
    pub path: PathBuf,
}

/// Structure, code lists and cubes of an activity, ready to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationPlan {
    pub activity: String,
    pub dsd_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    /// Dimensions of the data structure, without the indicator, value,
    /// status, frequency and temporal columns.
    pub dimensions: Vec<String>,
    /// Renames applied to cube columns (`temporal -> TIME_PERIOD`).
    pub cube_columns: Vec<(String, String)>,
    pub codelists: Vec<(String, PathBuf)>,
    pub cubes: Vec<PublishedCube>,
}

impl PublicationPlan {
    pub fn new(
        activity: &str,
        spec: &ActivitySpec,
        configuration: &ActivityConfiguration,
        layout: &ArtifactLayout,
        temporal_dimension: &str,
    ) -> Self {
        let dimensions = configuration.dimension_variables(temporal_dimension);
        let mut codelists: Vec<(String, PathBuf)> = dimensions
            .iter()
            .map(|dimension| {
                let file = strip_column_affixes(dimension);
                (dimension.clone(), layout.codelist(activity, &file))
            })
            .collect();
        if configuration.variables.iter().any(|name| name == INDICATOR) {
            codelists.push((INDICATOR.to_string(), layout.codelist(activity, INDICATOR)));
        }
        let cubes = configuration
            .groups
            .iter()
            .map(|(title, group)| PublishedCube {
                title: title.to_string(),
                group_id: group.id.clone(),
                path: layout.merged_extended(activity, &group.id),
            })
            .collect();

        Self {
            activity: activity.to_string(),
            dsd_name: configuration.dsd_name.clone(),
            category: configuration.category.clone(),
            subcategory: spec.subcategory.clone(),
            dimensions,
            cube_columns: configuration.cube_column_mapping(temporal_dimension),
            codelists,
            cubes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badea_model::{PathsConfig, QueryId};

    #[test]
    fn plan_excludes_measure_columns_from_dimensions() {
        let mut configuration = ActivityConfiguration::new("EMPLEO", "Mercado laboral");
        configuration.record_query(
            "Paro registrado",
            &QueryId::new("1").unwrap(),
            ["TEMPORAL", "SEXO", "INDICATOR", "OBS_VALUE", "FREQ"],
        );
        let spec = ActivitySpec {
            queries: vec![QueryId::new("1").unwrap()],
            category: "Mercado laboral".to_string(),
            subcategory: Some("Paro".to_string()),
            actions: Default::default(),
        };
        let layout = ArtifactLayout::new(PathsConfig::under("/work"));

        let plan = PublicationPlan::new("EMPLEO", &spec, &configuration, &layout, "D_TEMPORAL_0");

        assert_eq!(plan.dsd_name, "DSD_EMPLEO");
        assert_eq!(plan.dimensions, vec!["SEXO"]);
        assert_eq!(
            plan.cube_columns[0],
            ("TEMPORAL".to_string(), "TIME_PERIOD".to_string())
        );
        let codelists: Vec<&str> = plan.codelists.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(codelists, vec!["SEXO", "INDICATOR"]);
        assert_eq!(plan.cubes.len(), 1);
        assert_eq!(
            plan.cubes[0].path,
            PathBuf::from("/work/sdmx/EMPLEO/extension_disjuntos/1.csv")
        );
    }
}
