use anyhow::{Context, Result, anyhow};
use polars::prelude::DataFrame;
use tracing::{error, info};

use badea_cli::load_config;
use badea_core::{PipelineContext, PublicationPlan, run_activity};
use badea_ingest::{HttpApi, read_json, write_json, write_table};
use badea_map::{DEFAULT_STOPWORDS, default_identifier};
use badea_model::{
    ActivityAction, ActivitySpec, DataAction, HierarchyProperty, HierarchyResponse, PipelineConfig,
};
use badea_transform::expand_hierarchy;

use crate::cli::{ConfigArgs, DefaultIdArgs, ExpandArgs, RunArgs};
use crate::types::{AbortedActivity, ActivityListing, RunOutcome};

pub fn run_activities(args: &RunArgs) -> Result<RunOutcome> {
    let config = load_config(&args.config.config)?;
    let selected = select_activities(&config, &args.activities)?;
    let api = HttpApi::new(&config.api).context("build API client")?;
    let ctx = PipelineContext::new(config, Box::new(api));

    let mut outcome = RunOutcome::default();
    for (name, spec) in &selected {
        match run_activity(&ctx, name, spec) {
            Ok(report) => outcome.reports.push(report),
            Err(err) => {
                let message = format!("{err:#}");
                error!(activity = %name, error = %message, "Activity aborted");
                outcome.aborted.push(AbortedActivity {
                    activity: name.clone(),
                    message,
                });
            }
        }
    }

    if let Some(path) = &args.plan {
        let plans: Vec<&PublicationPlan> = outcome
            .reports
            .iter()
            .filter_map(|report| report.publication.as_ref())
            .collect();
        write_json(&plans, path).context("write publication plans")?;
        info!(path = %path.display(), plans = plans.len(), "Wrote publication plans");
    }
    Ok(outcome)
}

/// Requested activities in the order given, or every configured one.
fn select_activities(
    config: &PipelineConfig,
    requested: &[String],
) -> Result<Vec<(String, ActivitySpec)>> {
    if requested.is_empty() {
        return Ok(config
            .activities
            .iter()
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect());
    }
    requested
        .iter()
        .map(|name| {
            config
                .activities
                .get(name)
                .map(|spec| (name.clone(), spec.clone()))
                .ok_or_else(|| anyhow!("unknown activity {name}"))
        })
        .collect()
}

/// Expand a saved hierarchy response. Writes the table when an output path
/// is given and returns it either way.
pub fn expand(args: &ExpandArgs) -> Result<DataFrame> {
    let response: HierarchyResponse = read_json(&args.input)?;
    let table = expand_hierarchy(response.roots(), &HierarchyProperty::ALL)
        .with_context(|| format!("expand {}", args.input.display()))?;
    let mut frame = table.frame().clone();
    if let Some(output) = &args.output {
        write_table(&mut frame, output)?;
        info!(rows = frame.height(), path = %output.display(), "Wrote hierarchy table");
    }
    Ok(frame)
}

pub fn default_ids(args: &DefaultIdArgs) -> Vec<(String, Option<String>)> {
    let stopwords: Vec<String> = if args.stopwords.is_empty() {
        DEFAULT_STOPWORDS
            .iter()
            .map(|word| (*word).to_string())
            .collect()
    } else {
        args.stopwords.iter().map(|word| word.to_uppercase()).collect()
    };
    args.descriptions
        .iter()
        .map(|description| {
            (
                description.clone(),
                default_identifier(Some(description), &stopwords),
            )
        })
        .collect()
}

pub fn list_activities(args: &ConfigArgs) -> Result<Vec<ActivityListing>> {
    let config = load_config(&args.config)?;
    Ok(config
        .activities
        .iter()
        .map(|(name, spec)| {
            let plan = spec.resolved_actions(&config.template);
            ActivityListing {
                name: name.clone(),
                category: spec.category.clone(),
                subcategory: spec.subcategory.clone(),
                queries: spec.queries.len(),
                data_actions: plan.data.iter().map(DataAction::name).collect(),
                activity_actions: plan.activity.iter().map(ActivityAction::name).collect(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
        [paths]
        json_cache = "json"
        hierarchies = "jerarquias"
        data = "datos"
        sdmx_data = "sdmx"
        code_maps = "mapas"

        [[template.data]]
        action = "strip_column_affixes"

        [[template.activity]]
        action = "build_configuration"

        [activities.PADRON]
        queries = [1, 2]
        category = "Demografía"

        [activities.EPA]
        queries = [3]
        category = "Mercado laboral"

        [[activities.EPA.actions.data]]
        action = "sum_duplicate_rows"
    "#;

    fn config_args(dir: &std::path::Path) -> ConfigArgs {
        let path = dir.join("badea.toml");
        fs::write(&path, CONFIG).unwrap();
        ConfigArgs { config: path }
    }

    #[test]
    fn activities_list_resolved_actions() {
        let dir = tempdir().unwrap();
        let listing = list_activities(&config_args(dir.path())).unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "EPA");
        assert_eq!(listing[0].data_actions, vec!["sum_duplicate_rows"]);
        assert_eq!(listing[0].activity_actions, vec!["build_configuration"]);
        assert_eq!(listing[1].name, "PADRON");
        assert_eq!(listing[1].queries, 2);
        assert_eq!(listing[1].data_actions, vec!["strip_column_affixes"]);
    }

    #[test]
    fn unknown_activity_is_rejected() {
        let dir = tempdir().unwrap();
        let config = load_config(&config_args(dir.path()).config).unwrap();

        let err = select_activities(&config, &["EMPLEO".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "unknown activity EMPLEO");

        let selected = select_activities(&config, &["PADRON".to_string()]).unwrap();
        assert_eq!(selected[0].0, "PADRON");
        assert_eq!(select_activities(&config, &[]).unwrap().len(), 2);
    }

    #[test]
    fn short_descriptions_keep_every_word() {
        let args = DefaultIdArgs {
            descriptions: vec!["Tasa de paro".to_string()],
            stopwords: Vec::new(),
        };
        let ids = default_ids(&args);
        assert_eq!(ids[0].1.as_deref(), Some("TASA_DE_PARO"));
    }

    #[test]
    fn expand_writes_the_table() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sexo.json");
        fs::write(
            &input,
            r#"{"data": {"id": "T", "cod": "0", "label": "Total", "des": "Total",
                "parentId": null, "order": 1, "isLastLevel": false, "children": [
                    {"id": "H", "cod": "1", "label": "Hombres", "des": "Hombres",
                     "parentId": "T", "order": 2, "isLastLevel": true, "children": []}
                ]}}"#,
        )
        .unwrap();
        let output = dir.path().join("out").join("sexo.csv");

        let frame = expand(&ExpandArgs {
            input,
            output: Some(output.clone()),
        })
        .unwrap();

        assert_eq!(frame.height(), 3);
        assert!(output.is_file());
    }
}
