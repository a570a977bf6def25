//! Cross-query steps of an activity: grouping by title, disjoint extension,
//! merged group tables and code lists.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{info, warn};

use badea_common::concat_aligned;
use badea_ingest::{write_json, write_table};
use badea_model::ActivityConfiguration;
use badea_model::columns::{INDICATOR, strip_column_affixes};
use badea_transform::{dangling_parents, indicator_codelist, merge_codelists};

use crate::context::PipelineContext;
use crate::hierarchy::sdmx_table;
use crate::query::Query;

/// A group whose members do not share one column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub title: String,
    pub query_id: String,
    pub columns: BTreeSet<String>,
    pub union: BTreeSet<String>,
}

/// Group queries by title and collect the activity-wide variables.
pub fn build_configuration(activity: &str, category: &str, queries: &[Query]) -> ActivityConfiguration {
    let mut configuration = ActivityConfiguration::new(activity, category);
    for query in queries {
        let columns = query.columns();
        configuration.record_query(query.title(), &query.id, columns.iter().map(String::as_str));
    }
    configuration
}

/// Members of each group whose column set differs from the group's union.
pub fn check_consistency(
    configuration: &ActivityConfiguration,
    queries: &[Query],
) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();
    for (title, group) in configuration.groups.iter() {
        let members: Vec<&Query> = queries
            .iter()
            .filter(|query| group.queries.contains(&query.id))
            .collect();
        let column_sets: Vec<BTreeSet<String>> = members
            .iter()
            .map(|query| query.columns().into_iter().collect())
            .collect();
        let union: BTreeSet<String> = column_sets.iter().flatten().cloned().collect();

        for (query, columns) in members.iter().zip(column_sets) {
            if columns != union {
                warn!(
                    group = %title,
                    query_id = %query.id,
                    columns = ?columns,
                    union = ?union,
                    "Query columns differ from its group"
                );
                warnings.push(ConsistencyWarning {
                    title: title.to_string(),
                    query_id: query.id.to_string(),
                    columns,
                    union: union.clone(),
                });
            }
        }
    }
    warnings
}

pub fn write_configuration(
    ctx: &PipelineContext,
    activity: &str,
    configuration: &ActivityConfiguration,
) -> Result<()> {
    let path = ctx.layout.activity_configuration(activity);
    write_json(configuration, &path)?;
    info!(activity, groups = configuration.groups.len(), path = %path.display(), "Wrote activity configuration");
    Ok(())
}

/// Extend every query against the activity-wide variables.
pub fn extend_with_disjoint(queries: &mut [Query], variables: &[String]) -> Result<()> {
    for query in queries.iter_mut() {
        let id = query.id.clone();
        query
            .extend(variables)
            .with_context(|| format!("extend query {id}"))?;
    }
    Ok(())
}

/// Files written for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedGroup {
    pub group_id: String,
    pub original_rows: usize,
    pub extended_rows: Option<usize>,
}

/// Concatenate the tables of each group's members into the original and
/// extended group tables. Members without an extended table are left out
/// of the extended one.
pub fn merge_groups(
    ctx: &PipelineContext,
    activity: &str,
    configuration: &ActivityConfiguration,
    queries: &[Query],
) -> Result<Vec<MergedGroup>> {
    let mut merged = Vec::with_capacity(configuration.groups.len());
    for (title, group) in configuration.groups.iter() {
        let members: Vec<&Query> = queries
            .iter()
            .filter(|query| group.queries.contains(&query.id))
            .collect();
        if members.is_empty() {
            continue;
        }

        let frames: Vec<DataFrame> = members.iter().map(|query| query.data().frame().clone()).collect();
        let mut original = concat_aligned(&frames)?;
        write_table(&mut original, &ctx.layout.merged_original(activity, &group.id))?;

        let extended_frames: Vec<DataFrame> = members
            .iter()
            .filter_map(|query| query.extended().map(|table| table.frame().clone()))
            .collect();
        if extended_frames.len() < members.len() {
            warn!(
                group = %title,
                missing = members.len() - extended_frames.len(),
                "Group members without an extended table"
            );
        }
        let extended_rows = if extended_frames.is_empty() {
            None
        } else {
            let mut extended = concat_aligned(&extended_frames)?;
            write_table(&mut extended, &ctx.layout.merged_extended(activity, &group.id))?;
            Some(extended.height())
        };

        info!(group = %title, group_id = %group.id, members = members.len(), "Merged group");
        merged.push(MergedGroup {
            group_id: group.id.clone(),
            original_rows: original.height(),
            extended_rows,
        });
    }
    Ok(merged)
}

/// Write one merged code list per dimension, plus the `INDICATOR` list
/// when its code map exists. Returns the dimensions written.
pub fn export_codelists(ctx: &PipelineContext, activity: &str, queries: &[Query]) -> Result<Vec<String>> {
    let temporal = ctx.processor.temporal_dimension();
    let mut aliases: Vec<&str> = Vec::new();
    for query in queries {
        for hierarchy in &query.hierarchies {
            let alias = hierarchy.meta.alias.as_str();
            if alias != temporal && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
    }

    let mut written = Vec::new();
    for alias in aliases {
        let mut tables = Vec::new();
        for query in queries {
            if let Some(hierarchy) = query.hierarchy(alias) {
                tables.push(sdmx_table(ctx, hierarchy)?);
            }
        }
        let mut codelist = merge_codelists(&tables)?;
        let dangling = dangling_parents(&codelist)?;
        if !dangling.is_empty() {
            warn!(dimension = %alias, parents = ?dangling, "Code list parents reference no id");
        }
        let dimension = strip_column_affixes(alias);
        write_table(&mut codelist, &ctx.layout.codelist(activity, &dimension))?;
        written.push(dimension);
    }

    if let Some(map) = ctx.code_maps.load(INDICATOR)? {
        let mut codelist = indicator_codelist(&map)?;
        write_table(&mut codelist, &ctx.layout.codelist(activity, INDICATOR))?;
        written.push(INDICATOR.to_string());
    }
    info!(activity, codelists = written.len(), "Exported code lists");
    Ok(written)
}
