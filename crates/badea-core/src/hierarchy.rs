//! Loading and persisting the hierarchies of a query.

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use badea_ingest::{Sourced, read_table, write_table};
use badea_model::{HierarchyMeta, HierarchyResponse};
use badea_transform::{HierarchyTable, QueryHierarchy, expand_hierarchy};

use crate::context::PipelineContext;

/// Hierarchy of a query dimension, read from its persisted original table
/// or fetched and expanded when no table exists yet.
pub fn load_hierarchy(
    ctx: &PipelineContext,
    activity: &str,
    meta: &HierarchyMeta,
) -> Result<Sourced<QueryHierarchy>> {
    let hierarchy_id = meta.hierarchy_id();
    let path = ctx.layout.hierarchy_original(activity, &hierarchy_id);
    if path.is_file() {
        let frame = read_table(&path)
            .with_context(|| format!("read hierarchy table {}", path.display()))?;
        let table = HierarchyTable::from_frame(frame)
            .with_context(|| format!("hierarchy table {}", path.display()))?;
        debug!(hierarchy_id = %hierarchy_id, rows = table.height(), "Hierarchy read from cache");
        return Ok(Sourced::Hit(QueryHierarchy {
            meta: meta.clone(),
            table,
        }));
    }

    info!(hierarchy_id = %hierarchy_id, url = %meta.url, "Hierarchy not cached, requesting from API");
    let raw = ctx
        .api()
        .hierarchy(&meta.url)
        .with_context(|| format!("fetch hierarchy {hierarchy_id}"))?;
    let response: HierarchyResponse = serde_json::from_value(raw)
        .with_context(|| format!("decode hierarchy {hierarchy_id}"))?;
    let table = expand_hierarchy(response.roots(), &ctx.processing().hierarchy_properties)
        .with_context(|| format!("expand hierarchy {hierarchy_id}"))?;

    let mut frame = table.frame().clone();
    write_table(&mut frame, &path)?;
    Ok(Sourced::Fetched(QueryHierarchy {
        meta: meta.clone(),
        table,
    }))
}

/// SDMX view of a hierarchy. Mapped dimensions go through their code map;
/// a mapped dimension without a map file is published unmapped.
pub fn sdmx_table(ctx: &PipelineContext, hierarchy: &QueryHierarchy) -> Result<DataFrame> {
    let dimension = hierarchy.meta.dimension_name();
    let map = if ctx.processing().is_mapped(&dimension) {
        let map = ctx.code_maps.load(&dimension)?;
        if map.is_none() {
            warn!(dimension = %dimension, "No code map for mapped dimension, publishing raw ids");
        }
        map
    } else {
        None
    };
    Ok(hierarchy.table.sdmx_view(map.as_ref())?)
}

/// Write the original and SDMX tables of a hierarchy.
pub fn save_hierarchy(
    ctx: &PipelineContext,
    activity: &str,
    hierarchy: &QueryHierarchy,
) -> Result<()> {
    let hierarchy_id = hierarchy.meta.hierarchy_id();

    let mut original = hierarchy.table.frame().clone();
    write_table(&mut original, &ctx.layout.hierarchy_original(activity, &hierarchy_id))?;

    let mut sdmx = sdmx_table(ctx, hierarchy)
        .with_context(|| format!("build SDMX table for {hierarchy_id}"))?;
    write_table(&mut sdmx, &ctx.layout.hierarchy_sdmx(&hierarchy_id))?;
    debug!(hierarchy_id = %hierarchy_id, rows = sdmx.height(), "Saved hierarchy tables");
    Ok(())
}
