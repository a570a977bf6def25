//! Interpreter for the configured hierarchy and data actions.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use badea_ingest::write_table;
use badea_model::columns::strip_column_affixes;
use badea_model::{DataAction, HierarchyAction};
use badea_transform::{QueryHierarchy, dangling_parents};

use crate::context::PipelineContext;
use crate::hierarchy::save_hierarchy;
use crate::query::Query;

pub fn apply_hierarchy_action(
    ctx: &PipelineContext,
    activity: &str,
    hierarchy: &QueryHierarchy,
    action: &HierarchyAction,
) -> Result<()> {
    let hierarchy_id = hierarchy.meta.hierarchy_id();
    debug!(hierarchy_id = %hierarchy_id, action = action.name(), "Applying hierarchy action");
    match action {
        HierarchyAction::Save => save_hierarchy(ctx, activity, hierarchy),
        HierarchyAction::ReportDanglingParents => {
            let dangling = dangling_parents(hierarchy.table.frame())?;
            if !dangling.is_empty() {
                warn!(
                    hierarchy_id = %hierarchy_id,
                    count = dangling.len(),
                    parents = ?dangling,
                    "Parent codes reference no row of the hierarchy"
                );
            }
            Ok(())
        }
    }
}

pub fn apply_data_action(
    ctx: &PipelineContext,
    activity: &str,
    query: &mut Query,
    action: &DataAction,
) -> Result<()> {
    debug!(query_id = %query.id, action = action.name(), "Applying data action");
    match action {
        DataAction::Save { class } => {
            let path = ctx.layout.observations(activity, class, &query.id);
            let mut frame = query.data().frame().clone();
            write_table(&mut frame, &path)?;
            info!(query_id = %query.id, class = %class, rows = frame.height(), "Saved observations");
        }
        DataAction::MapValues => map_values(ctx, query)?,
        DataAction::ExtendCodeMaps => extend_code_maps(ctx, query)?,
        DataAction::DropDuplicateRows => {
            let dropped = query.data_mut().drop_duplicate_rows()?;
            if dropped > 0 {
                info!(query_id = %query.id, dropped, "Dropped duplicate rows");
            }
        }
        DataAction::SumDuplicateRows => query.data_mut().sum_duplicate_rows()?,
        DataAction::StripColumnAffixes => query.data_mut().strip_column_affixes()?,
        DataAction::RenameColumns { columns } => {
            let renames = if columns.is_empty() {
                &ctx.processing().column_renames
            } else {
                columns
            };
            query.data_mut().rename_columns(renames)?;
        }
        DataAction::DeleteRows { rows } => {
            for filter in rows {
                let deleted = query
                    .data_mut()
                    .delete_rows_matching(&filter.column, &filter.value)
                    .with_context(|| format!("delete rows where {} = {}", filter.column, filter.value))?;
                debug!(column = %filter.column, value = %filter.value, deleted, "Deleted rows");
            }
        }
        DataAction::ReportDuplicates => {
            let duplicates = query.data().duplicate_row_count()?;
            if duplicates > 0 {
                warn!(query_id = %query.id, duplicates, "Observation rows repeat their dimensions");
            } else {
                info!(query_id = %query.id, "No duplicate observations");
            }
        }
    }
    Ok(())
}

/// Column of the table holding a mapped dimension, whether or not its
/// affixes have been stripped yet.
fn mapped_column(query: &Query, dimension: &str) -> Option<String> {
    query
        .columns()
        .into_iter()
        .find(|column| strip_column_affixes(column) == dimension)
}

fn map_values(ctx: &PipelineContext, query: &mut Query) -> Result<()> {
    for dimension in ctx.processing().mapped_dimension_names() {
        let Some(column) = mapped_column(query, &dimension) else {
            continue;
        };
        let Some(map) = ctx.code_maps.load(&dimension)? else {
            warn!(dimension = %dimension, "No code map found, values left unmapped");
            continue;
        };
        let unresolved = query.data_mut().map_values(&column, &map)?;
        if unresolved > 0 {
            warn!(
                query_id = %query.id,
                dimension = %dimension,
                unresolved,
                "Values without a code map target"
            );
        }
    }
    Ok(())
}

/// Append every observed value missing from a dimension's code map, fill
/// code and label from the dimension's hierarchy and give every entry
/// without a target a default one. Existing entries are completed too.
fn extend_code_maps(ctx: &PipelineContext, query: &Query) -> Result<()> {
    let options = ctx.processing();
    for dimension in options.mapped_dimension_names() {
        let Some(column) = mapped_column(query, &dimension) else {
            continue;
        };
        let observed = query.data().unique_values(&column)?;
        let mut map = ctx.code_maps.load_or_empty(&dimension)?;
        let new_terms = map.extend(observed.iter().map(String::as_str));
        if !new_terms.is_empty() {
            warn!(
                query_id = %query.id,
                dimension = %dimension,
                count = new_terms.len(),
                terms = ?new_terms,
                "New terms added to code map"
            );
        }

        let mut backfilled = 0;
        if let Some(hierarchy) = query.hierarchy(&dimension) {
            let attributes = hierarchy.table.attributes_by_id()?;
            backfilled = map.backfill(|source| attributes.get(source).cloned());
        }
        let targeted = map.fill_missing_targets(&options.stopwords);
        if new_terms.is_empty() && backfilled == 0 && targeted.is_empty() {
            continue;
        }
        let path = ctx.code_maps.save(&map)?;
        debug!(
            dimension = %dimension,
            backfilled,
            targeted = targeted.len(),
            path = %path.display(),
            "Code map updated"
        );
    }
    Ok(())
}
