//! Running the queries of an activity and its cross-query steps.

use anyhow::{Context, Result};
use tracing::{error, info, info_span};

use badea_model::{
    ActionPlan, ActivityAction, ActivityConfiguration, ActivitySpec, ModelError, QueryId,
};
use badea_transform::TransformError;

use crate::actions::{apply_data_action, apply_hierarchy_action};
use crate::aggregator::{
    ConsistencyWarning, MergedGroup, build_configuration, check_consistency, export_codelists,
    extend_with_disjoint, merge_groups, write_configuration,
};
use crate::context::PipelineContext;
use crate::hierarchy::load_hierarchy;
use crate::publication::PublicationPlan;
use crate::query::{Query, QueryStage};

#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub id: QueryId,
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub stage: QueryStage,
    /// Whether the response came from the local cache.
    pub cached: bool,
    pub hierarchies_fetched: usize,
}

#[derive(Debug, Clone)]
pub struct QueryFailure {
    pub id: QueryId,
    pub message: String,
}

/// Outcome of an activity run.
#[derive(Debug, Clone)]
pub struct ActivityReport {
    pub activity: String,
    pub queries: Vec<QuerySummary>,
    pub failures: Vec<QueryFailure>,
    pub configuration: Option<ActivityConfiguration>,
    pub consistency: Vec<ConsistencyWarning>,
    pub merged: Vec<MergedGroup>,
    pub codelists: Vec<String>,
    pub publication: Option<PublicationPlan>,
}

impl ActivityReport {
    fn new(activity: &str) -> Self {
        Self {
            activity: activity.to_string(),
            queries: Vec::new(),
            failures: Vec::new(),
            configuration: None,
            consistency: Vec::new(),
            merged: Vec::new(),
            codelists: Vec::new(),
            publication: None,
        }
    }
}

/// Whether an error comes from a lookup the whole activity depends on.
pub fn is_config_lookup(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<TransformError>(),
            Some(TransformError::Model(ModelError::UnknownPeriodicity { .. }))
        ) || matches!(
            cause.downcast_ref::<ModelError>(),
            Some(ModelError::UnknownPeriodicity { .. })
        )
    })
}

/// Process every query of an activity, then run its activity actions.
///
/// A failing query is recorded and skipped; its siblings still run. An
/// unknown periodicity stops the activity.
pub fn run_activity(ctx: &PipelineContext, activity: &str, spec: &ActivitySpec) -> Result<ActivityReport> {
    let span = info_span!("activity", activity = %activity);
    let _guard = span.enter();

    let plan = spec.resolved_actions(&ctx.config.template);
    let mut report = ActivityReport::new(activity);
    let mut queries = Vec::with_capacity(spec.queries.len());

    for id in &spec.queries {
        match process_query(ctx, activity, id, &plan) {
            Ok((query, summary)) => {
                queries.push(query);
                report.queries.push(summary);
            }
            Err(err) if is_config_lookup(&err) => {
                return Err(err.context(format!("activity {activity} stopped")));
            }
            Err(err) => {
                error!(query_id = %id, error = %format!("{err:#}"), "Query failed");
                report.failures.push(QueryFailure {
                    id: id.clone(),
                    message: format!("{err:#}"),
                });
            }
        }
    }

    let mut configuration: Option<ActivityConfiguration> = None;
    for action in &plan.activity {
        info!(action = action.name(), "Running activity action");
        match action {
            ActivityAction::BuildConfiguration => {
                let built = build_configuration(activity, &spec.category, &queries);
                report.consistency = check_consistency(&built, &queries);
                write_configuration(ctx, activity, &built)?;
                configuration = Some(built);
            }
            ActivityAction::ExtendWithDisjoint => {
                let current = configuration
                    .get_or_insert_with(|| build_configuration(activity, &spec.category, &queries));
                extend_with_disjoint(&mut queries, &current.variables)?;
            }
            ActivityAction::MergeGroups => {
                let current = configuration
                    .get_or_insert_with(|| build_configuration(activity, &spec.category, &queries));
                report.merged = merge_groups(ctx, activity, current, &queries)?;
            }
            ActivityAction::ExportCodelists => {
                report.codelists = export_codelists(ctx, activity, &queries)?;
            }
        }
    }

    for (summary, query) in report.queries.iter_mut().zip(&queries) {
        summary.stage = query.stage();
    }
    report.publication = configuration.as_ref().map(|configuration| {
        PublicationPlan::new(
            activity,
            spec,
            configuration,
            &ctx.layout,
            ctx.processor.temporal_dimension(),
        )
    });
    report.configuration = configuration;

    info!(
        succeeded = report.queries.len(),
        failed = report.failures.len(),
        "Activity finished"
    );
    Ok(report)
}

fn process_query(
    ctx: &PipelineContext,
    activity: &str,
    id: &QueryId,
    plan: &ActionPlan,
) -> Result<(Query, QuerySummary)> {
    let span = info_span!("query", query_id = %id);
    let _guard = span.enter();

    let response = ctx
        .cache
        .query(activity, id, ctx.api())
        .with_context(|| format!("load query {id}"))?;
    let cached = response.is_hit();
    let response = response.into_inner();

    let mut hierarchies = Vec::with_capacity(response.hierarchies.len());
    let mut hierarchies_fetched = 0;
    for meta in &response.hierarchies {
        let loaded = load_hierarchy(ctx, activity, meta)
            .with_context(|| format!("load hierarchy {}", meta.hierarchy_id()))?;
        if !loaded.is_hit() {
            hierarchies_fetched += 1;
        }
        let hierarchy = loaded.into_inner();
        for action in &plan.hierarchy {
            apply_hierarchy_action(ctx, activity, &hierarchy, action)
                .with_context(|| format!("{} on {}", action.name(), meta.hierarchy_id()))?;
        }
        hierarchies.push(hierarchy);
    }

    let table = ctx
        .processor
        .build(&response, &hierarchies)
        .with_context(|| format!("build observations of query {id}"))?;
    let mut query = Query::new(
        id.clone(),
        response.metainfo,
        hierarchies,
        response.measures,
        table,
    );

    for action in &plan.data {
        apply_data_action(ctx, activity, &mut query, action)
            .with_context(|| format!("{} on query {id}", action.name()))?;
    }

    let summary = QuerySummary {
        id: id.clone(),
        title: query.title().to_string(),
        rows: query.data().height(),
        columns: query.columns().len(),
        stage: query.stage(),
        cached,
        hierarchies_fetched,
    };
    info!(rows = summary.rows, cached, "Query processed");
    Ok((query, summary))
}
