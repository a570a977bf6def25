//! Orchestration of BADEA activities.
//!
//! A [`PipelineContext`] is built once from the configuration. Each activity
//! runs its queries through the configured hierarchy and data actions, then
//! its activity actions group the queries, extend them to one schema and
//! write the merged artifacts.

pub mod actions;
pub mod activity;
pub mod aggregator;
pub mod context;
pub mod hierarchy;
pub mod publication;
pub mod query;

pub use actions::{apply_data_action, apply_hierarchy_action};
pub use activity::{ActivityReport, QueryFailure, QuerySummary, is_config_lookup, run_activity};
pub use aggregator::{
    ConsistencyWarning, MergedGroup, build_configuration, check_consistency, export_codelists,
    extend_with_disjoint, merge_groups, write_configuration,
};
pub use context::PipelineContext;
pub use hierarchy::{load_hierarchy, save_hierarchy, sdmx_table};
pub use publication::{PublicationPlan, PublishedCube};
pub use query::{Query, QueryStage};
