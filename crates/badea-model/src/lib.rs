//! Data model shared across the BADEA extraction pipeline.
//!
//! Covers the JSON payloads returned by the BADEA API, the per-activity
//! configuration artifact, and the pipeline options read from TOML.

pub mod actions;
pub mod activity;
pub mod api;
pub mod columns;
pub mod error;
pub mod options;
pub mod periodicity;
pub mod query_id;

pub use actions::{ActivityAction, DataAction, HierarchyAction, RowFilter};
pub use activity::{ActivityConfiguration, QueryGroup, QueryGroups};
pub use api::{
    HierarchyMeta, HierarchyNode, HierarchyProperty, HierarchyResponse, HierarchyRoots, Measure,
    ObservationCell, QueryMetainfo, QueryResponse, scalar_to_string,
};
pub use error::{ModelError, Result};
pub use options::{
    ActionPlan, ActionPlanOverride, ActivitySpec, ApiConfig, PathsConfig, PipelineConfig,
    ProcessingOptions,
};
pub use periodicity::{Frequency, is_sub_annual};
pub use query_id::QueryId;
