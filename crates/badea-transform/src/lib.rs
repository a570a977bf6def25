//! Reshaping of BADEA query responses.
//!
//! - **hierarchy**: expansion of hierarchy trees into coded tables and their SDMX views
//! - **wide**: one row per API observation, one column per dimension and measure
//! - **long**: unpivot of measures into `INDICATOR`/`OBS_VALUE` plus the `FREQ` tag
//! - **observations**: operations on the long observation table
//! - **processor**: the query build pipeline tying the steps together

pub mod error;
pub mod hierarchy;
pub mod long;
pub mod observations;
pub mod processor;
pub mod wide;

pub use error::{Result, TransformError};
pub use hierarchy::{
    HierarchyTable, QueryHierarchy, dangling_parents, expand_hierarchy, indicator_codelist,
    merge_codelists,
};
pub use long::{insert_freq, unpivot_measures};
pub use observations::ObservationTable;
pub use processor::QueryProcessor;
pub use wide::{build_wide_table, format_temporal_code};
