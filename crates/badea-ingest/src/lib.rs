//! Data ingestion for the BADEA pipeline: the HTTP client for the query and
//! hierarchy endpoints, the on-disk response cache, delimited table I/O and
//! the artifact directory layout.

pub mod api;
pub mod cache;
pub mod error;
pub mod io;
pub mod layout;

pub use api::{BadeaApi, HttpApi};
pub use cache::{ResponseCache, Sourced};
pub use error::{IngestError, Result};
pub use io::{TABLE_SEPARATOR, read_json, read_table, write_json, write_table};
pub use layout::ArtifactLayout;
