//! Code maps: append-only tables from a dimension's source codes to stable
//! target identifiers, persisted one file per dimension.

pub mod codemap;
pub mod error;
pub mod identifier;
pub mod repository;

pub use codemap::{CodeMap, CodeMapEntry};
pub use error::{MapError, Result};
pub use identifier::{DEFAULT_STOPWORDS, default_identifier};
pub use repository::CodeMapRepository;
