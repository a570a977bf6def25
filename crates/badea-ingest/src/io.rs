//! Reading and writing of persisted tables and JSON documents.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{IngestError, Result};

/// Field separator of every persisted hierarchy and observation table.
pub const TABLE_SEPARATOR: u8 = b';';

/// Read a `;`-separated table with a header row. Every column is read as
/// string; empty cells are null.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let parse_error = |err: PolarsError| IngestError::TableParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(TABLE_SEPARATOR))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)
}

/// Write a frame as a `;`-separated table, creating parent directories.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut file = File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(TABLE_SEPARATOR)
        .finish(df)
        .map_err(|err| IngestError::TableWrite {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| IngestError::CorruptCache {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a pretty-printed JSON document, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|source| IngestError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| IngestError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
