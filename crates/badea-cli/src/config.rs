//! Loading the pipeline configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use badea_model::{PathsConfig, PipelineConfig};

/// Read a TOML pipeline configuration. Relative artifact paths are taken
/// from the directory holding the file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read configuration {}", path.display()))?;
    let mut config: PipelineConfig =
        toml::from_str(&text).with_context(|| format!("parse configuration {}", path.display()))?;
    if let Some(base) = path.parent() {
        config.paths = resolve_paths(&config.paths, base);
    }
    validate(&config)?;
    debug!(
        path = %path.display(),
        activities = config.activities.len(),
        "Loaded configuration"
    );
    Ok(config)
}

fn resolve_paths(paths: &PathsConfig, base: &Path) -> PathsConfig {
    let resolve = |path: &PathBuf| {
        if path.is_relative() {
            base.join(path)
        } else {
            path.clone()
        }
    };
    PathsConfig {
        json_cache: resolve(&paths.json_cache),
        hierarchies: resolve(&paths.hierarchies),
        data: resolve(&paths.data),
        sdmx_data: resolve(&paths.sdmx_data),
        code_maps: resolve(&paths.code_maps),
    }
}

fn validate(config: &PipelineConfig) -> Result<()> {
    if config.processing.temporal_dimension.trim().is_empty() {
        bail!("processing.temporal_dimension must not be empty");
    }
    if config.processing.hierarchy_properties.is_empty() {
        bail!("processing.hierarchy_properties must list at least one property");
    }
    for (name, spec) in &config.activities {
        if spec.queries.is_empty() {
            bail!("activity {name} has no queries");
        }
    }
    Ok(())
}
