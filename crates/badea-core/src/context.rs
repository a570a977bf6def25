//! Everything an activity run needs, built once from the configuration.

use badea_ingest::{ArtifactLayout, BadeaApi, ResponseCache};
use badea_map::CodeMapRepository;
use badea_model::{PipelineConfig, ProcessingOptions};
use badea_transform::QueryProcessor;

/// Shared, read-only context of a pipeline run.
///
/// The configuration is never mutated once the context is built; actions
/// receive it by reference.
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub layout: ArtifactLayout,
    pub cache: ResponseCache,
    pub code_maps: CodeMapRepository,
    pub processor: QueryProcessor,
    api: Box<dyn BadeaApi>,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, api: Box<dyn BadeaApi>) -> Self {
        let layout = ArtifactLayout::new(config.paths.clone());
        let cache = ResponseCache::new(layout.json_cache());
        let code_maps = CodeMapRepository::new(layout.code_maps());
        let processor = QueryProcessor::new(&config.processing);
        Self {
            config,
            layout,
            cache,
            code_maps,
            processor,
            api,
        }
    }

    pub fn api(&self) -> &dyn BadeaApi {
        self.api.as_ref()
    }

    pub fn processing(&self) -> &ProcessingOptions {
        &self.config.processing
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("paths", self.layout.paths())
            .field("processing", &self.config.processing)
            .finish_non_exhaustive()
    }
}
