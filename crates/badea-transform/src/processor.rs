use tracing::{debug, info};

use badea_model::{Frequency, ProcessingOptions, QueryResponse};

use crate::error::Result;
use crate::hierarchy::QueryHierarchy;
use crate::long::{insert_freq, unpivot_measures};
use crate::observations::ObservationTable;
use crate::wide::build_wide_table;

/// Builds the long observation table of a query response.
#[derive(Debug, Clone)]
pub struct QueryProcessor {
    temporal_dimension: String,
    status_measures: Vec<String>,
    excluded_measures: Vec<String>,
}

impl QueryProcessor {
    pub fn new(options: &ProcessingOptions) -> Self {
        Self {
            temporal_dimension: options.temporal_dimension.clone(),
            status_measures: options.status_measures.clone(),
            excluded_measures: options.excluded_measures.clone(),
        }
    }

    pub fn temporal_dimension(&self) -> &str {
        &self.temporal_dimension
    }

    /// Run the wide build, temporal rewrite, code resolution and unpivot of
    /// one response. The periodicity is checked before any reshaping.
    pub fn build(
        &self,
        response: &QueryResponse,
        hierarchies: &[QueryHierarchy],
    ) -> Result<ObservationTable> {
        let frequency = Frequency::from_periodicity(&response.metainfo.periodicity)?;

        let wide = build_wide_table(response, hierarchies, &self.temporal_dimension)?;
        let measures: Vec<String> = response
            .measures
            .iter()
            .map(|measure| measure.des.clone())
            .collect();
        let mut long = unpivot_measures(
            &wide,
            &measures,
            &self.status_measures,
            &self.excluded_measures,
        )?;
        insert_freq(&mut long, frequency)?;

        debug!(wide_rows = wide.height(), "Reshaped query response");
        info!(
            title = %response.metainfo.title,
            frequency = %frequency,
            rows = long.height(),
            "Built observation table"
        );
        Ok(ObservationTable::new(long))
    }
}
