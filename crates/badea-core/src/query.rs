//! A processed query and where it stands in its lifecycle.

use anyhow::Result;

use badea_model::columns::strip_column_affixes;
use badea_model::{Measure, QueryId, QueryMetainfo};
use badea_transform::{ObservationTable, QueryHierarchy};

/// Lifecycle of a query's observation table once it has been built.
///
/// The raw, wide and code-resolved states only exist inside
/// [`QueryProcessor::build`](badea_transform::QueryProcessor::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    /// Freshly unpivoted, `FREQ` attached.
    Long,
    /// At least one data action changed the table.
    Refined,
    /// An extended table against the activity variables is available.
    Extended,
}

impl std::fmt::Display for QueryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QueryStage::Long => "long",
            QueryStage::Refined => "refined",
            QueryStage::Extended => "extended",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    pub id: QueryId,
    pub metainfo: QueryMetainfo,
    pub hierarchies: Vec<QueryHierarchy>,
    pub measures: Vec<Measure>,
    data: ObservationTable,
    extended: Option<ObservationTable>,
    stage: QueryStage,
}

impl Query {
    pub fn new(
        id: QueryId,
        metainfo: QueryMetainfo,
        hierarchies: Vec<QueryHierarchy>,
        measures: Vec<Measure>,
        data: ObservationTable,
    ) -> Self {
        Self {
            id,
            metainfo,
            hierarchies,
            measures,
            data,
            extended: None,
            stage: QueryStage::Long,
        }
    }

    pub fn title(&self) -> &str {
        &self.metainfo.title
    }

    pub fn stage(&self) -> QueryStage {
        self.stage
    }

    pub fn data(&self) -> &ObservationTable {
        &self.data
    }

    /// Mutable access to the observation table. Any extended table computed
    /// from the previous contents is discarded.
    pub fn data_mut(&mut self) -> &mut ObservationTable {
        self.extended = None;
        self.stage = QueryStage::Refined;
        &mut self.data
    }

    pub fn extended(&self) -> Option<&ObservationTable> {
        self.extended.as_ref()
    }

    /// Compute the extended table against the activity-wide variables,
    /// replacing any earlier one.
    pub fn extend(&mut self, variables: &[String]) -> Result<&ObservationTable> {
        let extended = self.data.extended_with_disjoint(variables)?;
        self.stage = QueryStage::Extended;
        Ok(&*self.extended.insert(extended))
    }

    pub fn columns(&self) -> Vec<String> {
        self.data.column_names()
    }

    /// The hierarchy of a dimension, by column alias with or without the
    /// `D_`/`_0` affixes.
    pub fn hierarchy(&self, dimension: &str) -> Option<&QueryHierarchy> {
        let dimension = strip_column_affixes(dimension);
        self.hierarchies
            .iter()
            .find(|hierarchy| hierarchy.meta.dimension_name() == dimension)
    }
}
