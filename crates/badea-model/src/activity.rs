//! Activity configuration artifact (`configuracion.json`).

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::columns::{FREQ, INDICATOR, OBS_STATUS, OBS_VALUE, TIME_PERIOD, strip_column_affixes};
use crate::query_id::QueryId;

/// Document describing how the queries of an activity are grouped and which
/// variables they span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityConfiguration {
    #[serde(rename = "NOMBRE_DSD")]
    pub dsd_name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "grupos_consultas")]
    pub groups: QueryGroups,
    pub variables: Vec<String>,
}

impl ActivityConfiguration {
    pub fn new(activity: &str, category: &str) -> Self {
        Self {
            dsd_name: format!("DSD_{activity}"),
            category: category.to_string(),
            groups: QueryGroups::default(),
            variables: Vec::new(),
        }
    }

    /// Record a query under its title and fold its columns into the
    /// activity-wide variables, keeping first-seen order.
    pub fn record_query<'a>(
        &mut self,
        title: &str,
        query_id: &QueryId,
        columns: impl IntoIterator<Item = &'a str>,
    ) {
        self.groups.add(title, query_id.clone());
        for column in columns {
            if !self.variables.iter().any(|known| known == column) {
                self.variables.push(column.to_string());
            }
        }
    }

    /// Variables that become dimensions of the published structure.
    pub fn dimension_variables(&self, temporal_dimension: &str) -> Vec<String> {
        let temporal_stripped = strip_column_affixes(temporal_dimension);
        self.variables
            .iter()
            .filter(|name| {
                ![INDICATOR, OBS_VALUE, OBS_STATUS, FREQ].contains(&name.as_str())
                    && name.as_str() != temporal_dimension
                    && **name != temporal_stripped
            })
            .cloned()
            .collect()
    }

    /// Column renames applied when a cube is published: the temporal
    /// dimension becomes `TIME_PERIOD`, every other variable keeps its name.
    pub fn cube_column_mapping(&self, temporal_dimension: &str) -> Vec<(String, String)> {
        let temporal_stripped = strip_column_affixes(temporal_dimension);
        self.variables
            .iter()
            .map(|name| {
                let target = if name == temporal_dimension || *name == temporal_stripped {
                    TIME_PERIOD.to_string()
                } else {
                    name.clone()
                };
                (name.clone(), target)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryGroup {
    pub id: String,
    #[serde(rename = "consultas")]
    pub queries: Vec<QueryId>,
}

/// Groups keyed by query title, in the order titles were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryGroups {
    entries: Vec<(String, QueryGroup)>,
}

impl QueryGroups {
    /// Append a query to the group for `title`, seeding the group with the
    /// next sequential id when the title is new.
    pub fn add(&mut self, title: &str, query_id: QueryId) -> &QueryGroup {
        let index = match self.entries.iter().position(|(known, _)| known == title) {
            Some(index) => index,
            None => {
                let group = QueryGroup {
                    id: (self.entries.len() + 1).to_string(),
                    queries: Vec::new(),
                };
                self.entries.push((title.to_string(), group));
                self.entries.len() - 1
            }
        };
        let group = &mut self.entries[index].1;
        if !group.queries.contains(&query_id) {
            group.queries.push(query_id);
        }
        &self.entries[index].1
    }

    pub fn get(&self, title: &str) -> Option<&QueryGroup> {
        self.entries
            .iter()
            .find(|(known, _)| known == title)
            .map(|(_, group)| group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryGroup)> {
        self.entries
            .iter()
            .map(|(title, group)| (title.as_str(), group))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for QueryGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (title, group) in &self.entries {
            map.serialize_entry(title, group)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QueryGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = QueryGroups;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of query titles to groups")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<QueryGroups, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((title, group)) = access.next_entry::<String, QueryGroup>()? {
                    entries.push((title, group));
                }
                Ok(QueryGroups { entries })
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}
