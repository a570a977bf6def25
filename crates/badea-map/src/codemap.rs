use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::identifier::default_identifier;

/// One row of a code map file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapEntry {
    #[serde(rename = "SOURCE")]
    pub source: String,
    #[serde(rename = "COD", default)]
    pub cod: Option<String>,
    #[serde(rename = "NAME", default)]
    pub name: Option<String>,
    #[serde(rename = "TARGET", default)]
    pub target: Option<String>,
}

impl CodeMapEntry {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Target identifier, treating an empty cell as missing.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|target| !target.is_empty())
    }
}

/// Append-only mapping of one dimension's source codes to target identifiers.
///
/// Rows are never removed or reordered. A source appears at most once; when
/// duplicates are loaded the first row wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMap {
    dimension: String,
    entries: Vec<CodeMapEntry>,
    index: HashMap<String, usize>,
}

impl CodeMap {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_entries(
        dimension: impl Into<String>,
        entries: impl IntoIterator<Item = CodeMapEntry>,
    ) -> Self {
        let mut map = Self::new(dimension);
        map.append(entries);
        map
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn entries(&self) -> &[CodeMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.index.contains_key(source)
    }

    pub fn get(&self, source: &str) -> Option<&CodeMapEntry> {
        self.index.get(source).map(|&position| &self.entries[position])
    }

    /// Target identifier for a source code, if one is known.
    pub fn resolve(&self, source: &str) -> Option<&str> {
        self.get(source).and_then(CodeMapEntry::target)
    }

    /// Append entries whose source is not yet present. Returns how many were added.
    pub fn append(&mut self, entries: impl IntoIterator<Item = CodeMapEntry>) -> usize {
        let mut added = 0;
        for entry in entries {
            if self.index.contains_key(&entry.source) {
                continue;
            }
            self.index.insert(entry.source.clone(), self.entries.len());
            self.entries.push(entry);
            added += 1;
        }
        added
    }

    /// Append a bare entry for every observed code not yet in the map, in
    /// first-seen order. Returns the codes that were new.
    pub fn extend<'a>(&mut self, observed: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut new_terms = Vec::new();
        for source in observed {
            if self.append([CodeMapEntry::new(source)]) > 0 {
                new_terms.push(source.to_string());
            }
        }
        new_terms
    }

    /// Fill missing `COD`/`NAME` cells from a lookup keyed by source code.
    /// Returns the number of entries that changed.
    pub fn backfill<F>(&mut self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<(Option<String>, Option<String>)>,
    {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.cod.is_some() && entry.name.is_some() {
                continue;
            }
            let Some((cod, name)) = lookup(&entry.source) else {
                continue;
            };
            let mut touched = false;
            if entry.cod.is_none() && cod.is_some() {
                entry.cod = cod;
                touched = true;
            }
            if entry.name.is_none() && name.is_some() {
                entry.name = name;
                touched = true;
            }
            if touched {
                changed += 1;
            }
        }
        changed
    }

    /// Give every entry without a target a default identifier derived from
    /// its source code. Returns the sources that were filled.
    pub fn fill_missing_targets(&mut self, stopwords: &[String]) -> Vec<String> {
        let mut filled = Vec::new();
        for entry in &mut self.entries {
            if entry.target().is_some() {
                continue;
            }
            entry.target = default_identifier(Some(&entry.source), stopwords);
            filled.push(entry.source.clone());
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::DEFAULT_STOPWORDS;

    fn stopwords() -> Vec<String> {
        DEFAULT_STOPWORDS.iter().map(|word| (*word).to_string()).collect()
    }

    #[test]
    fn first_row_wins_on_duplicate_sources() {
        let map = CodeMap::from_entries(
            "D_SEXO_0",
            [
                CodeMapEntry::new("1").with_target("H"),
                CodeMapEntry::new("1").with_target("X"),
                CodeMapEntry::new("2").with_target("M"),
            ],
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("1"), Some("H"));
        assert_eq!(map.resolve("2"), Some("M"));
        assert_eq!(map.resolve("3"), None);
    }

    #[test]
    fn empty_target_does_not_resolve() {
        let map = CodeMap::from_entries("X", [CodeMapEntry::new("1").with_target("")]);
        assert!(map.contains("1"));
        assert_eq!(map.resolve("1"), None);
    }

    #[test]
    fn extend_appends_only_new_terms_in_order() {
        let mut map = CodeMap::from_entries("X", [CodeMapEntry::new("b").with_target("B")]);
        let new_terms = map.extend(["c", "b", "a", "c"]);

        assert_eq!(new_terms, vec!["c", "a"]);
        let sources: Vec<&str> = map.entries().iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["b", "c", "a"]);
    }

    #[test]
    fn backfill_keeps_existing_cells() {
        let mut map = CodeMap::from_entries(
            "X",
            [
                CodeMapEntry {
                    source: "10".to_string(),
                    cod: Some("kept".to_string()),
                    name: None,
                    target: None,
                },
                CodeMapEntry::new("11"),
                CodeMapEntry::new("99"),
            ],
        );
        let changed = map.backfill(|source| match source {
            "10" => Some((Some("04".to_string()), Some("Almería".to_string()))),
            "11" => Some((Some("11".to_string()), Some("Cádiz".to_string()))),
            _ => None,
        });

        assert_eq!(changed, 2);

        let first = map.get("10").unwrap();
        assert_eq!(first.cod.as_deref(), Some("kept"));
        assert_eq!(first.name.as_deref(), Some("Almería"));
        assert_eq!(map.get("11").unwrap().name.as_deref(), Some("Cádiz"));
        assert_eq!(map.get("99").unwrap().cod, None);
    }

    #[test]
    fn fill_missing_targets_uses_default_identifier() {
        let mut map = CodeMap::from_entries(
            "INDICATOR",
            [
                CodeMapEntry::new("Tasa de paro").with_target("TP"),
                CodeMapEntry::new("Porcentaje de población en riesgo"),
            ],
        );
        let filled = map.fill_missing_targets(&stopwords());

        assert_eq!(filled, vec!["Porcentaje de población en riesgo"]);
        assert_eq!(map.resolve("Tasa de paro"), Some("TP"));
        assert_eq!(
            map.resolve("Porcentaje de población en riesgo"),
            Some("PORC_POBL_RIES")
        );
    }
}
