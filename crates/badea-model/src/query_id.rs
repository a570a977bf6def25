use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ModelError, Result};

/// Ids longer than this may carry a `?filter` suffix that is not part of the id.
const MAX_PLAIN_ID_LEN: usize = 8;

/// Identifier of a BADEA query.
///
/// Accepts numeric or textual input. Long ids keep only the part before `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(String);

impl QueryId {
    pub fn new(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let id = if raw.chars().count() > MAX_PLAIN_ID_LEN {
            raw.split('?').next().unwrap_or(raw)
        } else {
            raw
        };
        if id.is_empty() {
            return Err(ModelError::InvalidQueryId {
                raw: raw.to_string(),
            });
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QueryId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<u64> for QueryId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for QueryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for QueryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct QueryIdVisitor;

        impl Visitor<'_> for QueryIdVisitor {
            type Value = QueryId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a query id as a string or an integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<QueryId, E> {
                Ok(QueryId::from(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<QueryId, E> {
                QueryId::new(&value.to_string()).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<QueryId, E> {
                QueryId::new(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(QueryIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_ids_drop_query_string() {
        assert_eq!(QueryId::new("49325?CodOper=b3_2147").unwrap().as_str(), "49325");
        // Short ids are kept verbatim.
        assert_eq!(QueryId::new("12?a").unwrap().as_str(), "12?a");
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let ids: Vec<QueryId> = serde_json::from_str(r#"[49325, "18200?x=1"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "49325");
        assert_eq!(ids[1].as_str(), "18200");
    }

    #[test]
    fn empty_id_is_rejected() {
        assert!(QueryId::new("  ").is_err());
        assert!(QueryId::new("?abcdefghij").is_err());
    }
}
