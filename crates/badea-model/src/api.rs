//! Payloads returned by the BADEA query and hierarchy endpoints.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::columns::{
    COD, DESCRIPTION, ID, NAME, NOT_APPLICABLE, NOT_APPLICABLE_LABEL, ORDER, PARENTCODE,
    strip_column_affixes,
};
use crate::error::{ModelError, Result};

/// Literal token the API uses for absent values.
const NULL_TOKEN: &str = "null";

/// Full response of the query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub metainfo: QueryMetainfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hierarchies: Vec<HierarchyMeta>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub measures: Vec<Measure>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Vec<ObservationCell>>,
}

impl QueryResponse {
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetainfo {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub activity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub periodicity: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: String,
}

/// Summary of a hierarchy used as a dimension of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyMeta {
    #[serde(deserialize_with = "lenient_string")]
    pub alias: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cod: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub des: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

impl HierarchyMeta {
    /// Identifier used for persisted hierarchy tables: `<alias>-<cod>`.
    pub fn hierarchy_id(&self) -> String {
        format!("{}-{}", self.alias, self.cod)
    }

    /// Dimension name without the API's column affixes.
    pub fn dimension_name(&self) -> String {
        strip_column_affixes(&self.alias)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub des: String,
}

/// One cell of a raw observation row.
///
/// Dimension cells carry `cod` (the code path from root to leaf) and `label`;
/// measure cells carry `val` and its display `format`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// `Some(Value::Null)` when the field is present but null.
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub val: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
}

impl ObservationCell {
    /// Whether a dimension cell carries a non-empty code path.
    pub fn has_code_path(&self) -> bool {
        self.cod.as_ref().is_some_and(|path| !path.is_empty())
    }

    /// Whether a measure cell carries a `val` or a `format` field.
    pub fn has_measure(&self) -> bool {
        self.val.is_some() || self.format.is_some()
    }

    /// Leaf-most positional code of a dimension cell.
    pub fn leaf_code(&self) -> Option<String> {
        self.cod.as_ref()?.last().and_then(scalar_to_string)
    }

    /// Raw value of a measure cell, falling back to its display format when
    /// the value is absent or empty.
    pub fn measure_value(&self) -> Option<String> {
        match self.val.as_ref().and_then(scalar_to_string) {
            Some(value) if !value.is_empty() => Some(value),
            _ => self.format.as_ref().and_then(scalar_to_string),
        }
    }
}

/// Response of the hierarchy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyResponse {
    pub data: HierarchyRoots,
}

/// The endpoint returns either the root node itself or a list of roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HierarchyRoots {
    Many(Vec<HierarchyNode>),
    Single(Box<HierarchyNode>),
}

impl HierarchyResponse {
    pub fn roots(&self) -> &[HierarchyNode] {
        match &self.data {
            HierarchyRoots::Many(nodes) => nodes,
            HierarchyRoots::Single(node) => std::slice::from_ref(node.as_ref()),
        }
    }
}

/// Raw hierarchy tree node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<HierarchyNode>,
    #[serde(rename = "isLastLevel", default, deserialize_with = "null_as_default")]
    pub is_last_level: bool,
    /// Scalar properties (`id`, `cod`, `label`, `des`, `parentId`, `order`).
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl HierarchyNode {
    /// Whether descent stops at this node.
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty() || self.is_last_level
    }

    /// Value of a projected property as text. JSON null and the literal
    /// `"null"` token both read as the empty string.
    pub fn property(&self, property: HierarchyProperty) -> Result<String> {
        let key = property.json_key();
        let value = self
            .properties
            .get(key)
            .ok_or_else(|| ModelError::MissingNodeProperty {
                node: self.describe(),
                property: key.to_string(),
            })?;
        let text = scalar_to_string(value).unwrap_or_default();
        if text == NULL_TOKEN {
            return Ok(String::new());
        }
        Ok(text)
    }

    fn describe(&self) -> String {
        ["cod", "id", "label"]
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(scalar_to_string))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// Node fields that can be projected into a hierarchy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyProperty {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "cod")]
    Cod,
    #[serde(rename = "label")]
    Label,
    #[serde(rename = "des")]
    Des,
    #[serde(rename = "parentId")]
    ParentId,
    #[serde(rename = "order")]
    Order,
}

impl HierarchyProperty {
    pub const ALL: [HierarchyProperty; 6] = [
        HierarchyProperty::Id,
        HierarchyProperty::Cod,
        HierarchyProperty::Label,
        HierarchyProperty::Des,
        HierarchyProperty::ParentId,
        HierarchyProperty::Order,
    ];

    pub fn json_key(self) -> &'static str {
        match self {
            HierarchyProperty::Id => "id",
            HierarchyProperty::Cod => "cod",
            HierarchyProperty::Label => "label",
            HierarchyProperty::Des => "des",
            HierarchyProperty::ParentId => "parentId",
            HierarchyProperty::Order => "order",
        }
    }

    /// Column name in the hierarchy table.
    pub fn column_name(self) -> &'static str {
        match self {
            HierarchyProperty::Id => ID,
            HierarchyProperty::Cod => COD,
            HierarchyProperty::Label => NAME,
            HierarchyProperty::Des => DESCRIPTION,
            HierarchyProperty::ParentId => PARENTCODE,
            HierarchyProperty::Order => ORDER,
        }
    }

    /// Value of this property on the synthetic "not applicable" row.
    pub fn not_applicable_value(self) -> &'static str {
        match self {
            HierarchyProperty::Id => NOT_APPLICABLE,
            HierarchyProperty::Cod | HierarchyProperty::Label | HierarchyProperty::Des => {
                NOT_APPLICABLE_LABEL
            }
            HierarchyProperty::ParentId | HierarchyProperty::Order => "",
        }
    }
}

/// Render a scalar JSON value as text. Arrays and objects have no scalar form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn keep_null<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string).unwrap_or_default())
}
