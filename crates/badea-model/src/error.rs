use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unrecognized periodicity '{label}'")]
    UnknownPeriodicity { label: String },
    #[error("hierarchy node '{node}' has no '{property}' property")]
    MissingNodeProperty { node: String, property: String },
    #[error("invalid query id '{raw}'")]
    InvalidQueryId { raw: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
