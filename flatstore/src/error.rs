use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlatstoreError {
    #[error("Collection '{0}' does not exist")]
    CollectionNotFound(String),

    #[error("Column '{column}' does not exist for '{collection}' collection")]
    UnknownColumn { column: String, collection: String },

    #[error("Provide value for the mandatory fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlatstoreError>;
