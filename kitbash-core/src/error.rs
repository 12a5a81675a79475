use thiserror::Error;

/// Store faults. Read-side corruption is not here on purpose: unreadable
/// payloads degrade to the built-in defaults instead of erroring.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No entity with id '{id}'")]
    UnknownId { id: String },

    #[error("No built-in entity with id '{id}' to reset to")]
    NoFactoryCopy { id: String },

    #[error("Category '{name}' already exists")]
    DuplicateCategory { name: String },

    #[error("Invalid category name '{name}': {reason}")]
    InvalidCategoryName { name: String, reason: String },

    #[error("Persistence medium error: {0}")]
    Medium(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },
}
