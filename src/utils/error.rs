use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChronicleError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Invalid config value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{entity} not found: {id}")]
    NotFoundError { entity: &'static str, id: String },

    #[error("Permission denied for user {user_id}: {reason}")]
    PermissionError { user_id: String, reason: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid document '{id}': {reason}")]
    DocumentError { id: String, reason: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Notification failed: {message}")]
    NotificationError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    Permission,
    Validation,
    Storage,
    Notification,
}

impl ChronicleError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::NotFoundError {
            entity: "vaccination record",
            id: id.into(),
        }
    }

    pub fn code_not_found(id: impl Into<String>) -> Self {
        Self::NotFoundError {
            entity: "clinic code",
            id: id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::NotFoundError { .. } => ErrorCategory::NotFound,
            Self::PermissionError { .. } => ErrorCategory::Permission,
            Self::ValidationError { .. } | Self::DocumentError { .. } => ErrorCategory::Validation,
            Self::NotificationError { .. } => ErrorCategory::Notification,
            Self::StorageError { .. }
            | Self::CsvError(_)
            | Self::IoError(_)
            | Self::SerializationError(_) => ErrorCategory::Storage,
        }
    }

    /// Short message for terminal output.
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::NotFound => format!("Nothing found: {}", self),
            ErrorCategory::Permission => {
                "Only healthcare workers can change vaccination status".to_string()
            }
            ErrorCategory::Validation => format!("Invalid data: {}", self),
            ErrorCategory::Storage => format!("Could not read or write records: {}", self),
            ErrorCategory::Notification => format!("Notification could not be sent: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
