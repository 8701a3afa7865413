use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Language model error: {message}")]
    ModelError { message: String },

    #[error("Web search error: {message}")]
    SearchError { message: String },

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("Session storage error: {message}")]
    StorageError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Model,
    Extraction,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScoutError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScoutError::ConfigError { .. }
            | ScoutError::MissingConfigError { .. }
            | ScoutError::InvalidConfigValueError { .. }
            | ScoutError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ScoutError::HttpError(_) | ScoutError::SearchError { .. } => ErrorCategory::Network,
            ScoutError::ModelError { .. } => ErrorCategory::Model,
            ScoutError::Extraction { .. } => ErrorCategory::Extraction,
            ScoutError::IoError(_) | ScoutError::StorageError { .. } => ErrorCategory::Storage,
            ScoutError::SerializationError(_) | ScoutError::ValidationError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Storage => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Model => ErrorSeverity::Medium,
            ErrorCategory::Extraction | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScoutError::MissingConfigError { .. } => {
                "Set the missing value in the TOML config, on the command line, or in .env"
            }
            ScoutError::ConfigError { .. }
            | ScoutError::InvalidConfigValueError { .. }
            | ScoutError::ConfigValidationError { .. } => {
                "Check the configuration file and command line flags"
            }
            ScoutError::HttpError(_) | ScoutError::SearchError { .. } => {
                "Check network connectivity and try again"
            }
            ScoutError::ModelError { .. } => {
                "Verify GOOGLE_API_KEY and the model id, then try again"
            }
            ScoutError::Extraction { .. } => {
                "The selected page could not be processed; rerun to pick a different result"
            }
            ScoutError::IoError(_) | ScoutError::StorageError { .. } => {
                "Check that the session directory exists and is writable"
            }
            ScoutError::SerializationError(_) => "The service returned malformed data; try again",
            ScoutError::ValidationError { .. } => "Check the query and input values",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScoutError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            ScoutError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            ScoutError::Extraction { url, .. } => {
                format!("Could not extract details from {}", url)
            }
            ScoutError::ModelError { .. } => "The language model request failed".to_string(),
            ScoutError::HttpError(_) => "A network request failed".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
