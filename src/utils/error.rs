use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Out of doses after {allocated} allocations (individual #{position} left without a dose)")]
    OutOfDoses { allocated: u32, position: usize },

    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Degenerate line fit: {reason}")]
    DegenerateFit { reason: String },

    #[error("No vaccine center data for '{location}' on {date}")]
    UnknownCenter { location: String, date: String },

    #[error("Invalid grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Data,
    Numerical,
    Allocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LabError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LabError::IoError(_) => ErrorCategory::Io,
            LabError::ConfigError { .. }
            | LabError::InvalidConfigValueError { .. }
            | LabError::MissingConfigError { .. }
            | LabError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LabError::CsvError(_)
            | LabError::SerializationError(_)
            | LabError::UnknownCenter { .. }
            | LabError::InvalidGrid { .. }
            | LabError::ProcessingError { .. }
            | LabError::ValidationError { .. } => ErrorCategory::Data,
            LabError::DimensionMismatch { .. } | LabError::DegenerateFit { .. } => {
                ErrorCategory::Numerical
            }
            LabError::OutOfDoses { .. } => ErrorCategory::Allocation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 劑量不足屬於可預期的結果，重跑時加大劑量即可
            LabError::OutOfDoses { .. } => ErrorSeverity::Medium,
            LabError::DegenerateFit { .. } => ErrorSeverity::Medium,
            LabError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the input files exist and the output directory is writable",
            ErrorCategory::Configuration => "Review the TOML configuration and command line overrides",
            ErrorCategory::Data => "Check the input file format (headers, delimiters, numeric cells)",
            ErrorCategory::Numerical => "Provide more points or samples with distinct coordinates",
            ErrorCategory::Allocation => "Increase the number of doses or raise the age threshold",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LabError::OutOfDoses { allocated, .. } => format!(
                "Ran out of doses: {} doses were given before an eligible individual was reached",
                allocated
            ),
            LabError::MissingConfigError { field } => {
                format!("Missing configuration value '{}'", field)
            }
            LabError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration value for '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_doses_is_allocation_error() {
        let err = LabError::OutOfDoses {
            allocated: 3,
            position: 4,
        };
        assert_eq!(err.category(), ErrorCategory::Allocation);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("3 doses"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: LabError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Io);
    }
}
