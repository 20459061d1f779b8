use thiserror::Error;

/// Result type alias for reflect-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for memory discovery and routing
///
/// Missing files, malformed headers and ambiguous learnings are not errors: they map to
/// empty collections or `None`. Only conditions with no sensible default end up here.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// The user-level config directory could not be resolved
    #[error("could not determine the user config directory (is HOME set?)")]
    HomeNotFound,

    /// Unknown learning type
    #[error("invalid learning type: {0}")]
    InvalidLearningType(String),

    /// Logging setup errors
    #[error("logging error: {0}")]
    Logging(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io_err: Error = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        assert_eq!(io_err.to_string(), "I/O error: file not found");

        let config_err = Error::Config("memory_file must not be empty".to_string());
        assert_eq!(config_err.to_string(), "configuration error: memory_file must not be empty");

        let learning_err = Error::InvalidLearningType("bogus".to_string());
        assert_eq!(learning_err.to_string(), "invalid learning type: bogus");

        assert!(Error::HomeNotFound.to_string().contains("HOME"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_toml_error() {
        let toml_err = toml::from_str::<toml::Table>("not = [valid").unwrap_err();
        let err: Error = toml_err.into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<String> {
            Ok("success".to_string())
        }

        fn returns_err() -> Result<String> {
            Err(Error::HomeNotFound)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
