//! Error types for the color_tagger library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for color_tagger operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Error types for color extraction operations
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A component option is out of range, unknown, or missing
    #[error("Invalid configuration: {parameter} {reason}")]
    InvalidConfiguration { parameter: String, reason: String },

    /// Configuration document could not be parsed
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file could not be read
    #[error("Failed to read configuration file: {}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// K-means could not produce a result for a candidate cluster count
    #[error("Clustering failed for k = {k}: {reason}")]
    ClusteringFailure { k: usize, reason: String },

    /// Input image has no pixels
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidImage { width: u32, height: u32 },
}

impl ExtractionError {
    /// Create a configuration error for a named option
    pub fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a clustering failure for candidate `k`
    pub fn clustering(k: usize, reason: impl Into<String>) -> Self {
        Self::ClusteringFailure {
            k,
            reason: reason.into(),
        }
    }

    /// Create a configuration parse error with context
    pub fn parse(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source,
        }
    }

    /// Check if retrying the same image with different settings could succeed
    ///
    /// Clustering fails when masking leaves too little foreground; a caller
    /// may retry with less aggressive background or skin settings.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExtractionError::ClusteringFailure { .. })
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::ClusteringFailure { .. } => {
                "No foreground colors could be isolated in the image. Try a photo with a visible subject or relax the masking settings.".to_string()
            }
            ExtractionError::InvalidImage { .. } => {
                "The image is empty. Please provide a decoded image with pixels.".to_string()
            }
            ExtractionError::InvalidConfiguration { parameter, .. } => {
                format!("The setting '{}' is invalid. Please check the configuration.", parameter)
            }
            _ => "Color extraction failed. Please check the configuration and try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clustering_failure_is_recoverable() {
        let err = ExtractionError::clustering(2, "no pixels");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Clustering failed for k = 2: no pixels");
    }

    #[test]
    fn test_configuration_error_is_fatal() {
        let err = ExtractionError::config("crop", "must be in (0, 1]");
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("crop"));
    }

    #[test]
    fn test_parse_error_keeps_source() {
        use std::error::Error as _;

        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = ExtractionError::parse("bad document", source);
        assert!(err.source().is_some());
    }
}
