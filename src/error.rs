//! Error types and handling for the plumecast service

use thiserror::Error;

/// Main error type for plumecast
#[derive(Error, Debug)]
pub enum PlumeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transient network failures and non-OK HTTP statuses
    #[error("Network error: {message}")]
    Network { message: String },

    /// The remote endpoint answered 404: the service is not deployed there
    #[error("Endpoint not deployed: {endpoint}")]
    EndpointAbsent { endpoint: String },

    /// A collaborator answered with a body we could not use
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PlumeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new endpoint-absent error
    pub fn endpoint_absent<S: Into<String>>(endpoint: S) -> Self {
        Self::EndpointAbsent {
            endpoint: endpoint.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether another attempt of the same call may succeed.
    ///
    /// A 404 means the endpoint is not deployed and invalid input stays
    /// invalid, so neither is worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PlumeError::EndpointAbsent { .. } | PlumeError::Validation { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlumeError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            PlumeError::Network { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            PlumeError::EndpointAbsent { .. } => {
                "The dispersion model service is not deployed. Using the local estimate."
                    .to_string()
            }
            PlumeError::MalformedResponse { .. } => {
                "An external service returned unexpected data. Using the local estimate."
                    .to_string()
            }
            PlumeError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            PlumeError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for PlumeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlumeError::malformed(err.to_string())
        } else {
            PlumeError::network(err.to_string())
        }
    }
}
