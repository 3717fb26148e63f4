/// Failure kinds of the simulation and analysis core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input, rejected before any computation starts.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The power series could not be obtained from the external source.
    #[error("power series is unavailable")]
    DataUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Incomplete or inconsistent static configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
