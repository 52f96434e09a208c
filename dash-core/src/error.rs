use reqwest::StatusCode;

/// Rejected domain values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        reason: &'static str,
    },
}

/// Failures talking to the forecast or geocoding services.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to reach {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The service answered, but the body carries an error marker.
    #[error("{service} reported an error: {reason}")]
    Upstream { service: &'static str, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Device position errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    /// Short reason used in the degraded place-name message.
    pub fn reason(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Permission denied",
            LocationError::Unavailable => "Location unavailable",
            LocationError::Timeout => "Location request timed out",
            LocationError::Other(_) => "Location error",
        }
    }
}
