use crate::drag::GestureError;

/// Failures reported by the lead-management API, whatever the backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeadApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LeadApiError {
    /// Maps a non-success HTTP status onto the error taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => LeadApiError::Validation(message),
            404 | 410 => LeadApiError::NotFound(message),
            409 => LeadApiError::Conflict(message),
            _ => LeadApiError::Remote { status, message },
        }
    }

    /// The cached copy of the lead no longer reflects the API.
    pub fn is_stale_lead(&self) -> bool {
        matches!(self, LeadApiError::NotFound(_) | LeadApiError::Conflict(_))
    }
}

impl From<reqwest::Error> for LeadApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LeadApiError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            LeadApiError::from_status(status.as_u16(), e.to_string())
        } else {
            LeadApiError::Network(e.to_string())
        }
    }
}

/// Errors raised by pipeline operations before or after talking to the API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] LeadApiError),

    #[error(transparent)]
    Gesture(#[from] GestureError),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("View is no longer mounted")]
    Unmounted,
}
