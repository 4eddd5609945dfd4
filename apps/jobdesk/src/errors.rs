use thiserror::Error;

/// Fixed text shown when the backend cannot be reached.
pub const CONTACT_FAILURE_MESSAGE: &str = "Failed to contact backend";
/// Fixed text shown when the backend answers with something that is not JSON.
pub const INVALID_JSON_MESSAGE: &str = "Backend did not return valid JSON";

/// Client-level error type.
/// Every failure is terminal for the action that raised it; nothing retries.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend unreachable, connection reset or request timed out.
    #[error("{CONTACT_FAILURE_MESSAGE}: {0}")]
    Network(#[from] reqwest::Error),

    /// Body was not JSON, or not the JSON shape the endpoint promises.
    /// The raw body goes to the debug log only.
    #[error("{INVALID_JSON_MESSAGE} (status {status}): {reason}")]
    InvalidJson { status: u16, reason: String },

    /// `success: false` or a non-2xx status carrying an `error` field.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Local precondition failed before any network I/O.
    #[error("{0}")]
    Validation(String),

    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// The text a user sees for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => CONTACT_FAILURE_MESSAGE.to_string(),
            ClientError::InvalidJson { .. } => INVALID_JSON_MESSAGE.to_string(),
            ClientError::Backend { message, .. } => message.clone(),
            ClientError::Validation(message) => message.clone(),
            ClientError::Io(e) => format!("Could not read file: {e}"),
        }
    }
}
