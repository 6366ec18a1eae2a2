// src/infra/errors.rs — Error types for Nekota

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NekotaError {
    // HTTP status kinds
    #[error("Unauthorized: the session is no longer valid")]
    Unauthorized,

    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },

    #[error("Unprocessable input: {detail}")]
    UnprocessableInput { detail: String },

    #[error("Server error: {detail}")]
    ServerError { detail: String },

    #[error("Request failed with HTTP {status}: {detail}")]
    RequestFailed { status: u16, detail: String },

    // Transport / decoding
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    // Session
    #[error("Stored session is corrupt: {0}")]
    StorageCorrupt(String),

    #[error("Durable storage error: {0}")]
    Storage(String),

    #[error("Token subject '{token_subject}' does not match user '{user_id}'")]
    TokenUserMismatch {
        token_subject: String,
        user_id: String,
    },

    #[error("Device '{device_number}' is not registered")]
    DeviceNotRegistered { device_number: String },

    #[error("Not logged in. Run `nekota login` first.")]
    NotLoggedIn,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NekotaError {
    /// Map a non-success HTTP status onto the gateway taxonomy.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            401 => NekotaError::Unauthorized,
            403 => NekotaError::Forbidden { detail },
            422 => NekotaError::UnprocessableInput { detail },
            500 => NekotaError::ServerError { detail },
            _ => NekotaError::RequestFailed { status, detail },
        }
    }

    /// Errors after which the only way forward is a fresh login.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            NekotaError::Unauthorized
                | NekotaError::TokenUserMismatch { .. }
                | NekotaError::NotLoggedIn
        )
    }

    /// Short sentence suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            NekotaError::Unauthorized => "Your session has expired. Please log in again.".into(),
            NekotaError::Forbidden { .. } => "You do not have permission to do that.".into(),
            NekotaError::UnprocessableInput { detail } if !detail.is_empty() => {
                format!("Some of the information you entered is invalid: {detail}")
            }
            NekotaError::UnprocessableInput { .. } => {
                "Some of the information you entered is invalid.".into()
            }
            NekotaError::ServerError { .. } => {
                "The server ran into a problem. Please try again later.".into()
            }
            NekotaError::RequestFailed { status, .. } => {
                format!("The request failed (HTTP {status}). Please try again.")
            }
            NekotaError::Network(_) => {
                "Could not reach the server. Check your connection.".into()
            }
            NekotaError::Decode(_) => "The server sent an unexpected response.".into(),
            NekotaError::StorageCorrupt(_) | NekotaError::Storage(_) => {
                "Saved login data could not be read. Please log in again.".into()
            }
            NekotaError::TokenUserMismatch { .. } => {
                "Login returned inconsistent account data. Please log in again.".into()
            }
            NekotaError::DeviceNotRegistered { .. } => {
                "This device is not registered yet. Register it first.".into()
            }
            NekotaError::NotLoggedIn => "Please log in first.".into(),
            NekotaError::Config(msg) => format!("Configuration problem: {msg}"),
            NekotaError::Io(e) => format!("File system error: {e}"),
        }
    }
}

impl From<reqwest::Error> for NekotaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            NekotaError::Decode(e.to_string())
        } else {
            NekotaError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for NekotaError {
    fn from(e: serde_json::Error) -> Self {
        NekotaError::Decode(e.to_string())
    }
}
