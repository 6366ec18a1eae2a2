// src/api/types.rs — Request/response shapes exchanged with the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::NekotaError;
use crate::session::user::{lenient_timestamp, string_or_number, UserRecord};

type JsonMap = serde_json::Map<String, serde_json::Value>;

// ─── Auth / device ──────────────────────────────────────────────────────────

/// `{token, user}` as returned by credential login and device registration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
}

/// Response of `POST /api/device/exists`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceExistsResponse {
    pub exists: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceRequest<'a> {
    pub device_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

/// `GET /api/auth/verify` returns either the bare user or `{user: ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VerifyResponse {
    Wrapped { user: UserRecord },
    Bare(UserRecord),
}

impl VerifyResponse {
    pub fn into_user(self) -> UserRecord {
        match self {
            VerifyResponse::Wrapped { user } | VerifyResponse::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PremiumStatus {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub is_premium: bool,
}

// ─── User ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
}

// ─── Memories ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryDraft {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}

// ─── Friends ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

// ─── Voices ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// The voice model currently assigned to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceModel {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

// ─── Alarms ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Local wall-clock time, `HH:MM`.
    pub time: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub repeat_days: Vec<u8>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlarmDraft {
    pub user_id: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub enabled: bool,
    pub repeat_days: Vec<u8>,
}

// ─── Payments ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub plan: String,
}

/// Where to send the user to pay.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ─── Admin ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub premium_users: u64,
    #[serde(default)]
    pub total_memories: u64,
    #[serde(default)]
    pub total_voices: u64,
}

// ─── Uploads ────────────────────────────────────────────────────────────────

/// A file to send as multipart form data.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = audio_mime_for(&file_name).map(str::to_string);
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, NekotaError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

fn audio_mime_for(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "m4a" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_exists_without_session() {
        let resp: DeviceExistsResponse = serde_json::from_str(r#"{"exists":false}"#).unwrap();
        assert!(!resp.exists);
        assert!(resp.token.is_none());
        assert!(resp.user.is_none());
    }

    #[test]
    fn test_verify_response_shapes() {
        let bare: VerifyResponse = serde_json::from_str(r#"{"id":"u1","name":"Mika"}"#).unwrap();
        assert_eq!(bare.into_user().id, "u1");

        let wrapped: VerifyResponse =
            serde_json::from_str(r#"{"user":{"id":"u2"}}"#).unwrap();
        assert_eq!(wrapped.into_user().id, "u2");
    }

    #[test]
    fn test_premium_status_numeric_user_id() {
        let s: PremiumStatus =
            serde_json::from_str(r#"{"user_id":7,"is_premium":true}"#).unwrap();
        assert_eq!(s.user_id, "7");
        assert!(s.is_premium);
    }

    #[test]
    fn test_naive_created_at_accepted() {
        let m: Memory =
            serde_json::from_str(r#"{"id":3,"content":"hi","created_at":"2026-10-01T08:30:00"}"#)
                .unwrap();
        assert_eq!(
            m.created_at.unwrap().to_rfc3339(),
            "2026-10-01T08:30:00+00:00"
        );
    }

    #[test]
    fn test_device_request_omits_missing_name() {
        let body = serde_json::to_string(&DeviceRequest {
            device_number: "1234",
            name: None,
        })
        .unwrap();
        assert_eq!(body, r#"{"device_number":"1234"}"#);
    }

    #[test]
    fn test_upload_mime_detection() {
        assert_eq!(
            UploadFile::new("hello.WAV", vec![]).mime_type.as_deref(),
            Some("audio/wav")
        );
        assert!(UploadFile::new("notes.txt", vec![]).mime_type.is_none());
        assert!(UploadFile::new("noext", vec![]).mime_type.is_none());
    }
}
