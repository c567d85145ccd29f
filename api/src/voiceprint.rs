//! Voiceprint service: enrollment status, registration, match, history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::gateway::{Auth, Gateway};

/// Whether the account has a registered voiceprint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VoiceprintStatus {
    #[serde(default)]
    pub registered: bool,
}

/// One enrolled sample as submitted in the registration transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredSample {
    /// Server-side path returned by the audio upload.
    pub file_path: String,
    /// Measured duration in milliseconds.
    pub duration: u64,
    /// Prompt text the sample was spoken against.
    pub text: String,
    pub sample_index: u32,
    pub upload_time: DateTime<Utc>,
}

/// Result of a voiceprint match.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    #[serde(rename = "match", default)]
    pub matched: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// One past verification, as projected by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    data: Option<VoiceprintStatus>,
}

#[derive(Debug, Deserialize)]
struct VerifyBody {
    #[serde(default)]
    data: Option<VerifyOutcome>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    data: Vec<HistoryEntry>,
}

/// Voiceprint endpoints.
pub struct VoiceprintService {
    gateway: Arc<Gateway>,
}

impl VoiceprintService {
    pub(crate) fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Queries enrollment status.
    pub async fn status(&self) -> Result<VoiceprintStatus> {
        let resp: StatusBody = self
            .gateway
            .request("GET", "/voiceprint/status", None, Auth::Required)
            .await?;
        Ok(resp.data.unwrap_or(VoiceprintStatus { registered: false }))
    }

    /// Submits the full enrolled sample set as one registration
    /// transaction.
    pub async fn register(&self, recordings: &[RegisteredSample]) -> Result<()> {
        let body = json!({ "recordings": recordings });
        self.gateway
            .request::<serde_json::Value>("POST", "/voiceprint/register", Some(body), Auth::Required)
            .await?;
        Ok(())
    }

    /// Matches an uploaded sample against the registered voiceprint.
    pub async fn verify(&self, audio_file: &str) -> Result<VerifyOutcome> {
        let body = json!({ "audioFile": audio_file });
        let resp: VerifyBody = self
            .gateway
            .request("POST", "/voiceprint/verify", Some(body), Auth::Required)
            .await?;
        resp.data
            .ok_or_else(|| Error::MalformedResponse("verify response missing data".to_string()))
    }

    /// Fetches the verification history projection.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let resp: HistoryBody = self
            .gateway
            .request("GET", "/voiceprint/history", None, Auth::Required)
            .await?;
        Ok(resp.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_outcome_wire_shape() {
        let outcome: VerifyOutcome = serde_json::from_str(
            r#"{"match":true,"confidence":0.93,"userName":"Ada"}"#,
        )
        .unwrap();
        assert!(outcome.matched);
        assert_eq!(outcome.confidence, 0.93);
        assert_eq!(outcome.user_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_registered_sample_serializes_camel_case() {
        let sample = RegisteredSample {
            file_path: "uploads/a.mp3".to_string(),
            duration: 4200,
            text: "a prompt".to_string(),
            sample_index: 1,
            upload_time: "2026-01-05T08:30:00Z".parse().unwrap(),
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("filePath"));
        assert!(json.contains("sampleIndex"));
        assert!(json.contains("uploadTime"));
    }

    #[test]
    fn test_history_entry_parses() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"createdAt":"2026-01-05T08:30:00Z","matched":true,"confidence":0.88}"#,
        )
        .unwrap();
        assert!(entry.matched);
        assert_eq!(entry.confidence, 0.88);
    }
}
