//! Audio upload coordinator.
//!
//! Packages a captured artifact plus workflow metadata into one
//! multipart transfer and folds every failure axis — transport,
//! status, unparsable body — into [`Error::UploadFailed`], so the
//! flows branch only on success/failure. Session expiry is the one
//! exception: it always propagates as itself.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::gateway::{Auth, Gateway};

/// What the uploaded audio is for; the service routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// An enrollment sample.
    Register,
    /// A verification sample.
    Verify,
    /// An emotion analysis sample.
    Emotion,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Register => "register",
            UploadKind::Verify => "verify",
            UploadKind::Emotion => "emotion",
        }
    }
}

/// Workflow-specific tags attached to the transfer.
#[derive(Debug, Clone, Default)]
pub struct UploadTags {
    pub sample_index: Option<u32>,
    pub prompt_text: Option<String>,
    pub subject_id: Option<String>,
}

/// Server-side handle of an uploaded audio file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAudio {
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    #[serde(default)]
    data: Option<UploadedAudio>,
}

/// Upload endpoint coordinator.
pub struct UploadService {
    gateway: Arc<Gateway>,
}

impl UploadService {
    pub(crate) fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Uploads one audio artifact with its kind and tags.
    pub async fn upload(
        &self,
        artifact: &Path,
        kind: UploadKind,
        tags: UploadTags,
    ) -> Result<UploadedAudio> {
        let mut fields = vec![("type".to_string(), kind.as_str().to_string())];
        if let Some(index) = tags.sample_index {
            fields.push(("sampleIndex".to_string(), index.to_string()));
        }
        if let Some(text) = tags.prompt_text {
            fields.push(("text".to_string(), text));
        }
        if let Some(id) = tags.subject_id {
            fields.push(("subjectId".to_string(), id));
        }

        let result: Result<UploadBody> = self
            .gateway
            .upload("/upload/audio", artifact, "audio", fields, Auth::Required)
            .await;

        match result {
            Ok(body) => body.data.ok_or_else(|| {
                Error::UploadFailed("upload response missing data".to_string())
            }),
            // expiry must reach the top-level caller untouched
            Err(Error::AuthExpired) => Err(Error::AuthExpired),
            Err(e) => Err(Error::UploadFailed(e.to_string())),
        }
    }
}
