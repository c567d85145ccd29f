//! Emotion analysis service.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::gateway::{Auth, Gateway};

/// Emotion analysis of one audio sample.
///
/// Field names follow the service's wire shape.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionReport {
    pub dominant_emotion: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub emotion_probabilities: BTreeMap<String, f64>,
    #[serde(default)]
    pub intensity: f64,
    #[serde(default)]
    pub complexity: f64,
    #[serde(default)]
    pub quality_score: f64,
}

impl EmotionReport {
    /// Probabilities ranked most likely first.
    pub fn ranked_probabilities(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .emotion_probabilities
            .iter()
            .map(|(emotion, p)| (emotion.clone(), *p))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

#[derive(Debug, Deserialize)]
struct DetectBody {
    #[serde(default)]
    emotion_feature: Option<EmotionReport>,
}

/// Emotion endpoints.
pub struct EmotionService {
    gateway: Arc<Gateway>,
}

impl EmotionService {
    pub(crate) fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Runs emotion analysis on a previously uploaded audio file.
    pub async fn detect(&self, audio_file: &str, subject_id: Option<&str>) -> Result<EmotionReport> {
        let mut body = json!({
            "audio_file": audio_file,
            "require_analysis": true,
        });
        if let Some(id) = subject_id {
            body["employee_id"] = json!(id);
        }

        let resp: DetectBody = self
            .gateway
            .request("POST", "/emotion/detect", Some(body), Auth::Required)
            .await?;
        resp.emotion_feature.ok_or_else(|| {
            Error::MalformedResponse("detect response missing emotion_feature".to_string())
        })
    }
}
