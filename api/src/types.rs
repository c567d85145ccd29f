//! Shared wire types.

use serde::{Deserialize, Serialize};

/// User profile bound to a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Server-side user identifier, when the service exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nick_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Minimal view of the envelope every endpoint wraps its payload in.
///
/// Used to classify a response before the endpoint-specific shape is
/// deserialized from the same bytes.
#[derive(Debug, Deserialize)]
pub(crate) struct Probe {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_wire_names() {
        let identity = Identity {
            id: Some("u-1".to_string()),
            nick_name: "Ada".to_string(),
            avatar_url: None,
        };
        let json = serde_json::to_string(&identity).unwrap();
        assert!(json.contains("nickName"));
        assert!(!json.contains("avatarUrl")); // absent fields are skipped

        let restored: Identity =
            serde_json::from_str(r#"{"nickName":"Ada","avatarUrl":"http://a/b.png"}"#).unwrap();
        assert_eq!(restored.nick_name, "Ada");
        assert_eq!(restored.avatar_url.as_deref(), Some("http://a/b.png"));
    }

    #[test]
    fn test_probe_defaults() {
        let probe: Probe = serde_json::from_str("{}").unwrap();
        assert!(!probe.success);
        assert!(probe.message.is_none());

        let probe: Probe =
            serde_json::from_str(r#"{"success":true,"message":"ok","data":{"x":1}}"#).unwrap();
        assert!(probe.success);
        assert_eq!(probe.message.as_deref(), Some("ok"));
    }
}
