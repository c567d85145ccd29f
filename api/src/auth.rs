//! Authentication service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{Error, Result};
use crate::gateway::{Auth, Gateway};
use crate::session::SessionHandle;
use crate::types::Identity;

/// Platform profile captured at login time and forwarded to the
/// service alongside the login code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WxProfile {
    pub nick_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    token: String,
    user_info: Identity,
}

/// Login, validation, and logout.
pub struct AuthService {
    gateway: Arc<Gateway>,
    session: SessionHandle,
}

impl AuthService {
    pub(crate) fn new(gateway: Arc<Gateway>, session: SessionHandle) -> Self {
        Self { gateway, session }
    }

    /// Exchanges a platform login code for a session token and installs
    /// it in the session.
    pub async fn login(&self, code: &str, profile: &WxProfile) -> Result<Identity> {
        let body = json!({ "code": code, "userInfo": profile });
        let resp: LoginBody = self
            .gateway
            .request("POST", "/auth/wx-login", Some(body), Auth::Optional)
            .await?;

        let data = resp
            .data
            .ok_or_else(|| Error::MalformedResponse("login response missing data".to_string()))?;
        self.session.set(data.token, data.user_info.clone())?;
        info!(user = %data.user_info.nick_name, "logged in");
        Ok(data.user_info)
    }

    /// Checks the stored token against the service. Any failure —
    /// expiry, rejection, or no response — clears the session so the
    /// next session-dependent call fails fast without dispatch.
    pub async fn validate(&self) -> Result<bool> {
        match self
            .gateway
            .request_raw("GET", "/auth/validate", None, Auth::Required)
            .await
        {
            Ok(()) => Ok(true),
            Err(Error::AuthExpired) => Ok(false),
            Err(_) => {
                self.session.clear();
                Ok(false)
            }
        }
    }

    /// Drops the local session. Purely local; the token is simply
    /// forgotten.
    pub fn logout(&self) {
        if self.session.clear() {
            info!("logged out");
        }
    }
}
