//! Authentication flows: desktop token exchange and mobile sessions.

use super::core::LastFmClient;
use crate::protocol::signature::md5_hex;
use crate::protocol::{Params, Payload};
use crate::transport::HttpMethod;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// An authenticated user session. `key` is the `sk` sent with user calls
/// and does not expire unless the user revokes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub subscriber: bool,
}

impl Session {
    pub fn new(name: impl Into<String>, key: impl Into<String>, subscriber: bool) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            subscriber,
        }
    }

    /// Read a `<session>` payload.
    pub fn from_payload(payload: &Payload) -> Result<Self> {
        if payload.name() != "session" {
            return Err(Error::malformed_with_context(
                "expected a session payload",
                ErrorContext::new()
                    .with_details(format!("got <{}>", payload.name()))
                    .with_source("session"),
            ));
        }
        let name = required(payload, "name")?;
        let key = required(payload, "key")?;
        let subscriber = matches!(
            payload.child_text("subscriber")?.as_deref(),
            Some("1") | Some("true")
        );
        Ok(Self {
            name,
            key,
            subscriber,
        })
    }
}

fn required(payload: &Payload, field: &str) -> Result<String> {
    payload
        .child_text(field)?
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::malformed_with_context(
                "session payload is incomplete",
                ErrorContext::new()
                    .with_field_path(format!("session/{}", field))
                    .with_source("session"),
            )
        })
}

/// Token the mobile flow sends in place of the password.
pub fn mobile_auth_token(username: &str, password_md5: &str) -> String {
    md5_hex(&format!("{}{}", username, password_md5))
}

impl LastFmClient {
    /// Request an unauthorized token for the desktop flow.
    pub async fn get_token(&self) -> Result<String> {
        let payload = self.signed_call("auth.getToken", Params::new(), None).await?;
        let token = payload.text()?;
        if token.is_empty() {
            return Err(Error::malformed_with_context(
                "empty token",
                ErrorContext::new().with_source("auth.getToken"),
            ));
        }
        Ok(token)
    }

    /// Exchange a user-authorized token for a session.
    pub async fn get_session(&self, token: &str) -> Result<Session> {
        let payload = self
            .signed_call("auth.getSession", Params::new().with("token", token), None)
            .await?;
        let session = Session::from_payload(&payload)?;
        info!(user = %session.name, "session established");
        Ok(session)
    }

    /// Create a session directly from user credentials.
    pub async fn get_mobile_session(&self, username: &str, password: &str) -> Result<Session> {
        self.get_mobile_session_prehashed(username, &md5_hex(password))
            .await
    }

    /// Like [`get_mobile_session`](Self::get_mobile_session) with the
    /// password already MD5-hashed (lowercase hex).
    pub async fn get_mobile_session_prehashed(
        &self,
        username: &str,
        password_md5: &str,
    ) -> Result<Session> {
        let params = Params::new()
            .with("username", username)
            .with("authToken", mobile_auth_token(username, password_md5));
        let payload = self
            .signed_call_with_method("auth.getMobileSession", params, None, HttpMethod::Post)
            .await?;
        let session = Session::from_payload(&payload)?;
        info!(user = %session.name, "mobile session established");
        Ok(session)
    }
}
