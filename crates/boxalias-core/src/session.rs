//! Session lifecycle against a server's admin API.
//!
//! One login per server record per process: the first call performs the
//! handshake and stores the returned token on the record, every later call is
//! a no-op. The HTTP client is created lazily on first use, reused for every
//! call and released when the [`SessionClient`] drops.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::registry::{ServerRecord, Session};

/// Body of the admin API's login response.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Owns the HTTP transport used for login and provisioning calls.
#[derive(Debug, Default)]
pub struct SessionClient {
    http: Option<reqwest::Client>,
}

impl SessionClient {
    /// Creates a client with no transport yet; the connection pool is opened
    /// on the first call that needs it.
    #[must_use]
    pub const fn new() -> Self {
        Self { http: None }
    }

    /// Returns the HTTP client, opening it on first use.
    pub(crate) fn http(&mut self) -> Result<&reqwest::Client> {
        match &mut self.http {
            Some(client) => {
                debug!("reusing existing HTTP session");
                Ok(client)
            }
            slot @ None => {
                debug!("opening new HTTP session");
                let client = reqwest::Client::builder().build()?;
                Ok(slot.insert(client))
            }
        }
    }

    /// Makes sure `record` carries an authenticated session, logging in at
    /// most once per process.
    ///
    /// When the record already has a session token this returns immediately
    /// without any network traffic. Otherwise it fetches credentials from
    /// `provider` and performs the login handshake over TLS, storing the
    /// returned token and the username on the record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingServerUrl`] when the record has no base URL,
    /// [`Error::CredentialUnavailable`] when the provider cannot supply
    /// credentials, [`Error::LoginFailed`] when the server returns no
    /// `api_key`, and [`Error::Transport`] for connection-level failures.
    /// Nothing is retried.
    pub async fn ensure_session(
        &mut self,
        record: &mut ServerRecord,
        provider: &impl CredentialProvider,
    ) -> Result<()> {
        if record.is_authenticated() {
            debug!(server = %record.name, "skipping login, session token already present");
            return Ok(());
        }

        if record.base_url.is_empty() {
            return Err(Error::MissingServerUrl(record.name.clone()));
        }

        let creds = provider.get_entry(&record.credential_ref).await?;
        let authorization = basic_auth_header(&creds.username, &creds.secret);

        debug!(server = %record.name, url = %record.base_url, "starting login");
        let response = self
            .http()?
            .post(format!("{}/login", record.base_url))
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await?;

        let login: LoginResponse = response.json().await?;
        if login.api_key.is_empty() {
            return Err(Error::LoginFailed {
                reason: login
                    .reason
                    .unwrap_or_else(|| "no api_key in login response".to_string()),
            });
        }

        debug!(server = %record.name, "login succeeded");
        record.session = Some(Session {
            username: creds.username,
            api_key: login.api_key,
        });
        Ok(())
    }
}

/// Builds an HTTP Basic `Authorization` header value from credentials.
#[must_use]
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let token = BASE64.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn basic_auth_header_encodes_colon_joined_pair() {
        assert_eq!(basic_auth_header("user", "pass"), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn basic_auth_header_keeps_colons_in_password() {
        // Only the first colon separates username from password on decode.
        let header = basic_auth_header("user", "pa:ss");
        let encoded = header.strip_prefix("Basic ").unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), b"user:pa:ss");
    }

    #[test]
    fn login_response_tolerates_missing_fields() {
        let login: LoginResponse = serde_json::from_str("{}").unwrap();
        assert!(login.api_key.is_empty());
        assert!(login.reason.is_none());

        let login: LoginResponse =
            serde_json::from_str(r#"{"reason": "Incorrect password."}"#).unwrap();
        assert_eq!(login.reason.as_deref(), Some("Incorrect password."));
    }
}
