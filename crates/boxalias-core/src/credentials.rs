//! Credential retrieval through an external agent.
//!
//! The provisioning client never sees raw secrets in configuration; each
//! server record carries an opaque reference that a [`CredentialProvider`]
//! turns into a username/secret pair on demand.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// A username/secret pair returned by a credential provider.
#[derive(Clone)]
pub struct Credentials {
    /// Login username.
    pub username: String,
    /// Login secret.
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// External secret-retrieval collaborator.
///
/// Opaque to the rest of the crate beyond this request/response contract;
/// tests substitute their own implementation.
pub trait CredentialProvider {
    /// Resolves an opaque reference to a username/secret pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CredentialUnavailable`] when the reference is empty,
    /// the backing agent errors, or the expected fields are missing from its
    /// output.
    fn get_entry(&self, id: &str) -> impl Future<Output = Result<Credentials>> + Send;
}

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("username"));
static PASSWORD_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("password"));

/// Compiles the anchored multi-line pattern for one agent output field.
#[allow(clippy::expect_used)]
fn field_regex(field: &str) -> Regex {
    Regex::new(&format!(r"(?m)^\s+{field}:\s+(\S+)$")).expect("field pattern compiles")
}

/// Credential provider backed by the 1Password CLI (`op`).
///
/// Runs `op item get <id>` and extracts the `username:` and `password:`
/// fields from its textual output.
#[derive(Debug, Clone)]
pub struct OnePasswordCli {
    command: String,
}

impl Default for OnePasswordCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OnePasswordCli {
    /// Uses the `op` binary found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            command: "op".to_string(),
        }
    }

    /// Overrides the agent binary, mainly for tests.
    #[must_use]
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl CredentialProvider for OnePasswordCli {
    async fn get_entry(&self, id: &str) -> Result<Credentials> {
        if id.is_empty() {
            return Err(Error::CredentialUnavailable(
                "no credential reference configured for this server".to_string(),
            ));
        }

        debug!(%id, command = %self.command, "querying credential agent");
        let output = Command::new("/usr/bin/env")
            .args([self.command.as_str(), "item", "get", id])
            .output()
            .await
            .map_err(|err| {
                Error::CredentialUnavailable(format!("failed to run {}: {err}", self.command))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || !stderr.trim().is_empty() {
            return Err(Error::CredentialUnavailable(format!(
                "{} error: {}",
                self.command,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_item_output(&stdout, id)
    }
}

/// Extracts the username and password fields from `op item get` output.
fn parse_item_output(output: &str, id: &str) -> Result<Credentials> {
    let username = USERNAME_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::CredentialUnavailable(format!("no username in agent output for {id}"))
        })?;

    let secret = PASSWORD_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::CredentialUnavailable(format!("no password in agent output for {id}"))
        })?;

    debug!(%username, "retrieved credentials from agent");
    Ok(Credentials { username, secret })
}
