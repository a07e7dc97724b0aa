//! Create-or-update of mail aliases against an authenticated server.

use std::fmt;

use reqwest::header::AUTHORIZATION;
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::ServerRecord;
use crate::session::{SessionClient, basic_auth_header};

/// Marker appended to the confirmation line; the invoking environment greps
/// for it to detect success out-of-band.
pub const SUCCESS_MARKER: &str = "☺";

/// Result of a successful upsert, rendered as the one-line confirmation
/// `<alias> <raw response body> <marker>`.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The alias that was created or updated.
    pub alias: String,
    /// Raw response body from the server.
    pub response_body: String,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {SUCCESS_MARKER}",
            self.alias.trim(),
            self.response_body
        )
    }
}

/// Creates or updates `alias` so it forwards to `forwards_to`.
///
/// The request always sets `update_if_exists=1`, so re-provisioning an
/// existing alias succeeds rather than erroring; `permitted_senders` is
/// always sent empty. The call is a single all-or-nothing HTTP exchange
/// signed with the record's session token.
///
/// Local preconditions are checked in order before any network I/O, so a
/// misconfigured record never costs a wasted round trip.
///
/// # Errors
///
/// Returns [`Error::MissingServerUrl`], [`Error::MissingSession`] or
/// [`Error::EmptyAlias`] on precondition violations,
/// [`Error::ProvisioningFailed`] when the server answers anything other than
/// HTTP 200, and [`Error::Transport`] for connection-level failures.
pub async fn upsert_alias(
    client: &mut SessionClient,
    record: &ServerRecord,
    alias: &str,
    forwards_to: &str,
) -> Result<UpsertOutcome> {
    if record.base_url.is_empty() {
        return Err(Error::MissingServerUrl(record.name.clone()));
    }
    let Some(session) = record.session.as_ref() else {
        return Err(Error::MissingSession(record.name.clone()));
    };
    if alias.is_empty() {
        return Err(Error::EmptyAlias);
    }

    let form = [
        ("update_if_exists", "1"),
        ("address", alias),
        ("forwards_to", forwards_to),
        ("permitted_senders", ""),
    ];

    debug!(%alias, %forwards_to, server = %record.name, "starting alias upsert");
    let authorization = basic_auth_header(&session.username, &session.api_key);
    let response = client
        .http()?
        .post(format!("{}/mail/aliases/add", record.base_url))
        .header(AUTHORIZATION, authorization)
        .form(&form)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;

    if status != 200 {
        return Err(Error::ProvisioningFailed { status, body });
    }

    debug!(%alias, "alias upsert succeeded");
    Ok(UpsertOutcome {
        alias: alias.to_string(),
        response_body: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_line_contains_alias_body_and_marker() {
        let outcome = UpsertOutcome {
            alias: " tag@example.com ".into(),
            response_body: "alias updated".into(),
        };
        assert_eq!(outcome.to_string(), "tag@example.com alias updated ☺");
    }
}
