//! Error types for alias provisioning.

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by registry lookups, routing and the provisioning client.
///
/// Every variant is terminal for the current invocation: the library never
/// retries or falls back, and only the binary's entry point decides the exit
/// code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered server serves the given domain.
    #[error("no server is configured to handle {0} addresses")]
    NoServerForDomain(String),

    /// No server is registered under the given name.
    #[error("unknown server: {0}")]
    UnknownServer(String),

    /// No forwarding target matches the given domain query.
    #[error("no target email addresses for domain '{0}'")]
    NoTargetForDomain(String),

    /// The credential provider could not supply a username/secret pair.
    #[error("credential lookup failed: {0}")]
    CredentialUnavailable(String),

    /// The server rejected the login exchange.
    #[error("login failure: {reason}")]
    LoginFailed {
        /// Reason reported by the server, when it gave one.
        reason: String,
    },

    /// Transport-level failure (connection, TLS, malformed response body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A server record has no base URL configured.
    #[error("no server URL configured for {0}")]
    MissingServerUrl(String),

    /// The caller skipped `ensure_session` before provisioning.
    #[error("no authenticated session for {0}")]
    MissingSession(String),

    /// Refused to create an alias with an empty address.
    #[error("cannot create an empty alias")]
    EmptyAlias,

    /// The server answered the upsert with a non-200 status.
    #[error("server error {status}: {body}")]
    ProvisioningFailed {
        /// HTTP status returned by the server.
        status: u16,
        /// Raw response body, surfaced for diagnosis.
        body: String,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
