//! # boxalias-core
//!
//! Client library for provisioning mail-forwarding aliases on
//! [Mail-in-a-Box](https://mailinabox.email/) servers.
//!
//! This crate provides:
//! - A server registry mapping served domains to admin API endpoints
//! - Routing from an email address or partial query to the right server,
//!   domain or forwarding target
//! - A session client that logs in at most once per server per process and
//!   reuses the returned token
//! - An idempotent alias upsert against the admin API
//! - Credential retrieval through an external agent (1Password CLI)
//!
//! The whole crate is single-shot by design: there is no retry, no backoff
//! and no persistence; every error is terminal for the invocation and only
//! the binary decides the exit code.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod credentials;
mod error;
pub mod provision;
pub mod registry;
pub mod router;
pub mod session;

pub use config::Config;
pub use credentials::{CredentialProvider, Credentials, OnePasswordCli};
pub use error::{Error, Result};
pub use provision::{SUCCESS_MARKER, UpsertOutcome, upsert_alias};
pub use registry::{Registry, ServerRecord, Session, TargetList};
pub use router::{match_best_domain, match_best_target, resolve_server};
pub use session::{SessionClient, basic_auth_header};
