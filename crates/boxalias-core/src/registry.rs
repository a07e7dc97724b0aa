//! In-memory registry of Mail-in-a-Box servers and forwarding targets.

use std::fmt;

use crate::error::{Error, Result};

/// An authenticated session against one server's admin API.
///
/// Created by the session client on the first successful login and never
/// cleared; it lives exactly as long as the owning [`ServerRecord`].
#[derive(Clone)]
pub struct Session {
    /// Login username, reused to sign every call after login.
    pub username: String,
    /// Session token returned by the login exchange, used in place of the
    /// original secret.
    pub api_key: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// One administratively distinct Mail-in-a-Box server.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    /// Registry key, stable identifier from configuration.
    pub name: String,
    /// Admin API base URL, e.g. `https://box.example.com/admin`.
    pub base_url: String,
    /// Domains this server handles, in configuration order.
    pub served_domains: Vec<String>,
    /// Opaque handle into the credential provider; never a raw secret.
    pub credential_ref: String,
    /// Present only after a successful login.
    pub session: Option<Session>,
}

impl ServerRecord {
    /// Creates an unauthenticated record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        served_domains: Vec<String>,
        credential_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            served_domains,
            credential_ref: credential_ref.into(),
            session: None,
        }
    }

    /// Returns true once a login has succeeded for this record.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Ordered table of server records, built once per process from
/// configuration.
///
/// Registration order is significant: domain lookups walk the records in
/// insertion order and the first match wins, which is also the tie-break when
/// a domain appears in more than one record.
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<ServerRecord>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record, preserving configuration order.
    pub fn register(&mut self, record: ServerRecord) {
        self.records.push(record);
    }

    /// Returns the first registered record whose served domains contain
    /// `domain` (case-sensitive exact match).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoServerForDomain`] when no record serves the domain.
    pub fn lookup_by_domain(&self, domain: &str) -> Result<&ServerRecord> {
        self.records
            .iter()
            .find(|record| record.served_domains.iter().any(|d| d == domain))
            .ok_or_else(|| Error::NoServerForDomain(domain.to_string()))
    }

    /// Looks up a record by its registry key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownServer`] when no record has that name.
    pub fn lookup_by_name(&self, name: &str) -> Result<&ServerRecord> {
        self.records
            .iter()
            .find(|record| record.name == name)
            .ok_or_else(|| Error::UnknownServer(name.to_string()))
    }

    /// Mutable variant of [`Registry::lookup_by_name`], used to attach a
    /// session to a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownServer`] when no record has that name.
    pub fn lookup_by_name_mut(&mut self, name: &str) -> Result<&mut ServerRecord> {
        self.records
            .iter_mut()
            .find(|record| record.name == name)
            .ok_or_else(|| Error::UnknownServer(name.to_string()))
    }

    /// All served domains in insertion order across all records.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .flat_map(|record| record.served_domains.iter().map(String::as_str))
    }

    /// Number of registered servers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no servers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ordered, immutable list of forwarding-target addresses.
#[derive(Debug, Clone, Default)]
pub struct TargetList {
    targets: Vec<String>,
}

impl TargetList {
    /// Builds a target list, preserving configuration order.
    #[must_use]
    pub const fn new(targets: Vec<String>) -> Self {
        Self { targets }
    }

    /// Iterates over the targets in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    /// Returns true when no targets are configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(ServerRecord::new(
            "alpha",
            "https://alpha.example.com/admin",
            vec!["abc.com".into(), "shared.net".into()],
            "cred-alpha",
        ));
        registry.register(ServerRecord::new(
            "beta",
            "https://beta.example.com/admin",
            vec!["xyz.com".into(), "shared.net".into()],
            "cred-beta",
        ));
        registry
    }

    #[test]
    fn lookup_by_domain_finds_owning_server() {
        let registry = sample_registry();
        assert_eq!(registry.lookup_by_domain("xyz.com").unwrap().name, "beta");
    }

    #[test]
    fn lookup_by_domain_is_deterministic() {
        let registry = sample_registry();
        for _ in 0..3 {
            assert_eq!(registry.lookup_by_domain("abc.com").unwrap().name, "alpha");
        }
    }

    #[test]
    fn duplicate_domain_resolves_to_first_registered() {
        let registry = sample_registry();
        assert_eq!(
            registry.lookup_by_domain("shared.net").unwrap().name,
            "alpha"
        );
    }

    #[test]
    fn lookup_by_domain_rejects_unmanaged_domain() {
        let registry = sample_registry();
        assert!(matches!(
            registry.lookup_by_domain("z.com"),
            Err(Error::NoServerForDomain(domain)) if domain == "z.com"
        ));
    }

    #[test]
    fn lookup_by_domain_is_case_sensitive() {
        let registry = sample_registry();
        assert!(registry.lookup_by_domain("ABC.com").is_err());
    }

    #[test]
    fn lookup_by_name_rejects_unknown_server() {
        let registry = sample_registry();
        assert!(matches!(
            registry.lookup_by_name("gamma"),
            Err(Error::UnknownServer(name)) if name == "gamma"
        ));
    }

    #[test]
    fn domains_aggregate_in_insertion_order() {
        let registry = sample_registry();
        let domains: Vec<&str> = registry.domains().collect();
        assert_eq!(domains, ["abc.com", "shared.net", "xyz.com", "shared.net"]);
    }

    #[test]
    fn session_debug_redacts_api_key() {
        let session = Session {
            username: "admin@abc.com".into(),
            api_key: "top-secret".into(),
        };
        let rendered = format!("{session:?}");
        assert!(rendered.contains("admin@abc.com"));
        assert!(!rendered.contains("top-secret"));
    }
}
