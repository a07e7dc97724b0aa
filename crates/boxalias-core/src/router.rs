//! Routes email addresses and partial queries to servers, domains and
//! forwarding targets.

use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::{Registry, ServerRecord, TargetList};

/// Domain offered when the registry has no domains at all, so the suggestion
/// path still renders something.
const FALLBACK_DOMAIN: &str = "example.org";

/// Extracts the domain portion of an address: everything after the last `@`,
/// or the whole string when there is none.
fn domain_of(address: &str) -> &str {
    address.rsplit_once('@').map_or(address, |(_, domain)| domain)
}

/// Resolves an email address to the server that handles its domain.
///
/// # Errors
///
/// Returns [`Error::NoServerForDomain`] when the domain is unmanaged.
pub fn resolve_server<'a>(registry: &'a Registry, email: &str) -> Result<&'a ServerRecord> {
    let domain = domain_of(email);
    let record = registry.lookup_by_domain(domain)?;
    debug!(server = %record.name, %domain, "resolved server for address");
    Ok(record)
}

/// Chooses the best domain for an empty or partial query.
///
/// An empty query picks the default (first) domain; a non-empty query narrows
/// by *prefix*. When nothing matches the prefix this still returns the
/// default domain rather than failing, since the suggestion path prefers a
/// usable answer over an error.
#[must_use]
pub fn match_best_domain(registry: &Registry, query: &str) -> String {
    let default = registry.domains().next().unwrap_or(FALLBACK_DOMAIN);
    if !query.is_empty() {
        for domain in registry.domains() {
            if domain.starts_with(query) {
                return domain.to_string();
            }
        }
    }
    default.to_string()
}

/// Chooses the forwarding target for a domain query.
///
/// The query must match the target *after* its first character, which in
/// practice means the domain portion of a `user@domain` target and never the
/// username portion. Unlike [`match_best_domain`] this uses a non-leading
/// substring match, and an empty query is an error; both behaviours are
/// deliberate.
///
/// # Errors
///
/// Returns [`Error::NoTargetForDomain`] when the query is empty or no target
/// matches.
pub fn match_best_target<'a>(targets: &'a TargetList, query: &str) -> Result<&'a str> {
    if !query.is_empty() {
        for target in targets.iter() {
            match target.find(query) {
                Some(position) if position > 0 => {
                    debug!(%target, %query, "matched forwarding target");
                    return Ok(target);
                }
                _ => debug!(%target, %query, "target does not match"),
            }
        }
    }
    Err(Error::NoTargetForDomain(query.to_string()))
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
            vec!["abc.com".into()],
            "cred-alpha",
        ));
        registry.register(ServerRecord::new(
            "beta",
            "https://beta.example.com/admin",
            vec!["xyz.com".into()],
            "cred-beta",
        ));
        registry
    }

    #[test]
    fn resolve_server_splits_at_last_at_sign() {
        let registry = sample_registry();
        assert_eq!(
            resolve_server(&registry, "user@xyz.com").unwrap().name,
            "beta"
        );
        // Quoted local parts can themselves contain an @.
        assert_eq!(
            resolve_server(&registry, "odd@local@abc.com").unwrap().name,
            "alpha"
        );
    }

    #[test]
    fn resolve_server_rejects_unmanaged_domain() {
        let registry = sample_registry();
        assert!(matches!(
            resolve_server(&registry, "u@z.com"),
            Err(Error::NoServerForDomain(domain)) if domain == "z.com"
        ));
    }

    #[test]
    fn empty_query_picks_first_domain() {
        let registry = sample_registry();
        assert_eq!(match_best_domain(&registry, ""), "abc.com");
    }

    #[test]
    fn domain_match_is_prefix_not_substring() {
        let registry = sample_registry();
        // "x" prefixes xyz.com; the "x" inside abc.com's TLD must not win.
        assert_eq!(match_best_domain(&registry, "x"), "xyz.com");
        assert_eq!(match_best_domain(&registry, "ab"), "abc.com");
    }

    #[test]
    fn unmatched_prefix_falls_back_to_default() {
        let registry = sample_registry();
        assert_eq!(match_best_domain(&registry, "nope"), "abc.com");
    }

    #[test]
    fn empty_registry_falls_back_to_placeholder() {
        let registry = Registry::new();
        assert_eq!(match_best_domain(&registry, ""), "example.org");
    }

    #[test]
    fn empty_target_query_always_fails() {
        let targets = TargetList::new(vec!["alice@foo.com".into()]);
        assert!(matches!(
            match_best_target(&targets, ""),
            Err(Error::NoTargetForDomain(_))
        ));
    }

    #[test]
    fn target_match_requires_non_leading_substring() {
        let targets = TargetList::new(vec!["alice@foo.com".into(), "bob@bar.com".into()]);
        assert_eq!(match_best_target(&targets, "foo").unwrap(), "alice@foo.com");
        assert_eq!(match_best_target(&targets, "bar").unwrap(), "bob@bar.com");
        // A match at index 0 is the username, not the domain; excluded.
        assert!(match_best_target(&targets, "alice").is_err());
    }

    #[test]
    fn target_match_takes_first_configured_match() {
        let targets = TargetList::new(vec!["alice@foo.com".into(), "amy@foo.com".into()]);
        assert_eq!(match_best_target(&targets, "foo").unwrap(), "alice@foo.com");
    }
}
