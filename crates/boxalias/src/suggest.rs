//! Picker-item generation for launcher front-ends.
//!
//! Emits the script-filter JSON document an interactive launcher consumes:
//! each item proposes an alias built from the typed query, from the site the
//! browser is currently on, or from a random dictionary word. Pure
//! presentation; nothing here talks to a mail server.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

use anyhow::{Context as _, bail};
use rand::Rng as _;
use serde::Serialize;
use tracing::debug;
use url::Url;

use boxalias_core::{Config, Registry, router};

/// Word list used for random alias suggestions.
const WORDS_FILE: &str = "/usr/share/dict/words";

/// Environment variable the launcher sets to the frontmost browser URL.
const CURRENT_URL_ENV: &str = "CURRENT_URL";

#[derive(Debug, Serialize)]
struct ItemList {
    items: Vec<Item>,
}

/// One search result in the launcher's script-filter JSON shape.
#[derive(Debug, Serialize)]
struct Item {
    #[serde(rename = "type")]
    kind: &'static str,
    title: String,
    subtitle: String,
    arg: String,
    autocomplete: String,
    icon: Icon,
    mods: Mods,
}

#[derive(Debug, Serialize)]
struct Icon {
    path: &'static str,
}

#[derive(Debug, Serialize)]
struct Mods {
    cmd: Modifier,
}

#[derive(Debug, Serialize)]
struct Modifier {
    arg: String,
    subtitle: String,
}

/// Emits picker items for `query` on stdout.
pub fn run(query: &str) -> anyhow::Result<()> {
    let (registry, _targets) = Config::load()?.into_parts();
    let (username, domain_query) = parse_query(query);
    let domain = router::match_best_domain(&registry, domain_query);

    let mut items = Vec::new();
    if !username.is_empty() {
        debug!(%username, "adding item from typed username");
        items.push(generate_item(&registry, username, &domain)?);
    }

    if let Ok(current_url) = env::var(CURRENT_URL_ENV) {
        let site = sitename_from_fqdn(&current_url);
        if !site.is_empty() {
            debug!(%site, "adding item from current browser URL");
            items.push(generate_item(&registry, &site, &domain)?);
        }
    }

    for _ in 0..3 {
        items.push(generate_item(&registry, &random_word()?, &domain)?);
    }

    debug!(count = items.len(), "prepared picker items");
    println!("{}", serde_json::to_string(&ItemList { items })?);
    Ok(())
}

/// Builds one item for a proposed `username@domain` alias, plus a
/// cmd-modifier variant with a random numeric suffix.
fn generate_item(registry: &Registry, username: &str, domain: &str) -> anyhow::Result<Item> {
    let email = format!("{username}@{domain}");
    let server = router::resolve_server(registry, &email)?.name.clone();
    let suffix = random_number();

    Ok(Item {
        kind: "default",
        title: email.clone(),
        subtitle: format!("Create alias {username} on {server}"),
        arg: email.clone(),
        autocomplete: email,
        icon: Icon { path: "icon.png" },
        mods: Mods {
            cmd: Modifier {
                arg: format!("{username}{suffix}@{domain}"),
                subtitle: format!("Create alias {username}{suffix} on the {server} server"),
            },
        },
    })
}

/// Splits a search term into username and domain parts at the first `@`.
fn parse_query(query: &str) -> (&str, &str) {
    query.split_once('@').unwrap_or((query, ""))
}

/// Random three-digit suffix, as a string.
fn random_number() -> String {
    rand::thread_rng().gen_range(100..=999).to_string()
}

/// Picks a random word from the system dictionary via a random byte seek.
fn random_word() -> anyhow::Result<String> {
    let file = File::open(WORDS_FILE).with_context(|| format!("cannot open {WORDS_FILE}"))?;
    let size = file.metadata()?.len();
    if size == 0 {
        bail!("{WORDS_FILE} is empty");
    }

    let mut reader = BufReader::new(file);
    let spot = rand::thread_rng().gen_range(0..size);
    reader.seek(SeekFrom::Start(spot))?;

    // The seek almost certainly landed mid-word; discard the fragment up to
    // the next newline.
    let mut fragment = String::new();
    reader.read_line(&mut fragment)?;

    let mut word = String::new();
    if reader.read_line(&mut word)? == 0 {
        // Landed on the last line; wrap around to the first word.
        reader.seek(SeekFrom::Start(0))?;
        reader.read_line(&mut word)?;
    }
    Ok(word.trim().to_string())
}

/// Reduces a full URL to the second-to-last label of its hostname, which is
/// usually the memorable part of the site name.
fn sitename_from_fqdn(fqdn: &str) -> String {
    Url::parse(fqdn)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .and_then(|host| {
            let labels: Vec<&str> = host.split('.').collect();
            (labels.len() >= 2).then(|| labels[labels.len() - 2].to_string())
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxalias_core::ServerRecord;

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(ServerRecord::new(
            "homelab",
            "https://box.example.com/admin",
            vec!["example.com".into()],
            "cred",
        ));
        registry
    }

    #[test]
    fn parse_query_splits_at_first_at_sign() {
        assert_eq!(parse_query("tag@exa"), ("tag", "exa"));
        assert_eq!(parse_query("tag"), ("tag", ""));
        assert_eq!(parse_query(""), ("", ""));
    }

    #[test]
    fn random_number_is_three_digits() {
        for _ in 0..100 {
            let n: u32 = random_number().parse().unwrap();
            assert!((100..=999).contains(&n));
        }
    }

    #[test]
    fn sitename_takes_second_to_last_label() {
        assert_eq!(sitename_from_fqdn("https://www.example.com/page"), "example");
        assert_eq!(sitename_from_fqdn("https://shop.co.uk"), "co");
        assert_eq!(sitename_from_fqdn("not a url"), "");
        assert_eq!(sitename_from_fqdn(""), "");
    }

    #[test]
    fn generated_item_has_script_filter_shape() {
        let registry = sample_registry();
        let item = generate_item(&registry, "tag", "example.com").unwrap();
        assert_eq!(item.title, "tag@example.com");
        assert_eq!(item.arg, "tag@example.com");
        assert_eq!(item.subtitle, "Create alias tag on homelab");
        assert!(item.mods.cmd.arg.starts_with("tag"));
        assert!(item.mods.cmd.arg.ends_with("@example.com"));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "default");
        assert_eq!(json["icon"]["path"], "icon.png");
        assert!(json["mods"]["cmd"]["subtitle"].is_string());
    }

    #[test]
    fn generated_item_fails_for_unmanaged_domain() {
        let registry = sample_registry();
        assert!(generate_item(&registry, "tag", "nowhere.net").is_err());
    }
}
