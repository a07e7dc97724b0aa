//! `boxalias` - provision mail-forwarding aliases on Mail-in-a-Box servers.
//!
//! Two entry points: `create` performs the authenticated alias upsert,
//! `suggest` emits picker items for an interactive launcher. Every error is
//! terminal; this binary is the only place that chooses an exit code.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod suggest;

use std::env;
use std::process::ExitCode;

use anyhow::bail;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boxalias_core::{Config, OnePasswordCli, SessionClient, provision, router};

const USAGE: &str = "usage: boxalias create <alias> [forwards-to] | boxalias suggest [query]";

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxalias=debug,boxalias_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("boxalias: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    match args.first().map(String::as_str) {
        Some("create") => {
            let Some(alias) = args.get(1) else {
                bail!(USAGE);
            };
            create(alias, args.get(2).map(String::as_str)).await
        }
        Some("suggest") => suggest::run(args.get(1).map_or("", String::as_str)),
        _ => bail!(USAGE),
    }
}

/// Resolves the server for `alias`, authenticates and performs the upsert.
///
/// An explicit forwarding target wins; otherwise the target is inferred from
/// the alias domain. The confirmation line goes to stdout.
async fn create(alias: &str, explicit_target: Option<&str>) -> anyhow::Result<()> {
    let (mut registry, targets) = Config::load()?.into_parts();

    let server_name = router::resolve_server(&registry, alias)?.name.clone();
    let alias_domain = alias.rsplit_once('@').map_or("", |(_, domain)| domain);
    let forwards_to = match explicit_target {
        Some(target) => target.to_string(),
        None => router::match_best_target(&targets, alias_domain)?.to_string(),
    };

    let record = registry.lookup_by_name_mut(&server_name)?;
    let provider = OnePasswordCli::new();
    let mut client = SessionClient::new();
    client.ensure_session(record, &provider).await?;

    let outcome = provision::upsert_alias(&mut client, record, alias, &forwards_to).await?;
    println!("{outcome}");
    Ok(())
}
