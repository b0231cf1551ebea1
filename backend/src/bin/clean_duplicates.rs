//! Remove duplicate chat messages left behind by older clients.
//!
//! Two messages in one conversation are duplicates when they share a role,
//! the same content, and the same creation second. The oldest copy survives
//! and the conversation's message count is reset to what remains.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::sync::Arc;

use bookchat::domain::{CleanupReport, DuplicateMessageCleaner};
use bookchat::outbound::persistence::{DbPool, DieselConversationRepository, PoolConfig};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};

/// `clean-duplicates` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clean-duplicates",
    about = "Delete repeated chat messages and repair conversation message counts",
    version
)]
struct CliArgs {
    /// Report what would be removed without deleting anything.
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Database connection URL. Falls back to `BOOKCHAT_DATABASE_URL`, then
    /// `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .try_init();

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    let report = runtime.block_on(clean(args))?;
    print_report(&report);
    Ok(())
}

async fn clean(args: CliArgs) -> Result<CleanupReport> {
    let database_url = resolve_database_url(args.database_url, |name| env::var(name).ok())?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|err| eyre!("create database pool: {err}"))?;
    let cleaner = DuplicateMessageCleaner::new(Arc::new(DieselConversationRepository::new(pool)));
    cleaner
        .run(args.dry_run)
        .await
        .map_err(|err| eyre!("cleanup failed: {err}"))
}

fn print_report(report: &CleanupReport) {
    for entry in report
        .conversations
        .iter()
        .filter(|entry| entry.duplicates > 0)
    {
        println!(
            "conversation={} messages={} duplicates={} remaining={}",
            entry.conversation_id, entry.total_messages, entry.duplicates, entry.remaining
        );
    }
    let verb = if report.dry_run { "would_remove" } else { "removed" };
    println!(
        "conversations={} {verb}={}",
        report.conversations.len(),
        report.total_duplicates()
    );
}

fn resolve_database_url(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(eyre!("--database-url must not be empty when provided"));
        }
        return Ok(value);
    }
    ["BOOKCHAT_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
        .ok_or_else(|| {
            eyre!("database URL missing: set --database-url, BOOKCHAT_DATABASE_URL, or DATABASE_URL")
        })
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use rstest::rstest;

    use super::{CliArgs, resolve_database_url};
    use clap::Parser;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[rstest]
    #[case(Some("postgres://cli"), &[("DATABASE_URL", "postgres://env")], "postgres://cli")]
    #[case(None, &[("BOOKCHAT_DATABASE_URL", "postgres://app"), ("DATABASE_URL", "postgres://env")], "postgres://app")]
    #[case(None, &[("BOOKCHAT_DATABASE_URL", " "), ("DATABASE_URL", "postgres://env")], "postgres://env")]
    fn database_url_resolution_order(
        #[case] explicit: Option<&str>,
        #[case] env: &'static [(&'static str, &'static str)],
        #[case] expected: &str,
    ) {
        let url = resolve_database_url(explicit.map(str::to_owned), env_of(env))
            .expect("url should resolve");
        assert_eq!(url, expected);
    }

    #[rstest]
    #[case(Some(""))]
    #[case(None)]
    fn database_url_resolution_fails_without_value(#[case] explicit: Option<&str>) {
        let result = resolve_database_url(explicit.map(str::to_owned), env_of(&[]));
        assert!(result.is_err());
    }

    #[rstest]
    fn dry_run_flag_parses() {
        let args = CliArgs::try_parse_from(["clean-duplicates", "--dry-run"]).expect("args");
        assert!(args.dry_run);
        assert!(args.database_url.is_none());
    }
}
