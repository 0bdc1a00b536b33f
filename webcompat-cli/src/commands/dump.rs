use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use tracing::info;

use webcompat_core::fetch::{BugzillaClient, IssueFeed};
use webcompat_core::pipeline::DashboardPipeline;

use super::{CacheArgs, GlobalArgs, TokenArgs};

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Where to write the report
    #[arg(default_value = "webcompat.json")]
    pub output: PathBuf,

    /// Refresh the issue cache from GitHub before building the report
    #[arg(long)]
    pub refresh: bool,

    /// Pretty-print the JSON (overrides dashboard.pretty_output)
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub token: TokenArgs,
}

pub async fn run(args: DumpArgs, global: GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.cache.config.as_deref())?;

    // Resolve the token up front so a missing one fails before any fetch.
    let feed = if args.refresh {
        Some(super::github_feed(&config, &args.token)?)
    } else {
        None
    };

    let store = super::open_cache(&args.cache.cache)?;
    let bugzilla = BugzillaClient::new(&config.bugzilla)?;
    let progress = super::progress(global.quiet);

    let result = DashboardPipeline::new(&config)
        .run_with_progress(
            &store,
            &bugzilla,
            feed.as_ref().map(|f| f as &dyn IssueFeed),
            Utc::now(),
            &progress,
        )
        .await
        .context("Report run failed")?;

    let json = result
        .report
        .to_json(args.pretty || config.dashboard.pretty_output)
        .context("Cannot write report: serialization failed")?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Cannot write report: {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        duration_ms = result.duration.as_millis(),
        "Report written"
    );
    if !global.quiet {
        if let Some(refresh) = &result.refresh {
            println!("  Issues refreshed: {}", refresh.issues_written);
        }
        println!("  Issues used:      {} of {}", result.issues_used, result.issues_cached);
        println!("  Linked defects:   {}", result.linked_defects);
        println!("  Partner defects:  {}", result.partner_defects);
        println!("  Report:           {}", args.output.display());
    }
    Ok(())
}
