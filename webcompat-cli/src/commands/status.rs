use anyhow::Context;
use clap::Args;

use webcompat_core::store::IssueStore;

use super::CacheArgs;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub cache: CacheArgs,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let store = super::open_cache(&args.cache.cache)?;
    let stats = store.stats().await.context("Failed to read issue cache stats")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let path = store.db_path().unwrap_or(args.cache.cache.as_path());
    println!("Issue cache: {}", path.display());
    println!();
    println!("  Issues:    {}", stats.issue_count);
    println!("  Open:      {}", stats.open_count);
    println!(
        "  Watermark: {}",
        stats.watermark.as_deref().unwrap_or("none (next refresh fetches everything)")
    );
    Ok(())
}
