use clap::Args;

use webcompat_core::fetch::refresh_cache;

use super::{CacheArgs, GlobalArgs, TokenArgs};

#[derive(Args, Debug)]
pub struct RefreshArgs {
    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub token: TokenArgs,
}

pub async fn run(args: RefreshArgs, global: GlobalArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.cache.config.as_deref())?;
    let feed = super::github_feed(&config, &args.token)?;
    let store = super::open_cache(&args.cache.cache)?;
    let progress = super::progress(global.quiet);

    let stats = refresh_cache(&store, &feed, &progress).await?;

    if !global.quiet {
        match &stats.since {
            Some(since) => println!("Fetched {} issues updated since {since}", stats.issues_written),
            None => println!("Fetched {} issues (full fetch)", stats.issues_written),
        }
    }
    Ok(())
}
