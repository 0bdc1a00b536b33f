pub mod dump;
pub mod init;
pub mod refresh;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};

use webcompat_core::config::CompatConfig;
use webcompat_core::fetch::{GitHubIssueFeed, resolve_token};
use webcompat_core::progress::SpinnerProgress;
use webcompat_core::store::SqliteIssueStore;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "webcompat.toml";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dashboard report and write it as JSON
    Dump(dump::DumpArgs),
    /// Pull new and updated issues into the cache
    Refresh(refresh::RefreshArgs),
    /// Show what the issue cache holds
    Status(status::StatusArgs),
    /// Write a default configuration file
    Init(init::InitArgs),
}

/// Flags that apply to every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct GlobalArgs {
    pub quiet: bool,
}

pub async fn run(cmd: Command, global: GlobalArgs) -> anyhow::Result<()> {
    match cmd {
        Command::Dump(args) => dump::run(args, global).await,
        Command::Refresh(args) => refresh::run(args, global).await,
        Command::Status(args) => status::run(args).await,
        Command::Init(args) => init::run(&args),
    }
}

/// Options shared by commands that read the config and the issue cache.
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// SQLite issue cache
    #[arg(long, default_value = "issues.db")]
    pub cache: PathBuf,

    /// Configuration file (default: ./webcompat.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Options needed to talk to GitHub.
#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// File holding the token, read when neither flag nor env var is set
    #[arg(long, default_value = ".token")]
    pub token_file: PathBuf,
}

/// Load the explicit config file, else `./webcompat.toml`, else defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<CompatConfig> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(CompatConfig::default()),
    };
    CompatConfig::load(path).with_context(|| format!("Cannot load config: {}", path.display()))
}

pub fn open_cache(path: &Path) -> anyhow::Result<SqliteIssueStore> {
    SqliteIssueStore::open(path)
        .with_context(|| format!("Cannot open issue cache: {}", path.display()))
}

/// Build the GitHub feed, failing before any request when no token is found.
pub fn github_feed(config: &CompatConfig, token: &TokenArgs) -> anyhow::Result<GitHubIssueFeed> {
    let token = resolve_token(
        token.github_token.as_deref(),
        &config.github.token_env,
        &token.token_file,
    )?;
    GitHubIssueFeed::new(&config.github, token).context("Cannot build GitHub client")
}

pub fn progress(quiet: bool) -> SpinnerProgress {
    if quiet {
        SpinnerProgress::hidden()
    } else {
        SpinnerProgress::new()
    }
}
