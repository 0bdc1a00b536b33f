use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use webcompat_core::config::CompatConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration
    #[arg(default_value = super::DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            args.path.display()
        );
    }
    let text = CompatConfig::default()
        .to_toml_string()
        .context("Cannot render default config")?;
    std::fs::write(&args.path, text)
        .with_context(|| format!("Cannot write config: {}", args.path.display()))?;
    println!("Wrote {}", args.path.display());
    Ok(())
}
