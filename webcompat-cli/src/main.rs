use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "webcompat",
    version,
    about = "Correlate webcompat reports with Bugzilla defects and dump dashboard metrics"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0  = success
///   1  = general/unknown error
///   2  = configuration or credentials error
///   4  = issue cache (database) error
///   5  = GitHub/Bugzilla API error
///   7  = report could not be written
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    // Upstream error text may echo a response body, so it is matched first.
    if lower.contains("github api") || lower.contains("bugzilla api") {
        5
    } else if lower.contains("config") || lower.contains("github token") {
        2
    } else if lower.contains("cache") || lower.contains("sqlite") || lower.contains("database") {
        4
    } else if lower.contains("cannot write report") {
        7
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Every request is awaited in sequence; one thread is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    let global = commands::GlobalArgs { quiet: cli.quiet };
    match runtime.block_on(commands::run(cli.command, global)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
