// ABOUTME: CLI entry point for pseudo-node-osc
// ABOUTME: Parses the mode switches, loads configuration and streams osmChange to stdout

use anyhow::Context;
use clap::Parser;
use pseudo_node_osc::commands::{self, Mode};
use pseudo_node_osc::{postgres, Config};
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pseudo-node-osc")]
#[command(about = "Export pseudo nodes as an osmChange document", long_about = None)]
#[command(version)]
struct Cli {
    /// Full dump: every pseudo node as a create
    #[arg(short = 'f', long = "full")]
    full: bool,
    /// Diff: flagged pseudo nodes as delete/modify/create, clearing the flags
    #[arg(short = 'd', long = "diff")]
    diff: bool,
    /// Path to a TOML configuration file (defaults to ./pseudo-node-osc.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// PostgreSQL connection URL, overriding the configuration file
    #[arg(long = "database-url", env = "PSEUDO_NODES_DATABASE_URL")]
    database_url: Option<String>,
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log: String,
    /// Allow self-signed TLS certificates (insecure - use only for testing)
    #[arg(long = "allow-self-signed-certs", default_value_t = false)]
    allow_self_signed_certs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log. Logs go to stderr; stdout carries the document.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(mode) = Mode::from_flags(cli.full, cli.diff) else {
        println!("{}", commands::USAGE);
        return Ok(());
    };

    postgres::init_tls_policy(cli.allow_self_signed_certs);

    let config = Config::resolve(cli.config.as_deref())?.with_database_url(cli.database_url);
    config.validate().context("Invalid configuration")?;

    let mut client = postgres::connect_with_retry(&config.database.url).await?;

    let stdout = std::io::stdout();
    let out = BufWriter::new(stdout.lock());

    match mode {
        Mode::Full => commands::dump::run(&mut client, &config, out).await?,
        Mode::Diff => commands::diff::run(&mut client, &config, out).await?,
    };

    Ok(())
}
