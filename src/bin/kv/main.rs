// kv - command line access to a sqlkv store

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use sqlkv::{DialectKind, KvClient, StoreOptions};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{execute_del, execute_exists, execute_get, execute_mget, execute_set};

/// Log to stderr so values printed on stdout stay clean
fn init_tracing(verbose: bool) {
    let default = if verbose { "sqlkv=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the store options from --config, or from --driver/--dsn
fn load_options(cli: &Cli) -> Result<StoreOptions> {
    let options = match &cli.config {
        Some(path) => sqlkv::cfg::from_file(path)?,
        None => {
            let dialect: DialectKind = cli.driver.parse()?;
            let dsn = cli
                .dsn
                .clone()
                .unwrap_or_else(|| Cli::default_dsn(dialect.as_str()).to_string());
            StoreOptions::from_target(dialect, &dsn)
        }
    };

    Ok(match &cli.table {
        Some(table) => options.with_table_name(table),
        None => options,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let options = load_options(&cli)?;
    let kv = KvClient::new(options).await?;

    let result = match &cli.command {
        Commands::Get(args) => execute_get(args, &kv).await,
        Commands::Mget(args) => execute_mget(args, &kv).await,
        Commands::Set(args) => execute_set(args, &kv).await,
        Commands::Del(args) => execute_del(args, &kv).await,
        Commands::Exists(args) => execute_exists(args, &kv).await,
    };

    kv.close().await?;
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
