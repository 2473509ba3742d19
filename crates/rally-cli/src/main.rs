//! CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rally_cli::{Cli, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let migrator = bootstrap(cli.database_url.as_deref()).await?;
    match cli.command {
        Commands::Db { command } => {
            if let Some(output) = handlers::db::run(&migrator, &command).await? {
                println!("{output}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads `RALLY_DATABASE_URL`.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
