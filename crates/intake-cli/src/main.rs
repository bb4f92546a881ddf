use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use intake_cli::{
    cli::{Cli, Commands},
    commands, config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load(cli.config.clone())?;

    // --log-level / --verbose, then RUST_LOG, then the config file
    let env_filter = match cli.requested_level() {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Sync { folders } => commands::sync::execute(config, folders).await?,

        Commands::Check { file } => {
            if !commands::check::execute(&config, &file).await? {
                std::process::exit(1);
            }
        }

        Commands::Config(cmd) => commands::config::execute(&config, cmd)?,
    }

    Ok(())
}
