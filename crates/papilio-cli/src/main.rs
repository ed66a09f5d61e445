//! `papilio-loader` entry point and composition root.

use anyhow::Context;
use clap::Parser;
use papilio_cli::{Cli, Commands, handlers, logging};
use papilio_core::{Settings, validate_settings};
use papilio_runtime::build_services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.stdout_is_protocol());

    let mut settings = Settings::from_env().context("Invalid PAPILIO_* environment")?;
    cli.apply_overrides(&mut settings);
    validate_settings(&settings)?;

    let services = build_services(&settings);

    match cli.command {
        Commands::Web(_) => handlers::serve::web(services, &settings).await,
        Commands::Mcp => handlers::serve::mcp(services).await,
        Commands::Both(_) => handlers::serve::both(services, &settings).await,
        Commands::Ports => handlers::ports::execute(services).await,
        Commands::Flash(args) => handlers::flash::execute(services, args).await,
    }
}
