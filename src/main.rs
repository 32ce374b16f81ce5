mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use lb_core::config::Config;
use std::path::Path;
use tokio_util::sync::CancellationToken;

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting lookbook {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    lb_server::start(config, CancellationToken::new()).await?;
    Ok(())
}

fn check_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let warnings = config.validate()?;

    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!("{}", toml::to_string_pretty(&config).context("failed to render config")?);
    println!("Configuration is valid");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "lookbook=trace,lb_server=trace,lb_imaging=trace,lb_cache=trace,lb_core=debug,tower_http=debug".to_string()
        } else {
            "lookbook=debug,lb_server=debug,lb_imaging=debug,lb_cache=debug,lb_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let config = Config::load(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(config, host, port))
        }
        Commands::CheckConfig => check_config(cli.config.as_deref()),
        Commands::Version => {
            println!("lookbook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
