//! smsgate - Rule-based SMS gateway
//!
//! Accepts send requests over HTTP and forwards each message to the
//! delivery provider chosen by the configured routing rules.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smsgate::config::{Config, ConfigError};

#[derive(Parser)]
#[command(name = "smsgate")]
#[command(about = "Rule-based SMS gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// Override listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Validate configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Show configured providers and routing rules
    Providers {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
}

impl Commands {
    fn config_path(&self) -> &str {
        match self {
            Commands::Serve { config, .. }
            | Commands::Check { config }
            | Commands::Providers { config } => config,
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("smsgate={},tower_http={}", level, level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn report(path: &str, error: &ConfigError) {
    match error.violations() {
        Some(violations) => {
            eprintln!("{}: invalid configuration", path);
            for violation in violations.iter() {
                eprintln!("  {}", violation);
            }
        }
        None => eprintln!("{}: {}", path, error),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let path = cli.command.config_path().to_string();

    let loaded = Config::from_file(&path);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    tracing::info!(config = %path, "Loading configuration");
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            report(&path, &e);
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Serve { listen, .. } => {
            if let Some(addr) = listen {
                tracing::info!(listen = %addr, "Override listen address");
                config.server.listen = addr;
            }
            smsgate::proxy::run_server(config).await
        }

        Commands::Check { .. } => {
            println!(
                "{}: OK ({} providers, {} rules)",
                path,
                config.routing.providers.len(),
                config.routing.rules.len()
            );
            Ok(())
        }

        Commands::Providers { .. } => {
            println!("Providers:");
            for provider in &config.routing.providers {
                println!("  {:<24} {}", provider.name, provider.provider_type());
            }
            println!("Rules (first match wins, last default is the fallback):");
            for (i, rule) in config.routing.rules.iter().enumerate() {
                println!("  {:>3}. {}", i, rule);
            }
            Ok(())
        }
    }
}
