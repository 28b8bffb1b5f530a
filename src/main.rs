// src/main.rs

//! secwatch CLI
//!
//! Entry point for both trigger modes: the periodic checker (cron) and
//! the webhook handler (fed by a web server or a pipe).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use secwatch::{
    config::Config,
    error::Result,
    notify::{Notifier, TelegramTransport},
    pipeline::Checker,
    router::{self, Trigger},
    store::{JsonStore, StateStore},
    utils::http::{self, HttpFetcher},
};

/// secwatch - Apple security & firmware watcher
#[derive(Parser, Debug)]
#[command(
    name = "secwatch",
    version,
    about = "Watches Apple security acknowledgements and firmware releases, notifies Telegram subscribers"
)]
struct Cli {
    /// Directory holding state files and the delivery log
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the change checker once
    Check,

    /// Handle an inbound webhook update
    Webhook {
        /// Read the update JSON from this file instead of stdin
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Original query string, for CGI-style dispatch
        #[arg(long)]
        query: Option<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Run one check cycle with live collaborators.
async fn run_check(config: &Config, store: &JsonStore) -> Result<()> {
    let client = http::create_client(&config.http)?;
    let fetcher = HttpFetcher::new(client.clone());
    let transport = TelegramTransport::new(client, &config.bot);
    let notifier = Notifier::new(&transport, store, &config.notify);

    Checker::new(config, &fetcher, store, &notifier).run().await;
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let store = JsonStore::new(&cli.data_dir);

    match cli.command {
        Command::Check => {
            run_check(&config, &store).await?;
        }

        Command::Webhook { payload, query } => {
            if Trigger::resolve(query.as_deref(), None) == Trigger::Check {
                return run_check(&config, &store).await;
            }

            let body = match &payload {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => std::io::read_to_string(std::io::stdin())?,
            };

            let client = http::create_client(&config.http)?;
            let transport = TelegramTransport::new(client, &config.bot);
            let notifier = Notifier::new(&transport, &store, &config.notify);
            router::handle_webhook(&body, &store, &notifier).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK ({} watched devices)", config.devices.len());
        }

        Command::Info => {
            log::info!("Data directory: {}", cli.data_dir.display());

            let subscribers = store.load_subscribers().await?;
            log::info!("Subscribers: {}", subscribers.len());

            match store.load_ack().await? {
                Some(snapshot) => log::info!(
                    "Last notified acknowledgements: {} ({} names)",
                    snapshot.month,
                    snapshot.names.len()
                ),
                None => log::info!("No acknowledgement snapshot yet."),
            }

            let versions = store.load_firmware().await?;
            if versions.is_empty() {
                log::info!("No firmware snapshot yet.");
            } else {
                for (os, label) in &versions {
                    log::info!("{} → {}", os, label);
                }
            }
        }
    }

    Ok(())
}
