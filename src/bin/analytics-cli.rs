use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use analytics_relay::analytics::{bootstrap, Properties};
use analytics_relay::config;

#[derive(Parser)]
#[command(name = "analytics-cli")]
#[command(about = "Send analytics events through the configured client", long_about = None)]
struct Cli {
    /// TOML configuration file; its [analytics] section is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a custom event
    Capture {
        event: String,
        /// Event properties as a JSON object
        #[arg(short, long)]
        properties: Option<String>,
        /// Identify as this user before capturing
        #[arg(short, long)]
        distinct_id: Option<String>,
    },
    /// Identify a user and set person properties
    Identify {
        distinct_id: String,
        /// Person properties as a JSON object
        #[arg(short, long)]
        properties: Option<String>,
    },
    /// Record a pageview for a path
    Pageview { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analytics_relay=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::load_from_env()?,
    };

    let analytics = bootstrap(&config.analytics, config.mode);
    if !analytics.is_enabled() {
        eprintln!("No analytics client key configured; nothing was sent.");
        return Ok(());
    }

    match cli.command {
        Commands::Capture { event, properties, distinct_id } => {
            if let Some(id) = distinct_id {
                analytics.identify(&id, None);
            }
            analytics.capture(&event, parse_properties(properties.as_deref())?);
        }
        Commands::Identify { distinct_id, properties } => {
            analytics.identify(&distinct_id, parse_properties(properties.as_deref())?);
            if let Some(client) = analytics.client() {
                println!("{}", client.person_url(&distinct_id));
            }
        }
        Commands::Pageview { path } => {
            analytics.after_navigation(&path);
        }
    }

    analytics.flush().await;
    Ok(())
}

fn parse_properties(raw: Option<&str>) -> Result<Option<Properties>, Box<dyn std::error::Error>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err("properties must be a JSON object".into()),
    }
}
