//! Run one aggregation query and print the result as JSON.
//!
//! ```text
//! aggregate --name "Jane Doe" --location Seattle
//! aggregate --email jane@example.com --source directory
//! ```

use aggregation::config::Config;
use aggregation::Query;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "aggregate", about = "Resolve a partial identity query into one profile")]
struct Args {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    address: Option<String>,

    /// Image reference (URL or path) for image-capable sources
    #[arg(long)]
    image: Option<String>,

    /// Query only this source and print its raw payload
    #[arg(long)]
    source: Option<String>,

    /// Override the run deadline
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// List configured sources and exit
    #[arg(long)]
    list_sources: bool,
}

impl Args {
    fn query(&self) -> Query {
        Query {
            name: self.name.clone(),
            location: self.location.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            username: self.username.clone(),
            address: self.address.clone(),
            image: self.image.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aggregation=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(ms) = args.deadline_ms {
        config.orchestrator = config
            .orchestrator
            .with_deadline(Duration::from_millis(ms));
    }
    let orchestrator = config
        .orchestrator()
        .context("Failed to build source registry")?;

    if args.list_sources {
        for id in orchestrator.sources() {
            println!("{}", id);
        }
        return Ok(());
    }

    let query = args.query();
    if query.is_empty() {
        bail!("at least one of --name, --location, --email, --phone, --username, --address or --image is required");
    }

    let output = match &args.source {
        Some(source) => {
            let payload = orchestrator.search_source(source, &query).await?;
            serde_json::to_string_pretty(&payload)?
        }
        None => orchestrator.run(query).await?.to_json()?,
    };

    println!("{}", output);
    Ok(())
}
