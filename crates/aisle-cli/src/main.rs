mod crawl;
mod store;

use std::path::PathBuf;

use aisle_core::CrawlTarget;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "aisle")]
#[command(about = "Crawl the full product catalog of a single store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl every product of a store, writing raw pages under a job directory
    Crawl {
        #[command(flatten)]
        target: StoreArgs,
        /// Directory to create the job folder in (defaults to `AISLE_DATA_ROOT`)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Report a store's catalog size and the crawl mode it would need
    Probe {
        #[command(flatten)]
        target: StoreArgs,
    },
}

#[derive(Debug, Clone, Copy, clap::Args)]
struct StoreArgs {
    /// Region number, e.g. 479
    #[arg(long)]
    region: u32,
    /// Store number within the region, e.g. 30
    #[arg(long)]
    store: u32,
}

impl From<StoreArgs> for CrawlTarget {
    fn from(args: StoreArgs) -> Self {
        CrawlTarget::new(args.region, args.store)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = aisle_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Crawl { target, output } => {
            let root = output.unwrap_or_else(|| config.data_root.clone());
            crawl::run_crawl(&config, target.into(), &root).await
        }
        Commands::Probe { target } => crawl::run_probe(&config, target.into()).await,
    }
}
