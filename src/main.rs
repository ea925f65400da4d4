use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    aggregate::{AppState, ResultAggregator},
    config::{Config, DEFAULT_CONFIG_PATH},
    page_loader::{ChromeLauncher, PageLoader},
    query::{MarketplaceQuery, MatchMode},
};

mod aggregate;
mod config;
mod error;
mod export;
mod listings;
mod page_loader;
mod query;


#[derive(Debug, Parser)]
#[command(name = "marketplace-scraper")]
#[command(about = "Scrapes marketplace search results for a product in a city")]
struct Cli {
    /// Config file holding the registered queries.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}


#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a query.
    Add {
        #[arg(long)]
        city: String,
        #[arg(long)]
        product: String,
        #[arg(long, default_value_t = 0.0)]
        min_price: f64,
        #[arg(long, default_value_t = 1000.0)]
        max_price: f64,
        /// The marketplace's identifier for the city.
        #[arg(long)]
        city_code: String,
    },
    /// Remove the query at a position shown by `list`.
    Remove { position: usize },
    /// Show the registered queries.
    List,
    /// Print the search URL of every registered query.
    Url {
        #[arg(long, value_enum, default_value_t = MatchMode::Exact)]
        mode: MatchMode,
    },
    /// Scrape every registered query and write the results archive.
    Scrape {
        #[arg(long, value_enum, default_value_t = MatchMode::Exact)]
        mode: MatchMode,
        /// Overrides `output_dir` from the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Add { city, product, min_price, max_price, city_code } => {
            let query = MarketplaceQuery { city, product, min_price, max_price, city_code };
            config.queries.add(query).context("Please fill all fields correctly")?;
            config.save(&cli.config)?;
            println!("Marketplace added successfully!");
        }
        Commands::Remove { position } => {
            let removed = config.queries.remove(position)?;
            config.save(&cli.config)?;
            println!("Removed {} / {}", removed.city, removed.product);
        }
        Commands::List => {
            for (position, q) in config.queries.iter().enumerate() {
                println!("{position}\t{}\t{}\t{}\t{}\t{}", q.city, q.product, q.min_price, q.max_price, q.city_code);
            }
        }
        Commands::Url { mode } => {
            for q in config.queries.iter() {
                println!("{}", q.search_url(&config.loader.search_host, mode)?);
            }
        }
        Commands::Scrape { mode, output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            scrape(config, mode, output_dir).await?;
        }
    }

    Ok(())
}


async fn scrape(config: Config, mode: MatchMode, output_dir: PathBuf) -> anyhow::Result<()> {
    if config.queries.is_empty() {
        anyhow::bail!("Please add at least one marketplace to scrape data");
    }

    let loader = PageLoader::new(
        ChromeLauncher { headless: config.loader.headless },
        config.loader.load_settings(),
    );
    let aggregator = ResultAggregator::new(loader, config.loader.search_host, config.loader.listing_base, mode);
    let mut state = AppState::new(config.queries);

    // Browser waits are blocking sleeps; keep them off the async workers.
    let state = tokio::task::spawn_blocking(move || {
        state.scrape(&aggregator);
        state
    })
    .await
    .context("Scrape task panicked")?;

    let Some(report) = state.last_report else {
        return Ok(());
    };
    for failure in &report.failures {
        eprintln!("Failed to scrape {} / {}: {}", failure.query.city, failure.query.product, failure.error);
    }
    if report.all_failed() {
        anyhow::bail!("Every marketplace failed to scrape");
    }

    for result in &report.results {
        println!(
            "{} / {}: {} of {} links matched",
            result.query.city,
            result.query.product,
            result.listings.len(),
            result.links_seen
        );
    }

    match export::build_archive(&report)? {
        Some(archive) => {
            let path = export::write_archive(&output_dir, &archive)
                .await
                .context("Failed to write the results archive. Do we have permissions?")?;
            println!("{} listings written to {}", report.total_listings(), path.display());
        }
        None => println!("No matching listings found"),
    }
    Ok(())
}
