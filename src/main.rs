use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use job_salary_scraper::app::normalize_use_case::{BatchSummary, NormalizeJobPostsUseCase};
use job_salary_scraper::app::ports::RateLookupPort;
use job_salary_scraper::config::{Config, DEFAULT_CONFIG_PATH};
use job_salary_scraper::currency::{CurrencyConverter, CurrencyTable, RateCache};
use job_salary_scraper::infra::{HttpRateLookup, NdjsonOutput, StaticRateLookup};
use job_salary_scraper::job_post::JobPostPage;
use job_salary_scraper::observability::{self, metrics};
use job_salary_scraper::salary::SalaryNormalizer;

#[derive(Parser)]
#[command(name = "job_salary_scraper")]
#[command(about = "Extract and normalize salaries from cached job post webpages")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Destination currency code, overrides the configuration
    #[arg(long, global = true)]
    dest: Option<String>,

    /// Use the fixed rates from the configuration instead of the rate service
    #[arg(long, global = true)]
    offline: bool,

    /// Print Prometheus metrics when the command finishes
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse salary texts such as "€42k - 75k | Equity"
    Parse {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Extract job data from cached job post pages and normalize their salaries
    Extract {
        /// HTML files, or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Number of job posts normalized at the same time
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Write NDJSON records to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert one unit of BASE into DEST
    Rate { base: String, dest: String },
}

fn build_normalizer(config: &Config, offline: bool) -> Result<SalaryNormalizer> {
    let table = CurrencyTable::load(config.currency.table_path.as_deref())
        .context("failed to load the currency table")?;

    let lookup: Arc<dyn RateLookupPort> = if offline {
        let fixed = StaticRateLookup::new(config.rates.fixed.clone());
        if fixed.is_empty() {
            warn!("Offline mode without [rates.fixed]: every conversion will fail");
        } else {
            info!("Offline mode: {} fixed rates configured", config.rates.fixed.len());
        }
        Arc::new(fixed)
    } else {
        Arc::new(HttpRateLookup::new(&config.rates)?)
    };
    let cache = RateCache::new(config.rates.cache_ttl());
    let converter = CurrencyConverter::new(lookup, cache);

    Ok(SalaryNormalizer::new(
        Arc::new(table),
        Arc::new(converter),
        config.currency.destination.clone(),
    ))
}

/// Expand directories into the `.html` files they contain
fn collect_pages(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
                .collect();
            entries.sort();
            pages.extend(entries);
        } else {
            pages.push(path.clone());
        }
    }
    Ok(pages)
}

fn print_summary(summary: &BatchSummary, dest: &str) {
    eprintln!("\n📊 Salary summary ({}):", dest);
    eprintln!("   Job posts: {}", summary.total_posts);
    eprintln!("   With salary: {}", summary.posts_with_salary);
    eprintln!("   Normalized: {}", summary.posts_normalized);
    eprintln!("   Outliers removed: {}", summary.outliers_removed);
    if let Some(stats) = &summary.mid_range_stats {
        eprintln!(
            "   Mid-range: mean {:.0}, std {:.0}, min {:.0}, max {:.0}",
            stats.mean, stats.std_dev, stats.min, stats.max
        );
    }
    for group in summary.average_by_country.iter().take(10) {
        eprintln!("   {:<20} {:>10.0} ({} posts)", group.key, group.average, group.count);
    }
    if !summary.issues_by_kind.is_empty() {
        eprintln!("\n⚠️  Issues encountered:");
        for (kind, count) in &summary.issues_by_kind {
            eprintln!("   - {}: {}", kind, count);
        }
    }
}

async fn run_extract(
    normalizer: SalaryNormalizer,
    config: &Config,
    paths: &[PathBuf],
    concurrency: usize,
    output: Option<&Path>,
) -> Result<()> {
    let pages = collect_pages(paths)?;
    info!("Extracting {} job post pages", pages.len());

    let mut posts = Vec::with_capacity(pages.len());
    for page in &pages {
        match JobPostPage::from_path(page) {
            Ok(post) => posts.push((page.display().to_string(), post)),
            Err(e) => error!("Skipping {}: {}", page.display(), e),
        }
    }

    let sink = Arc::new(match output {
        Some(path) => NdjsonOutput::to_file(path)?,
        None => NdjsonOutput::stdout(),
    });
    let dest = normalizer.dest_code().to_string();
    let use_case = NormalizeJobPostsUseCase::new(Arc::new(normalizer), sink.clone(), config.stats.clone())
        .with_concurrency(concurrency);

    let (_, summary) = use_case.normalize_batch(posts).await?;
    sink.flush().await?;
    print_summary(&summary, &dest);
    Ok(())
}

/// One unit of `base` expressed in `dest`
async fn run_rate(normalizer: &SalaryNormalizer, base: &str, dest: &str) -> Result<String> {
    let (base, dest) = (base.to_uppercase(), dest.to_uppercase());
    let conversion = normalizer
        .converter()
        .convert(1, &base, &dest)
        .await
        .with_context(|| format!("no rate for {}->{}", base, dest))?;
    Ok(format!(
        "1 {} = {} {} (at {})",
        base, conversion.rate, dest, conversion.timestamp
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load_from(&cli.config)?;
    if let Some(dest) = cli.dest {
        config.currency.destination = dest.to_uppercase();
        config.validate()?;
    }

    let _log_guard = observability::init_logging(&config.logging.directory);
    match &config.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No config file at {}, using defaults", cli.config.display()),
    }
    if let Err(e) = metrics::init() {
        warn!("Metrics disabled: {}", e);
    }

    let normalizer = build_normalizer(&config, cli.offline)?;

    match cli.command {
        Commands::Parse { texts } => {
            for text in &texts {
                let salary = normalizer.parse_range(text).await;
                println!("{}", serde_json::to_string(&salary)?);
            }
        }
        Commands::Extract { paths, concurrency, output } => {
            run_extract(normalizer, &config, &paths, concurrency, output.as_deref()).await?;
        }
        Commands::Rate { base, dest } => {
            println!("{}", run_rate(&normalizer, &base, &dest).await?);
        }
    }

    if cli.print_metrics {
        if let Some(rendered) = metrics::render() {
            eprintln!("{}", rendered);
        }
    }
    Ok(())
}
