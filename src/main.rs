//! Veilcrawl main entry point
//!
//! This is the command-line interface for the Veilcrawl anonymized crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use veilcrawl::config::{load_config_with_hash, validate, Config};
use veilcrawl::crawler::{CrawlLoop, HtmlCrawler};
use veilcrawl::output::{print_summary, write_json_lines};
use veilcrawl::session::SessionProvisioner;

/// Veilcrawl: a paced crawler that routes every request through an
/// anonymizing proxy
///
/// Each run requests a fresh network identity over the proxy's control port,
/// picks a random user agent, then visits the targets one by one and prints
/// the extracted page data as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "veilcrawl")]
#[command(version)]
#[command(about = "An anonymized, paced web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Target URL to crawl; replaces the configured targets (repeatable)
    #[arg(short, long = "target", value_name = "URL")]
    targets: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if !cli.targets.is_empty() {
        config.targets = cli.targets.clone();
        validate(&config).context("invalid --target")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only JSON lines.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("veilcrawl=info,warn"),
            1 => EnvFilter::new("veilcrawl=debug,info"),
            2 => EnvFilter::new("veilcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the plan without touching the network
fn handle_dry_run(config: &Config) {
    println!("=== Veilcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Delay between requests: {}s", config.crawler.delay_seconds);
    println!("  Delay after last target: {}", config.crawler.delay_after_last);
    println!("  On failure: {:?}", config.crawler.on_failure);
    match config.crawler.rotate_every {
        Some(n) => println!("  Rotate identity every: {} targets", n),
        None => println!("  Rotate identity every: never (one identity per run)"),
    }
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nAnonymizer:");
    println!("  Proxy: {}", config.anonymizer.proxy_endpoint);
    println!(
        "  Control port: {}:{}",
        config.anonymizer.control_host, config.anonymizer.control_port
    );
    println!(
        "  Credential: {}",
        if config.anonymizer.credential.is_some() {
            "configured"
        } else {
            "none"
        }
    );

    println!("\nIdentity Pool ({}):", config.identity.pool.len());
    for agent in &config.identity.pool {
        println!("  - {}", agent);
    }

    println!("\nTargets ({}):", config.targets.len());
    for target in &config.targets {
        println!("  * {}", target);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let provisioner = SessionProvisioner::from_config(&config)?;
    let crawl_loop = CrawlLoop::new(config.targets, config.crawler, provisioner);

    match crawl_loop.crawl(&HtmlCrawler::new()).await {
        Ok(report) => {
            write_json_lines(&report, std::io::stdout().lock())?;
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
