use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use monthly_outlook::analysis::run_batch;
use monthly_outlook::config::{Config, DEFAULT_CONFIG_PATH};
use monthly_outlook::history::{CsvHistoryProvider, PriceHistoryProvider};
use monthly_outlook::model::DateRange;
use monthly_outlook::monthly::aggregate_monthly_with;
use monthly_outlook::nse::NseRestClient;
use monthly_outlook::report::{format_monthly_table, format_summary, write_csv_file};

#[derive(Parser)]
#[command(name = "monthly-outlook")]
#[command(version)]
#[command(about = "Weighted month-over-month direction outlook for NSE equities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Read `{SYMBOL}.csv` files from this directory instead of calling NSE
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Months of history to analyse (overrides analysis.lookback_months)
    #[arg(short, long)]
    months: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate direction for every configured symbol and write the CSV report
    Predict {
        /// Symbols to analyse (repeatable; overrides analysis.symbols)
        #[arg(short, long = "symbol")]
        symbols: Vec<String>,

        /// Report output path (overrides output.report_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the month-over-month change table for one symbol
    Changes {
        #[arg(short, long)]
        symbol: String,
    },
}

fn init_tracing(config: &Config, verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        };
        level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_provider(config: &Config, cli_dir: Option<PathBuf>) -> Result<Box<dyn PriceHistoryProvider>> {
    match cli_dir.or_else(|| config.output.data_dir.clone()) {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Using offline CSV history");
            Ok(Box::new(CsvHistoryProvider::new(dir)))
        }
        None => Ok(Box::new(NseRestClient::new(&config.nse)?)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load_from(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config, cli.verbose);

    let params = config.analysis.to_params()?;
    let months = cli.months.unwrap_or(config.analysis.lookback_months);
    if months == 0 {
        bail!("--months must be > 0");
    }
    let today = chrono::Local::now().date_naive();
    let range = DateRange::trailing_months(today, months);
    let provider = build_provider(&config, cli.data_dir)?;

    tracing::info!(
        start = %range.start,
        end = %range.end,
        anchor = %params.anchor,
        trim = params.trim.as_str(),
        weights = params.weights.as_str(),
        "Starting monthly-outlook"
    );

    match cli.command {
        Commands::Predict { symbols, output } => {
            let symbols = if symbols.is_empty() {
                config.analysis.symbol_list()
            } else {
                symbols
                    .iter()
                    .map(|s| s.trim().to_ascii_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            };
            if symbols.is_empty() {
                bail!("no symbols configured");
            }

            let outcome = run_batch(&provider, &symbols, range, &params);
            for report in &outcome.reports {
                println!("\n{}", format_summary(report));
            }
            for skipped in &outcome.skipped {
                println!("Skipped {}: {}", skipped.symbol, skipped.reason);
            }
            if outcome.is_empty() {
                bail!("no predictions produced for {} symbol(s)", symbols.len());
            }

            let path = output.unwrap_or_else(|| config.output.report_path.clone());
            write_csv_file(&path, &outcome.reports)?;
            println!("\nAll predictions saved to {}", path.display());
        }
        Commands::Changes { symbol } => {
            let symbol = symbol.trim().to_ascii_uppercase();
            let observations = provider
                .load_history(&symbol, &range)
                .with_context(|| format!("failed to load history for {}", symbol))?;
            let monthly = aggregate_monthly_with(&observations, params.anchor)?;
            print!("{}", format_monthly_table(&symbol, &monthly));
        }
    }

    Ok(())
}
