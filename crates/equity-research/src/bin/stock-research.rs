//! Research one stock from the command line
//!
//! # Usage
//!
//! ```bash
//! export GOOGLE_API_KEY=...
//! export TAVILY_API_KEY=...
//!
//! cargo run --bin stock-research -- --ticker AAPL
//! cargo run --bin stock-research -- --ticker MSFT --max-iterations 1 --json
//! ```
//!
//! Without `--ticker` the symbol is read from stdin.

use anyhow::{Context, Result};
use clap::Parser;
use equity_research::orchestrator::normalize_ticker;
use equity_research::{ResearchConfig, ResearchOrchestrator};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-research")]
#[command(about = "Multi-agent equity research report for a single ticker", long_about = None)]
struct Args {
    /// Ticker symbol, e.g. AAPL; prompted for when omitted
    #[arg(short, long)]
    ticker: Option<String>,

    /// Maximum number of critique-driven revisions
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Print the report as JSON instead of markdown
    #[arg(long)]
    json: bool,
}

fn read_ticker() -> Result<String> {
    print!("Enter a stock ticker (e.g. AAPL, TSLA, NVDA): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("failed to read ticker from stdin")?;
    Ok(input)
}

async fn run(args: Args) -> Result<()> {
    let mut config = ResearchConfig::from_env().context("invalid configuration")?;
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }

    let raw = match args.ticker {
        Some(ticker) => ticker,
        None => read_ticker()?,
    };
    let ticker = normalize_ticker(&raw)?;

    let orchestrator = ResearchOrchestrator::from_config(&config)
        .context("failed to initialize research orchestrator")?;
    info!(
        ticker = %ticker,
        model = config.model(),
        market_provider = ?config.market_provider,
        "Starting research"
    );

    let report = orchestrator
        .run(&ticker)
        .await
        .with_context(|| format!("research on {ticker} failed"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_markdown());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    research_runtime::logging::init_tracing("warn,equity_research=info,research_runtime=info");

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
