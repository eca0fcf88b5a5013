use anyhow::Context;
use clap::{Parser, Subcommand};
use duallens_core::analysis::{self, AnalysisConfig, Analyzer};
use duallens_core::ingest::provider::HttpJsonMetricsProvider;
use duallens_core::scoring::screen::{screen, ScreenCriteria};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod universe;

use universe::Universe;

#[derive(Debug, Parser)]
#[command(name = "duallens_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score each ticker and print the ranked report as JSON.
    Analyze {
        /// Ticker to analyse; repeatable. Defaults to the selected universe.
        #[arg(long = "ticker")]
        tickers: Vec<String>,

        #[arg(long, value_enum, default_value_t = Universe::Seed)]
        universe: Universe,

        /// Keep only the N best recommendations.
        #[arg(long)]
        top_n: Option<usize>,

        /// Resolve config and tickers, then exit without calling any service.
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch metrics and print tickers passing the basic quality screen.
    Screen {
        #[arg(long = "ticker")]
        tickers: Vec<String>,

        #[arg(long, value_enum, default_value_t = Universe::Nasdaq100)]
        universe: Universe,

        #[arg(long, default_value_t = 50.0)]
        max_pe: f64,

        /// Minimum market cap in USD.
        #[arg(long, default_value_t = 10.0e9)]
        min_market_cap: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = duallens_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let config = AnalysisConfig::from_env()?;

    match args.command {
        Command::Analyze {
            tickers,
            universe,
            top_n,
            dry_run,
        } => {
            let tickers = universe::resolve_tickers(&tickers, universe)?;

            if dry_run {
                tracing::info!(
                    dry_run = true,
                    tickers_len = tickers.len(),
                    top_k = config.top_k,
                    timeout_ms = config.timeout_ms,
                    weight_quantitative = config.weights.quantitative(),
                    weight_qualitative = config.weights.qualitative(),
                    "analysis run (dry-run)"
                );
                return Ok(());
            }

            let analyzer = Analyzer::from_settings(&settings)?;
            let report = analyzer.analyze_batch(&tickers, &config, top_n).await?;

            for failure in &report.failures {
                let err = anyhow::anyhow!("{}", failure.message)
                    .context(format!("analysis failed for {}", failure.ticker));
                sentry_anyhow::capture_anyhow(&err);
            }

            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
            tracing::info!(
                run_id = %report.run_id,
                recommendations = report.recommendations.len(),
                failures = report.failures.len(),
                "analysis run finished"
            );
        }
        Command::Screen {
            tickers,
            universe,
            max_pe,
            min_market_cap,
        } => {
            let tickers = universe::resolve_tickers(&tickers, universe)?;
            let provider = HttpJsonMetricsProvider::from_settings(&settings)?;

            let mut rows = Vec::with_capacity(tickers.len());
            for ticker in tickers {
                match analysis::fetch_metrics(&provider, &ticker, config.timeout_ms).await {
                    Ok(metrics) => rows.push((ticker, metrics)),
                    Err(err) => {
                        tracing::warn!(%ticker, error = %err.describe(), "skipping ticker in screen")
                    }
                }
            }

            let criteria = ScreenCriteria {
                max_pe,
                min_market_cap_usd: min_market_cap,
            };
            let passed = screen(rows, &criteria);
            println!(
                "{}",
                serde_json::to_string_pretty(&passed).context("failed to serialize screen")?
            );
        }
    }

    Ok(())
}

fn init_sentry(settings: &duallens_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
