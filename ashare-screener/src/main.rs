//! A-Share Screener CLI.
//!
//! `screen` runs a filtered, scored, ranked screen over a scope;
//! `fetch` pulls per-stock documents or lists a scope's codes.
//! Results go to stdout (or `--output`); logs go to stderr.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ashare_screener::data::{
    DataKind, EastmoneyProvider, RetryPolicy, Scope, StockFetcher, DEFAULT_FINANCIAL_YEARS,
};
use ashare_screener::screener::{
    FilterParams, ReportFormat, ScreenReport, ScreenRequest, ScreenerEngine, SortKey,
};
use screener_common::config::Config;
use screener_common::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "ashare-screener")]
#[command(version)]
#[command(about = "A股股票筛选与数据获取工具", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Screen stocks by valuation and quality thresholds
    Screen {
        /// Scope: all / hs300 / zz500 / zz1000 / cyb / kcb / custom:CODE1,CODE2
        #[arg(long)]
        scope: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Sort key: score / pe / pb / market_cap
        #[arg(long)]
        sort_by: Option<SortKey>,

        /// Keep the first N stocks (0 keeps all)
        #[arg(long)]
        top: Option<usize>,

        /// Output format: json / markdown
        #[arg(long, default_value = "json")]
        format: ReportFormat,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fetch per-stock data or list a scope's codes
    #[command(group(ArgGroup::new("target").required(true).args(["code", "codes", "scope"])))]
    Fetch {
        /// Stock code (e.g., 600519)
        #[arg(long)]
        code: Option<String>,

        /// Comma-separated stock codes (e.g., 600519,000858)
        #[arg(long)]
        codes: Option<String>,

        /// List the codes in a scope: all / hs300 / zz500 / zz1000 / cyb / kcb
        #[arg(long)]
        scope: Option<String>,

        /// Data type: all / basic / financial / valuation / holder
        #[arg(long, default_value = "basic")]
        data_type: DataKind,

        /// Years of financial statements (financial and all)
        #[arg(long, default_value_t = DEFAULT_FINANCIAL_YEARS)]
        years: u32,

        /// Bypass the document cache
        #[arg(long)]
        no_cache: bool,

        /// Output file path (JSON)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Filter bounds. Percentages in %, market cap in 亿.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Minimum PE
    #[arg(long)]
    pe_min: Option<f64>,
    /// Maximum PE
    #[arg(long)]
    pe_max: Option<f64>,
    /// Minimum PB
    #[arg(long)]
    pb_min: Option<f64>,
    /// Maximum PB
    #[arg(long)]
    pb_max: Option<f64>,
    /// Minimum ROE (%)
    #[arg(long)]
    roe_min: Option<f64>,
    /// Maximum debt ratio (%)
    #[arg(long)]
    debt_ratio_max: Option<f64>,
    /// Minimum dividend yield (%)
    #[arg(long)]
    dividend_min: Option<f64>,
    /// Minimum market cap (亿)
    #[arg(long)]
    market_cap_min: Option<f64>,
    /// Maximum market cap (亿)
    #[arg(long)]
    market_cap_max: Option<f64>,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        Self {
            pe_max: args.pe_max,
            pe_min: args.pe_min,
            pb_max: args.pb_max,
            pb_min: args.pb_min,
            roe_min: args.roe_min,
            debt_ratio_max: args.debt_ratio_max,
            dividend_min: args.dividend_min,
            market_cap_min: args.market_cap_min,
            market_cap_max: args.market_cap_max,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<screener_common::Error>()
            .map_or(1, screener_common::Error::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_with_env()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );
    tracing::debug!("ashare-screener v{}", env!("CARGO_PKG_VERSION"));

    let provider = Arc::new(EastmoneyProvider::from_config(&config.data));
    let retry = RetryPolicy::from_config(&config.data);

    match cli.command {
        Commands::Screen {
            scope,
            filters,
            sort_by,
            top,
            format,
            output,
        } => {
            let mut request = ScreenRequest::from_defaults(&config.screener)?
                .with_filters(filters.into());
            if let Some(scope) = scope {
                request.scope = scope;
            }
            if let Some(sort_by) = sort_by {
                request = request.with_sort(sort_by);
            }
            if let Some(top) = top {
                request = request.with_top(top);
            }

            let engine = ScreenerEngine::new(provider, retry);
            let result = engine.run(&request).await;
            let report = ScreenReport::new(result);

            match output {
                Some(path) => {
                    let written = report.save_to_file(&path, format)?;
                    tracing::info!(path = %written.display(), "Results saved");
                }
                None => println!("{}", report.generate(format)),
            }
        }

        Commands::Fetch {
            code,
            codes,
            scope,
            data_type,
            years,
            no_cache,
            output,
        } => {
            let fetcher =
                StockFetcher::from_config(provider, &config.data).with_financial_years(years);

            if let Some(code) = code {
                let doc = fetcher.fetch_stock(code.trim(), data_type, !no_cache).await;
                emit_json(&doc, output.as_deref())?;
            } else if let Some(codes) = codes {
                let codes: Vec<String> = codes
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
                let batch = fetcher.fetch_many(&codes, data_type, !no_cache).await;
                emit_json(&batch, output.as_deref())?;
            } else if let Some(scope) = scope {
                let stocks = fetcher.list_scope(&Scope::parse(&scope)).await;
                let listing = serde_json::json!({
                    "scope": scope,
                    "count": stocks.len(),
                    "stocks": stocks,
                });
                emit_json(&listing, output.as_deref())?;
            }
        }
    }

    Ok(())
}

/// Pretty JSON to `output`, or stdout.
fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Data saved");
        }
        None => println!("{}", json),
    }

    Ok(())
}
