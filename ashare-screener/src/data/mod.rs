//! Market data acquisition for A-shares.
//!
//! Everything that touches the network or the filesystem lives here; the
//! screening pipeline only sees the [`Dataset`](crate::table::Dataset) the
//! loader hands it.
//!
//! # Data Sources
//! - **eastmoney** (default): public quote APIs, no key required

mod cache;
mod document;
mod eastmoney;
mod fetcher;
mod loader;
mod provider;
mod retry;
mod scope;

pub use cache::DocumentCache;
pub use eastmoney::EastmoneyProvider;
pub use document::{
    percentile_below, BatchDocument, DataKind, DividendSection, FinancialStatements, HolderSection,
    PriceSummary, StockDocument, ValuationSnapshot,
};
pub use fetcher::{StockFetcher, DEFAULT_FINANCIAL_YEARS};
pub use loader::DatasetLoader;
pub use provider::{
    DataProvider, ProviderError, ReportKind, ReportRecord, StockProfile, ValuationPoint,
};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use scope::{index_code, Scope, INDEX_CODES};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Data Types
// ============================================================================

/// A single daily candlestick (forward-adjusted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Trading day
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// Close price
    pub close: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Volume (lots)
    pub volume: f64,
    /// Amount (turnover in yuan)
    #[serde(default)]
    pub amount: f64,
    /// Change from previous close (%)
    #[serde(default)]
    pub change_pct: Option<f64>,
}
