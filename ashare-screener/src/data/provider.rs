//! Data provider abstraction.
//!
//! Defines the `DataProvider` trait that market data sources implement. The
//! screener only ever talks to this trait, so the acquisition layer can be
//! swapped or mocked without touching the pipeline.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::Candle;
use crate::table::Dataset;

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to data providers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded
    #[error("Rate limited{}", .retry_after_secs.map(|s| format!(", retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    /// Data not available for the requested code
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    /// Provider is temporarily unavailable
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal provider error (unexpected payload, parse failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Check if the error is recoverable (worth retrying)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Unavailable(_)
        )
    }
}

// ============================================================================
// Stock Profile
// ============================================================================

/// Basic per-stock information.
///
/// Every numeric field is optional: sources report "-" for suspended or
/// newly listed stocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockProfile {
    /// Exchange code (e.g., "600519")
    pub code: String,
    /// Short name (e.g., "贵州茅台")
    pub name: String,
    /// Industry classification
    #[serde(default)]
    pub industry: Option<String>,
    /// Latest price
    #[serde(default)]
    pub price: Option<f64>,
    /// Total market cap (yuan)
    #[serde(default)]
    pub total_market_cap: Option<f64>,
    /// Float market cap (yuan)
    #[serde(default)]
    pub float_market_cap: Option<f64>,
    /// Total shares
    #[serde(default)]
    pub total_shares: Option<f64>,
    /// Float shares
    #[serde(default)]
    pub float_shares: Option<f64>,
    /// Dynamic PE
    #[serde(default)]
    pub pe: Option<f64>,
    /// PB
    #[serde(default)]
    pub pb: Option<f64>,
    /// Listing date
    #[serde(default)]
    pub listing_date: Option<NaiveDate>,
}

// ============================================================================
// Periodic Reports
// ============================================================================

/// One row of a periodic report, keyed by the source's own column names.
pub type ReportRecord = serde_json::Map<String, serde_json::Value>;

/// Per-stock periodic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    /// Key figures per reporting period (revenue, profit, ROE, margins)
    FinancialSummary,
    /// Per-period performance report; stands in for `FinancialSummary`
    PerformanceIndicators,
    /// Ten largest holders of the latest period
    #[serde(rename = "top_10_holders")]
    TopHolders,
    /// Holder count per period
    #[serde(rename = "holder_count_history")]
    HolderCount,
    /// Dividend and bonus share history
    Dividends,
    /// Dividend plan announcements; stands in for `Dividends`
    DividendPlans,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::CashFlow => "cash_flow",
            Self::FinancialSummary => "financial_summary",
            Self::PerformanceIndicators => "performance_indicators",
            Self::TopHolders => "top_10_holders",
            Self::HolderCount => "holder_count_history",
            Self::Dividends => "dividends",
            Self::DividendPlans => "dividend_plans",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily valuation multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    #[serde(default)]
    pub pe_ttm: Option<f64>,
    #[serde(default)]
    pub pb: Option<f64>,
}

// ============================================================================
// Data Provider Trait
// ============================================================================

/// Trait for market data providers.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Provider name (e.g., "eastmoney")
    fn name(&self) -> &'static str;

    /// Whole-market snapshot, one row per listed stock, keyed by Chinese
    /// column names (`代码`, `名称`, `最新价`, `市盈率-动态`, ...).
    async fn fetch_spot_table(&self) -> Result<Dataset, ProviderError>;

    /// Constituent codes of an index (e.g., "000300").
    async fn fetch_index_constituents(&self, index_code: &str) -> Result<Vec<String>, ProviderError>;

    /// Basic information for one stock.
    async fn fetch_profile(&self, code: &str) -> Result<StockProfile, ProviderError>;

    /// Most recent `days` forward-adjusted daily candles, oldest first.
    async fn fetch_daily_candles(&self, code: &str, days: usize) -> Result<Vec<Candle>, ProviderError>;

    /// Up to `limit` rows of a periodic report, newest period first.
    ///
    /// A stock with no rows for the report yields `DataNotAvailable`.
    async fn fetch_report(
        &self,
        code: &str,
        report: ReportKind,
        limit: usize,
    ) -> Result<Vec<ReportRecord>, ProviderError>;

    /// Daily PE-TTM and PB history, oldest first.
    async fn fetch_valuation_history(&self, code: &str) -> Result<Vec<ValuationPoint>, ProviderError>;
}

// ============================================================================
// Tests
// ============================================================================
