//! Per-stock document acquisition.
//!
//! Assembles a [`StockDocument`] per code from the provider's profile, daily
//! prices, valuation history and periodic reports, reading and writing the
//! day-scoped cache. Section failures are recorded inside the document rather
//! than failing the call.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use screener_common::DataConfig;

use super::cache::DocumentCache;
use super::document::{
    BatchDocument, DataKind, DividendSection, FinancialStatements, HolderSection, PriceSummary,
    StockDocument, ValuationSnapshot, BASIC_SECTION, DIVIDEND_SECTION, INDICATORS_SECTION,
    PRICE_SECTION, VALUATION_HISTORY_SECTION, VALUATION_SECTION,
};
use super::loader::DatasetLoader;
use super::provider::{DataProvider, ProviderError, ReportKind, ReportRecord};
use super::retry::{retry_with_backoff, RetryPolicy};
use super::scope::Scope;

/// Daily candles requested for the price summary.
const PRICE_HISTORY_DAYS: usize = 60;
/// Years of statements fetched unless configured otherwise.
pub const DEFAULT_FINANCIAL_YEARS: u32 = 3;
/// Quarterly statements per year.
const STATEMENTS_PER_YEAR: usize = 4;
/// Cap on statement rows regardless of years.
const MAX_STATEMENT_ROWS: usize = 12;
const INDICATOR_ROWS: usize = 8;
const TOP_HOLDER_ROWS: usize = 10;
const HOLDER_COUNT_ROWS: usize = 10;
const DIVIDEND_ROWS: usize = 100;

// ============================================================================
// Stock Fetcher
// ============================================================================

/// Fetches per-stock documents through a provider and the document cache.
pub struct StockFetcher<P: DataProvider> {
    provider: Arc<P>,
    cache: Option<DocumentCache>,
    retry: RetryPolicy,
    request_interval: Duration,
    financial_years: u32,
}

impl<P: DataProvider> StockFetcher<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            cache: None,
            retry: RetryPolicy::default(),
            request_interval: Duration::from_millis(500),
            financial_years: DEFAULT_FINANCIAL_YEARS,
        }
    }

    /// Build from the data section of the configuration.
    pub fn from_config(provider: Arc<P>, config: &DataConfig) -> Self {
        Self {
            provider,
            cache: config
                .cache_enabled
                .then(|| DocumentCache::new(config.cache_path())),
            retry: RetryPolicy::from_config(config),
            request_interval: Duration::from_millis(config.request_interval_ms),
            financial_years: DEFAULT_FINANCIAL_YEARS,
        }
    }

    pub fn with_cache(mut self, cache: DocumentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Years of financial statements to fetch (at most 12 quarters).
    pub fn with_financial_years(mut self, years: u32) -> Self {
        self.financial_years = years.max(1);
        self
    }

    fn statement_rows(&self) -> usize {
        (self.financial_years as usize * STATEMENTS_PER_YEAR).min(MAX_STATEMENT_ROWS)
    }

    /// Cache key for a kind. Kinds carrying statements also key on the years.
    fn cache_key(&self, kind: DataKind) -> String {
        if kind.includes_financial() {
            format!("{}-{}y", kind, self.financial_years)
        } else {
            kind.as_str().to_string()
        }
    }

    /// Fetch one stock's document.
    ///
    /// With `use_cache`, today's cached document is returned when present and
    /// a freshly fetched document is written back if every section arrived.
    pub async fn fetch_stock(&self, code: &str, kind: DataKind, use_cache: bool) -> StockDocument {
        let cache = self.cache.as_ref().filter(|_| use_cache);
        let key = self.cache_key(kind);

        if let Some(cached) = cache.and_then(|c| c.load::<StockDocument>(code, &key)) {
            info!(code = code, data_type = %kind, "Using cached document");
            return cached;
        }

        info!(code = code, data_type = %kind, "Fetching stock data");
        let mut doc = StockDocument::new(code, kind);

        if kind.includes_basic() || kind.includes_valuation() {
            self.fill_profile(code, kind, &mut doc).await;
        }
        if kind.includes_financial() {
            self.fill_financial(code, &mut doc).await;
        }
        if kind.includes_valuation() {
            self.fill_valuation_history(code, &mut doc).await;
            self.fill_price(code, &mut doc).await;
        }
        if kind.includes_holder() {
            self.fill_holder(code, &mut doc).await;
            self.fill_dividend(code, &mut doc).await;
        }

        match cache {
            Some(cache) if doc.is_complete() => cache.store(code, &key, &doc),
            Some(_) => debug!(code = code, failed = doc.errors.len(), "Incomplete document not cached"),
            None => {}
        }

        doc
    }

    async fn fill_profile(&self, code: &str, kind: DataKind, doc: &mut StockDocument) {
        let profile = retry_with_backoff("profile", self.retry, || self.provider.fetch_profile(code)).await;

        match profile {
            Ok(profile) => {
                if kind.includes_valuation() {
                    doc.valuation = Some(ValuationSnapshot::from(&profile));
                }
                if kind.includes_basic() {
                    doc.basic_info = Some(profile);
                }
            }
            Err(e) => {
                warn!(code = code, error = %e, "Profile fetch failed");
                let section = if kind.includes_basic() {
                    BASIC_SECTION
                } else {
                    VALUATION_SECTION
                };
                doc.record_error(section, e);
            }
        }
    }

    async fn fill_financial(&self, code: &str, doc: &mut StockDocument) {
        let rows = self.statement_rows();
        let mut statements = FinancialStatements::default();
        let mut any = false;

        for report in [ReportKind::BalanceSheet, ReportKind::IncomeStatement, ReportKind::CashFlow] {
            match self.report(code, report, rows).await {
                Ok(records) => {
                    let slot = match report {
                        ReportKind::BalanceSheet => &mut statements.balance_sheet,
                        ReportKind::IncomeStatement => &mut statements.income_statement,
                        _ => &mut statements.cash_flow,
                    };
                    *slot = records;
                    any = true;
                }
                Err(e) => {
                    warn!(code = code, report = %report, error = %e, "Statement fetch failed");
                    doc.record_error(report.as_str(), e);
                }
            }
        }

        if any {
            doc.financial_data = Some(statements);
        }

        let chain = [ReportKind::FinancialSummary, ReportKind::PerformanceIndicators];
        match self.report_with_fallback(code, &chain, INDICATOR_ROWS).await {
            Ok(records) => doc.financial_indicators = Some(records),
            Err(e) => {
                warn!(code = code, error = %e, "Financial indicators unavailable");
                doc.record_error(INDICATORS_SECTION, e);
            }
        }
    }

    async fn fill_valuation_history(&self, code: &str, doc: &mut StockDocument) {
        let history = retry_with_backoff("valuation_history", self.retry, || {
            self.provider.fetch_valuation_history(code)
        })
        .await;

        match history {
            Ok(points) => {
                let snapshot = doc.valuation.take().unwrap_or_default();
                doc.valuation = Some(snapshot.with_history(&points));
            }
            Err(e) => {
                warn!(code = code, error = %e, "Valuation history unavailable, keeping profile figures");
                doc.record_error(VALUATION_HISTORY_SECTION, e);
            }
        }
    }

    async fn fill_price(&self, code: &str, doc: &mut StockDocument) {
        let candles = retry_with_backoff("daily_candles", self.retry, || {
            self.provider.fetch_daily_candles(code, PRICE_HISTORY_DAYS)
        })
        .await;

        match candles {
            Ok(candles) => doc.price = PriceSummary::from_candles(&candles),
            Err(e) => {
                warn!(code = code, error = %e, "Price history fetch failed");
                doc.record_error(PRICE_SECTION, e);
            }
        }
    }

    async fn fill_holder(&self, code: &str, doc: &mut StockDocument) {
        let mut holder = HolderSection::default();
        let mut any = false;

        for (report, rows) in [
            (ReportKind::TopHolders, TOP_HOLDER_ROWS),
            (ReportKind::HolderCount, HOLDER_COUNT_ROWS),
        ] {
            match self.report(code, report, rows).await {
                Ok(records) => {
                    if report == ReportKind::TopHolders {
                        holder.top_10_holders = records;
                    } else {
                        holder.holder_count_history = records;
                    }
                    any = true;
                }
                Err(e) => {
                    warn!(code = code, report = %report, error = %e, "Holder report fetch failed");
                    doc.record_error(report.as_str(), e);
                }
            }
        }

        if any {
            doc.holder = Some(holder);
        }
    }

    async fn fill_dividend(&self, code: &str, doc: &mut StockDocument) {
        let chain = [ReportKind::Dividends, ReportKind::DividendPlans];

        match self.report_with_fallback(code, &chain, DIVIDEND_ROWS).await {
            Ok(records) => doc.dividend = Some(DividendSection::new(records)),
            // No rows anywhere: the stock has never paid out
            Err(ProviderError::DataNotAvailable(_)) => doc.dividend = Some(DividendSection::default()),
            Err(e) => {
                warn!(code = code, error = %e, "Dividend history fetch failed");
                doc.record_error(DIVIDEND_SECTION, e);
            }
        }
    }

    async fn report(
        &self,
        code: &str,
        report: ReportKind,
        rows: usize,
    ) -> Result<Vec<ReportRecord>, ProviderError> {
        retry_with_backoff(report.as_str(), self.retry, || {
            self.provider.fetch_report(code, report, rows)
        })
        .await
    }

    /// First report in `chain` that yields rows; otherwise the last error.
    async fn report_with_fallback(
        &self,
        code: &str,
        chain: &[ReportKind],
        rows: usize,
    ) -> Result<Vec<ReportRecord>, ProviderError> {
        let mut last_error = ProviderError::DataNotAvailable(format!("no report for {}", code));

        for &report in chain {
            match self.report(code, report, rows).await {
                Ok(records) => return Ok(records),
                Err(e) => {
                    debug!(code = code, report = %report, error = %e, "Report unavailable, trying fallback");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Fetch several stocks in order, pausing between requests.
    pub async fn fetch_many(&self, codes: &[String], kind: DataKind, use_cache: bool) -> BatchDocument {
        let mut batch = BatchDocument {
            fetch_time: Local::now(),
            stocks: Vec::with_capacity(codes.len()),
            success_count: 0,
            fail_count: 0,
        };

        let total = codes.len();
        for (i, code) in codes.iter().enumerate() {
            info!(progress = %format!("{}/{}", i + 1, total), code = code.as_str(), "Fetching");

            let doc = self.fetch_stock(code, kind, use_cache).await;
            if doc.is_success() {
                batch.stocks.push(doc);
                batch.success_count += 1;
            } else {
                batch.fail_count += 1;
            }

            if i + 1 < total && !self.request_interval.is_zero() {
                tokio::time::sleep(self.request_interval).await;
            }
        }

        info!(
            success = batch.success_count,
            failed = batch.fail_count,
            "Batch fetch complete"
        );
        batch
    }

    /// Codes in a scope: the whole market, an index, or a custom list.
    pub async fn list_scope(&self, scope: &Scope) -> Vec<String> {
        DatasetLoader::new(Arc::clone(&self.provider), self.retry)
            .list_codes(scope)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
