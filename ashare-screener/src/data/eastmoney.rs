//! Eastmoney adapter for A-share market data.
//!
//! Implements the DataProvider trait against eastmoney's public quote APIs
//! (免费、无需密钥).
//!
//! # Endpoints
//! - Whole-market snapshot: push2.eastmoney.com `clist`
//! - Per-stock profile: push2.eastmoney.com `stock/get`
//! - Daily K-line: push2his.eastmoney.com `kline`
//! - Index constituents, financial statements, holders, dividends and
//!   valuation history: datacenter reports (`reportName=RPT_*`)

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use screener_common::DataConfig;

use super::provider::{
    DataProvider, ProviderError, ReportKind, ReportRecord, StockProfile, ValuationPoint,
};
use super::Candle;
use crate::table::{parse_number, to_number, Cell, Dataset, StockRecord};

// ============================================================================
// Constants
// ============================================================================

/// Eastmoney list API (whole-market snapshot)
const EASTMONEY_CLIST_URL: &str = "https://push2.eastmoney.com/api/qt/clist/get";

/// Eastmoney real-time single-stock API
const EASTMONEY_QUOTE_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";

/// Eastmoney historical data API
const EASTMONEY_KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";

/// Eastmoney datacenter report API
const EASTMONEY_DATACENTER_URL: &str = "https://datacenter-web.eastmoney.com/api/data/v1/get";

/// Eastmoney F10 report API (same protocol, filtered by SECUCODE)
const EASTMONEY_SECURITIES_URL: &str = "https://datacenter.eastmoney.com/securities/api/data/v1/get";

/// Market filter covering SH/SZ main boards, ChiNext, STAR and BJ.
const A_SHARE_MARKETS: &str = "m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23,m:0+t:81+s:2048";

/// Snapshot field codes and the column names the screener reads them as.
const SPOT_FIELDS: &[(&str, &str)] = &[
    ("f12", "代码"),
    ("f14", "名称"),
    ("f2", "最新价"),
    ("f3", "涨跌幅"),
    ("f4", "涨跌额"),
    ("f5", "成交量"),
    ("f6", "成交额"),
    ("f7", "振幅"),
    ("f8", "换手率"),
    ("f9", "市盈率-动态"),
    ("f10", "量比"),
    ("f15", "最高"),
    ("f16", "最低"),
    ("f17", "今开"),
    ("f18", "昨收"),
    ("f20", "总市值"),
    ("f21", "流通市值"),
    ("f23", "市净率"),
];

/// Profile fields requested from `stock/get`.
const PROFILE_FIELDS: &str = "f57,f58,f43,f116,f117,f84,f85,f162,f167,f127,f189";

/// Safety cap on pages per paged request.
const MAX_PAGES: usize = 200;

/// Rows per datacenter page.
const DATACENTER_PAGE_SIZE: usize = 500;

/// Trading days of valuation history requested (about ten years).
const VALUATION_HISTORY_DAYS: usize = 2500;

// ============================================================================
// Code Mapping
// ============================================================================

/// Convert a bare exchange code to eastmoney's secid.
///
/// "600519" -> "1.600519" (SH), "000001" -> "0.000001" (SZ/BJ)
fn to_secid(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let market = match code.as_bytes()[0] {
        b'5' | b'6' | b'9' => "1",
        _ => "0",
    };

    Some(format!("{}.{}", market, code))
}

/// Convert a bare exchange code to the F10 `SECUCODE` form.
///
/// "600519" -> "600519.SH", "000001" -> "000001.SZ", "830799" -> "830799.BJ"
fn to_secucode(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let exchange = match code.as_bytes()[0] {
        b'5' | b'6' | b'9' => "SH",
        b'4' | b'8' => "BJ",
        _ => "SZ",
    };

    Some(format!("{}.{}", code, exchange))
}

fn invalid_code(code: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!("Invalid stock code: {}", code))
}

// ============================================================================
// Report Sources
// ============================================================================

/// Where a periodic report lives in the datacenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReportSource {
    url: &'static str,
    report_name: &'static str,
    /// Filter on `SECUCODE` ("600519.SH") instead of `SECURITY_CODE`
    by_secucode: bool,
    sort_columns: &'static str,
    sort_types: &'static str,
}

fn report_source(report: ReportKind) -> ReportSource {
    let (url, report_name, by_secucode, sort_columns, sort_types) = match report {
        ReportKind::BalanceSheet => (EASTMONEY_DATACENTER_URL, "RPT_DMSK_FN_BALANCE", false, "REPORT_DATE", "-1"),
        ReportKind::IncomeStatement => (EASTMONEY_DATACENTER_URL, "RPT_DMSK_FN_INCOME", false, "REPORT_DATE", "-1"),
        ReportKind::CashFlow => (EASTMONEY_DATACENTER_URL, "RPT_DMSK_FN_CASHFLOW", false, "REPORT_DATE", "-1"),
        ReportKind::FinancialSummary => {
            (EASTMONEY_SECURITIES_URL, "RPT_F10_FINANCE_MAINFINADATA", true, "REPORT_DATE", "-1")
        }
        ReportKind::PerformanceIndicators => (EASTMONEY_DATACENTER_URL, "RPT_LICO_FN_CPD", false, "REPORTDATE", "-1"),
        ReportKind::TopHolders => {
            (EASTMONEY_SECURITIES_URL, "RPT_F10_EH_HOLDERS", true, "END_DATE,HOLDER_RANK", "-1,1")
        }
        ReportKind::HolderCount => (EASTMONEY_DATACENTER_URL, "RPT_HOLDERNUM_DET", false, "END_DATE", "-1"),
        ReportKind::Dividends => (EASTMONEY_DATACENTER_URL, "RPT_SHAREBONUS_DET", false, "PLAN_NOTICE_DATE", "-1"),
        ReportKind::DividendPlans => {
            (EASTMONEY_SECURITIES_URL, "RPT_F10_DIVIDEND_MAIN", true, "NOTICE_DATE", "-1")
        }
    };

    ReportSource {
        url,
        report_name,
        by_secucode,
        sort_columns,
        sort_types,
    }
}

// ============================================================================
// Eastmoney Provider
// ============================================================================

/// Eastmoney data provider.
pub struct EastmoneyProvider {
    /// HTTP client
    client: reqwest::Client,
    /// Rows per snapshot page
    page_size: usize,
}

impl EastmoneyProvider {
    /// Create with default settings.
    pub fn new() -> Self {
        Self::with_settings(Duration::from_secs(30), 100)
    }

    /// Create from the data section of the configuration.
    pub fn from_config(config: &DataConfig) -> Self {
        Self::with_settings(
            Duration::from_secs(config.request_timeout_secs),
            config.page_size,
        )
    }

    fn with_settings(timeout: Duration, page_size: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// GET `url` with `query` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        debug!(url = url, ?query, "Requesting eastmoney");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: None,
            });
        }
        if status.is_server_error() {
            return Err(ProviderError::Unavailable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("Failed to parse response: {}", e)))
    }

    /// Fetch one page of the snapshot. Returns the rows and the total count.
    async fn fetch_spot_page(&self, page: usize) -> Result<(Vec<StockRecord>, usize), ProviderError> {
        let fields = SPOT_FIELDS
            .iter()
            .map(|(code, _)| *code)
            .collect::<Vec<_>>()
            .join(",");

        let query = [
            ("pn", page.to_string()),
            ("pz", self.page_size.to_string()),
            ("po", "1".to_string()),
            ("np", "1".to_string()),
            ("fltt", "2".to_string()),
            ("invt", "2".to_string()),
            ("fid", "f3".to_string()),
            ("fs", A_SHARE_MARKETS.to_string()),
            ("fields", fields),
        ];

        let body: ClistResponse = self.get_json(EASTMONEY_CLIST_URL, &query).await?;
        let Some(data) = body.data else {
            return Ok((Vec::new(), 0));
        };

        let rows = data.diff.into_iter().map(spot_row).collect();
        Ok((rows, data.total))
    }

    /// Page through a datacenter report, collecting at most `limit` rows.
    ///
    /// An empty report (`result: null`) yields no rows rather than an error.
    async fn query_datacenter(
        &self,
        url: &str,
        report_name: &str,
        filter: &str,
        sort: (&str, &str),
        columns: &str,
        limit: usize,
    ) -> Result<Vec<ReportRecord>, ProviderError> {
        let page_size = limit.clamp(1, DATACENTER_PAGE_SIZE);
        let mut rows = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut query = vec![
                ("reportName", report_name.to_string()),
                ("columns", columns.to_string()),
                ("filter", filter.to_string()),
                ("pageNumber", page.to_string()),
                ("pageSize", page_size.to_string()),
                ("source", "WEB".to_string()),
                ("client", "WEB".to_string()),
            ];
            if !sort.0.is_empty() {
                query.push(("sortColumns", sort.0.to_string()));
                query.push(("sortTypes", sort.1.to_string()));
            }

            let body: DatacenterResponse = self.get_json(url, &query).await?;
            let Some(result) = body.result else {
                break;
            };

            let fetched = result.data.len();
            rows.extend(result.data);
            if fetched == 0 || rows.len() >= limit || page >= result.pages {
                break;
            }
        }

        rows.truncate(limit);
        Ok(rows)
    }
}

impl Default for EastmoneyProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Map one snapshot entry to a record keyed by column name. Raw values are
/// kept as delivered, "-" included.
fn spot_row(mut entry: HashMap<String, serde_json::Value>) -> StockRecord {
    SPOT_FIELDS
        .iter()
        .map(|(field, column)| {
            let cell = entry.remove(*field).map(Cell::from).unwrap_or_default();
            (*column, cell)
        })
        .collect()
}

/// Parse kline strings.
///
/// Format: "2024-01-02,10.50,10.70,10.80,10.40,1000000,10500000,3.8,1.9,0.2,0.5"
/// Fields: date,open,close,high,low,volume,amount,amplitude,change%,change,turnover%
fn parse_klines(klines: &[String]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = klines
        .iter()
        .filter_map(|line| {
            let candle = parse_kline(line);
            if candle.is_none() {
                warn!(line = line.as_str(), "Invalid kline format, skipping");
            }
            candle
        })
        .collect();

    candles.sort_by_key(|c| c.date);
    candles
}

fn parse_kline(line: &str) -> Option<Candle> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 7 {
        return None;
    }

    let number = |i: usize| parts.get(i).and_then(|s| parse_number(s));

    Some(Candle {
        date: NaiveDate::parse_from_str(parts[0], "%Y-%m-%d").ok()?,
        open: number(1)?,
        close: number(2)?,
        high: number(3)?,
        low: number(4)?,
        volume: number(5)?,
        amount: number(6)?,
        change_pct: number(8),
    })
}

/// Build a profile from a `stock/get` payload.
fn parse_profile(code: &str, data: &HashMap<String, serde_json::Value>) -> StockProfile {
    let number = |key: &str| data.get(key).cloned().map(Cell::from).as_ref().and_then(to_number);
    let text = |key: &str| {
        data.get(key)
            .cloned()
            .map(Cell::from)
            .map(|c| c.as_text())
            .filter(|s| !s.is_empty() && s != "-")
    };

    StockProfile {
        code: text("f57").unwrap_or_else(|| code.to_string()),
        name: text("f58").unwrap_or_default(),
        industry: text("f127"),
        price: number("f43"),
        total_market_cap: number("f116"),
        float_market_cap: number("f117"),
        total_shares: number("f84"),
        float_shares: number("f85"),
        pe: number("f162"),
        pb: number("f167"),
        listing_date: text("f189").and_then(|d| NaiveDate::parse_from_str(&d, "%Y%m%d").ok()),
    }
}

/// Numeric report value, normalized like any other cell.
fn report_number(row: &ReportRecord, key: &str) -> Option<f64> {
    row.get(key).cloned().map(Cell::from).as_ref().and_then(to_number)
}

/// Parse a `RPT_VALUEANALYSIS_DET` row. Dates arrive as "2024-01-02 00:00:00".
fn parse_valuation_point(row: &ReportRecord) -> Option<ValuationPoint> {
    let date = row.get("TRADE_DATE")?.as_str()?;
    let date = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;

    Some(ValuationPoint {
        date,
        pe_ttm: report_number(row, "PE_TTM"),
        pb: report_number(row, "PB_MRQ"),
    })
}

// ============================================================================
// DataProvider Implementation
// ============================================================================

#[async_trait]
impl DataProvider for EastmoneyProvider {
    fn name(&self) -> &'static str {
        "eastmoney"
    }

    async fn fetch_spot_table(&self) -> Result<Dataset, ProviderError> {
        let mut rows = Vec::new();
        let mut total = 0;

        for page in 1..=MAX_PAGES {
            let (page_rows, page_total) = self.fetch_spot_page(page).await?;
            let fetched = page_rows.len();
            rows.extend(page_rows);
            total = page_total;

            debug!(page = page, fetched = fetched, collected = rows.len(), total = total, "Snapshot page");
            if fetched == 0 || rows.len() >= total {
                break;
            }
        }

        if rows.len() < total {
            warn!(
                collected = rows.len(),
                total = total,
                max_pages = MAX_PAGES,
                page_size = self.page_size,
                "Snapshot truncated at the page cap; raise data.page_size"
            );
        }

        if rows.is_empty() {
            return Err(ProviderError::DataNotAvailable("empty market snapshot".into()));
        }

        let columns = SPOT_FIELDS.iter().map(|(_, column)| column.to_string()).collect();
        Ok(Dataset::new(columns, rows))
    }

    async fn fetch_index_constituents(&self, index_code: &str) -> Result<Vec<String>, ProviderError> {
        let rows = self
            .query_datacenter(
                EASTMONEY_DATACENTER_URL,
                "RPT_INDEX_TS_COMPONENT",
                &format!("(INDEX_CODE=\"{}\")", index_code),
                ("", ""),
                "SECURITY_CODE",
                MAX_PAGES * DATACENTER_PAGE_SIZE,
            )
            .await?;

        let codes: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("SECURITY_CODE")?.as_str().map(str::to_string))
            .collect();

        if codes.is_empty() {
            return Err(ProviderError::DataNotAvailable(format!(
                "no constituents for index {}",
                index_code
            )));
        }

        Ok(codes)
    }

    async fn fetch_profile(&self, code: &str) -> Result<StockProfile, ProviderError> {
        let secid = to_secid(code).ok_or_else(|| invalid_code(code))?;

        let query = [
            ("secid", secid),
            ("fltt", "2".to_string()),
            ("invt", "2".to_string()),
            ("fields", PROFILE_FIELDS.to_string()),
        ];

        let body: QuoteResponse = self.get_json(EASTMONEY_QUOTE_URL, &query).await?;
        let data = body
            .data
            .ok_or_else(|| ProviderError::DataNotAvailable(format!("no profile for {}", code)))?;

        Ok(parse_profile(code, &data))
    }

    async fn fetch_daily_candles(&self, code: &str, days: usize) -> Result<Vec<Candle>, ProviderError> {
        let secid = to_secid(code).ok_or_else(|| invalid_code(code))?;

        // klt=101 daily, fqt=1 forward-adjusted
        let query = [
            ("secid", secid),
            ("klt", "101".to_string()),
            ("fqt", "1".to_string()),
            ("lmt", days.to_string()),
            ("end", "20500101".to_string()),
            ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
            ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61".to_string()),
        ];

        let body: KlineResponse = self.get_json(EASTMONEY_KLINE_URL, &query).await?;
        if body.rc != 0 {
            return Err(ProviderError::Internal(format!("Eastmoney API error: rc={}", body.rc)));
        }

        let klines = body.data.and_then(|d| d.klines).unwrap_or_default();
        Ok(parse_klines(&klines))
    }

    async fn fetch_report(
        &self,
        code: &str,
        report: ReportKind,
        limit: usize,
    ) -> Result<Vec<ReportRecord>, ProviderError> {
        let source = report_source(report);
        let filter = if source.by_secucode {
            let secucode = to_secucode(code).ok_or_else(|| invalid_code(code))?;
            format!("(SECUCODE=\"{}\")", secucode)
        } else {
            if to_secid(code).is_none() {
                return Err(invalid_code(code));
            }
            format!("(SECURITY_CODE=\"{}\")", code.trim())
        };

        let rows = self
            .query_datacenter(
                source.url,
                source.report_name,
                &filter,
                (source.sort_columns, source.sort_types),
                "ALL",
                limit,
            )
            .await?;

        if rows.is_empty() {
            return Err(ProviderError::DataNotAvailable(format!(
                "no {} for {}",
                report, code
            )));
        }

        Ok(rows)
    }

    async fn fetch_valuation_history(&self, code: &str) -> Result<Vec<ValuationPoint>, ProviderError> {
        if to_secid(code).is_none() {
            return Err(invalid_code(code));
        }

        // Newest first so the cap keeps the most recent days
        let rows = self
            .query_datacenter(
                EASTMONEY_DATACENTER_URL,
                "RPT_VALUEANALYSIS_DET",
                &format!("(SECURITY_CODE=\"{}\")", code.trim()),
                ("TRADE_DATE", "-1"),
                "TRADE_DATE,PE_TTM,PB_MRQ",
                VALUATION_HISTORY_DAYS,
            )
            .await?;

        let mut points: Vec<ValuationPoint> = rows.iter().filter_map(parse_valuation_point).collect();
        if points.is_empty() {
            return Err(ProviderError::DataNotAvailable(format!(
                "no valuation history for {}",
                code
            )));
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

// ============================================================================
// Eastmoney API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ClistResponse {
    data: Option<ClistData>,
}

#[derive(Debug, Deserialize)]
struct ClistData {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    diff: Vec<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    data: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    /// Return code (0 = success)
    rc: i32,
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    /// K-line data as strings
    klines: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct DatacenterResponse {
    result: Option<DatacenterResult>,
}

#[derive(Debug, Deserialize)]
struct DatacenterResult {
    #[serde(default)]
    pages: usize,
    #[serde(default)]
    data: Vec<ReportRecord>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_secid() {
        assert_eq!(to_secid("600519"), Some("1.600519".to_string()));
        assert_eq!(to_secid("688981"), Some("1.688981".to_string()));
        assert_eq!(to_secid("000001"), Some("0.000001".to_string()));
        assert_eq!(to_secid("300750"), Some("0.300750".to_string()));
        assert_eq!(to_secid("000001.SZ"), None);
        assert_eq!(to_secid("abc"), None);
    }

    #[test]
    fn test_to_secucode() {
        assert_eq!(to_secucode("600519"), Some("600519.SH".to_string()));
        assert_eq!(to_secucode("300750"), Some("300750.SZ".to_string()));
        assert_eq!(to_secucode("830799"), Some("830799.BJ".to_string()));
        assert_eq!(to_secucode("60051"), None);
    }

    #[test]
    fn test_report_sources() {
        let top = report_source(ReportKind::TopHolders);
        assert_eq!(top.url, EASTMONEY_SECURITIES_URL);
        assert!(top.by_secucode);

        let balance = report_source(ReportKind::BalanceSheet);
        assert_eq!(balance.report_name, "RPT_DMSK_FN_BALANCE");
        assert!(!balance.by_secucode);
        assert_eq!(balance.sort_types, "-1");
    }

    #[test]
    fn test_spot_row_keeps_raw_sentinels() {
        let entry: HashMap<String, serde_json::Value> = serde_json::from_value(json!({
            "f12": "600519", "f14": "贵州茅台", "f2": 1688.0, "f9": "-", "f23": 8.1
        }))
        .unwrap();

        let row = spot_row(entry);
        assert_eq!(row.code(), "600519");
        assert_eq!(row.get("最新价"), &Cell::Number(1688.0));
        assert_eq!(row.get("市盈率-动态"), &Cell::Text("-".into()));
        assert!(row.get("总市值").is_missing());
    }

    #[test]
    fn test_parse_klines_sorted_and_lenient() {
        let klines = vec![
            "2024-01-03,10.7,10.9,11.0,10.6,1200,13000,3.7,1.87,0.2,0.6".to_string(),
            "garbage".to_string(),
            "2024-01-02,10.5,10.7,10.8,10.4,1000,10500,3.8,1.90,0.2,0.5".to_string(),
        ];

        let candles = parse_klines(&klines);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(candles[0].close, 10.7);
        assert_eq!(candles[1].change_pct, Some(1.87));
    }

    #[test]
    fn test_parse_kline_missing_change_is_none() {
        let candle = parse_kline("2024-01-02,10.5,10.7,10.8,10.4,1000,10500,3.8,-,0.2,0.5").unwrap();
        assert_eq!(candle.change_pct, None);
        assert!(parse_kline("2024-01-02,10.5,-,10.8,10.4,1000,10500").is_none());
    }

    #[test]
    fn test_parse_valuation_point() {
        let row: ReportRecord = serde_json::from_value(json!({
            "TRADE_DATE": "2024-01-02 00:00:00", "PE_TTM": 28.4, "PB_MRQ": null
        }))
        .unwrap();

        let point = parse_valuation_point(&row).unwrap();
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(point.pe_ttm, Some(28.4));
        assert_eq!(point.pb, None);

        let undated: ReportRecord = serde_json::from_value(json!({"PE_TTM": 1.0})).unwrap();
        assert!(parse_valuation_point(&undated).is_none());
    }

    #[test]
    fn test_parse_profile() {
        let data: HashMap<String, serde_json::Value> = serde_json::from_value(json!({
            "f57": "600519", "f58": "贵州茅台", "f43": 1688.0, "f116": 2.12e12,
            "f162": 25.3, "f167": "-", "f127": "酿酒行业", "f189": 20010827
        }))
        .unwrap();

        let profile = parse_profile("600519", &data);
        assert_eq!(profile.name, "贵州茅台");
        assert_eq!(profile.pe, Some(25.3));
        assert_eq!(profile.pb, None);
        assert_eq!(profile.industry.as_deref(), Some("酿酒行业"));
        assert_eq!(profile.listing_date, NaiveDate::from_ymd_opt(2001, 8, 27));
    }

    // Integration tests require network access
    // Run with: cargo test -- --ignored

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_spot_table() {
        let provider = EastmoneyProvider::new();
        let dataset = provider.fetch_spot_table().await.unwrap();
        assert!(dataset.len() > 1000);
        assert!(dataset.has_column("市盈率-动态"));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_daily_candles() {
        let provider = EastmoneyProvider::new();
        let candles = provider.fetch_daily_candles("000001", 10).await.unwrap();
        assert!(!candles.is_empty());
        assert!(candles.len() <= 10);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_index_constituents() {
        let provider = EastmoneyProvider::new();
        let codes = provider.fetch_index_constituents("000300").await.unwrap();
        assert!(codes.len() >= 250);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_report() {
        let provider = EastmoneyProvider::new();
        let rows = provider
            .fetch_report("600519", ReportKind::IncomeStatement, 4)
            .await
            .unwrap();
        assert!(!rows.is_empty() && rows.len() <= 4);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_valuation_history() {
        let provider = EastmoneyProvider::new();
        let points = provider.fetch_valuation_history("600519").await.unwrap();
        assert!(points.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
