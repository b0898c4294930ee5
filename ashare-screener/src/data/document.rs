//! Per-stock documents.
//!
//! A [`StockDocument`] carries the sections requested by its [`DataKind`].
//! Sections that could not be fetched are absent and their error message is
//! recorded under the section name in `errors`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use screener_common::Error;

use super::provider::{ReportRecord, StockProfile, ValuationPoint};
use super::Candle;

/// Candles averaged for the volume baseline.
const AVG_VOLUME_WINDOW: usize = 20;
/// Candles kept verbatim in the document.
const RECENT_CANDLES: usize = 30;

pub(crate) const BASIC_SECTION: &str = "basic_info";
pub(crate) const VALUATION_SECTION: &str = "valuation";
pub(crate) const VALUATION_HISTORY_SECTION: &str = "valuation_history";
pub(crate) const PRICE_SECTION: &str = "price";
pub(crate) const INDICATORS_SECTION: &str = "financial_indicators";
pub(crate) const DIVIDEND_SECTION: &str = "dividend";

// ============================================================================
// Data Kind
// ============================================================================

/// Which sections a stock document carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Every section
    All,
    /// Profile only
    #[default]
    Basic,
    /// Financial statements and indicators
    Financial,
    /// Valuation snapshot with history percentiles, and price summary
    Valuation,
    /// Top holders, holder count history and dividends
    Holder,
}

impl DataKind {
    pub fn includes_basic(self) -> bool {
        matches!(self, Self::All | Self::Basic)
    }

    pub fn includes_financial(self) -> bool {
        matches!(self, Self::All | Self::Financial)
    }

    pub fn includes_valuation(self) -> bool {
        matches!(self, Self::All | Self::Valuation)
    }

    pub fn includes_holder(self) -> bool {
        matches!(self, Self::All | Self::Holder)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Basic => "basic",
            Self::Financial => "financial",
            Self::Valuation => "valuation",
            Self::Holder => "holder",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "basic" => Ok(Self::Basic),
            "financial" => Ok(Self::Financial),
            "valuation" => Ok(Self::Valuation),
            "holder" => Ok(Self::Holder),
            other => Err(Error::InvalidInput(format!(
                "unknown data type '{}' (expected all, basic, financial, valuation or holder)",
                other
            ))),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Valuation figures from the profile, plus where today's multiples sit in
/// their own history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub total_market_cap: Option<f64>,
    pub float_market_cap: Option<f64>,
    /// Most recent point of the valuation history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<ValuationPoint>,
    #[serde(default)]
    pub history_count: usize,
    /// Share of historical PE-TTM values below the latest one (%)
    #[serde(default)]
    pub pe_ttm_percentile: Option<f64>,
    /// Share of historical PB values below the latest one (%)
    #[serde(default)]
    pub pb_percentile: Option<f64>,
}

impl From<&StockProfile> for ValuationSnapshot {
    fn from(profile: &StockProfile) -> Self {
        Self {
            pe: profile.pe,
            pb: profile.pb,
            total_market_cap: profile.total_market_cap,
            float_market_cap: profile.float_market_cap,
            ..Default::default()
        }
    }
}

impl ValuationSnapshot {
    /// Attach history statistics from points sorted oldest first.
    pub fn with_history(mut self, points: &[ValuationPoint]) -> Self {
        let Some(latest) = points.last() else {
            return self;
        };

        let pe_values: Vec<f64> = points.iter().filter_map(|p| p.pe_ttm).collect();
        let pb_values: Vec<f64> = points.iter().filter_map(|p| p.pb).collect();

        self.pe_ttm_percentile = latest.pe_ttm.and_then(|pe| percentile_below(&pe_values, pe));
        self.pb_percentile = latest.pb.and_then(|pb| percentile_below(&pb_values, pb));
        self.history_count = points.len();
        self.latest = Some(latest.clone());
        self
    }
}

/// Percentage of `values` strictly below `current`.
///
/// `None` for an empty history or a zero current value.
pub fn percentile_below(values: &[f64], current: f64) -> Option<f64> {
    if values.is_empty() || current == 0.0 {
        return None;
    }

    let below = values.iter().filter(|v| **v < current).count();
    Some(below as f64 * 100.0 / values.len() as f64)
}

/// Summary of recent daily prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub latest_price: f64,
    pub latest_date: String,
    pub price_change_pct: Option<f64>,
    pub volume: f64,
    pub turnover: f64,
    pub high_60d: f64,
    pub low_60d: f64,
    pub avg_volume_20d: f64,
    /// Most recent candles, oldest first
    pub price_data: Vec<Candle>,
}

impl PriceSummary {
    /// Summarize candles sorted oldest first; `None` when there are none.
    pub fn from_candles(candles: &[Candle]) -> Option<Self> {
        let latest = candles.last()?;

        let high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        let window = &candles[candles.len().saturating_sub(AVG_VOLUME_WINDOW)..];
        let avg_volume = window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64;

        let recent = &candles[candles.len().saturating_sub(RECENT_CANDLES)..];

        Some(Self {
            latest_price: latest.close,
            latest_date: latest.date.format("%Y-%m-%d").to_string(),
            price_change_pct: latest.change_pct,
            volume: latest.volume,
            turnover: latest.amount,
            high_60d: high,
            low_60d: low,
            avg_volume_20d: avg_volume,
            price_data: recent.to_vec(),
        })
    }
}

/// Statement rows, newest period first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    #[serde(default)]
    pub balance_sheet: Vec<ReportRecord>,
    #[serde(default)]
    pub income_statement: Vec<ReportRecord>,
    #[serde(default)]
    pub cash_flow: Vec<ReportRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderSection {
    #[serde(default)]
    pub top_10_holders: Vec<ReportRecord>,
    #[serde(default)]
    pub holder_count_history: Vec<ReportRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendSection {
    #[serde(default)]
    pub dividend_history: Vec<ReportRecord>,
    #[serde(default)]
    pub dividend_count: usize,
}

impl DividendSection {
    pub fn new(dividend_history: Vec<ReportRecord>) -> Self {
        Self {
            dividend_count: dividend_history.len(),
            dividend_history,
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Everything fetched for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDocument {
    pub code: String,
    pub fetch_time: DateTime<Local>,
    pub data_type: DataKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<StockProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_data: Option<FinancialStatements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_indicators: Option<Vec<ReportRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<ValuationSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<HolderSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend: Option<DividendSection>,
    /// Section name → error message
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl StockDocument {
    pub(crate) fn new(code: &str, kind: DataKind) -> Self {
        Self {
            code: code.to_string(),
            fetch_time: Local::now(),
            data_type: kind,
            basic_info: None,
            financial_data: None,
            financial_indicators: None,
            valuation: None,
            price: None,
            holder: None,
            dividend: None,
            errors: BTreeMap::new(),
        }
    }

    pub(crate) fn record_error(&mut self, section: &str, error: impl fmt::Display) {
        self.errors.insert(section.to_string(), error.to_string());
    }

    /// Fetched unless the profile failed or no section arrived at all.
    pub fn is_success(&self) -> bool {
        let profile_failed =
            self.errors.contains_key(BASIC_SECTION) || self.errors.contains_key(VALUATION_SECTION);
        !profile_failed && self.has_data()
    }

    /// Whether every requested section arrived.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    fn has_data(&self) -> bool {
        self.basic_info.is_some()
            || self.financial_data.is_some()
            || self.financial_indicators.is_some()
            || self.valuation.is_some()
            || self.price.is_some()
            || self.holder.is_some()
            || self.dividend.is_some()
    }
}

/// Result of a multi-stock fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDocument {
    pub fetch_time: DateTime<Local>,
    pub stocks: Vec<StockDocument>,
    pub success_count: usize,
    pub fail_count: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn candle(day: u32, close: f64, high: f64, low: f64, volume: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            close,
            high,
            low,
            volume,
            amount: volume * close,
            change_pct: Some(1.0),
        }
    }

    fn point(day: u32, pe_ttm: Option<f64>, pb: Option<f64>) -> ValuationPoint {
        ValuationPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            pe_ttm,
            pb,
        }
    }

    #[test]
    fn test_data_kind_parse() {
        assert_eq!("all".parse::<DataKind>().unwrap(), DataKind::All);
        assert_eq!("Basic".parse::<DataKind>().unwrap(), DataKind::Basic);
        assert_eq!("holder".parse::<DataKind>().unwrap(), DataKind::Holder);
        assert_eq!(" financial ".parse::<DataKind>().unwrap(), DataKind::Financial);
        assert!("quotes".parse::<DataKind>().unwrap_err().is_invalid_input());
    }

    #[test_case(DataKind::All => (true, true, true, true); "all")]
    #[test_case(DataKind::Basic => (true, false, false, false); "basic")]
    #[test_case(DataKind::Financial => (false, true, false, false); "financial")]
    #[test_case(DataKind::Valuation => (false, false, true, false); "valuation")]
    #[test_case(DataKind::Holder => (false, false, false, true); "holder")]
    fn test_data_kind_sections(kind: DataKind) -> (bool, bool, bool, bool) {
        (
            kind.includes_basic(),
            kind.includes_financial(),
            kind.includes_valuation(),
            kind.includes_holder(),
        )
    }

    #[test_case(&[10.0, 20.0, 30.0, 40.0, 25.0], 25.0 => Some(40.0); "middle")]
    #[test_case(&[1.0, 2.0, 3.0], 3.0 => Some(200.0 / 3.0); "latest is max")]
    #[test_case(&[5.0, 5.0], 5.0 => Some(0.0); "flat history")]
    #[test_case(&[], 5.0 => None; "no history")]
    #[test_case(&[-3.0, 1.0], 0.0 => None; "zero current")]
    fn test_percentile_below(values: &[f64], current: f64) -> Option<f64> {
        percentile_below(values, current)
    }

    #[test]
    fn test_valuation_history_skips_missing_values() {
        let points = vec![
            point(2, Some(10.0), None),
            point(3, None, Some(2.0)),
            point(4, Some(30.0), Some(1.0)),
            point(5, Some(20.0), Some(1.5)),
        ];

        let snapshot = ValuationSnapshot::default().with_history(&points);
        assert_eq!(snapshot.history_count, 4);
        // PE history [10, 30, 20]: one value below 20
        assert_eq!(snapshot.pe_ttm_percentile, Some(100.0 / 3.0));
        // PB history [2.0, 1.0, 1.5]: one value below 1.5
        assert_eq!(snapshot.pb_percentile, Some(100.0 / 3.0));
        assert_eq!(snapshot.latest.map(|p| p.date.to_string()), Some("2024-01-05".into()));
    }

    #[test]
    fn test_valuation_history_keeps_profile_figures() {
        let profile = StockProfile {
            pe: Some(12.0),
            pb: Some(1.1),
            ..Default::default()
        };
        let snapshot = ValuationSnapshot::from(&profile).with_history(&[]);
        assert_eq!(snapshot.pe, Some(12.0));
        assert_eq!(snapshot.history_count, 0);
        assert!(snapshot.latest.is_none());
    }

    #[test]
    fn test_price_summary_empty() {
        assert!(PriceSummary::from_candles(&[]).is_none());
    }

    #[test]
    fn test_price_summary_windows() {
        let candles: Vec<Candle> = (1..=31)
            .map(|d| candle(d, 10.0 + d as f64, 11.0 + d as f64, 9.0 + d as f64, d as f64 * 100.0))
            .collect();

        let summary = PriceSummary::from_candles(&candles).unwrap();
        assert_eq!(summary.latest_price, 41.0);
        assert_eq!(summary.latest_date, "2024-01-31");
        assert_eq!(summary.high_60d, 42.0);
        assert_eq!(summary.low_60d, 10.0);
        // mean of days 12..=31 → 21.5 * 100
        assert!((summary.avg_volume_20d - 2150.0).abs() < 1e-9);
        assert_eq!(summary.price_data.len(), 30);
        assert_eq!(summary.price_data[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_document_success_depends_on_profile() {
        let mut doc = StockDocument::new("600519", DataKind::All);
        assert!(!doc.is_success());

        doc.basic_info = Some(StockProfile::default());
        doc.record_error(PRICE_SECTION, "timeout");
        assert!(doc.is_success());
        assert!(!doc.is_complete());

        doc.record_error(BASIC_SECTION, "timeout");
        assert!(!doc.is_success());
    }

    #[test]
    fn test_report_only_document_succeeds_with_any_section() {
        let mut doc = StockDocument::new("600519", DataKind::Holder);
        doc.record_error("top_10_holders", "offline");
        doc.dividend = Some(DividendSection::default());
        assert!(doc.is_success());
    }
}
