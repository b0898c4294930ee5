//! Screen request parameters.
//!
//! Defines what a single screening run asks for: the scope token, the
//! numeric filter bounds, the sort key and the result size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use screener_common::{Error, ScreenerDefaults};

use super::filter::{Constraint, FilterSpec};
use crate::table::Field;

// ============================================================================
// Filter Parameters
// ============================================================================

/// User-facing filter bounds. All bounds are inclusive and optional.
///
/// Market cap bounds are in 亿 (hundreds of millions of yuan); percentages
/// are in percent units, as the data sources report them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pb_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pb_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roe_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_ratio_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_max: Option<f64>,
}

impl FilterParams {
    /// Whether no bound at all is set.
    pub fn is_empty(&self) -> bool {
        self.to_spec().is_empty()
    }

    /// Build the ordered constraint list.
    ///
    /// Fields with neither bound set are dropped here.
    pub fn to_spec(&self) -> FilterSpec {
        [
            Constraint::new(Field::Pe, self.pe_min, self.pe_max),
            Constraint::new(Field::Pb, self.pb_min, self.pb_max),
            Constraint::new(Field::Roe, self.roe_min, None),
            Constraint::new(Field::DebtRatio, None, self.debt_ratio_max),
            Constraint::new(Field::DividendYield, self.dividend_min, None),
            Constraint::new(Field::MarketCap, self.market_cap_min, self.market_cap_max),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// ============================================================================
// Sort Key
// ============================================================================

/// Ranking key. Each key has a fixed direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Composite score, descending
    #[default]
    Score,
    /// PE, ascending
    Pe,
    /// PB, ascending
    Pb,
    /// Total market cap, descending
    MarketCap,
}

impl SortKey {
    pub fn descending(self) -> bool {
        matches!(self, Self::Score | Self::MarketCap)
    }

    /// Field backing this key; `None` for the derived score.
    pub fn field(self) -> Option<Field> {
        match self {
            Self::Score => None,
            Self::Pe => Some(Field::Pe),
            Self::Pb => Some(Field::Pb),
            Self::MarketCap => Some(Field::MarketCap),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score => write!(f, "score"),
            Self::Pe => write!(f, "pe"),
            Self::Pb => write!(f, "pb"),
            Self::MarketCap => write!(f, "market_cap"),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "score" => Ok(Self::Score),
            "pe" => Ok(Self::Pe),
            "pb" => Ok(Self::Pb),
            "market_cap" | "market-cap" => Ok(Self::MarketCap),
            other => Err(Error::InvalidInput(format!(
                "unknown sort key '{}' (expected score, pe, pb or market_cap)",
                other
            ))),
        }
    }
}

// ============================================================================
// Screen Request
// ============================================================================

/// Everything one screening run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRequest {
    /// Scope token (see `data::Scope`)
    pub scope: String,
    /// Filter bounds
    #[serde(default)]
    pub filters: FilterParams,
    /// Ranking key
    #[serde(default)]
    pub sort_by: SortKey,
    /// Maximum number of rows; `None` or `Some(0)` keeps all
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl ScreenRequest {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            filters: FilterParams::default(),
            sort_by: SortKey::default(),
            top_n: None,
        }
    }

    /// Request seeded from configured defaults.
    pub fn from_defaults(defaults: &ScreenerDefaults) -> Result<Self, Error> {
        Ok(Self {
            scope: defaults.default_scope.clone(),
            filters: FilterParams::default(),
            sort_by: defaults.default_sort.parse()?,
            top_n: Some(defaults.default_top),
        })
    }

    pub fn with_filters(mut self, filters: FilterParams) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_top(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params_build_empty_spec() {
        let params = FilterParams::default();
        assert!(params.is_empty());
        assert!(params.to_spec().is_empty());
    }

    #[test]
    fn test_spec_order_is_fixed() {
        let params = FilterParams {
            market_cap_min: Some(100.0),
            pe_max: Some(20.0),
            roe_min: Some(10.0),
            ..Default::default()
        };
        let fields: Vec<Field> = params.to_spec().constraints().iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![Field::Pe, Field::Roe, Field::MarketCap]);
    }

    #[test]
    fn test_params_serialize_only_set_bounds() {
        let params = FilterParams {
            pe_max: Some(20.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"pe_max": 20.0}));
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("score".parse::<SortKey>().unwrap(), SortKey::Score);
        assert_eq!("PE".parse::<SortKey>().unwrap(), SortKey::Pe);
        assert_eq!("market_cap".parse::<SortKey>().unwrap(), SortKey::MarketCap);
        let err = "volume".parse::<SortKey>().unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_sort_key_direction() {
        assert!(SortKey::Score.descending());
        assert!(SortKey::MarketCap.descending());
        assert!(!SortKey::Pe.descending());
        assert!(!SortKey::Pb.descending());
    }

    #[test]
    fn test_request_from_defaults() {
        let request = ScreenRequest::from_defaults(&ScreenerDefaults::default()).unwrap();
        assert_eq!(request.scope, "hs300");
        assert_eq!(request.sort_by, SortKey::Score);
        assert_eq!(request.top_n, Some(50));
    }
}
