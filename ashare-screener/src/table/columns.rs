//! Column resolution by alias.
//!
//! The same semantic field shows up under different column names depending
//! on the data source and the era of the data. Each [`Field`] carries an
//! ordered alias list; the first alias present in a dataset wins. Later
//! sources added aliases rather than renaming, so the order is a preference,
//! not an accident.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::normalize::to_number;
use super::{Cell, Dataset, StockRecord};

/// Return the first alias (in priority order) present in `columns`.
///
/// The order of `columns` never matters, only the order of `aliases`.
pub fn resolve<'a, S: AsRef<str>>(columns: &[S], aliases: &[&'a str]) -> Option<&'a str> {
    aliases
        .iter()
        .copied()
        .find(|alias| columns.iter().any(|c| c.as_ref() == *alias))
}

/// Semantic fields the screener understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Code,
    Name,
    Price,
    ChangePct,
    Pe,
    Pb,
    Roe,
    DebtRatio,
    MarketCap,
    DividendYield,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Code,
        Field::Name,
        Field::Price,
        Field::ChangePct,
        Field::Pe,
        Field::Pb,
        Field::Roe,
        Field::DebtRatio,
        Field::MarketCap,
        Field::DividendYield,
    ];

    /// Known column names for this field, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Code => &["代码"],
            Self::Name => &["名称"],
            Self::Price => &["最新价"],
            Self::ChangePct => &["涨跌幅"],
            Self::Pe => &["市盈率-动态", "市盈率(动态)"],
            Self::Pb => &["市净率"],
            Self::Roe => &["净资产收益率", "ROE", "加权净资产收益率"],
            Self::DebtRatio => &["资产负债率"],
            Self::MarketCap => &["总市值"],
            Self::DividendYield => &["股息率"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Code => "代码",
            Self::Name => "名称",
            Self::Price => "最新价",
            Self::ChangePct => "涨跌幅",
            Self::Pe => "PE",
            Self::Pb => "PB",
            Self::Roe => "ROE",
            Self::DebtRatio => "资产负债率",
            Self::MarketCap => "总市值",
            Self::DividendYield => "股息率",
        };
        f.write_str(label)
    }
}

/// Every field resolved once against one dataset's columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedColumns {
    resolved: BTreeMap<Field, &'static str>,
}

impl ResolvedColumns {
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let resolved = Field::ALL
            .iter()
            .filter_map(|&field| resolve(columns, field.aliases()).map(|col| (field, col)))
            .collect();
        Self { resolved }
    }

    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self::from_columns(dataset.columns())
    }

    /// Column name backing `field`, if the dataset has one.
    pub fn column(&self, field: Field) -> Option<&'static str> {
        self.resolved.get(&field).copied()
    }

    pub fn has(&self, field: Field) -> bool {
        self.resolved.contains_key(&field)
    }

    /// Raw cell for `field`; `Missing` when the field is unresolved.
    pub fn cell<'r>(&self, record: &'r StockRecord, field: Field) -> &'r Cell {
        match self.column(field) {
            Some(col) => record.get(col),
            None => &super::MISSING,
        }
    }

    /// Normalized value for `field`; `None` when unresolved or not numeric.
    pub fn value(&self, record: &StockRecord, field: Field) -> Option<f64> {
        self.column(field).and_then(|col| to_number(record.get(col)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_first_alias() {
        let columns = ["代码", "ROE", "净资产收益率"];
        assert_eq!(resolve(&columns, Field::Roe.aliases()), Some("净资产收益率"));
    }

    #[test]
    fn test_resolve_ignores_column_order() {
        let forward = ["加权净资产收益率", "ROE"];
        let backward = ["ROE", "加权净资产收益率"];
        assert_eq!(resolve(&forward, Field::Roe.aliases()), Some("ROE"));
        assert_eq!(resolve(&backward, Field::Roe.aliases()), Some("ROE"));
    }

    #[test]
    fn test_resolve_miss() {
        let columns = ["代码", "名称"];
        assert_eq!(resolve(&columns, Field::Roe.aliases()), None);
        let none: [&str; 0] = [];
        assert_eq!(resolve(&none, Field::Pe.aliases()), None);
    }

    #[test]
    fn test_resolved_columns_value() {
        let record = StockRecord::new()
            .with("市盈率(动态)", "12.5")
            .with("市净率", "-");
        let resolved = ResolvedColumns::from_columns(&["市盈率(动态)", "市净率"]);

        assert_eq!(resolved.column(Field::Pe), Some("市盈率(动态)"));
        assert_eq!(resolved.value(&record, Field::Pe), Some(12.5));
        assert_eq!(resolved.value(&record, Field::Pb), None);
        assert!(!resolved.has(Field::Roe));
        assert!(resolved.cell(&record, Field::Roe).is_missing());
    }
}
