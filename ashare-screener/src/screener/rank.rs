//! Ranking and output projection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::config::SortKey;
use super::filter::YUAN_PER_YI;
use super::scoring::ScoredRecord;
use crate::table::{Field, ResolvedColumns};

// ============================================================================
// Screen Row
// ============================================================================

/// One row of the screening output.
///
/// Unavailable values serialize as `""`; no key is ever omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRow {
    #[serde(rename = "代码")]
    pub code: String,
    #[serde(rename = "名称")]
    pub name: String,
    #[serde(rename = "最新价", with = "blank_if_none")]
    pub price: Option<f64>,
    #[serde(rename = "涨跌幅", with = "blank_if_none")]
    pub change_pct: Option<f64>,
    #[serde(rename = "市盈率", with = "blank_if_none")]
    pub pe: Option<f64>,
    #[serde(rename = "市净率", with = "blank_if_none")]
    pub pb: Option<f64>,
    /// Total market cap in 亿, rounded to 2 decimals
    #[serde(rename = "总市值(亿)", with = "blank_if_none")]
    pub market_cap_yi: Option<f64>,
    #[serde(rename = "评分")]
    pub score: f64,
}

impl ScreenRow {
    /// Project a scored record through the dataset's resolved columns.
    pub fn project(scored: &ScoredRecord, columns: &ResolvedColumns) -> Self {
        let record = &scored.record;
        let value = |field| columns.value(record, field);

        Self {
            code: columns.cell(record, Field::Code).as_text(),
            name: columns.cell(record, Field::Name).as_text(),
            price: value(Field::Price),
            change_pct: value(Field::ChangePct),
            pe: value(Field::Pe),
            pb: value(Field::Pb),
            market_cap_yi: value(Field::MarketCap).map(|cap| round2(cap / YUAN_PER_YI)),
            score: scored.score,
        }
    }

    /// Value this row is ranked by under `key`.
    pub fn sort_value(&self, key: SortKey) -> Option<f64> {
        match key {
            SortKey::Score => Some(self.score),
            SortKey::Pe => self.pe,
            SortKey::Pb => self.pb,
            SortKey::MarketCap => self.market_cap_yi,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `Option<f64>` as a number or `""`.
mod blank_if_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.is_finite() => serializer.serialize_f64(*v),
            _ => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => crate::table::normalize::parse_number(&s),
            _ => None,
        })
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Compare two sort values; missing values always sort last.
fn compare(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn truncate<T>(rows: &mut Vec<T>, top_n: Option<usize>) {
    if let Some(n) = top_n.filter(|&n| n > 0) {
        rows.truncate(n);
    }
}

/// Sort scored records by `key`, keep the first `top_n` and project them.
///
/// The sort is stable. When the key's column is absent from the dataset
/// the incoming order is kept.
pub fn rank_and_project(
    scored: &[ScoredRecord],
    columns: &ResolvedColumns,
    key: SortKey,
    top_n: Option<usize>,
) -> Vec<ScreenRow> {
    let mut order: Vec<(&ScoredRecord, Option<f64>)> = scored
        .iter()
        .map(|s| {
            let value = match key.field() {
                None => Some(s.score),
                Some(field) => columns.value(&s.record, field),
            };
            (s, value)
        })
        .collect();

    let sortable = key.field().map_or(true, |field| columns.has(field));
    if sortable {
        order.sort_by(|a, b| compare(a.1, b.1, key.descending()));
    }
    truncate(&mut order, top_n);

    order
        .into_iter()
        .map(|(s, _)| ScreenRow::project(s, columns))
        .collect()
}

/// Re-sort already projected rows.
///
/// Applying the same key and `top_n` to the output of [`rank_and_project`]
/// returns it unchanged.
pub fn rerank(mut rows: Vec<ScreenRow>, key: SortKey, top_n: Option<usize>) -> Vec<ScreenRow> {
    rows.sort_by(|a, b| compare(a.sort_value(key), b.sort_value(key), key.descending()));
    truncate(&mut rows, top_n);
    rows
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Dataset, StockRecord};
    use serde_json::json;

    fn scored(code: &str, pe: Option<f64>, cap: Option<f64>, score: f64) -> ScoredRecord {
        ScoredRecord {
            record: StockRecord::new()
                .with("代码", code)
                .with("名称", format!("股票{}", code))
                .with("市盈率-动态", pe)
                .with("总市值", cap),
            score,
        }
    }

    fn fixture() -> (Vec<ScoredRecord>, ResolvedColumns) {
        let rows = vec![
            scored("A", Some(12.0), Some(5.0e10), 60.0),
            scored("B", None, Some(2.0e11), 80.0),
            scored("C", Some(8.0), None, 60.0),
            scored("D", Some(30.0), Some(1.0e9), 45.0),
        ];
        let dataset = Dataset::from_records(rows.iter().map(|s| s.record.clone()).collect());
        (rows, ResolvedColumns::for_dataset(&dataset))
    }

    fn codes(rows: &[ScreenRow]) -> Vec<&str> {
        rows.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn test_score_descending_is_stable() {
        let (rows, columns) = fixture();
        let ranked = rank_and_project(&rows, &columns, SortKey::Score, None);
        assert_eq!(codes(&ranked), vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn test_pe_ascending_missing_last() {
        let (rows, columns) = fixture();
        let ranked = rank_and_project(&rows, &columns, SortKey::Pe, None);
        assert_eq!(codes(&ranked), vec!["C", "A", "D", "B"]);
    }

    #[test]
    fn test_market_cap_descending_missing_last() {
        let (rows, columns) = fixture();
        let ranked = rank_and_project(&rows, &columns, SortKey::MarketCap, None);
        assert_eq!(codes(&ranked), vec!["B", "A", "D", "C"]);
    }

    #[test]
    fn test_absent_sort_column_keeps_order() {
        let (rows, columns) = fixture();
        let ranked = rank_and_project(&rows, &columns, SortKey::Pb, None);
        assert_eq!(codes(&ranked), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_top_n_zero_keeps_all() {
        let (rows, columns) = fixture();
        assert_eq!(rank_and_project(&rows, &columns, SortKey::Score, Some(0)).len(), 4);
        assert_eq!(rank_and_project(&rows, &columns, SortKey::Score, Some(2)).len(), 2);
        assert_eq!(rank_and_project(&rows, &columns, SortKey::Score, Some(10)).len(), 4);
    }

    #[test]
    fn test_rerank_is_idempotent() {
        let (rows, columns) = fixture();
        for key in [SortKey::Score, SortKey::Pe, SortKey::Pb, SortKey::MarketCap] {
            let ranked = rank_and_project(&rows, &columns, key, Some(3));
            assert_eq!(rerank(ranked.clone(), key, Some(3)), ranked);
        }
    }

    #[test]
    fn test_projection_units_and_blanks() {
        let (rows, columns) = fixture();
        let ranked = rank_and_project(&rows, &columns, SortKey::Score, None);

        let b = &ranked[0];
        assert_eq!(b.market_cap_yi, Some(2000.0));
        assert_eq!(b.pe, None);

        let json = serde_json::to_value(b).unwrap();
        assert_eq!(json["代码"], json!("B"));
        assert_eq!(json["市盈率"], json!(""));
        assert_eq!(json["最新价"], json!(""));
        assert_eq!(json["总市值(亿)"], json!(2000.0));
        assert_eq!(json["评分"], json!(80.0));
    }

    #[test]
    fn test_market_cap_rounded_to_two_decimals() {
        let row = ScreenRow::project(
            &scored("E", None, Some(123_456_789.0), 50.0),
            &ResolvedColumns::from_columns(&["代码", "总市值"]),
        );
        assert_eq!(row.market_cap_yi, Some(1.23));
    }

    #[test]
    fn test_row_roundtrips_blank_values() {
        let row: ScreenRow = serde_json::from_value(json!({
            "代码": "600000", "名称": "浦发银行", "最新价": 7.5, "涨跌幅": "",
            "市盈率": "", "市净率": 0.45, "总市值(亿)": 2200.0, "评分": 65.0
        }))
        .unwrap();
        assert_eq!(row.change_pct, None);
        assert_eq!(row.pb, Some(0.45));
    }
}
