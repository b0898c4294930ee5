//! Composite quality score.
//!
//! A baseline of 50 plus independent additive rules over PE, PB, ROE and the
//! day's change. Every rule is a pure function of one normalized value, so a
//! missing input simply contributes nothing. The total is clamped to
//! [0, 100].

use serde::{Deserialize, Serialize};

use crate::table::{Dataset, Field, ResolvedColumns, StockRecord};

/// Score before any rule applies.
pub const BASELINE: f64 = 50.0;

/// Lowest possible score.
pub const MIN_SCORE: f64 = 0.0;

/// Highest possible score.
pub const MAX_SCORE: f64 = 100.0;

// ============================================================================
// Rules
// ============================================================================

/// Cheap earnings score higher; loss-making (PE <= 0) is not scored.
pub fn pe_points(pe: Option<f64>) -> f64 {
    match pe {
        Some(pe) if pe > 0.0 => {
            if pe < 10.0 {
                15.0
            } else if pe < 15.0 {
                10.0
            } else if pe < 20.0 {
                5.0
            } else if pe > 50.0 {
                -10.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Book-value band. PB at or below 0.5 earns nothing.
pub fn pb_points(pb: Option<f64>) -> f64 {
    match pb {
        Some(pb) if pb > 0.0 => {
            if pb > 0.5 && pb < 1.5 {
                10.0
            } else if (1.5..3.0).contains(&pb) {
                5.0
            } else if pb > 5.0 {
                -5.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Profitability. Applies to any sign.
pub fn roe_points(roe: Option<f64>) -> f64 {
    match roe {
        Some(roe) if roe > 20.0 => 15.0,
        Some(roe) if roe > 15.0 => 10.0,
        Some(roe) if roe > 10.0 => 5.0,
        Some(roe) if roe < 5.0 => -5.0,
        _ => 0.0,
    }
}

/// A down day is treated as an entry opportunity.
pub fn change_points(change_pct: Option<f64>) -> f64 {
    match change_pct {
        Some(c) if c > -5.0 && c < 0.0 => 3.0,
        Some(c) if c < -5.0 => 5.0,
        _ => 0.0,
    }
}

// ============================================================================
// Breakdown
// ============================================================================

/// Per-rule contributions for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pe: f64,
    pub pb: f64,
    pub roe: f64,
    pub change: f64,
}

impl ScoreBreakdown {
    /// Baseline plus all contributions, unclamped.
    pub fn raw_total(&self) -> f64 {
        BASELINE + self.pe + self.pb + self.roe + self.change
    }

    /// Final score in [0, 100].
    pub fn score(&self) -> f64 {
        self.raw_total().clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// A record together with its final score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: StockRecord,
    pub score: f64,
}

// ============================================================================
// Heuristic
// ============================================================================

/// Scores records against one dataset's resolved columns.
pub struct ScoringHeuristic<'a> {
    columns: &'a ResolvedColumns,
}

impl<'a> ScoringHeuristic<'a> {
    pub fn new(columns: &'a ResolvedColumns) -> Self {
        Self { columns }
    }

    pub fn breakdown(&self, record: &StockRecord) -> ScoreBreakdown {
        let value = |field| self.columns.value(record, field);
        ScoreBreakdown {
            pe: pe_points(value(Field::Pe)),
            pb: pb_points(value(Field::Pb)),
            roe: roe_points(value(Field::Roe)),
            change: change_points(value(Field::ChangePct)),
        }
    }

    pub fn score(&self, record: &StockRecord) -> f64 {
        self.breakdown(record).score()
    }

    /// Score every row, keeping dataset order.
    pub fn score_dataset(&self, dataset: &Dataset) -> Vec<ScoredRecord> {
        dataset
            .rows()
            .iter()
            .map(|record| ScoredRecord {
                record: record.clone(),
                score: self.score(record),
            })
            .collect()
    }
}

/// Score a standalone record, resolving columns from the record itself.
pub fn score(record: &StockRecord) -> f64 {
    breakdown(record).score()
}

/// Breakdown for a standalone record.
pub fn breakdown(record: &StockRecord) -> ScoreBreakdown {
    let columns: Vec<&str> = record.columns().collect();
    let resolved = ResolvedColumns::from_columns(&columns);
    ScoringHeuristic::new(&resolved).breakdown(record)
}

// ============================================================================
// Tests
// ============================================================================
