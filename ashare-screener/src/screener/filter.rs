//! Filter pipeline.
//!
//! Applies inclusive numeric range constraints over alias-resolved columns.
//!
//! - A constraint whose column is absent from the dataset is skipped: every
//!   row passes it (vacuous pass).
//! - A row whose value is missing fails any constraint that is applied.
//! - Market cap bounds are in 亿; the native yuan value is divided by 1e8
//!   before comparison.
//!
//! Constraints are commutative. They are still applied in a fixed order so
//! the per-stage statistics and logs are reproducible.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::{Dataset, Field, ResolvedColumns};

/// Yuan per 亿.
pub const YUAN_PER_YI: f64 = 1e8;

// ============================================================================
// Constraint
// ============================================================================

/// An inclusive range bound on one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub field: Field,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Constraint {
    /// Create a constraint; `None` when neither bound is set.
    pub fn new(field: Field, min: Option<f64>, max: Option<f64>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            return None;
        }
        Some(Self { field, min, max })
    }

    /// Divisor from the dataset's native unit to the bound's unit.
    fn scale(&self) -> f64 {
        match self.field {
            Field::MarketCap => YUAN_PER_YI,
            _ => 1.0,
        }
    }

    /// Whether a normalized native value satisfies the bounds.
    pub fn admits(&self, value: Option<f64>) -> bool {
        let Some(raw) = value else {
            return false;
        };
        let value = raw / self.scale();
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

// ============================================================================
// Filter Spec
// ============================================================================

/// Ordered set of constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    constraints: Vec<Constraint>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint; bound-less constraints are ignored.
    pub fn with(mut self, field: Field, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.extend(Constraint::new(field, min, max));
        self
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl FromIterator<Constraint> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Filter Result
// ============================================================================

/// Outcome of one constraint stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Field the stage filtered on
    pub stage: Field,
    /// Column the field resolved to; `None` when the stage was skipped
    pub column: Option<String>,
    /// Rows that passed this stage
    pub passed: usize,
    /// Rows eliminated at this stage
    pub eliminated: usize,
    /// Elimination rate (%)
    pub elimination_rate: f64,
}

impl FilterResult {
    pub fn new(stage: Field, column: Option<&str>, input_count: usize, passed_count: usize) -> Self {
        let eliminated = input_count.saturating_sub(passed_count);
        let elimination_rate = if input_count > 0 {
            (eliminated as f64 / input_count as f64) * 100.0
        } else {
            0.0
        };

        Self {
            stage,
            column: column.map(str::to_string),
            passed: passed_count,
            eliminated,
            elimination_rate,
        }
    }

    pub fn skipped(&self) -> bool {
        self.column.is_none()
    }
}

// ============================================================================
// Filter Pipeline
// ============================================================================

/// Applies a [`FilterSpec`] to datasets.
pub struct FilterPipeline {
    spec: FilterSpec,
}

impl FilterPipeline {
    pub fn new(spec: FilterSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Filter `dataset`, returning the derived dataset and one result per
    /// constraint (skipped constraints included).
    pub fn apply(&self, dataset: &Dataset) -> (Dataset, Vec<FilterResult>) {
        let columns = ResolvedColumns::for_dataset(dataset);
        let mut current = dataset.clone();
        let mut results = Vec::with_capacity(self.spec.constraints.len());

        for constraint in &self.spec.constraints {
            let input_count = current.len();

            let Some(column) = columns.column(constraint.field) else {
                debug!(field = %constraint.field, "Column absent, constraint skipped");
                results.push(FilterResult::new(constraint.field, None, input_count, input_count));
                continue;
            };

            current = current.filter_rows(|row| {
                constraint.admits(columns.value(row, constraint.field))
            });

            let result = FilterResult::new(constraint.field, Some(column), input_count, current.len());
            debug!(
                field = %constraint.field,
                column = column,
                min = ?constraint.min,
                max = ?constraint.max,
                passed = result.passed,
                eliminated = result.eliminated,
                "Constraint applied"
            );
            results.push(result);
        }

        (current, results)
    }
}

// ============================================================================
// Tests
// ============================================================================
