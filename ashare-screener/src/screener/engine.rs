//! Screener engine.
//!
//! Orchestrates one screening run: load → filter → score → rank.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

use screener_common::logging::generate_run_id;

use super::config::{FilterParams, ScreenRequest};
use super::filter::{FilterPipeline, FilterResult};
use super::rank::{rank_and_project, ScreenRow};
use super::scoring::ScoringHeuristic;
use crate::data::{DataProvider, DatasetLoader, RetryPolicy, Scope};
use crate::table::{Dataset, ResolvedColumns};

// ============================================================================
// Screen Result
// ============================================================================

/// Result of a screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenResult {
    /// When the screen ran (local time)
    pub screen_time: DateTime<Local>,
    /// Scope token as requested
    pub scope: String,
    /// Filter bounds as requested
    pub filters: FilterParams,
    /// Number of result rows
    pub count: usize,
    /// Ranked rows
    pub results: Vec<ScreenRow>,
    /// Per-constraint statistics
    #[serde(skip)]
    pub filter_results: Vec<FilterResult>,
    /// Rows in the loaded dataset
    #[serde(skip)]
    pub total_scanned: usize,
}

impl ScreenResult {
    /// Empty result for a request.
    pub fn empty(request: &ScreenRequest) -> Self {
        Self {
            screen_time: Local::now(),
            scope: request.scope.clone(),
            filters: request.filters.clone(),
            count: 0,
            results: Vec::new(),
            filter_results: Vec::new(),
            total_scanned: 0,
        }
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "Screened {} stocks: {} selected ({:.1}%)",
            self.total_scanned,
            self.count,
            if self.total_scanned > 0 {
                (self.count as f64 / self.total_scanned as f64) * 100.0
            } else {
                0.0
            }
        )
    }
}

/// Run the synchronous pipeline over an already loaded dataset.
///
/// Never fails: an empty dataset, or one without any usable column, yields a
/// result with zero or unfiltered rows rather than an error.
pub fn screen_dataset(dataset: &Dataset, request: &ScreenRequest) -> ScreenResult {
    let mut result = ScreenResult::empty(request);
    result.total_scanned = dataset.len();

    if dataset.is_empty() {
        info!(scope = %request.scope, "Empty dataset, nothing to screen");
        return result;
    }

    let pipeline = FilterPipeline::new(request.filters.to_spec());
    let (filtered, filter_results) = pipeline.apply(dataset);
    info!(
        input = dataset.len(),
        passed = filtered.len(),
        constraints = filter_results.len(),
        "Filters applied"
    );

    let columns = ResolvedColumns::for_dataset(&filtered);
    let scored = ScoringHeuristic::new(&columns).score_dataset(&filtered);
    let rows = rank_and_project(&scored, &columns, request.sort_by, request.top_n);

    result.count = rows.len();
    result.results = rows;
    result.filter_results = filter_results;
    info!(sort_by = %request.sort_by, "{}", result.summary());

    result
}

// ============================================================================
// Screener Engine
// ============================================================================

/// The screener engine.
///
/// Resolves the request's scope to a dataset through a provider, then runs
/// [`screen_dataset`] on it.
pub struct ScreenerEngine<P: DataProvider> {
    loader: DatasetLoader<P>,
}

impl<P: DataProvider> ScreenerEngine<P> {
    pub fn new(provider: Arc<P>, retry: RetryPolicy) -> Self {
        Self {
            loader: DatasetLoader::new(provider, retry),
        }
    }

    pub fn from_loader(loader: DatasetLoader<P>) -> Self {
        Self { loader }
    }

    /// Run one screen. Acquisition failures surface as an empty result.
    pub async fn run(&self, request: &ScreenRequest) -> ScreenResult {
        let run_id = generate_run_id();
        let span = info_span!("screen", run_id = %run_id, scope = %request.scope);

        async {
            let scope = Scope::parse(&request.scope);
            let dataset = self.loader.load(&scope).await;
            screen_dataset(&dataset, request)
        }
        .instrument(span)
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
