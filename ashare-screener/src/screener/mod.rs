//! Screening & scoring engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────┐    ┌─────────────┐
//! │   Loader    │───▶│    Filter    │───▶│   Scoring    │───▶│  Rank &     │
//! │  (data)     │    │   Pipeline   │    │  Heuristic   │    │  Project    │
//! └─────────────┘    └──────────────┘    └──────────────┘    └─────────────┘
//!                           │                   │                   │
//!                           └──── table::columns / table::normalize ┘
//! ```
//!
//! Filter, scoring and ranking are synchronous pure transformations over a
//! [`Dataset`](crate::table::Dataset); only loading is async.
//!
//! # Usage
//!
//! ```ignore
//! use ashare_screener::screener::{FilterParams, ScreenRequest, ScreenerEngine};
//!
//! let engine = ScreenerEngine::new(provider, RetryPolicy::default());
//! let request = ScreenRequest::new("hs300").with_filters(FilterParams {
//!     pe_max: Some(20.0),
//!     ..Default::default()
//! });
//! let result = engine.run(&request).await;
//! ```

pub mod config;
pub mod engine;
pub mod filter;
pub mod rank;
pub mod report;
pub mod scoring;

pub use config::{FilterParams, ScreenRequest, SortKey};
pub use engine::{screen_dataset, ScreenResult, ScreenerEngine};
pub use filter::{Constraint, FilterPipeline, FilterResult, FilterSpec};
pub use rank::{rank_and_project, rerank, ScreenRow};
pub use report::{ReportFormat, ScreenReport};
pub use scoring::{ScoreBreakdown, ScoredRecord, ScoringHeuristic};
