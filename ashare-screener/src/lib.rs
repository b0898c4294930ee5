//! A-Share Stock Screener Library
//!
//! Filters, scores and ranks A-share stocks from a heterogeneous tabular
//! snapshot whose column names and availability vary by data source.
//!
//! # Modules
//!
//! - [`table`]: schema-tolerant rows, alias-based column resolution and
//!   numeric normalization
//! - [`screener`]: filter pipeline, scoring heuristic, ranking, reports
//! - [`data`]: providers, scope resolution, retries, per-stock documents and
//!   the day-scoped cache
//!
//! # Key Concepts
//!
//! ## Missing data
//! Any cell that is null, a no-data sentinel (`-`, `--`, ...) or unparsable is
//! "missing". A missing value fails any filter applied to it and contributes
//! nothing to the score. A column that is absent altogether makes its filter
//! a no-op.
//!
//! ## Units
//! Market cap is stored in yuan and compared/reported in 亿 (1e8 yuan).

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod screener;
pub mod table;

pub use data::{DataProvider, EastmoneyProvider, ProviderError, Scope};
pub use screener::{FilterParams, ScreenRequest, ScreenResult, ScreenerEngine, SortKey};
pub use table::{Cell, Dataset, Field, StockRecord};
