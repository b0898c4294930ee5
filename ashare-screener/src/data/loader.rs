//! Scope → dataset resolution.
//!
//! The loader never fails: an acquisition error degrades to an empty
//! dataset, which the pipeline turns into an empty result.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::provider::{DataProvider, ProviderError};
use super::retry::{retry_with_backoff, RetryPolicy};
use super::scope::Scope;
use crate::table::Dataset;

/// Loads the raw dataset for a scope through a [`DataProvider`].
pub struct DatasetLoader<P: DataProvider> {
    provider: Arc<P>,
    retry: RetryPolicy,
}

impl<P: DataProvider> DatasetLoader<P> {
    pub fn new(provider: Arc<P>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Load the dataset for `scope`; empty on any failure.
    pub async fn load(&self, scope: &Scope) -> Dataset {
        info!(scope = %scope, provider = self.provider.name(), "Loading stock data");

        match self.try_load(scope).await {
            Ok(dataset) => {
                info!(scope = %scope, rows = dataset.len(), "Stock data loaded");
                dataset
            }
            Err(e) => {
                error!(scope = %scope, error = %e, "Failed to load stock data");
                Dataset::empty()
            }
        }
    }

    async fn try_load(&self, scope: &Scope) -> Result<Dataset, ProviderError> {
        match scope {
            Scope::All => self.spot_table().await,
            Scope::Index { name, code } => {
                let codes = retry_with_backoff("index_constituents", self.retry, || {
                    self.provider.fetch_index_constituents(code)
                })
                .await?;
                info!(index = %name, code = *code, constituents = codes.len(), "Index constituents fetched");

                let spot = self.spot_table().await?;
                Ok(spot.retain_codes(&codes))
            }
            Scope::Custom(codes) => {
                if codes.is_empty() {
                    warn!("Custom scope lists no codes");
                    return Ok(Dataset::empty());
                }
                let spot = self.spot_table().await?;
                Ok(spot.retain_codes(codes))
            }
            Scope::Unknown(token) => {
                warn!(scope = %token, "Unknown scope, nothing to load");
                Ok(Dataset::empty())
            }
        }
    }

    async fn spot_table(&self) -> Result<Dataset, ProviderError> {
        retry_with_backoff("spot_table", self.retry, || self.provider.fetch_spot_table()).await
    }

    /// Codes in `scope`, without loading quotes for custom lists.
    pub async fn list_codes(&self, scope: &Scope) -> Vec<String> {
        let result = match scope {
            Scope::All => self
                .spot_table()
                .await
                .map(|spot| spot.rows().iter().map(|r| r.code()).filter(|c| !c.is_empty()).collect()),
            Scope::Index { code, .. } => {
                retry_with_backoff("index_constituents", self.retry, || {
                    self.provider.fetch_index_constituents(code)
                })
                .await
            }
            Scope::Custom(codes) => Ok(codes.clone()),
            Scope::Unknown(token) => {
                warn!(scope = %token, "Unknown scope, nothing to list");
                Ok(Vec::new())
            }
        };

        result.unwrap_or_else(|e| {
            error!(scope = %scope, error = %e, "Failed to list scope");
            Vec::new()
        })
    }
}
