//! Record store contract.
//!
//! The engine never talks to a database directly. Everything it reads
//! comes through [`PopulationStore`], scoped to one tenant per call.

use async_trait::async_trait;
use voter_stats_report_models::{EntityDetail, PopulationRecord, RankingEntry};

use crate::StoreError;

/// Read-only access to a tenant's constituent data.
#[async_trait]
pub trait PopulationStore: Send + Sync {
    /// Returns the exact number of constituents registered for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the count cannot be obtained.
    async fn fetch_total_count(&self, tenant_id: &str) -> Result<u64, StoreError>;

    /// Returns every constituent of the tenant with canvasser and referrer
    /// names already joined.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the records cannot be fetched.
    async fn fetch_records(&self, tenant_id: &str) -> Result<Vec<PopulationRecord>, StoreError>;

    /// Returns at most `limit` constituent ids ordered by activity count,
    /// highest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the ranking source fails.
    async fn fetch_top_ranked(
        &self,
        tenant_id: &str,
        limit: u32,
    ) -> Result<Vec<RankingEntry>, StoreError>;

    /// Looks up display details for all `ids` of the tenant in one batch.
    /// Ids without a match, including ids of other tenants, are simply
    /// absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    async fn fetch_entity_details(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> Result<Vec<EntityDetail>, StoreError>;
}
