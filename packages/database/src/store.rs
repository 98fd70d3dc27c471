//! [`PopulationStore`] implementation over a `switchy_database` connection.

use async_trait::async_trait;
use switchy_database::Database;
use voter_stats_report::{PopulationStore, StoreError};
use voter_stats_report_models::{EntityDetail, PopulationRecord, RankingEntry};

use crate::{db, queries};

/// Constituent store backed by Postgres.
pub struct PostgresPopulationStore {
    db: Box<dyn Database>,
}

impl PostgresPopulationStore {
    /// Wraps an existing connection.
    #[must_use]
    pub const fn new(db: Box<dyn Database>) -> Self {
        Self { db }
    }

    /// Connects using `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect_from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(db::connect_from_env().await?))
    }
}

#[async_trait]
impl PopulationStore for PostgresPopulationStore {
    async fn fetch_total_count(&self, tenant_id: &str) -> Result<u64, StoreError> {
        Ok(queries::count_constituents(self.db.as_ref(), tenant_id).await?)
    }

    async fn fetch_records(&self, tenant_id: &str) -> Result<Vec<PopulationRecord>, StoreError> {
        Ok(queries::load_constituents(self.db.as_ref(), tenant_id).await?)
    }

    async fn fetch_top_ranked(
        &self,
        tenant_id: &str,
        limit: u32,
    ) -> Result<Vec<RankingEntry>, StoreError> {
        Ok(queries::top_served_constituents(self.db.as_ref(), tenant_id, limit).await?)
    }

    async fn fetch_entity_details(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> Result<Vec<EntityDetail>, StoreError> {
        Ok(queries::constituent_details(self.db.as_ref(), tenant_id, ids).await?)
    }
}
