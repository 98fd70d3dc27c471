#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Postgres-backed constituent store for the voter statistics engine.
//!
//! Implements [`voter_stats_report::PopulationStore`] on top of
//! `switchy_database`. All queries are raw SQL via `query_raw_params()`
//! and scoped to a single tenant.
//!
//! Expected schema:
//!
//! - `constituents (id uuid, tenant_id uuid, name, phone, city,
//!   neighborhood, electoral_zone, electoral_section, reliability,
//!   canvasser_id, referrer_id, created_at)`
//! - `canvassers (id, name)` and `referrers (id, name)`
//! - `top_served_constituents(tenant uuid, max_rows integer)` returning
//!   `(entity_id uuid, metric_count bigint)`

pub mod db;
pub mod queries;
pub mod store;

pub use store::PostgresPopulationStore;

use voter_stats_report::StoreError;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Database(e) => Self::Query {
                message: e.to_string(),
            },
            DbError::Conversion { message } => Self::Conversion { message },
        }
    }
}
