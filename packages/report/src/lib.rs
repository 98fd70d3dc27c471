#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Voter statistics aggregation engine.
//!
//! Turns the raw constituent population of one tenant into a
//! [`StatsReport`](voter_stats_report_models::StatsReport): free-text
//! fields are canonicalized ([`normalize`]), grouped per dimension
//! ([`grouping`]), annotated with percentages ([`aggregate`]) and joined
//! with a most-served ranking ([`ranking`]). [`report::build_report`] is
//! the entry point; the record store is reached only through the
//! [`store::PopulationStore`] trait.

pub mod aggregate;
pub mod grouping;
pub mod normalize;
pub mod ranking;
pub mod report;
pub mod store;

pub use report::{ReportOptions, build_report, build_report_with_defaults};
pub use store::PopulationStore;

use thiserror::Error;

/// Errors returned by a [`PopulationStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying query failed or the store was unreachable.
    #[error("Query error: {message}")]
    Query {
        /// Description of what went wrong.
        message: String,
    },

    /// A row could not be converted into the expected shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Errors that abort report assembly.
///
/// Only the population fetch is fatal. Ranking and detail lookups degrade
/// to empty or placeholder data instead of surfacing here.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The total count or the record set could not be fetched.
    #[error("Population fetch failed: {0}")]
    Fetch(#[from] StoreError),
}
