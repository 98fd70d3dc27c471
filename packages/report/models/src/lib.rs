#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Constituent record and statistics report types.
//!
//! [`PopulationRecord`] is the read-only input shape handed over by the
//! record store. Everything else in this crate is output: the grouped,
//! counted and percentage-annotated rows that make up a [`StatsReport`].
//! Exporters (spreadsheet, PDF, on-screen rendering) only read these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single constituent as returned by the record store.
///
/// Relation-derived names (`canvasser_name`, `referrer_name`) are already
/// joined upstream. Every categorical field is optional; an empty or
/// whitespace-only value is treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRecord {
    /// Store identifier of the constituent.
    pub id: String,
    /// Free-text city name.
    pub city: Option<String>,
    /// Free-text neighborhood name.
    pub neighborhood: Option<String>,
    /// Electoral zone (e.g. "Zona III" or "Zona 3").
    pub electoral_zone: Option<String>,
    /// Electoral section within the zone.
    pub electoral_section: Option<String>,
    /// Reliability classification assigned by the office.
    pub reliability_label: Option<String>,
    /// Name of the canvasser linked to this constituent.
    pub canvasser_name: Option<String>,
    /// Name of the person who referred this constituent.
    pub referrer_name: Option<String>,
}

/// One row of the pre-aggregated ranking source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// Identifier of the ranked constituent.
    pub entity_id: String,
    /// Activity count (number of services rendered).
    pub metric_count: u64,
}

/// Display details for a ranked constituent, from the batched lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetail {
    /// Identifier of the constituent.
    pub id: String,
    /// Name shown in the ranking.
    pub display_name: String,
    /// Secondary column shown next to the name (phone number).
    pub secondary_field: Option<String>,
}

/// A counted group for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedStat {
    /// Normalized key used for equality. Not shown to users.
    pub canonical_key: String,
    /// First-seen original spelling of the group.
    pub display_label: String,
    /// Number of records in the group.
    pub count: u64,
}

/// A [`GroupedStat`] with its share of the total population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionStat {
    /// Normalized key used for equality.
    pub canonical_key: String,
    /// First-seen original spelling of the group.
    pub display_label: String,
    /// Number of records in the group.
    pub count: u64,
    /// Percentage of the total population, one decimal place.
    pub percentage: f64,
}

/// A neighborhood counted within its city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedGroupedStat {
    /// Composite normalized `city|neighborhood` key.
    pub canonical_key: String,
    /// First-seen city label.
    pub city: String,
    /// First-seen neighborhood label.
    pub neighborhood: String,
    /// Number of records in this neighborhood of this city.
    pub count: u64,
    /// Percentage of the city's own total.
    pub percentage_of_city: f64,
    /// Percentage of the total population.
    pub percentage_of_total: f64,
}

/// A section counted within its electoral zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSectionStat {
    /// Composite normalized `zone|section` key.
    pub canonical_key: String,
    /// First-seen zone label.
    pub zone: String,
    /// First-seen section label.
    pub section: String,
    /// Number of records in this zone/section pair.
    pub count: u64,
    /// Percentage of the total population.
    pub percentage: f64,
}

/// A constituent in the most-served ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntity {
    /// Identifier as returned by the ranking source.
    pub id: String,
    /// Resolved name, or a placeholder if the lookup had no match.
    pub display_name: String,
    /// Resolved secondary column, if any.
    pub secondary_field: Option<String>,
    /// Activity count from the ranking source.
    pub metric: u64,
}

/// Fully assembled statistics for one tenant.
///
/// Built once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// Tenant the report was built for.
    pub tenant_id: String,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// Exact number of constituents registered for the tenant.
    pub total_population: u64,
    /// Breakdown by city.
    pub by_city: Vec<DimensionStat>,
    /// Breakdown by neighborhood within city.
    pub by_neighborhood: Vec<NestedGroupedStat>,
    /// Breakdown by electoral zone and section.
    pub by_zone_section: Vec<ZoneSectionStat>,
    /// Breakdown by canvasser.
    pub by_canvasser: Vec<DimensionStat>,
    /// Breakdown by referrer.
    pub by_referrer: Vec<DimensionStat>,
    /// Breakdown by reliability classification.
    pub by_reliability: Vec<DimensionStat>,
    /// Most-served constituents, highest metric first.
    pub top_ranked_entities: Vec<RankedEntity>,
}
