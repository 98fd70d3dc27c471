//! Report assembly.
//!
//! [`build_report`] fetches the population once, runs every dimension
//! over that single in-memory record set and joins in the ranking. All
//! accumulators live on the stack of one call; nothing is cached between
//! tenants or requests.

use std::time::Instant;

use voter_stats_report_models::{DimensionStat, GroupedStat, PopulationRecord, StatsReport};

use crate::aggregate::{nest_within_parent, with_percentages, zone_sections};
use crate::grouping::{group, group_pair, group_with_unknown};
use crate::ranking::rank_top;
use crate::store::PopulationStore;
use crate::{StatsError, StoreError};

/// Default number of entries in the most-served ranking.
pub const DEFAULT_TOP_LIMIT: u32 = 10;

/// Environment variable overriding [`ReportOptions::top_limit`].
pub const TOP_LIMIT_ENV: &str = "VOTER_STATS_TOP_LIMIT";

/// Environment variable setting [`ReportOptions::unknown_label`].
pub const UNKNOWN_LABEL_ENV: &str = "VOTER_STATS_UNKNOWN_LABEL";

/// Caller-tunable knobs for [`build_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Maximum number of ranked entities.
    pub top_limit: u32,
    /// When set, single-field dimensions count records without a value
    /// under this label instead of leaving them out.
    pub unknown_label: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_limit: DEFAULT_TOP_LIMIT,
            unknown_label: None,
        }
    }
}

impl ReportOptions {
    /// Reads options from `VOTER_STATS_TOP_LIMIT` and
    /// `VOTER_STATS_UNKNOWN_LABEL`, keeping defaults for anything unset
    /// or invalid.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(raw) = lookup(TOP_LIMIT_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(limit) => options.top_limit = limit,
                Err(e) => log::warn!(
                    "Ignoring invalid {TOP_LIMIT_ENV}={raw:?} ({e}), using {DEFAULT_TOP_LIMIT}"
                ),
            }
        }

        options.unknown_label = lookup(UNKNOWN_LABEL_ENV)
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty());

        options
    }
}

/// Groups one single-field dimension, honoring the unknown-bucket option.
fn dimension(
    records: &[PopulationRecord],
    key: impl Fn(&PopulationRecord) -> Option<&str>,
    options: &ReportOptions,
) -> Vec<GroupedStat> {
    match options.unknown_label.as_deref() {
        Some(label) => group_with_unknown(records, key, label),
        None => group(records, key),
    }
}

/// Builds the statistics report for one tenant.
///
/// The total count, the record set and the ranking are fetched
/// concurrently. If the total or the records cannot be fetched the
/// pending ranking is dropped and the whole call fails. Ranking problems
/// only ever empty or placeholder-fill `top_ranked_entities`.
///
/// Dropping the returned future cancels any in-flight fetch.
///
/// # Errors
///
/// Returns [`StatsError::Fetch`] if the population total or record set is
/// unavailable.
pub async fn build_report(
    store: &dyn PopulationStore,
    tenant_id: &str,
    options: &ReportOptions,
) -> Result<StatsReport, StatsError> {
    let start = Instant::now();

    let (total_population, records, top_ranked_entities) = futures::try_join!(
        store.fetch_total_count(tenant_id),
        store.fetch_records(tenant_id),
        async { Ok::<_, StoreError>(rank_top(store, tenant_id, options.top_limit).await) },
    )?;

    if u64::try_from(records.len()).is_ok_and(|fetched| fetched > total_population) {
        log::warn!(
            "Tenant {tenant_id}: total count {total_population} is below the {} fetched records",
            records.len()
        );
    }

    let cities = dimension(&records, |r| r.city.as_deref(), options);

    let neighborhoods = group_pair(
        &records,
        |r| r.city.as_deref(),
        |r| r.neighborhood.as_deref(),
    );
    let by_neighborhood = nest_within_parent(neighborhoods, &cities, total_population);

    let zones = group_pair(
        &records,
        |r| r.electoral_zone.as_deref(),
        |r| r.electoral_section.as_deref(),
    );
    let by_zone_section = zone_sections(zones, total_population);

    let share = |stats: Vec<GroupedStat>| -> Vec<DimensionStat> {
        with_percentages(stats, total_population)
    };

    let report = StatsReport {
        tenant_id: tenant_id.to_string(),
        generated_at: chrono::Utc::now(),
        total_population,
        by_city: share(cities),
        by_neighborhood,
        by_zone_section,
        by_canvasser: share(dimension(&records, |r| r.canvasser_name.as_deref(), options)),
        by_referrer: share(dimension(&records, |r| r.referrer_name.as_deref(), options)),
        by_reliability: share(dimension(
            &records,
            |r| r.reliability_label.as_deref(),
            options,
        )),
        top_ranked_entities,
    };

    log::info!(
        "Built report for tenant {tenant_id}: {} constituents, {} cities, {} ranked in {:.2?}",
        report.total_population,
        report.by_city.len(),
        report.top_ranked_entities.len(),
        start.elapsed()
    );

    Ok(report)
}

/// [`build_report`] with [`ReportOptions::default`].
///
/// # Errors
///
/// Returns [`StatsError::Fetch`] if the population total or record set is
/// unavailable.
pub async fn build_report_with_defaults(
    store: &dyn PopulationStore,
    tenant_id: &str,
) -> Result<StatsReport, StatsError> {
    build_report(store, tenant_id, &ReportOptions::default()).await
}
