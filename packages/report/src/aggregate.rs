//! Percentage breakdowns over grouped counts.

use std::collections::BTreeMap;

use voter_stats_report_models::{DimensionStat, GroupedStat, NestedGroupedStat, ZoneSectionStat};

use crate::grouping::PairStat;

/// Returns `count` as a percentage of `total`, rounded to one decimal.
///
/// A zero `total` yields `0.0` so that an empty tenant still produces a
/// renderable report.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Attaches each group's share of `total`.
#[must_use]
pub fn with_percentages(stats: Vec<GroupedStat>, total: u64) -> Vec<DimensionStat> {
    stats
        .into_iter()
        .map(|stat| DimensionStat {
            percentage: percentage(stat.count, total),
            canonical_key: stat.canonical_key,
            display_label: stat.display_label,
            count: stat.count,
        })
        .collect()
}

/// Builds neighborhood-within-city rows from `city|neighborhood` pairs.
///
/// `cities` is the city dimension of the same record set; each pair's
/// parent total is the count of its canonical city there.
#[must_use]
pub fn nest_within_parent(
    pairs: Vec<PairStat>,
    cities: &[GroupedStat],
    total: u64,
) -> Vec<NestedGroupedStat> {
    let city_totals: BTreeMap<&str, u64> = cities
        .iter()
        .map(|city| (city.canonical_key.as_str(), city.count))
        .collect();

    pairs
        .into_iter()
        .map(|pair| {
            let city_total = city_totals
                .get(pair.first_key.as_str())
                .copied()
                .unwrap_or(0);

            NestedGroupedStat {
                canonical_key: pair.canonical_key(),
                percentage_of_city: percentage(pair.count, city_total),
                percentage_of_total: percentage(pair.count, total),
                city: pair.first_label,
                neighborhood: pair.second_label,
                count: pair.count,
            }
        })
        .collect()
}

/// Builds zone/section rows with their share of `total`.
#[must_use]
pub fn zone_sections(pairs: Vec<PairStat>, total: u64) -> Vec<ZoneSectionStat> {
    pairs
        .into_iter()
        .map(|pair| ZoneSectionStat {
            canonical_key: pair.canonical_key(),
            percentage: percentage(pair.count, total),
            zone: pair.first_label,
            section: pair.second_label,
            count: pair.count,
        })
        .collect()
}
