//! Grouping of records by canonicalized categorical fields.
//!
//! Every dimension of the report goes through here. Values are keyed by
//! [`normalize`], the first original spelling seen becomes the group's
//! display label, and groups come out sorted by count with ties in
//! first-seen order.

use std::collections::BTreeMap;

use voter_stats_report_models::GroupedStat;

use crate::normalize::normalize;

/// Separator used when rendering a composite key.
pub const KEY_SEPARATOR: char = '|';

/// Escape character for [`KEY_SEPARATOR`] inside a rendered key part.
const KEY_ESCAPE: char = '\\';

/// Escapes [`KEY_ESCAPE`] and [`KEY_SEPARATOR`] so the pair can be split
/// back unambiguously.
fn escape_key_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if c == KEY_ESCAPE || c == KEY_SEPARATOR {
            escaped.push(KEY_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// A counted group for a two-field composite dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairStat {
    /// Canonical key of the first (parent) field.
    pub first_key: String,
    /// Canonical key of the second (child) field.
    pub second_key: String,
    /// First-seen label of the first field.
    pub first_label: String,
    /// First-seen label of the second field.
    pub second_label: String,
    /// Number of records with this pair.
    pub count: u64,
}

impl PairStat {
    /// Renders the composite key as `first|second`, with any `\` or `|`
    /// inside either part escaped by a backslash. Distinct pairs always
    /// render to distinct keys.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        format!(
            "{}{KEY_SEPARATOR}{}",
            escape_key_part(&self.first_key),
            escape_key_part(&self.second_key)
        )
    }
}

/// Returns the original value and its canonical key, or `None` if the
/// value is absent or normalizes to nothing.
fn canonicalize(value: Option<&str>) -> Option<(&str, String)> {
    let value = value?;
    let key = normalize(value);
    if key.is_empty() {
        None
    } else {
        Some((value, key))
    }
}

/// Stable sort, so equal counts keep insertion order.
fn sort_by_count_desc<T>(groups: &mut [T], count: impl Fn(&T) -> u64) {
    groups.sort_by(|a, b| count(b).cmp(&count(a)));
}

/// Core accumulator shared by [`group`] and [`group_with_unknown`].
///
/// `extract` yields `(canonical_key, display_label)` for records that
/// belong to some group.
fn accumulate<'a, T>(
    records: &'a [T],
    extract: impl Fn(&'a T) -> Option<(String, &'a str)>,
) -> Vec<GroupedStat> {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut groups: Vec<GroupedStat> = Vec::new();

    for record in records {
        let Some((key, label)) = extract(record) else {
            continue;
        };

        if let Some(&i) = index.get(&key) {
            groups[i].count += 1;
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(GroupedStat {
                canonical_key: key,
                display_label: label.to_string(),
                count: 1,
            });
        }
    }

    sort_by_count_desc(&mut groups, |g| g.count);
    groups
}

/// Groups `records` by the field returned from `key`.
///
/// Records whose field is `None`, empty or blank are left out; there is
/// no synthetic "unknown" group.
#[must_use]
pub fn group<T, F>(records: &[T], key: F) -> Vec<GroupedStat>
where
    F: Fn(&T) -> Option<&str>,
{
    accumulate(records, |record| {
        canonicalize(key(record)).map(|(value, canonical)| (canonical, value))
    })
}

/// Like [`group`], but records without a value are counted in a bucket
/// with an empty canonical key and the given `unknown_label`.
#[must_use]
pub fn group_with_unknown<'a, T, F>(
    records: &'a [T],
    key: F,
    unknown_label: &'a str,
) -> Vec<GroupedStat>
where
    F: Fn(&T) -> Option<&str>,
{
    accumulate(records, |record| {
        Some(
            canonicalize(key(record)).map_or_else(
                || (String::new(), unknown_label),
                |(value, canonical)| (canonical, value),
            ),
        )
    })
}

/// Groups `records` by a pair of fields, e.g. city and neighborhood.
///
/// A record is counted only when both fields have a value. The same child
/// value under two different parents yields two separate groups.
#[must_use]
pub fn group_pair<T, F, G>(records: &[T], first: F, second: G) -> Vec<PairStat>
where
    F: Fn(&T) -> Option<&str>,
    G: Fn(&T) -> Option<&str>,
{
    let mut index: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut groups: Vec<PairStat> = Vec::new();

    for record in records {
        let Some((first_value, first_key)) = canonicalize(first(record)) else {
            continue;
        };
        let Some((second_value, second_key)) = canonicalize(second(record)) else {
            continue;
        };

        let key = (first_key, second_key);
        if let Some(&i) = index.get(&key) {
            groups[i].count += 1;
        } else {
            index.insert(key.clone(), groups.len());
            let (first_key, second_key) = key;
            groups.push(PairStat {
                first_key,
                second_key,
                first_label: first_value.to_string(),
                second_label: second_value.to_string(),
                count: 1,
            });
        }
    }

    sort_by_count_desc(&mut groups, |g| g.count);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use voter_stats_report_models::PopulationRecord;

    fn with_city(city: Option<&str>) -> PopulationRecord {
        PopulationRecord {
            id: "x".to_string(),
            city: city.map(str::to_string),
            ..PopulationRecord::default()
        }
    }

    fn with_place(city: &str, neighborhood: &str) -> PopulationRecord {
        PopulationRecord {
            id: "x".to_string(),
            city: Some(city.to_string()),
            neighborhood: Some(neighborhood.to_string()),
            ..PopulationRecord::default()
        }
    }

    fn by_city(records: &[PopulationRecord]) -> Vec<GroupedStat> {
        group(records, |r| r.city.as_deref())
    }

    #[test]
    fn merges_case_variants_under_first_label() {
        let records: Vec<_> = ["Rio", "RIO", "rio", "Salvador"]
            .into_iter()
            .map(|c| with_city(Some(c)))
            .collect();

        let groups = by_city(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].display_label, "Rio");
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[1].display_label, "Salvador");
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn first_seen_label_wins_even_when_later_spelling_dominates() {
        let records: Vec<_> = ["SAO PAULO", "São Paulo", "São Paulo"]
            .into_iter()
            .map(|c| with_city(Some(c)))
            .collect();

        let groups = by_city(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].display_label, "SAO PAULO");
        assert_eq!(groups[0].canonical_key, "sao paulo");
        assert_eq!(groups[0].count, 3);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records: Vec<_> = ["Niterói", "Recife", "Belém", "recife", "niteroi"]
            .into_iter()
            .map(|c| with_city(Some(c)))
            .collect();

        let labels: Vec<_> = by_city(&records)
            .into_iter()
            .map(|g| g.display_label)
            .collect();

        assert_eq!(labels, ["Niterói", "Recife", "Belém"]);
    }

    #[test]
    fn grouping_is_idempotent() {
        let records: Vec<_> = ["Rio", "Salvador", "rio", "Recife", "SALVADOR"]
            .into_iter()
            .map(|c| with_city(Some(c)))
            .collect();

        assert_eq!(by_city(&records), by_city(&records));
    }

    #[test]
    fn skips_missing_and_blank_values() {
        let records = vec![
            with_city(Some("Rio")),
            with_city(None),
            with_city(Some("")),
            with_city(Some("   ")),
        ];

        let groups = by_city(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.iter().map(|g| g.count).sum::<u64>(), 1);
        assert!(groups.iter().all(|g| !g.canonical_key.is_empty()));
    }

    #[test]
    fn unknown_bucket_collects_missing_values_on_request() {
        let records = vec![
            with_city(None),
            with_city(Some("Rio")),
            with_city(Some(" ")),
            with_city(None),
        ];

        let groups = group_with_unknown(&records, |r| r.city.as_deref(), "Not informed");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].display_label, "Not informed");
        assert_eq!(groups[0].canonical_key, "");
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[1].display_label, "Rio");
    }

    #[test]
    fn same_neighborhood_in_two_cities_stays_separate() {
        let records = vec![
            with_place("Rio", "Centro"),
            with_place("Salvador", "Centro"),
            with_place("RIO", "centro"),
        ];

        let pairs = group_pair(
            &records,
            |r| r.city.as_deref(),
            |r| r.neighborhood.as_deref(),
        );

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].first_label, "Rio");
        assert_eq!(pairs[0].second_label, "Centro");
        assert_eq!(pairs[0].count, 2);
        assert_eq!(pairs[0].canonical_key(), "rio|centro");
        assert_eq!(pairs[1].first_label, "Salvador");
        assert_eq!(pairs[1].count, 1);
    }

    #[test]
    fn separator_inside_values_keeps_keys_distinct() {
        let records = vec![with_place("a|b", "q"), with_place("a", "b|q")];

        let pairs = group_pair(
            &records,
            |r| r.city.as_deref(),
            |r| r.neighborhood.as_deref(),
        );

        let keys: Vec<_> = pairs.iter().map(PairStat::canonical_key).collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(keys, [r"a\|b|q", r"a|b\|q"]);
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn escape_character_is_escaped_too() {
        let records = vec![with_place("a\\", "|b"), with_place("a", "\\|b")];

        let pairs = group_pair(
            &records,
            |r| r.city.as_deref(),
            |r| r.neighborhood.as_deref(),
        );

        let keys: Vec<_> = pairs.iter().map(PairStat::canonical_key).collect();
        assert_eq!(keys, [r"a\\|\|b", r"a|\\\|b"]);
    }

    #[test]
    fn pair_requires_both_fields() {
        let mut only_city = with_place("Rio", "Centro");
        only_city.neighborhood = None;
        let records = vec![only_city, with_place("Rio", "Lapa")];

        let pairs = group_pair(
            &records,
            |r| r.city.as_deref(),
            |r| r.neighborhood.as_deref(),
        );

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].second_label, "Lapa");
    }

    #[test]
    fn zone_numerals_merge_in_pairs() {
        let records = vec![
            PopulationRecord {
                id: "1".to_string(),
                electoral_zone: Some("Zona III".to_string()),
                electoral_section: Some("12".to_string()),
                ..PopulationRecord::default()
            },
            PopulationRecord {
                id: "2".to_string(),
                electoral_zone: Some("zona 3".to_string()),
                electoral_section: Some("12".to_string()),
                ..PopulationRecord::default()
            },
        ];

        let pairs = group_pair(
            &records,
            |r| r.electoral_zone.as_deref(),
            |r| r.electoral_section.as_deref(),
        );

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first_label, "Zona III");
        assert_eq!(pairs[0].count, 2);
    }
}
