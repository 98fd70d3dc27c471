//! Most-served constituents ranking.
//!
//! Two independent remote calls: the ranking source returns ids with an
//! activity count, then one batched lookup resolves display details for
//! exactly those ids. A failure in either call degrades the ranking
//! instead of failing the report:
//!
//! - ranking source fails: no ranking at all
//! - detail lookup fails or misses an id: the entity keeps its rank and
//!   metric with [`NAME_UNAVAILABLE`] as its name

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use voter_stats_report_models::{EntityDetail, RankedEntity, RankingEntry};

use crate::store::PopulationStore;

/// Display name used when an entity's details could not be resolved.
pub const NAME_UNAVAILABLE: &str = "name unavailable";

/// Canonical hyphenated UUID, the identifier format of the record store.
static ENTITY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

/// Returns `true` if `id` is safe to pass to the detail lookup.
#[must_use]
pub fn is_valid_entity_id(id: &str) -> bool {
    ENTITY_ID_RE.is_match(id)
}

/// Join key for an entity id. UUIDs compare case-insensitively.
fn id_key(id: &str) -> String {
    id.to_ascii_lowercase()
}

/// Fetches the top `limit` most-served constituents of a tenant.
///
/// Never fails. See the module docs for how each failure degrades.
pub async fn rank_top(
    store: &dyn PopulationStore,
    tenant_id: &str,
    limit: u32,
) -> Vec<RankedEntity> {
    if limit == 0 {
        return vec![];
    }

    let mut ranking = match store.fetch_top_ranked(tenant_id, limit).await {
        Ok(ranking) => ranking,
        Err(e) => {
            log::warn!("Ranking source unavailable for tenant {tenant_id}: {e}");
            return vec![];
        }
    };
    ranking.truncate(limit as usize);

    let ids = lookup_ids(&ranking);

    let details = if ids.is_empty() {
        vec![]
    } else {
        match store.fetch_entity_details(tenant_id, &ids).await {
            Ok(details) => details,
            Err(e) => {
                log::warn!(
                    "Detail lookup failed for {} ranked ids of tenant {tenant_id}: {e}",
                    ids.len()
                );
                vec![]
            }
        }
    };

    resolve(ranking, details)
}

/// Collects the distinct, well-formed ids of `ranking` in rank order,
/// lower-cased.
fn lookup_ids(ranking: &[RankingEntry]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut ids = Vec::with_capacity(ranking.len());

    for entry in ranking {
        if !is_valid_entity_id(&entry.entity_id) {
            log::debug!("Skipping detail lookup for malformed id {:?}", entry.entity_id);
            continue;
        }
        let id = id_key(&entry.entity_id);
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    ids
}

/// Joins ranking rows with their details, keeping rank order and every
/// ranked entry.
fn resolve(ranking: Vec<RankingEntry>, details: Vec<EntityDetail>) -> Vec<RankedEntity> {
    let index: BTreeMap<String, EntityDetail> = details
        .into_iter()
        .map(|detail| (id_key(&detail.id), detail))
        .collect();

    let mut unresolved = 0usize;

    let entities: Vec<RankedEntity> = ranking
        .into_iter()
        .map(|entry| {
            let (display_name, secondary_field) = index.get(&id_key(&entry.entity_id)).map_or_else(
                || {
                    unresolved += 1;
                    (NAME_UNAVAILABLE.to_string(), None)
                },
                |detail| (detail.display_name.clone(), detail.secondary_field.clone()),
            );

            RankedEntity {
                id: entry.entity_id,
                display_name,
                secondary_field,
                metric: entry.metric_count,
            }
        })
        .collect();

    if unresolved > 0 {
        log::warn!(
            "{unresolved} of {} ranked entities could not be resolved",
            entities.len()
        );
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANA: &str = "0b7f2c1e-4d8a-4c2b-9a51-3f0e6d7c8b90";
    const BRUNO: &str = "5d1e9a44-2f6b-4e3c-8d7a-1c2b3a4f5e60";

    fn entry(id: &str, metric: u64) -> RankingEntry {
        RankingEntry {
            entity_id: id.to_string(),
            metric_count: metric,
        }
    }

    fn detail(id: &str, name: &str) -> EntityDetail {
        EntityDetail {
            id: id.to_string(),
            display_name: name.to_string(),
            secondary_field: Some("(21) 99999-0000".to_string()),
        }
    }

    #[test]
    fn validates_uuid_shaped_ids() {
        assert!(is_valid_entity_id(ANA));
        assert!(is_valid_entity_id(&ANA.to_uppercase()));
        assert!(!is_valid_entity_id("42"));
        assert!(!is_valid_entity_id(""));
        assert!(!is_valid_entity_id("0b7f2c1e-4d8a-4c2b-9a51-3f0e6d7c8b9"));
        assert!(!is_valid_entity_id("0b7f2c1e-4d8a-4c2b-9a51-3f0e6d7c8b90; DROP"));
    }

    #[test]
    fn lookup_ids_drop_malformed_and_duplicate_ids() {
        let ranking = vec![entry(ANA, 9), entry("not-an-id", 5), entry(ANA, 1)];
        assert_eq!(lookup_ids(&ranking), vec![ANA.to_string()]);
    }

    #[test]
    fn lookup_ids_fold_case() {
        let ranking = vec![entry(&ANA.to_uppercase(), 9), entry(ANA, 4)];
        assert_eq!(lookup_ids(&ranking), vec![ANA.to_string()]);
    }

    #[test]
    fn resolve_matches_ids_regardless_of_case() {
        let upper = BRUNO.to_uppercase();
        let ranking = vec![entry(&upper, 12), entry(ANA, 3)];
        let details = vec![detail(&ANA.to_uppercase(), "Ana"), detail(BRUNO, "Bruno")];

        let entities = resolve(ranking, details);

        assert_eq!(entities[0].id, upper);
        assert_eq!(entities[0].display_name, "Bruno");
        assert_eq!(entities[1].display_name, "Ana");
    }

    #[test]
    fn resolve_keeps_order_and_fills_placeholders() {
        let ranking = vec![entry(BRUNO, 12), entry("legacy-7", 8), entry(ANA, 3)];
        let details = vec![detail(ANA, "Ana"), detail(BRUNO, "Bruno")];

        let entities = resolve(ranking, details);

        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].display_name, "Bruno");
        assert_eq!(entities[0].metric, 12);
        assert_eq!(entities[1].id, "legacy-7");
        assert_eq!(entities[1].display_name, NAME_UNAVAILABLE);
        assert_eq!(entities[1].secondary_field, None);
        assert_eq!(entities[1].metric, 8);
        assert_eq!(entities[2].display_name, "Ana");
    }

    #[test]
    fn resolve_without_details_uses_placeholders_only() {
        let entities = resolve(vec![entry(ANA, 2)], vec![]);
        assert_eq!(entities[0].display_name, NAME_UNAVAILABLE);
        assert_eq!(entities[0].metric, 2);
    }
}
