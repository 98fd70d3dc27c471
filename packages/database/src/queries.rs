//! Constituent queries.
//!
//! Identifiers are `uuid` columns but travel as text parameters cast with
//! `$n::text::uuid`, since `switchy_database` sends parameters in binary
//! format and Postgres cannot decode raw UTF-8 bytes as a binary `uuid`.
//! For the same reason every `uuid` column is selected as `::text`.

use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use voter_stats_report_models::{EntityDetail, PopulationRecord, RankingEntry};

use crate::DbError;

/// Clamps a `bigint` count to an unsigned count.
fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Builds `$start::text::uuid, $start+1::text::uuid, ...` for `count`
/// parameters.
fn uuid_placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|idx| format!("${idx}::text::uuid"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Counts all constituents of a tenant.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the count cannot be parsed.
pub async fn count_constituents(db: &dyn Database, tenant_id: &str) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) AS total FROM constituents WHERE tenant_id = $1::text::uuid",
            &[DatabaseValue::String(tenant_id.to_string())],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "COUNT query returned no rows".to_string(),
    })?;

    let total: i64 = row.to_value("total").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse constituent count: {e}"),
    })?;

    Ok(to_count(total))
}

/// Loads every constituent of a tenant with canvasser and referrer names
/// joined.
///
/// Rows come back in registration order so that grouping ties resolve
/// the same way on every run.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row has no id.
pub async fn load_constituents(
    db: &dyn Database,
    tenant_id: &str,
) -> Result<Vec<PopulationRecord>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT c.id::text AS id,
                    c.city, c.neighborhood,
                    c.electoral_zone, c.electoral_section,
                    c.reliability,
                    cv.name AS canvasser_name,
                    rf.name AS referrer_name
             FROM constituents c
             LEFT JOIN canvassers cv ON cv.id = c.canvasser_id
             LEFT JOIN referrers rf ON rf.id = c.referrer_id
             WHERE c.tenant_id = $1::text::uuid
             ORDER BY c.created_at, c.id",
            &[DatabaseValue::String(tenant_id.to_string())],
        )
        .await?;

    let mut records = Vec::with_capacity(rows.len());

    for row in &rows {
        let id: String = row.to_value("id").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse constituent id: {e}"),
        })?;

        records.push(PopulationRecord {
            id,
            city: row.to_value("city").unwrap_or(None),
            neighborhood: row.to_value("neighborhood").unwrap_or(None),
            electoral_zone: row.to_value("electoral_zone").unwrap_or(None),
            electoral_section: row.to_value("electoral_section").unwrap_or(None),
            reliability_label: row.to_value("reliability").unwrap_or(None),
            canvasser_name: row.to_value("canvasser_name").unwrap_or(None),
            referrer_name: row.to_value("referrer_name").unwrap_or(None),
        });
    }

    log::debug!("Loaded {} constituents for tenant {tenant_id}", records.len());

    Ok(records)
}

/// Calls the `top_served_constituents` aggregation for a tenant.
///
/// # Errors
///
/// Returns [`DbError`] if the function call fails.
pub async fn top_served_constituents(
    db: &dyn Database,
    tenant_id: &str,
    limit: u32,
) -> Result<Vec<RankingEntry>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT entity_id::text AS entity_id, metric_count::bigint AS metric_count
             FROM top_served_constituents($1::text::uuid, $2)
             ORDER BY metric_count DESC
             LIMIT $3",
            &[
                DatabaseValue::String(tenant_id.to_string()),
                DatabaseValue::Int32(i32::try_from(limit).unwrap_or(i32::MAX)),
                DatabaseValue::Int64(i64::from(limit)),
            ],
        )
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let entity_id: Option<String> = row.to_value("entity_id").unwrap_or(None);
            let Some(entity_id) = entity_id else {
                log::warn!("Ranking row without entity id for tenant {tenant_id}, skipping");
                return None;
            };
            let metric: i64 = row.to_value("metric_count").unwrap_or(0);
            Some(RankingEntry {
                entity_id,
                metric_count: to_count(metric),
            })
        })
        .collect())
}

/// Detail lookup for `id_count` ids: `$1` is the tenant, ids follow.
fn constituent_details_sql(id_count: usize) -> String {
    format!(
        "SELECT id::text AS id, name, phone
         FROM constituents
         WHERE tenant_id = $1::text::uuid
           AND id IN ({})",
        uuid_placeholders(2, id_count)
    )
}

/// Fetches name and phone for all `ids` of a tenant in a single query.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn constituent_details(
    db: &dyn Database,
    tenant_id: &str,
    ids: &[String],
) -> Result<Vec<EntityDetail>, DbError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = constituent_details_sql(ids.len());
    let params: Vec<DatabaseValue> = std::iter::once(tenant_id)
        .chain(ids.iter().map(String::as_str))
        .map(|value| DatabaseValue::String(value.to_string()))
        .collect();

    let rows = db.query_raw_params(&sql, &params).await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let id: String = row.to_value("id").ok()?;
            let name: Option<String> = row.to_value("name").unwrap_or(None);
            Some(EntityDetail {
                id,
                display_name: name?,
                secondary_field: row.to_value("phone").unwrap_or(None),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_and_cast() {
        assert_eq!(
            uuid_placeholders(1, 3),
            "$1::text::uuid, $2::text::uuid, $3::text::uuid"
        );
        assert_eq!(uuid_placeholders(4, 1), "$4::text::uuid");
    }

    #[test]
    fn detail_lookup_is_scoped_to_tenant() {
        let sql = constituent_details_sql(2);

        assert!(sql.contains("WHERE tenant_id = $1::text::uuid"));
        assert!(sql.contains("AND id IN ($2::text::uuid, $3::text::uuid)"));
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(to_count(-3), 0);
        assert_eq!(to_count(0), 0);
        assert_eq!(to_count(42), 42);
    }
}
