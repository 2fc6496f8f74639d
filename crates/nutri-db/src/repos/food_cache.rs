//! Barcode cache repository: last successful fetch per (provider, barcode).

use chrono::{DateTime, Utc};
use nutri_core::Provider;
use nutri_core::cache::{CacheEntry, CacheSummary, PurgeScope};

use crate::NutriDb;
use crate::error::DatabaseError;
use crate::helpers::{
    FOOD_COLUMN_COUNT, FOOD_COLUMNS, food_values, parse_datetime, parse_provider, placeholders,
    purge_filter, read_food,
};

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT provider, barcode, {FOOD_COLUMNS}, exact_match, raw_payload, fetched_at, expires_at
         FROM barcode_cache {filter}"
    )
}

fn row_to_entry(row: &libsql::Row) -> Result<CacheEntry, DatabaseError> {
    let provider = parse_provider(&row.get::<String>(0)?)?;
    let barcode = row.get::<String>(1)?;
    let tail = 2 + FOOD_COLUMN_COUNT;
    let mut food = read_food(row, 2, provider)?;
    food.identifier.clone_from(&barcode);
    food.exact_match = row.get::<i64>(tail)? != 0;
    Ok(CacheEntry {
        provider,
        barcode,
        food,
        raw_payload: row.get::<String>(tail + 1)?,
        fetched_at: parse_datetime(&row.get::<String>(tail + 2)?)?,
        expires_at: parse_datetime(&row.get::<String>(tail + 3)?)?,
    })
}

impl NutriDb {
    /// The entry for (provider, barcode) if it is still fresh at `now`.
    ///
    /// Expired rows read as a miss and stay in place until overwritten or purged.
    pub async fn get_cached_food(
        &self,
        provider: Provider,
        barcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &select_sql("WHERE provider = ?1 AND barcode = ?2"),
                [provider.as_str(), barcode],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let entry = row_to_entry(&row)?;
        if entry.is_fresh(now) {
            Ok(Some(entry))
        } else {
            tracing::debug!(
                %provider,
                barcode,
                expired_at = %entry.expires_at,
                "barcode cache entry expired"
            );
            Ok(None)
        }
    }

    /// Insert or overwrite the entry for (provider, barcode).
    pub async fn put_cached_food(&self, entry: &CacheEntry) -> Result<(), DatabaseError> {
        let mut params: Vec<libsql::Value> =
            vec![entry.provider.as_str().into(), entry.barcode.as_str().into()];
        params.extend(food_values(&entry.food)?);
        params.push(i64::from(entry.food.exact_match).into());
        params.push(entry.raw_payload.as_str().into());
        params.push(entry.fetched_at.to_rfc3339().into());
        params.push(entry.expires_at.to_rfc3339().into());

        let sql = format!(
            "INSERT OR REPLACE INTO barcode_cache
                (provider, barcode, {FOOD_COLUMNS}, exact_match, raw_payload, fetched_at, expires_at)
             VALUES ({})",
            placeholders(1, params.len())
        );
        self.conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        Ok(())
    }

    /// Summaries of every entry, fresh or not, ordered by provider then barcode.
    pub async fn list_cached_foods(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError> {
        let mut rows = match provider {
            Some(p) => {
                self.conn()
                    .query(
                        "SELECT provider, barcode, description, fetched_at, expires_at
                         FROM barcode_cache WHERE provider = ?1 ORDER BY provider, barcode",
                        [p.as_str()],
                    )
                    .await?
            }
            None => {
                self.conn()
                    .query(
                        "SELECT provider, barcode, description, fetched_at, expires_at
                         FROM barcode_cache ORDER BY provider, barcode",
                        (),
                    )
                    .await?
            }
        };
        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            let expires_at = parse_datetime(&row.get::<String>(4)?)?;
            summaries.push(CacheSummary {
                provider: parse_provider(&row.get::<String>(0)?)?,
                key: row.get::<String>(1)?,
                limit: None,
                label: row.get::<String>(2)?,
                fetched_at: parse_datetime(&row.get::<String>(3)?)?,
                expires_at,
                fresh: now < expires_at,
            });
        }
        Ok(summaries)
    }

    /// Remove the entries selected by `scope`. Returns how many were removed.
    pub async fn purge_cached_foods(&self, scope: &PurgeScope) -> Result<u64, DatabaseError> {
        let (filter, params) = purge_filter(scope, "barcode");
        let removed = self
            .conn()
            .execute(
                &format!("DELETE FROM barcode_cache {filter}"),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(removed)
    }
}
