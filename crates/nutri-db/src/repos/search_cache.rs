//! Search cache repository: result lists per (provider, query, limit).

use chrono::{DateTime, Utc};
use nutri_core::Provider;
use nutri_core::cache::{CacheSummary, PurgeScope, SearchCacheEntry};

use crate::NutriDb;
use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_provider, purge_filter};

fn row_to_entry(row: &libsql::Row) -> Result<SearchCacheEntry, DatabaseError> {
    let limit = row.get::<i64>(2)?;
    Ok(SearchCacheEntry {
        provider: parse_provider(&row.get::<String>(0)?)?,
        query: row.get::<String>(1)?,
        limit: u32::try_from(limit)
            .map_err(|_| DatabaseError::InvalidState(format!("search limit {limit}")))?,
        results: serde_json::from_str(&row.get::<String>(3)?)?,
        raw_payload: row.get::<String>(4)?,
        fetched_at: parse_datetime(&row.get::<String>(5)?)?,
        expires_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl NutriDb {
    /// The entry for (provider, normalized query, limit) if fresh at `now`.
    pub async fn get_cached_search(
        &self,
        provider: Provider,
        query: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<SearchCacheEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT provider, query, result_limit, results, raw_payload, fetched_at, expires_at
                 FROM search_cache WHERE provider = ?1 AND query = ?2 AND result_limit = ?3",
                libsql::params![provider.as_str(), query, i64::from(limit)],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let entry = row_to_entry(&row)?;
        Ok(entry.is_fresh(now).then_some(entry))
    }

    /// Insert or overwrite the entry for (provider, query, limit).
    pub async fn put_cached_search(&self, entry: &SearchCacheEntry) -> Result<(), DatabaseError> {
        let results = serde_json::to_string(&entry.results)?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO search_cache
                    (provider, query, result_limit, results, raw_payload, fetched_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    entry.provider.as_str(),
                    entry.query.as_str(),
                    i64::from(entry.limit),
                    results,
                    entry.raw_payload.as_str(),
                    entry.fetched_at.to_rfc3339(),
                    entry.expires_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Summaries of every entry, ordered by provider, query, then limit.
    pub async fn list_cached_searches(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError> {
        let base = "SELECT provider, query, result_limit, results, raw_payload, fetched_at, expires_at
                    FROM search_cache";
        let mut rows = match provider {
            Some(p) => {
                self.conn()
                    .query(
                        &format!("{base} WHERE provider = ?1 ORDER BY provider, query, result_limit"),
                        [p.as_str()],
                    )
                    .await?
            }
            None => {
                self.conn()
                    .query(&format!("{base} ORDER BY provider, query, result_limit"), ())
                    .await?
            }
        };
        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            let entry = row_to_entry(&row)?;
            summaries.push(CacheSummary {
                provider: entry.provider,
                label: format!("{} results", entry.results.len()),
                key: entry.query,
                limit: Some(entry.limit),
                fetched_at: entry.fetched_at,
                expires_at: entry.expires_at,
                fresh: now < entry.expires_at,
            });
        }
        Ok(summaries)
    }

    /// Remove the entries selected by `scope`; a key scope covers every limit.
    pub async fn purge_cached_searches(&self, scope: &PurgeScope) -> Result<u64, DatabaseError> {
        let (filter, params) = purge_filter(scope, "query");
        let removed = self
            .conn()
            .execute(
                &format!("DELETE FROM search_cache {filter}"),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(removed)
    }
}
