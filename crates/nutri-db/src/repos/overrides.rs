//! Override repository: user-maintained records keyed by (provider, barcode).

use nutri_core::overrides::OverrideRecord;
use nutri_core::{Provider, SourceTier};

use crate::NutriDb;
use crate::error::DatabaseError;
use crate::helpers::{
    FOOD_COLUMN_COUNT, FOOD_COLUMNS, food_values, parse_datetime, parse_provider, placeholders,
    read_food,
};

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT provider, barcode, {FOOD_COLUMNS}, notes, created_at, updated_at
         FROM food_overrides {filter}"
    )
}

fn row_to_override(row: &libsql::Row) -> Result<OverrideRecord, DatabaseError> {
    let provider = parse_provider(&row.get::<String>(0)?)?;
    let barcode = row.get::<String>(1)?;
    let tail = 2 + FOOD_COLUMN_COUNT;
    let mut food = read_food(row, 2, provider)?;
    food.identifier.clone_from(&barcode);
    food.source_tier = SourceTier::Override;
    food.exact_match = true;
    Ok(OverrideRecord {
        provider,
        barcode,
        food,
        notes: row.get::<String>(tail)?,
        created_at: parse_datetime(&row.get::<String>(tail + 1)?)?,
        updated_at: parse_datetime(&row.get::<String>(tail + 2)?)?,
    })
}

impl NutriDb {
    pub async fn get_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<Option<OverrideRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &select_sql("WHERE provider = ?1 AND barcode = ?2"),
                [provider.as_str(), barcode],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_override(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace the record for (provider, barcode).
    ///
    /// An existing record keeps its `created_at`; the stored row is returned.
    pub async fn upsert_override(
        &self,
        record: &OverrideRecord,
    ) -> Result<OverrideRecord, DatabaseError> {
        let mut params: Vec<libsql::Value> =
            vec![record.provider.as_str().into(), record.barcode.as_str().into()];
        params.extend(food_values(&record.food)?);
        params.push(record.notes.as_str().into());
        params.push(record.created_at.to_rfc3339().into());
        params.push(record.updated_at.to_rfc3339().into());

        let sql = format!(
            "INSERT INTO food_overrides (provider, barcode, {FOOD_COLUMNS}, notes, created_at, updated_at)
             VALUES ({})
             ON CONFLICT (provider, barcode) DO UPDATE SET
                description = excluded.description,
                brand = excluded.brand,
                serving_amount = excluded.serving_amount,
                serving_unit = excluded.serving_unit,
                calories = excluded.calories,
                protein_g = excluded.protein_g,
                carbs_g = excluded.carbs_g,
                fat_g = excluded.fat_g,
                fiber_g = excluded.fiber_g,
                sugar_g = excluded.sugar_g,
                sodium_mg = excluded.sodium_mg,
                micronutrients = excluded.micronutrients,
                source_id = excluded.source_id,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            placeholders(1, params.len())
        );
        self.conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;

        self.get_override(record.provider, &record.barcode)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Delete the record for (provider, barcode). Returns whether one existed.
    pub async fn delete_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<bool, DatabaseError> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM food_overrides WHERE provider = ?1 AND barcode = ?2",
                [provider.as_str(), barcode],
            )
            .await?;
        Ok(removed > 0)
    }

    /// All overrides, optionally for one provider, ordered by provider then barcode.
    pub async fn list_overrides(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<OverrideRecord>, DatabaseError> {
        let mut rows = match provider {
            Some(p) => {
                self.conn()
                    .query(
                        &select_sql("WHERE provider = ?1 ORDER BY provider, barcode"),
                        [p.as_str()],
                    )
                    .await?
            }
            None => {
                self.conn()
                    .query(&select_sql("ORDER BY provider, barcode"), ())
                    .await?
            }
        };
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_override(&row)?);
        }
        Ok(records)
    }
}
