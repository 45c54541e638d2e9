//! Postgres destination keyed by `place_id`.

use std::collections::HashSet;

use async_trait::async_trait;
use evtrack_core::{ChargerRow, ChargerSink, SinkError};
use sqlx::PgPool;

use crate::table::TableName;
use crate::DbError;

pub struct PgChargerSink {
    pool: PgPool,
    table: TableName,
    destination: String,
}

impl PgChargerSink {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTableName`] if `table` is not a plain
    /// identifier.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, DbError> {
        let table = TableName::parse(table)?;
        let destination = table.to_string();
        Ok(Self {
            pool,
            table,
            destination,
        })
    }

    /// Column names of the destination table, empty when it does not exist.
    async fn columns(&self) -> Result<Vec<String>, DbError> {
        let columns = sqlx::query_scalar::<_, String>(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = COALESCE($1, current_schema()) AND table_name = $2",
        )
        .bind(self.table.schema())
        .bind(self.table.table())
        .fetch_all(&self.pool)
        .await?;
        Ok(columns)
    }

    /// Whether `place_id` alone carries a unique, non-partial index, which
    /// `ON CONFLICT (place_id)` needs.
    async fn has_place_id_key(&self) -> Result<bool, DbError> {
        let has_key = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (\
                 SELECT 1 FROM pg_index i \
                 JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = i.indkey[0] \
                 WHERE i.indrelid = to_regclass($1) \
                   AND i.indisunique AND i.indnkeyatts = 1 AND i.indpred IS NULL \
                   AND a.attname = 'place_id')",
        )
        .bind(self.table.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(has_key)
    }

    async fn read_keys(&self) -> Result<HashSet<String>, DbError> {
        let keys = sqlx::query_scalar::<_, String>(&format!(
            "SELECT place_id FROM {}",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(keys.into_iter().collect())
    }

    /// Create the destination (if absent) and insert `rows` in one
    /// transaction. Keys already present are left untouched.
    async fn write(&self, rows: &[ChargerRow], create: bool) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        if create {
            sqlx::query(&create_table_sql(&self.table))
                .execute(&mut *tx)
                .await?;
            tracing::info!(table = %self.table, "created destination table");
        }

        let written = if rows.is_empty() {
            0
        } else {
            insert_rows(&mut tx, &self.table, rows).await?
        };

        tx.commit().await?;
        Ok(written)
    }
}

#[async_trait]
impl ChargerSink for PgChargerSink {
    fn destination(&self) -> &str {
        &self.destination
    }

    async fn existing_keys(&self) -> Result<Option<HashSet<String>>, SinkError> {
        let columns = self
            .columns()
            .await
            .map_err(|e| e.into_sink_error(&self.destination))?;
        if columns.is_empty() {
            return Ok(None);
        }

        let missing = missing_columns(&columns);
        if !missing.is_empty() {
            return Err(SinkError::SchemaMismatch {
                destination: self.destination.clone(),
                reason: format!("missing columns: {}", missing.join(", ")),
            });
        }

        let has_key = self
            .has_place_id_key()
            .await
            .map_err(|e| e.into_sink_error(&self.destination))?;
        if !has_key {
            return Err(SinkError::SchemaMismatch {
                destination: self.destination.clone(),
                reason: "place_id has no primary key or unique constraint".to_string(),
            });
        }

        let keys = self
            .read_keys()
            .await
            .map_err(|e| e.into_sink_error(&self.destination))?;
        tracing::debug!(table = %self.table, keys = keys.len(), "read existing keys");
        Ok(Some(keys))
    }

    async fn append_rows(&self, rows: &[ChargerRow], create: bool) -> Result<u64, SinkError> {
        self.write(rows, create)
            .await
            .map_err(|e| e.into_sink_error(&self.destination))
    }
}

/// Row columns absent from `present`, in column order.
fn missing_columns(present: &[String]) -> Vec<&'static str> {
    ChargerRow::COLUMNS
        .iter()
        .copied()
        .filter(|col| !present.iter().any(|p| p == col))
        .collect()
}

fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
             place_id          TEXT PRIMARY KEY, \
             name              TEXT NOT NULL, \
             address           TEXT NOT NULL, \
             latitude          DOUBLE PRECISION NOT NULL, \
             longitude         DOUBLE PRECISION NOT NULL, \
             business_status   TEXT NOT NULL, \
             operator          TEXT NOT NULL, \
             usage             TEXT NOT NULL, \
             phone             TEXT NOT NULL, \
             connector_count   INTEGER NOT NULL, \
             connector_types   TEXT NOT NULL, \
             connector_powers  TEXT NOT NULL, \
             current_types     TEXT NOT NULL, \
             min_power_kw      DOUBLE PRECISION, \
             max_power_kw      DOUBLE PRECISION, \
             charging_tier_max TEXT NOT NULL, \
             rapid_available   BOOLEAN NOT NULL, \
             fast_available    BOOLEAN NOT NULL, \
             slow_available    BOOLEAN NOT NULL, \
             source            TEXT NOT NULL, \
             match_status      TEXT NOT NULL, \
             synced_at         TIMESTAMPTZ NOT NULL DEFAULT NOW())"
    )
}

fn insert_sql(table: &TableName) -> String {
    format!(
        "INSERT INTO {table} ({columns}) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::float8[], $5::float8[], \
              $6::text[], $7::text[], $8::text[], $9::text[], $10::int4[], $11::text[], \
              $12::text[], $13::text[], $14::float8[], $15::float8[], $16::text[], \
              $17::bool[], $18::bool[], $19::bool[], $20::text[], $21::text[]) \
         ON CONFLICT (place_id) DO NOTHING",
        columns = ChargerRow::COLUMNS.join(", ")
    )
}

/// Bulk insert in a single `INSERT … SELECT * FROM UNNEST(…)` round-trip.
async fn insert_rows(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    table: &TableName,
    rows: &[ChargerRow],
) -> Result<u64, DbError> {
    let n = rows.len();
    let mut place_ids: Vec<String> = Vec::with_capacity(n);
    let mut names: Vec<String> = Vec::with_capacity(n);
    let mut addresses: Vec<String> = Vec::with_capacity(n);
    let mut latitudes: Vec<f64> = Vec::with_capacity(n);
    let mut longitudes: Vec<f64> = Vec::with_capacity(n);
    let mut statuses: Vec<String> = Vec::with_capacity(n);
    let mut operators: Vec<String> = Vec::with_capacity(n);
    let mut usages: Vec<String> = Vec::with_capacity(n);
    let mut phones: Vec<String> = Vec::with_capacity(n);
    let mut connector_counts: Vec<i32> = Vec::with_capacity(n);
    let mut connector_types: Vec<String> = Vec::with_capacity(n);
    let mut connector_powers: Vec<String> = Vec::with_capacity(n);
    let mut current_types: Vec<String> = Vec::with_capacity(n);
    let mut min_powers: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut max_powers: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut tiers: Vec<String> = Vec::with_capacity(n);
    let mut rapid: Vec<bool> = Vec::with_capacity(n);
    let mut fast: Vec<bool> = Vec::with_capacity(n);
    let mut slow: Vec<bool> = Vec::with_capacity(n);
    let mut sources: Vec<String> = Vec::with_capacity(n);
    let mut match_statuses: Vec<String> = Vec::with_capacity(n);

    for row in rows {
        place_ids.push(row.place_id.clone());
        names.push(row.name.clone());
        addresses.push(row.address.clone());
        latitudes.push(row.latitude);
        longitudes.push(row.longitude);
        statuses.push(row.business_status.clone());
        operators.push(row.operator.clone());
        usages.push(row.usage.clone());
        phones.push(row.phone.clone());
        connector_counts.push(row.connector_count);
        connector_types.push(row.connector_types.clone());
        connector_powers.push(row.connector_powers.clone());
        current_types.push(row.current_types.clone());
        min_powers.push(row.min_power_kw);
        max_powers.push(row.max_power_kw);
        tiers.push(row.charging_tier_max.clone());
        rapid.push(row.rapid_available);
        fast.push(row.fast_available);
        slow.push(row.slow_available);
        sources.push(row.source.clone());
        match_statuses.push(row.match_status.clone());
    }

    let result = sqlx::query(&insert_sql(table))
        .bind(&place_ids)
        .bind(&names)
        .bind(&addresses)
        .bind(&latitudes)
        .bind(&longitudes)
        .bind(&statuses)
        .bind(&operators)
        .bind(&usages)
        .bind(&phones)
        .bind(&connector_counts)
        .bind(&connector_types)
        .bind(&connector_powers)
        .bind(&current_types)
        .bind(&min_powers)
        .bind(&max_powers)
        .bind(&tiers)
        .bind(&rapid)
        .bind(&fast)
        .bind(&slow)
        .bind(&sources)
        .bind(&match_statuses)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_absent_row_columns() {
        let present: Vec<String> = ChargerRow::COLUMNS
            .iter()
            .filter(|c| **c != "match_status" && **c != "usage")
            .map(|c| (*c).to_string())
            .collect();
        assert_eq!(missing_columns(&present), vec!["usage", "match_status"]);
    }

    #[test]
    fn complete_schema_has_no_missing_columns() {
        let mut present: Vec<String> =
            ChargerRow::COLUMNS.iter().map(|c| (*c).to_string()).collect();
        present.push("synced_at".to_string());
        assert!(missing_columns(&present).is_empty());
    }

    #[test]
    fn create_table_declares_every_row_column() {
        let sql = create_table_sql(&TableName::parse("ev_chargers").unwrap());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS ev_chargers ("));
        assert!(sql.contains("place_id          TEXT PRIMARY KEY"));
        for column in ChargerRow::COLUMNS {
            assert!(sql.contains(&format!("{column} ")), "missing {column}");
        }
    }

    #[test]
    fn insert_binds_one_array_per_column() {
        let sql = insert_sql(&TableName::parse("public.ev_chargers").unwrap());
        assert!(sql.starts_with("INSERT INTO public.ev_chargers (place_id, name,"));
        assert!(sql.contains("$12::text[], $13::text[], $14::float8[]"));
        assert!(sql.contains("$21::text[]"));
        assert!(!sql.contains("$22"));
        assert!(sql.ends_with("ON CONFLICT (place_id) DO NOTHING"));
    }
}
