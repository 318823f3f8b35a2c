//! Corp-code directory persistence.
//!
//! The directory is reconciled wholesale from the EDS archive; the upsert is
//! keyed on `corp_code`, so repeating a sync with identical upstream bytes
//! leaves every row unchanged.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::eds::archive::CorpCodeEntry;

#[derive(Debug, Clone, FromRow)]
pub struct CorpCodeRow {
    pub corp_code: String,
    pub corp_name: String,
    pub corp_name_eng: Option<String>,
    pub stock_code: Option<String>,
    pub modify_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CorpCodeRepository {
    pool: PgPool,
}

impl CorpCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_corp_code(&self, corp_code: &str) -> Result<Option<CorpCodeRow>> {
        let result = sqlx::query_as::<_, CorpCodeRow>(
            r#"
            SELECT corp_code, corp_name, corp_name_eng, stock_code,
                   modify_date, created_at, updated_at
            FROM corp_code_directory
            WHERE corp_code = $1
            "#,
        )
        .bind(corp_code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find directory entry by corp_code")?;

        Ok(result)
    }

    pub async fn find_by_corp_name_containing_ignore_case(
        &self,
        fragment: &str,
    ) -> Result<Vec<CorpCodeRow>> {
        let results = sqlx::query_as::<_, CorpCodeRow>(
            r#"
            SELECT corp_code, corp_name, corp_name_eng, stock_code,
                   modify_date, created_at, updated_at
            FROM corp_code_directory
            WHERE corp_name ILIKE '%' || $1 || '%'
            ORDER BY corp_name
            "#,
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search directory by corp_name")?;

        Ok(results)
    }

    /// Reconcile the full directory from an archive parse. Runs in one
    /// transaction so a failed sync leaves the previous directory intact.
    pub async fn upsert_all(&self, entries: &[CorpCodeEntry]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open directory sync transaction")?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO corp_code_directory
                    (corp_code, corp_name, corp_name_eng, stock_code,
                     modify_date, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, now(), now())
                ON CONFLICT (corp_code) DO UPDATE
                SET corp_name = EXCLUDED.corp_name,
                    corp_name_eng = EXCLUDED.corp_name_eng,
                    stock_code = EXCLUDED.stock_code,
                    modify_date = EXCLUDED.modify_date,
                    updated_at = now()
                WHERE corp_code_directory.corp_name IS DISTINCT FROM EXCLUDED.corp_name
                   OR corp_code_directory.corp_name_eng IS DISTINCT FROM EXCLUDED.corp_name_eng
                   OR corp_code_directory.stock_code IS DISTINCT FROM EXCLUDED.stock_code
                   OR corp_code_directory.modify_date IS DISTINCT FROM EXCLUDED.modify_date
                "#,
            )
            .bind(&entry.corp_code)
            .bind(&entry.corp_name)
            .bind(&entry.corp_name_eng)
            .bind(&entry.stock_code)
            .bind(&entry.modify_date)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!("Failed to upsert directory entry {}", entry.corp_code)
            })?;
        }

        tx.commit()
            .await
            .context("Failed to commit directory sync transaction")?;

        info!("Upserted {} corp-code directory entries", entries.len());
        Ok(())
    }
}
