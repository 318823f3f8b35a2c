//! Disclosure persistence.
//!
//! `receipt_no` is globally unique; inserts ignore conflicts so replays of
//! the same search window are no-ops.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;

/// Fields for storing one filing submission.
#[derive(Debug, Clone)]
pub struct NewDisclosure {
    pub receipt_no: String,
    pub corp_code: String,
    pub company_profile_id: Option<i64>,
    pub corp_name: String,
    pub stock_code: Option<String>,
    pub corp_class: Option<String>,
    pub report_name: String,
    pub submitter_name: Option<String>,
    pub receipt_date: NaiveDate,
    pub remark: Option<String>,
}

#[derive(Clone)]
pub struct DisclosureRepository {
    pool: PgPool,
}

impl DisclosureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists_by_receipt_no(&self, receipt_no: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM disclosures WHERE receipt_no = $1)",
        )
        .bind(receipt_no)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check disclosure existence")?;

        Ok(exists)
    }

    /// Insert one disclosure; returns whether a row was actually written.
    pub async fn insert_if_absent(&self, new: &NewDisclosure) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO disclosures
                (receipt_no, corp_code, company_profile_id, corp_name,
                 stock_code, corp_class, report_name, submitter_name,
                 receipt_date, remark, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now())
            ON CONFLICT (receipt_no) DO NOTHING
            "#,
        )
        .bind(&new.receipt_no)
        .bind(&new.corp_code)
        .bind(new.company_profile_id)
        .bind(&new.corp_name)
        .bind(&new.stock_code)
        .bind(&new.corp_class)
        .bind(&new.report_name)
        .bind(&new.submitter_name)
        .bind(new.receipt_date)
        .bind(&new.remark)
        .execute(&self.pool)
        .await
        .context("Failed to insert disclosure")?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            debug!("Disclosure already stored: receipt_no={}", new.receipt_no);
        }
        Ok(inserted)
    }

    pub async fn count_by_corp_code(&self, corp_code: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM disclosures WHERE corp_code = $1",
        )
        .bind(corp_code)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count disclosures")?;

        Ok(count)
    }
}
