//! Financial statement row persistence.
//!
//! Amounts are stored as the exact signed, comma-formatted strings EDS
//! returns; conversion to decimal happens only inside the risk evaluator.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

#[derive(Debug, Clone, FromRow)]
pub struct FinancialStatementRow {
    pub id: i64,
    pub corp_code: String,
    pub business_year: String,
    pub report_code: String,
    pub statement_division: Option<String>,
    pub account_id: Option<String>,
    pub account_name: String,
    pub thstrm_nm: Option<String>,
    pub thstrm_amount: Option<String>,
    pub thstrm_add_amount: Option<String>,
    pub frmtrm_nm: Option<String>,
    pub frmtrm_amount: Option<String>,
    pub frmtrm_q_nm: Option<String>,
    pub frmtrm_q_amount: Option<String>,
    pub frmtrm_add_amount: Option<String>,
    pub bfefrmtrm_nm: Option<String>,
    pub bfefrmtrm_amount: Option<String>,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialStatementRow {
    /// Duplicate-detection key within one (corp_code, year, report) tuple.
    pub fn dedup_key(&self) -> (String, String) {
        dedup_key(self.account_id.as_deref(), self.statement_division.as_deref())
    }
}

/// Key for `(account_id, statement_division)` duplicate detection; missing
/// parts collapse to a sentinel so rows without a standard account id still
/// dedup consistently.
pub fn dedup_key(account_id: Option<&str>, statement_division: Option<&str>) -> (String, String) {
    (
        account_id.unwrap_or("NULL").to_string(),
        statement_division.unwrap_or("NULL").to_string(),
    )
}

/// Fields for one statement row insert.
#[derive(Debug, Clone, Default)]
pub struct NewFinancialStatementRow {
    pub corp_code: String,
    pub business_year: String,
    pub report_code: String,
    pub statement_division: Option<String>,
    pub account_id: Option<String>,
    pub account_name: String,
    pub thstrm_nm: Option<String>,
    pub thstrm_amount: Option<String>,
    pub thstrm_add_amount: Option<String>,
    pub frmtrm_nm: Option<String>,
    pub frmtrm_amount: Option<String>,
    pub frmtrm_q_nm: Option<String>,
    pub frmtrm_q_amount: Option<String>,
    pub frmtrm_add_amount: Option<String>,
    pub bfefrmtrm_nm: Option<String>,
    pub bfefrmtrm_amount: Option<String>,
    pub currency: Option<String>,
}

/// One (year, report) tuple with stored row count.
#[derive(Debug, Clone, FromRow)]
pub struct StatementPeriod {
    pub business_year: String,
    pub report_code: String,
    pub item_count: i64,
}

#[derive(Clone)]
pub struct FinancialStatementRepository {
    pool: PgPool,
}

impl FinancialStatementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_corp_year_report(
        &self,
        corp_code: &str,
        business_year: &str,
        report_code: &str,
    ) -> Result<Vec<FinancialStatementRow>> {
        let results = sqlx::query_as::<_, FinancialStatementRow>(
            r#"
            SELECT id, corp_code, business_year, report_code,
                   statement_division, account_id, account_name,
                   thstrm_nm, thstrm_amount, thstrm_add_amount,
                   frmtrm_nm, frmtrm_amount, frmtrm_q_nm, frmtrm_q_amount,
                   frmtrm_add_amount, bfefrmtrm_nm, bfefrmtrm_amount,
                   currency, created_at, updated_at
            FROM financial_statement_rows
            WHERE corp_code = $1 AND business_year = $2 AND report_code = $3
            ORDER BY id
            "#,
        )
        .bind(corp_code)
        .bind(business_year)
        .bind(report_code)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load financial statement rows")?;

        Ok(results)
    }

    /// Insert a batch of rows inside one transaction.
    pub async fn bulk_insert(&self, rows: &[NewFinancialStatementRow]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open statement insert transaction")?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO financial_statement_rows
                    (corp_code, business_year, report_code, statement_division,
                     account_id, account_name, thstrm_nm, thstrm_amount,
                     thstrm_add_amount, frmtrm_nm, frmtrm_amount, frmtrm_q_nm,
                     frmtrm_q_amount, frmtrm_add_amount, bfefrmtrm_nm,
                     bfefrmtrm_amount, currency, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                        $13, $14, $15, $16, $17, now(), now())
                "#,
            )
            .bind(&row.corp_code)
            .bind(&row.business_year)
            .bind(&row.report_code)
            .bind(&row.statement_division)
            .bind(&row.account_id)
            .bind(&row.account_name)
            .bind(&row.thstrm_nm)
            .bind(&row.thstrm_amount)
            .bind(&row.thstrm_add_amount)
            .bind(&row.frmtrm_nm)
            .bind(&row.frmtrm_amount)
            .bind(&row.frmtrm_q_nm)
            .bind(&row.frmtrm_q_amount)
            .bind(&row.frmtrm_add_amount)
            .bind(&row.bfefrmtrm_nm)
            .bind(&row.bfefrmtrm_amount)
            .bind(&row.currency)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!(
                    "Failed to insert statement row {} / {}",
                    row.corp_code, row.account_name
                )
            })?;
        }

        tx.commit()
            .await
            .context("Failed to commit statement insert transaction")?;

        info!(
            "Stored {} financial statement rows for corp_code={}",
            rows.len(),
            rows[0].corp_code
        );
        Ok(rows.len() as u64)
    }

    /// Distinct (year, report) tuples with row counts, newest first.
    pub async fn distinct_periods(&self, corp_code: &str) -> Result<Vec<StatementPeriod>> {
        let results = sqlx::query_as::<_, StatementPeriod>(
            r#"
            SELECT business_year, report_code, COUNT(*) AS item_count
            FROM financial_statement_rows
            WHERE corp_code = $1
            GROUP BY business_year, report_code
            ORDER BY business_year DESC, report_code DESC
            "#,
        )
        .bind(corp_code)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list statement periods")?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_collapses_missing_parts() {
        assert_eq!(
            dedup_key(Some("ifrs-full_Assets"), Some("BS")),
            ("ifrs-full_Assets".to_string(), "BS".to_string())
        );
        assert_eq!(dedup_key(None, Some("IS")), ("NULL".to_string(), "IS".to_string()));
        assert_eq!(dedup_key(None, None), ("NULL".to_string(), "NULL".to_string()));
    }
}
