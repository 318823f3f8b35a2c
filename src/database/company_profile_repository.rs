//! Company profile persistence.
//!
//! `corp_code` is the natural identity but duplicates can exist (the
//! ingestion coordinator picks a canonical row by completeness score and
//! leaves the rest unreferenced), so lookups come in single- and all-rows
//! flavors.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::partner::types::Owner;

#[derive(Debug, Clone, FromRow)]
pub struct CompanyProfileRow {
    pub id: i64,
    pub corp_code: String,
    pub headquarters_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub user_type: String,
    pub corp_name: String,
    pub corp_name_eng: Option<String>,
    pub stock_code: Option<String>,
    pub stock_name: Option<String>,
    pub ceo_name: Option<String>,
    pub corp_class: Option<String>,
    pub business_number: Option<String>,
    pub corporate_registration_number: Option<String>,
    pub address: Option<String>,
    pub homepage_url: Option<String>,
    pub ir_url: Option<String>,
    pub phone_number: Option<String>,
    pub fax_number: Option<String>,
    pub industry_code: Option<String>,
    pub establishment_date: Option<String>,
    pub accounting_month: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a profile.
#[derive(Debug, Clone, Default)]
pub struct NewCompanyProfile {
    pub corp_code: String,
    pub headquarters_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub user_type: String,
    pub corp_name: String,
    pub corp_name_eng: Option<String>,
    pub stock_code: Option<String>,
    pub stock_name: Option<String>,
    pub ceo_name: Option<String>,
    pub corp_class: Option<String>,
    pub business_number: Option<String>,
    pub corporate_registration_number: Option<String>,
    pub address: Option<String>,
    pub homepage_url: Option<String>,
    pub ir_url: Option<String>,
    pub phone_number: Option<String>,
    pub fax_number: Option<String>,
    pub industry_code: Option<String>,
    pub establishment_date: Option<String>,
    pub accounting_month: Option<String>,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, corp_code, headquarters_id, partner_id, user_type,
           corp_name, corp_name_eng, stock_code, stock_name, ceo_name,
           corp_class, business_number, corporate_registration_number,
           address, homepage_url, ir_url, phone_number, fax_number,
           industry_code, establishment_date, accounting_month,
           created_at, updated_at
    FROM company_profiles
"#;

#[derive(Clone)]
pub struct CompanyProfileRepository {
    pool: PgPool,
}

impl CompanyProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// First profile for a corp code, lowest id wins when duplicates exist.
    pub async fn find_by_corp_code(&self, corp_code: &str) -> Result<Option<CompanyProfileRow>> {
        let result = sqlx::query_as::<_, CompanyProfileRow>(&format!(
            "{} WHERE corp_code = $1 ORDER BY id LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(corp_code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find company profile by corp_code")?;

        Ok(result)
    }

    /// All rows for a corp code, for duplicate consolidation.
    pub async fn find_all_by_corp_code(&self, corp_code: &str) -> Result<Vec<CompanyProfileRow>> {
        let results = sqlx::query_as::<_, CompanyProfileRow>(&format!(
            "{} WHERE corp_code = $1 ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(corp_code)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list company profiles by corp_code")?;

        Ok(results)
    }

    /// Owner-scoped profile lookup.
    pub async fn find_by_owner_and_corp_code(
        &self,
        owner: Owner,
        corp_code: &str,
    ) -> Result<Option<CompanyProfileRow>> {
        let query = match owner {
            Owner::Headquarters(_) => format!(
                "{} WHERE headquarters_id = $1 AND corp_code = $2 ORDER BY id LIMIT 1",
                SELECT_COLUMNS
            ),
            Owner::Partner(_) => format!(
                "{} WHERE partner_id = $1 AND corp_code = $2 ORDER BY id LIMIT 1",
                SELECT_COLUMNS
            ),
        };
        let owner_id = match owner {
            Owner::Headquarters(id) | Owner::Partner(id) => id,
        };

        let result = sqlx::query_as::<_, CompanyProfileRow>(&query)
            .bind(owner_id)
            .bind(corp_code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find company profile by owner and corp_code")?;

        Ok(result)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<CompanyProfileRow>> {
        let result = sqlx::query_as::<_, CompanyProfileRow>(&format!(
            "{} WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find company profile by id")?;

        Ok(result)
    }

    pub async fn insert(&self, new: &NewCompanyProfile) -> Result<CompanyProfileRow> {
        let row = sqlx::query_as::<_, CompanyProfileRow>(
            r#"
            INSERT INTO company_profiles
                (corp_code, headquarters_id, partner_id, user_type,
                 corp_name, corp_name_eng, stock_code, stock_name, ceo_name,
                 corp_class, business_number, corporate_registration_number,
                 address, homepage_url, ir_url, phone_number, fax_number,
                 industry_code, establishment_date, accounting_month,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, now(), now())
            RETURNING id, corp_code, headquarters_id, partner_id, user_type,
                      corp_name, corp_name_eng, stock_code, stock_name, ceo_name,
                      corp_class, business_number, corporate_registration_number,
                      address, homepage_url, ir_url, phone_number, fax_number,
                      industry_code, establishment_date, accounting_month,
                      created_at, updated_at
            "#,
        )
        .bind(&new.corp_code)
        .bind(new.headquarters_id)
        .bind(new.partner_id)
        .bind(&new.user_type)
        .bind(&new.corp_name)
        .bind(&new.corp_name_eng)
        .bind(&new.stock_code)
        .bind(&new.stock_name)
        .bind(&new.ceo_name)
        .bind(&new.corp_class)
        .bind(&new.business_number)
        .bind(&new.corporate_registration_number)
        .bind(&new.address)
        .bind(&new.homepage_url)
        .bind(&new.ir_url)
        .bind(&new.phone_number)
        .bind(&new.fax_number)
        .bind(&new.industry_code)
        .bind(&new.establishment_date)
        .bind(&new.accounting_month)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert company profile")?;

        info!(
            "Created company profile {} for corp_code={}",
            row.id, row.corp_code
        );
        Ok(row)
    }

    /// Persist all mutable fields of an in-memory row.
    pub async fn update(&self, row: &CompanyProfileRow) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE company_profiles
            SET corp_name = $1, corp_name_eng = $2, stock_code = $3,
                stock_name = $4, ceo_name = $5, corp_class = $6,
                business_number = $7, corporate_registration_number = $8,
                address = $9, homepage_url = $10, ir_url = $11,
                phone_number = $12, fax_number = $13, industry_code = $14,
                establishment_date = $15, accounting_month = $16,
                headquarters_id = $17, partner_id = $18, user_type = $19,
                updated_at = now()
            WHERE id = $20
            "#,
        )
        .bind(&row.corp_name)
        .bind(&row.corp_name_eng)
        .bind(&row.stock_code)
        .bind(&row.stock_name)
        .bind(&row.ceo_name)
        .bind(&row.corp_class)
        .bind(&row.business_number)
        .bind(&row.corporate_registration_number)
        .bind(&row.address)
        .bind(&row.homepage_url)
        .bind(&row.ir_url)
        .bind(&row.phone_number)
        .bind(&row.fax_number)
        .bind(&row.industry_code)
        .bind(&row.establishment_date)
        .bind(&row.accounting_month)
        .bind(row.headquarters_id)
        .bind(row.partner_id)
        .bind(&row.user_type)
        .bind(row.id)
        .execute(&self.pool)
        .await
        .context("Failed to update company profile")?;

        Ok(())
    }
}
