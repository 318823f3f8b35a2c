//! Partner company persistence.
//!
//! Name lookups resolve through the linked company profile (the partner row
//! never stores the display name) and compare case-insensitively. Owner
//! scoping uses whichever id column the owner kind maps to.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::partner::types::{Owner, PartnerStatus};

#[derive(Debug, Clone, FromRow)]
pub struct PartnerCompanyRow {
    pub id: Uuid,
    pub corp_code: String,
    pub company_profile_id: Option<i64>,
    pub headquarters_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub user_type: String,
    pub contract_start_date: Option<NaiveDate>,
    pub status: String,
    pub account_created: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str = r#"
    SELECT p.id, p.corp_code, p.company_profile_id, p.headquarters_id,
           p.partner_id, p.user_type, p.contract_start_date, p.status,
           p.account_created, p.created_at, p.updated_at
    FROM partner_companies p
"#;

fn owner_column(owner: Owner) -> &'static str {
    match owner {
        Owner::Headquarters(_) => "p.headquarters_id",
        Owner::Partner(_) => "p.partner_id",
    }
}

fn owner_id(owner: Owner) -> i64 {
    match owner {
        Owner::Headquarters(id) | Owner::Partner(id) => id,
    }
}

#[derive(Clone)]
pub struct PartnerCompanyRepository {
    pool: PgPool,
}

impl PartnerCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PartnerCompanyRow>> {
        let result = sqlx::query_as::<_, PartnerCompanyRow>(&format!(
            "{} WHERE p.id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find partner company by id")?;

        Ok(result)
    }

    /// Owner-scoped exact-name lookup (case-insensitive) in one status.
    pub async fn find_by_owner_and_name_and_status(
        &self,
        owner: Owner,
        company_name: &str,
        status: PartnerStatus,
    ) -> Result<Option<PartnerCompanyRow>> {
        let query = format!(
            r#"{} JOIN company_profiles cp ON cp.id = p.company_profile_id
               WHERE {} = $1 AND LOWER(cp.corp_name) = LOWER($2) AND p.status = $3
               ORDER BY p.created_at
               LIMIT 1"#,
            SELECT_COLUMNS,
            owner_column(owner)
        );

        let result = sqlx::query_as::<_, PartnerCompanyRow>(&query)
            .bind(owner_id(owner))
            .bind(company_name)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find partner company by owner and name")?;

        Ok(result)
    }

    /// Global exact-name lookup against ACTIVE partners, for the
    /// duplicate-name check endpoint.
    pub async fn find_active_by_name(
        &self,
        company_name: &str,
    ) -> Result<Option<PartnerCompanyRow>> {
        let query = format!(
            r#"{} JOIN company_profiles cp ON cp.id = p.company_profile_id
               WHERE LOWER(cp.corp_name) = LOWER($1) AND p.status = $2
               ORDER BY p.created_at
               LIMIT 1"#,
            SELECT_COLUMNS
        );

        let result = sqlx::query_as::<_, PartnerCompanyRow>(&query)
            .bind(company_name)
            .bind(PartnerStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find active partner company by name")?;

        Ok(result)
    }

    pub async fn find_by_owner_and_corp_code(
        &self,
        owner: Owner,
        corp_code: &str,
    ) -> Result<Option<PartnerCompanyRow>> {
        let query = format!(
            "{} WHERE {} = $1 AND p.corp_code = $2 ORDER BY p.created_at LIMIT 1",
            SELECT_COLUMNS,
            owner_column(owner)
        );

        let result = sqlx::query_as::<_, PartnerCompanyRow>(&query)
            .bind(owner_id(owner))
            .bind(corp_code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find partner company by owner and corp_code")?;

        Ok(result)
    }

    /// Page of an owner's partners in one status, newest first, optionally
    /// filtered by a name fragment.
    pub async fn list_by_owner(
        &self,
        owner: Owner,
        status: PartnerStatus,
        name_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PartnerCompanyRow>> {
        let query = match name_filter {
            Some(_) => format!(
                r#"{} JOIN company_profiles cp ON cp.id = p.company_profile_id
                   WHERE {} = $1 AND p.status = $2
                     AND cp.corp_name ILIKE '%' || $3 || '%'
                   ORDER BY p.created_at DESC
                   LIMIT $4 OFFSET $5"#,
                SELECT_COLUMNS,
                owner_column(owner)
            ),
            None => format!(
                r#"{} WHERE {} = $1 AND p.status = $2
                   ORDER BY p.created_at DESC
                   LIMIT $3 OFFSET $4"#,
                SELECT_COLUMNS,
                owner_column(owner)
            ),
        };

        let mut q = sqlx::query_as::<_, PartnerCompanyRow>(&query)
            .bind(owner_id(owner))
            .bind(status.as_str());
        if let Some(fragment) = name_filter {
            q = q.bind(fragment);
        }
        let results = q
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list partner companies by owner")?;

        Ok(results)
    }

    pub async fn count_by_owner(
        &self,
        owner: Owner,
        status: PartnerStatus,
        name_filter: Option<&str>,
    ) -> Result<i64> {
        let query = match name_filter {
            Some(_) => format!(
                r#"SELECT COUNT(*) FROM partner_companies p
                   JOIN company_profiles cp ON cp.id = p.company_profile_id
                   WHERE {} = $1 AND p.status = $2
                     AND cp.corp_name ILIKE '%' || $3 || '%'"#,
                owner_column(owner)
            ),
            None => format!(
                "SELECT COUNT(*) FROM partner_companies p WHERE {} = $1 AND p.status = $2",
                owner_column(owner)
            ),
        };

        let mut q = sqlx::query_scalar::<_, i64>(&query)
            .bind(owner_id(owner))
            .bind(status.as_str());
        if let Some(fragment) = name_filter {
            q = q.bind(fragment);
        }
        let count = q
            .fetch_one(&self.pool)
            .await
            .context("Failed to count partner companies by owner")?;

        Ok(count)
    }

    /// Distinct display names of all ACTIVE partners, system-wide.
    pub async fn unique_active_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT cp.corp_name
            FROM partner_companies p
            JOIN company_profiles cp ON cp.id = p.company_profile_id
            WHERE p.status = $1
            ORDER BY cp.corp_name
            "#,
        )
        .bind(PartnerStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list unique active partner names")?;

        Ok(names)
    }

    pub async fn insert(&self, row: &PartnerCompanyRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO partner_companies
                (id, corp_code, company_profile_id, headquarters_id,
                 partner_id, user_type, contract_start_date, status,
                 account_created, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
            "#,
        )
        .bind(row.id)
        .bind(&row.corp_code)
        .bind(row.company_profile_id)
        .bind(row.headquarters_id)
        .bind(row.partner_id)
        .bind(&row.user_type)
        .bind(row.contract_start_date)
        .bind(&row.status)
        .bind(row.account_created)
        .execute(&self.pool)
        .await
        .context("Failed to insert partner company")?;

        info!(
            "Created partner company {} for corp_code={}",
            row.id, row.corp_code
        );
        Ok(())
    }

    pub async fn update(&self, row: &PartnerCompanyRow) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE partner_companies
            SET corp_code = $1, company_profile_id = $2, headquarters_id = $3,
                partner_id = $4, user_type = $5, contract_start_date = $6,
                status = $7, account_created = $8, updated_at = now()
            WHERE id = $9
            "#,
        )
        .bind(&row.corp_code)
        .bind(row.company_profile_id)
        .bind(row.headquarters_id)
        .bind(row.partner_id)
        .bind(&row.user_type)
        .bind(row.contract_start_date)
        .bind(&row.status)
        .bind(row.account_created)
        .bind(row.id)
        .execute(&self.pool)
        .await
        .context("Failed to update partner company")?;

        Ok(())
    }
}
