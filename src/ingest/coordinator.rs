//! Per-event ingestion pipeline.
//!
//! Each inbound partner event with a corp code drives three steps: profile
//! reconciliation, disclosure refresh and statement refresh. Profile
//! reconciliation failure aborts the rest; the two refreshes are independent
//! and best-effort. Everything that goes wrong is logged and the event is
//! acknowledged - replays come from bus redelivery and every write is
//! idempotent.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::bus::PartnerEvent;
use crate::database::financial_statement_repository::dedup_key;
use crate::database::{
    CompanyProfileRepository, CompanyProfileRow, CorpCodeRepository, DisclosureRepository,
    FinancialStatementRepository, NewCompanyProfile, NewDisclosure, NewFinancialStatementRow,
};
use crate::eds::{
    CompanyProfileResponse, EdsClient, FinancialStatementItem, ReportCode, StatementDivision,
};
use crate::partner::types::USER_TYPE_UNKNOWN;

/// Fallback display name when neither EDS nor the directory knows the code.
const UNKNOWN_CORP_NAME: &str = "정보 없음";

/// Statement tuples refreshed per event, in fetch order: last year's annual
/// report, then this year's Q3 / half / Q1 filings.
fn statement_refresh_plan(today: NaiveDate) -> [(String, ReportCode); 4] {
    let this_year = today.year().to_string();
    let last_year = (today.year() - 1).to_string();
    [
        (last_year, ReportCode::Annual),
        (this_year.clone(), ReportCode::ThirdQuarter),
        (this_year.clone(), ReportCode::HalfYear),
        (this_year, ReportCode::FirstQuarter),
    ]
}

pub struct IngestionCoordinator {
    eds: Arc<EdsClient>,
    profiles: CompanyProfileRepository,
    disclosures: DisclosureRepository,
    statements: FinancialStatementRepository,
    directory: CorpCodeRepository,
}

impl IngestionCoordinator {
    pub fn new(
        eds: Arc<EdsClient>,
        profiles: CompanyProfileRepository,
        disclosures: DisclosureRepository,
        statements: FinancialStatementRepository,
        directory: CorpCodeRepository,
    ) -> Self {
        Self {
            eds,
            profiles,
            disclosures,
            statements,
            directory,
        }
    }

    /// Process one inbound partner event. Never fails the caller: the event
    /// is acknowledged whatever happens, with the outcome logged.
    pub async fn handle_event(&self, event: &PartnerEvent) {
        let corp_code = match event.corp_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => {
                warn!(
                    "Partner event carries no corp_code, skipping EDS sync: action={:?}",
                    event.action
                );
                return;
            }
        };

        info!(
            "Processing partner event: corp_code={}, action={:?}, timestamp={}",
            corp_code, event.action, event.timestamp
        );

        let profile = match self.reconcile_profile(corp_code).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(
                    "Profile reconciliation failed, aborting event: corp_code={}, error={:#}",
                    corp_code, e
                );
                return;
            }
        };

        if let Err(e) = self.refresh_disclosures(corp_code, &profile).await {
            error!(
                "Disclosure refresh failed: corp_code={}, error={:#}",
                corp_code, e
            );
        }

        self.refresh_statements(corp_code).await;

        info!("Partner event processed: corp_code={}", corp_code);
    }

    /// Step 1: settle on exactly one canonical profile row for the corp
    /// code, creating or enriching as needed.
    pub async fn reconcile_profile(&self, corp_code: &str) -> Result<CompanyProfileRow> {
        let existing = self
            .profiles
            .find_all_by_corp_code(corp_code)
            .await
            .context("profile lookup failed")?;

        match existing.len() {
            0 => self.create_profile(corp_code).await,
            1 => {
                let profile = existing.into_iter().next().unwrap();
                if needs_detail_update(&profile) {
                    info!(
                        "Profile lacks detail fields, enriching from EDS: corp_code={}, id={}",
                        corp_code, profile.id
                    );
                    self.enrich_profile(profile).await
                } else {
                    Ok(profile)
                }
            }
            n => {
                warn!(
                    "Duplicate company profiles found: corp_code={}, count={}",
                    corp_code, n
                );
                Ok(consolidate_profiles(existing))
            }
        }
    }

    /// Create a profile from EDS, falling back to the corp-code directory
    /// when EDS has nothing. The created row carries no owner yet.
    async fn create_profile(&self, corp_code: &str) -> Result<CompanyProfileRow> {
        if let Some(response) = self.eds.get_company_profile(corp_code).await? {
            info!(
                "EDS answered company profile: corp_code={}, corp_name={}",
                corp_code,
                response.corp_name.as_deref().unwrap_or("-")
            );
            let mut new = NewCompanyProfile {
                corp_code: corp_code.to_string(),
                user_type: USER_TYPE_UNKNOWN.to_string(),
                corp_name: UNKNOWN_CORP_NAME.to_string(),
                ..NewCompanyProfile::default()
            };
            apply_profile_response(&mut new, &response);
            return self.profiles.insert(&new).await;
        }

        warn!(
            "EDS has no profile, falling back to corp-code directory: corp_code={}",
            corp_code
        );
        let corp_name = match self.directory.find_by_corp_code(corp_code).await {
            Ok(Some(entry)) => entry.corp_name,
            Ok(None) => {
                warn!("Corp code missing from directory too: corp_code={}", corp_code);
                UNKNOWN_CORP_NAME.to_string()
            }
            Err(e) => {
                error!(
                    "Directory lookup failed, using fallback name: corp_code={}, error={:#}",
                    corp_code, e
                );
                UNKNOWN_CORP_NAME.to_string()
            }
        };

        let new = NewCompanyProfile {
            corp_code: corp_code.to_string(),
            user_type: USER_TYPE_UNKNOWN.to_string(),
            corp_name,
            ..NewCompanyProfile::default()
        };
        self.profiles.insert(&new).await
    }

    /// Merge EDS detail fields over an incomplete profile. EDS failures
    /// leave the existing row untouched.
    async fn enrich_profile(&self, mut profile: CompanyProfileRow) -> Result<CompanyProfileRow> {
        match self.eds.get_company_profile(&profile.corp_code).await {
            Ok(Some(response)) => {
                merge_profile_response(&mut profile, &response);
                self.profiles
                    .update(&profile)
                    .await
                    .context("profile enrichment write failed")?;
                info!(
                    "Profile enriched from EDS: corp_code={}, id={}",
                    profile.corp_code, profile.id
                );
                Ok(profile)
            }
            Ok(None) => {
                warn!(
                    "EDS had no data for enrichment, keeping existing profile: corp_code={}",
                    profile.corp_code
                );
                Ok(profile)
            }
            Err(e) => {
                warn!(
                    "EDS enrichment call failed, keeping existing profile: corp_code={}, error={}",
                    profile.corp_code, e
                );
                Ok(profile)
            }
        }
    }

    /// Step 2: pull the last 365 days of disclosures and store the ones not
    /// seen yet, linked to the canonical profile.
    async fn refresh_disclosures(
        &self,
        corp_code: &str,
        profile: &CompanyProfileRow,
    ) -> Result<()> {
        let end = Utc::now().date_naive();
        let begin = end - Duration::days(365);
        let begin_str = begin.format("%Y%m%d").to_string();
        let end_str = end.format("%Y%m%d").to_string();

        let items = self
            .eds
            .search_disclosures(corp_code, &begin_str, &end_str)
            .await
            .context("disclosure search failed")?;

        if items.is_empty() {
            info!("No disclosures in window: corp_code={}", corp_code);
            return Ok(());
        }

        let total = items.len();
        let mut inserted = 0usize;
        for item in items {
            let receipt_date = match NaiveDate::parse_from_str(&item.receipt_date, "%Y%m%d") {
                Ok(date) => date,
                Err(e) => {
                    warn!(
                        "Unparseable receipt date, skipping disclosure: receipt_no={}, value={}, error={}",
                        item.receipt_no, item.receipt_date, e
                    );
                    continue;
                }
            };

            let new = NewDisclosure {
                receipt_no: item.receipt_no,
                corp_code: corp_code.to_string(),
                company_profile_id: Some(profile.id),
                corp_name: item.corp_name,
                stock_code: item.stock_code,
                corp_class: item.corp_class,
                report_name: item.report_name,
                submitter_name: item.submitter_name,
                receipt_date,
                remark: item.remark,
            };
            match self.disclosures.insert_if_absent(&new).await {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    "Disclosure insert failed: receipt_no={}, error={:#}",
                    new.receipt_no, e
                ),
            }
        }

        info!(
            "Disclosure refresh complete: corp_code={}, fetched={}, new={}",
            corp_code, total, inserted
        );
        Ok(())
    }

    /// Step 3: refresh the four recent statement tuples. Each tuple is its
    /// own best-effort sub-step.
    async fn refresh_statements(&self, corp_code: &str) {
        let today = Utc::now().date_naive();
        for (year, report) in statement_refresh_plan(today) {
            if let Err(e) = self.refresh_single_statement(corp_code, &year, report).await {
                error!(
                    "Statement refresh failed: corp_code={}, year={}, report={}, error={:#}",
                    corp_code, year, report, e
                );
            }
        }
    }

    async fn refresh_single_statement(
        &self,
        corp_code: &str,
        business_year: &str,
        report_code: ReportCode,
    ) -> Result<()> {
        let existing = self
            .statements
            .find_by_corp_year_report(corp_code, business_year, report_code.as_str())
            .await
            .context("existing statement rows lookup failed")?;

        let items = self
            .eds
            .get_financial_statement(
                corp_code,
                business_year,
                report_code,
                StatementDivision::Separate,
            )
            .await
            .context("statement fetch failed")?;

        if items.is_empty() {
            debug!(
                "No statement data: corp_code={}, year={}, report={}",
                corp_code, business_year, report_code
            );
            return Ok(());
        }

        // Existing rows are never deleted; only unseen
        // (account_id, statement_division) keys are added.
        let mut seen: HashSet<(String, String)> =
            existing.iter().map(|row| row.dedup_key()).collect();

        let fetched = items.len();
        let mut to_insert = Vec::new();
        for item in items {
            let key = dedup_key(item.account_id.as_deref(), item.statement_division.as_deref());
            if !seen.insert(key) {
                continue;
            }
            to_insert.push(statement_row_from_item(
                corp_code,
                business_year,
                report_code,
                item,
            ));
        }

        if to_insert.is_empty() {
            info!(
                "Statement already complete: corp_code={}, year={}, report={}, fetched={}, existing={}",
                corp_code,
                business_year,
                report_code,
                fetched,
                existing.len()
            );
            return Ok(());
        }

        let written = self.statements.bulk_insert(&to_insert).await?;
        info!(
            "Statement refresh complete: corp_code={}, year={}, report={}, fetched={}, existing={}, new={}",
            corp_code,
            business_year,
            report_code,
            fetched,
            existing.len(),
            written
        );
        Ok(())
    }
}

/// Count of non-blank descriptive fields, used to pick the canonical row
/// among duplicates.
pub fn completeness_score(profile: &CompanyProfileRow) -> u32 {
    let opt = |value: &Option<String>| -> u32 {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => 1,
            _ => 0,
        }
    };

    let mut score = 0;
    if !profile.corp_name.trim().is_empty() {
        score += 1;
    }
    score += opt(&profile.ceo_name);
    score += opt(&profile.address);
    score += opt(&profile.phone_number);
    score += opt(&profile.business_number);
    score += opt(&profile.industry_code);
    score += opt(&profile.establishment_date);
    score += opt(&profile.accounting_month);
    score += opt(&profile.corp_name_eng);
    score += opt(&profile.stock_code);
    score += opt(&profile.homepage_url);
    score += opt(&profile.fax_number);
    score
}

/// Pick the most complete row; ties resolve to the lowest id. The ignored
/// duplicates stay in place (other rows may reference them) and are logged.
fn consolidate_profiles(mut profiles: Vec<CompanyProfileRow>) -> CompanyProfileRow {
    profiles.sort_by_key(|p| p.id);
    let mut best_index = 0;
    let mut best_score = completeness_score(&profiles[0]);
    for (index, profile) in profiles.iter().enumerate().skip(1) {
        let score = completeness_score(profile);
        if score > best_score {
            best_index = index;
            best_score = score;
        }
    }

    for (index, profile) in profiles.iter().enumerate() {
        if index != best_index {
            info!(
                "Ignoring duplicate profile (kept, unreferenced): id={}, corp_code={}, score={}",
                profile.id,
                profile.corp_code,
                completeness_score(profile)
            );
        }
    }

    info!(
        "Canonical profile selected: id={}, corp_code={}, score={}",
        profiles[best_index].id, profiles[best_index].corp_code, best_score
    );
    profiles.swap_remove(best_index)
}

fn needs_detail_update(profile: &CompanyProfileRow) -> bool {
    let blank = |value: &Option<String>| -> bool {
        value.as_deref().map(str::trim).unwrap_or("").is_empty()
    };
    blank(&profile.ceo_name)
        || blank(&profile.address)
        || blank(&profile.phone_number)
        || blank(&profile.business_number)
        || blank(&profile.industry_code)
}

/// Copy EDS response fields into a fresh profile.
fn apply_profile_response(new: &mut NewCompanyProfile, response: &CompanyProfileResponse) {
    if let Some(name) = response.corp_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            new.corp_name = name.to_string();
        }
    }
    new.corp_name_eng = response.corp_name_eng.clone();
    new.stock_code = response.stock_code.clone();
    new.stock_name = response.stock_name.clone();
    new.ceo_name = response.ceo_name.clone();
    new.corp_class = response.corp_class.clone();
    new.business_number = response.business_number.clone();
    new.corporate_registration_number = response.corporate_registration_number.clone();
    new.address = response.address.clone();
    new.homepage_url = response.homepage_url.clone();
    new.ir_url = response.ir_url.clone();
    new.phone_number = response.phone_number.clone();
    new.fax_number = response.fax_number.clone();
    new.industry_code = response.industry_code.clone();
    new.establishment_date = response.establishment_date.clone();
    new.accounting_month = response.accounting_month.clone();
}

/// Merge EDS response fields over an existing row; fields absent from the
/// response keep their stored values.
fn merge_profile_response(profile: &mut CompanyProfileRow, response: &CompanyProfileResponse) {
    if let Some(name) = response.corp_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            profile.corp_name = name.to_string();
        }
    }
    let merge = |target: &mut Option<String>, source: &Option<String>| {
        if source.is_some() {
            *target = source.clone();
        }
    };
    merge(&mut profile.corp_name_eng, &response.corp_name_eng);
    merge(&mut profile.stock_code, &response.stock_code);
    merge(&mut profile.stock_name, &response.stock_name);
    merge(&mut profile.ceo_name, &response.ceo_name);
    merge(&mut profile.corp_class, &response.corp_class);
    merge(&mut profile.business_number, &response.business_number);
    merge(
        &mut profile.corporate_registration_number,
        &response.corporate_registration_number,
    );
    merge(&mut profile.address, &response.address);
    merge(&mut profile.homepage_url, &response.homepage_url);
    merge(&mut profile.ir_url, &response.ir_url);
    merge(&mut profile.phone_number, &response.phone_number);
    merge(&mut profile.fax_number, &response.fax_number);
    merge(&mut profile.industry_code, &response.industry_code);
    merge(&mut profile.establishment_date, &response.establishment_date);
    merge(&mut profile.accounting_month, &response.accounting_month);
}

fn statement_row_from_item(
    corp_code: &str,
    business_year: &str,
    report_code: ReportCode,
    item: FinancialStatementItem,
) -> NewFinancialStatementRow {
    NewFinancialStatementRow {
        corp_code: corp_code.to_string(),
        business_year: business_year.to_string(),
        report_code: report_code.as_str().to_string(),
        statement_division: item.statement_division,
        account_id: item.account_id,
        account_name: item.account_name,
        thstrm_nm: item.thstrm_nm,
        thstrm_amount: item.thstrm_amount,
        thstrm_add_amount: item.thstrm_add_amount,
        frmtrm_nm: item.frmtrm_nm,
        frmtrm_amount: item.frmtrm_amount,
        frmtrm_q_nm: item.frmtrm_q_nm,
        frmtrm_q_amount: item.frmtrm_q_amount,
        frmtrm_add_amount: item.frmtrm_add_amount,
        bfefrmtrm_nm: item.bfefrmtrm_nm,
        bfefrmtrm_amount: item.bfefrmtrm_amount,
        currency: item.currency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn profile(id: i64, fields: &[(&str, &str)]) -> CompanyProfileRow {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut row = CompanyProfileRow {
            id,
            corp_code: "00126380".to_string(),
            headquarters_id: None,
            partner_id: None,
            user_type: USER_TYPE_UNKNOWN.to_string(),
            corp_name: String::new(),
            corp_name_eng: None,
            stock_code: None,
            stock_name: None,
            ceo_name: None,
            corp_class: None,
            business_number: None,
            corporate_registration_number: None,
            address: None,
            homepage_url: None,
            ir_url: None,
            phone_number: None,
            fax_number: None,
            industry_code: None,
            establishment_date: None,
            accounting_month: None,
            created_at: now,
            updated_at: now,
        };
        for (field, value) in fields {
            let value = Some(value.to_string());
            match *field {
                "corp_name" => row.corp_name = value.unwrap(),
                "ceo_name" => row.ceo_name = value,
                "address" => row.address = value,
                "phone_number" => row.phone_number = value,
                "business_number" => row.business_number = value,
                "industry_code" => row.industry_code = value,
                "establishment_date" => row.establishment_date = value,
                "accounting_month" => row.accounting_month = value,
                "corp_name_eng" => row.corp_name_eng = value,
                "stock_code" => row.stock_code = value,
                "homepage_url" => row.homepage_url = value,
                "fax_number" => row.fax_number = value,
                other => panic!("unknown field {}", other),
            }
        }
        row
    }

    #[test]
    fn completeness_counts_the_twelve_fields() {
        let empty = profile(1, &[]);
        assert_eq!(completeness_score(&empty), 0);

        let partial = profile(
            2,
            &[
                ("corp_name", "삼성전자(주)"),
                ("ceo_name", "한종희"),
                ("stock_code", "005930"),
            ],
        );
        assert_eq!(completeness_score(&partial), 3);

        let full = profile(
            3,
            &[
                ("corp_name", "삼성전자(주)"),
                ("ceo_name", "한종희"),
                ("address", "수원시"),
                ("phone_number", "031-200-1114"),
                ("business_number", "124-81-00998"),
                ("industry_code", "26410"),
                ("establishment_date", "19690113"),
                ("accounting_month", "12"),
                ("corp_name_eng", "SAMSUNG ELECTRONICS"),
                ("stock_code", "005930"),
                ("homepage_url", "www.samsung.com"),
                ("fax_number", "031-200-7538"),
            ],
        );
        assert_eq!(completeness_score(&full), 12);
    }

    #[test]
    fn blank_fields_do_not_count() {
        let padded = profile(1, &[("corp_name", "회사"), ("ceo_name", "   ")]);
        assert_eq!(completeness_score(&padded), 1);
    }

    #[test]
    fn consolidation_keeps_the_highest_score() {
        let low = profile(10, &[("corp_name", "회사")]);
        let high = profile(
            20,
            &[
                ("corp_name", "회사"),
                ("ceo_name", "대표"),
                ("address", "서울"),
                ("phone_number", "02-000-0000"),
            ],
        );
        let best = consolidate_profiles(vec![low, high]);
        assert_eq!(best.id, 20);
    }

    #[test]
    fn consolidation_breaks_ties_by_lowest_id() {
        let a = profile(30, &[("corp_name", "회사"), ("ceo_name", "대표")]);
        let b = profile(7, &[("corp_name", "회사"), ("address", "서울")]);
        let best = consolidate_profiles(vec![a, b]);
        assert_eq!(best.id, 7);
    }

    #[test]
    fn detail_update_needed_when_core_fields_blank() {
        let sparse = profile(1, &[("corp_name", "회사")]);
        assert!(needs_detail_update(&sparse));

        let complete = profile(
            2,
            &[
                ("corp_name", "회사"),
                ("ceo_name", "대표"),
                ("address", "서울"),
                ("phone_number", "02-000-0000"),
                ("business_number", "123-45-67890"),
                ("industry_code", "26410"),
            ],
        );
        assert!(!needs_detail_update(&complete));
    }

    #[test]
    fn merge_keeps_stored_values_for_absent_fields() {
        let mut row = profile(
            1,
            &[("corp_name", "회사"), ("address", "기존 주소")],
        );
        let response = CompanyProfileResponse {
            status: "000".to_string(),
            ceo_name: Some("새 대표".to_string()),
            ..CompanyProfileResponse::default()
        };
        merge_profile_response(&mut row, &response);
        assert_eq!(row.ceo_name.as_deref(), Some("새 대표"));
        assert_eq!(row.address.as_deref(), Some("기존 주소"));
        assert_eq!(row.corp_name, "회사");
    }

    #[test]
    fn refresh_plan_orders_annual_then_quarters() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        let plan = statement_refresh_plan(today);
        assert_eq!(plan[0], ("2024".to_string(), ReportCode::Annual));
        assert_eq!(plan[1], ("2025".to_string(), ReportCode::ThirdQuarter));
        assert_eq!(plan[2], ("2025".to_string(), ReportCode::HalfYear));
        assert_eq!(plan[3], ("2025".to_string(), ReportCode::FirstQuarter));
    }
}
