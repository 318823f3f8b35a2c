//! Repository-backed entry points for the risk rubric.

use chrono::Utc;
use tracing::info;

use super::evaluator::{auto_period, evaluate_rows};
use super::types::{period_description, report_name, AvailablePeriod, RiskAssessment};
use crate::database::FinancialStatementRepository;
use crate::eds::ReportCode;
use crate::error::{ServiceError, ServiceResult};

const MIN_BUSINESS_YEAR: i32 = 2000;
const MAX_BUSINESS_YEAR: i32 = 2030;

pub struct RiskAssessmentService {
    statements: FinancialStatementRepository,
}

impl RiskAssessmentService {
    pub fn new(statements: FinancialStatementRepository) -> Self {
        Self { statements }
    }

    /// Assess against the most recent filing likely to be available today.
    pub async fn assess_financial_risk(
        &self,
        corp_code: &str,
        partner_name: &str,
    ) -> ServiceResult<RiskAssessment> {
        let (year, report_code) = auto_period(Utc::now().date_naive());
        info!(
            "Automatic assessment period selected: corp_code={}, year={}, report={}",
            corp_code, year, report_code
        );
        self.assess(corp_code, partner_name, &year.to_string(), report_code)
            .await
    }

    /// Assess a caller-chosen (year, report) tuple.
    pub async fn assess_financial_risk_for_period(
        &self,
        corp_code: &str,
        partner_name: &str,
        business_year: &str,
        report_code: &str,
    ) -> ServiceResult<RiskAssessment> {
        let year: i32 = business_year.trim().parse().map_err(|_| {
            ServiceError::InvalidArgument(format!(
                "business year must be a four-digit year, got '{}'",
                business_year
            ))
        })?;
        if !(MIN_BUSINESS_YEAR..=MAX_BUSINESS_YEAR).contains(&year) {
            return Err(ServiceError::InvalidArgument(format!(
                "business year must be between {} and {}, got {}",
                MIN_BUSINESS_YEAR, MAX_BUSINESS_YEAR, year
            )));
        }
        let report_code = ReportCode::parse(report_code.trim())?;

        info!(
            "Manual assessment period selected: corp_code={}, year={}, report={}",
            corp_code, year, report_code
        );
        self.assess(corp_code, partner_name, &year.to_string(), report_code)
            .await
    }

    async fn assess(
        &self,
        corp_code: &str,
        partner_name: &str,
        business_year: &str,
        report_code: ReportCode,
    ) -> ServiceResult<RiskAssessment> {
        if corp_code.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "corp_code must not be blank".to_string(),
            ));
        }

        let rows = self
            .statements
            .find_by_corp_year_report(corp_code, business_year, report_code.as_str())
            .await?;

        let assessment = evaluate_rows(corp_code, partner_name, business_year, report_code, &rows);
        info!(
            "Assessment complete: corp_code={}, year={}, report={}, items={}",
            corp_code,
            business_year,
            report_code,
            assessment.risk_items.len()
        );
        Ok(assessment)
    }

    /// All (year, report) tuples with stored rows, newest first, flagging
    /// the one automatic selection would pick today.
    pub async fn available_periods(&self, corp_code: &str) -> ServiceResult<Vec<AvailablePeriod>> {
        let periods = self.statements.distinct_periods(corp_code).await?;
        if periods.is_empty() {
            info!("No stored statement periods: corp_code={}", corp_code);
            return Ok(Vec::new());
        }

        let (auto_year, auto_report) = auto_period(Utc::now().date_naive());
        let auto_year = auto_year.to_string();

        let result = periods
            .into_iter()
            .map(|p| {
                let auto_selected =
                    p.business_year == auto_year && p.report_code == auto_report.as_str();
                AvailablePeriod {
                    report_name: report_name(&p.report_code).to_string(),
                    period_description: period_description(&p.business_year, &p.report_code),
                    business_year: p.business_year,
                    report_code: p.report_code,
                    item_count: p.item_count,
                    auto_selected,
                }
            })
            .collect();
        Ok(result)
    }
}
