//! Wire types for the EDS Open API.
//!
//! Every payload carries a `status`/`message` envelope; `"000"` means OK and
//! anything else is a business-level "no data" answer, not a transport error.
//! Field names follow the EDS wire format, renamed to the domain vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// EDS status code meaning success.
pub const STATUS_OK: &str = "000";

/// Fiscal reporting period codes accepted by the statement endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCode {
    /// 사업보고서
    Annual,
    /// 반기보고서
    HalfYear,
    /// 1분기보고서
    FirstQuarter,
    /// 3분기보고서
    ThirdQuarter,
}

impl ReportCode {
    pub const ALL: [ReportCode; 4] = [
        ReportCode::Annual,
        ReportCode::HalfYear,
        ReportCode::FirstQuarter,
        ReportCode::ThirdQuarter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCode::Annual => "11011",
            ReportCode::HalfYear => "11012",
            ReportCode::FirstQuarter => "11013",
            ReportCode::ThirdQuarter => "11014",
        }
    }

    pub fn parse(code: &str) -> Result<Self, ServiceError> {
        match code {
            "11011" => Ok(ReportCode::Annual),
            "11012" => Ok(ReportCode::HalfYear),
            "11013" => Ok(ReportCode::FirstQuarter),
            "11014" => Ok(ReportCode::ThirdQuarter),
            other => Err(ServiceError::InvalidArgument(format!(
                "unknown report code: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Separate (OFS) vs consolidated (CFS) financial statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementDivision {
    Separate,
    Consolidated,
}

impl StatementDivision {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementDivision::Separate => "OFS",
            StatementDivision::Consolidated => "CFS",
        }
    }
}

/// `company.json` payload: company profile with the status envelope inline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompanyProfileResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub corp_code: Option<String>,
    #[serde(default)]
    pub corp_name: Option<String>,
    #[serde(default)]
    pub corp_name_eng: Option<String>,
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default, rename = "ceo_nm")]
    pub ceo_name: Option<String>,
    #[serde(default, rename = "corp_cls")]
    pub corp_class: Option<String>,
    /// 법인등록번호
    #[serde(default, rename = "jurir_no")]
    pub corporate_registration_number: Option<String>,
    /// 사업자등록번호
    #[serde(default, rename = "bizr_no")]
    pub business_number: Option<String>,
    #[serde(default, rename = "adres")]
    pub address: Option<String>,
    #[serde(default, rename = "hm_url")]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub ir_url: Option<String>,
    #[serde(default, rename = "phn_no")]
    pub phone_number: Option<String>,
    #[serde(default, rename = "fax_no")]
    pub fax_number: Option<String>,
    #[serde(default, rename = "induty_code")]
    pub industry_code: Option<String>,
    /// 설립일 (YYYYMMDD)
    #[serde(default, rename = "est_dt")]
    pub establishment_date: Option<String>,
    /// 결산월 (MM)
    #[serde(default, rename = "acc_mt")]
    pub accounting_month: Option<String>,
}

impl CompanyProfileResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// `list.json` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisclosureSearchResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub page_no: Option<i64>,
    #[serde(default)]
    pub page_count: Option<i64>,
    #[serde(default)]
    pub total_count: Option<i64>,
    #[serde(default)]
    pub total_page: Option<i64>,
    #[serde(default)]
    pub list: Vec<DisclosureItem>,
}

/// One filing submission as returned by the disclosure search.
#[derive(Debug, Clone, Deserialize)]
pub struct DisclosureItem {
    pub corp_code: String,
    pub corp_name: String,
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default, rename = "corp_cls")]
    pub corp_class: Option<String>,
    #[serde(rename = "report_nm")]
    pub report_name: String,
    #[serde(rename = "rcept_no")]
    pub receipt_no: String,
    /// 제출인명
    #[serde(default, rename = "flr_nm")]
    pub submitter_name: Option<String>,
    /// YYYYMMDD
    #[serde(rename = "rcept_dt")]
    pub receipt_date: String,
    #[serde(default, rename = "rm")]
    pub remark: Option<String>,
}

/// `fnlttSinglAcntAll.json` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialStatementResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub list: Vec<FinancialStatementItem>,
}

/// One statement line. Amounts are comma-formatted signed integers as
/// strings; `"-"` denotes an absent value and is preserved verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialStatementItem {
    #[serde(default, rename = "sj_div")]
    pub statement_division: Option<String>,
    #[serde(default, rename = "sj_nm")]
    pub statement_name: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(rename = "account_nm")]
    pub account_name: String,
    #[serde(default)]
    pub thstrm_nm: Option<String>,
    #[serde(default)]
    pub thstrm_amount: Option<String>,
    #[serde(default)]
    pub thstrm_add_amount: Option<String>,
    #[serde(default)]
    pub frmtrm_nm: Option<String>,
    #[serde(default)]
    pub frmtrm_amount: Option<String>,
    #[serde(default)]
    pub frmtrm_q_nm: Option<String>,
    #[serde(default)]
    pub frmtrm_q_amount: Option<String>,
    #[serde(default)]
    pub frmtrm_add_amount: Option<String>,
    #[serde(default)]
    pub bfefrmtrm_nm: Option<String>,
    #[serde(default)]
    pub bfefrmtrm_amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_code_round_trips() {
        for code in ReportCode::ALL {
            assert_eq!(ReportCode::parse(code.as_str()).unwrap(), code);
        }
        assert!(ReportCode::parse("11015").is_err());
    }

    #[test]
    fn company_profile_parses_wire_names() {
        let raw = r#"{
            "status": "000",
            "message": "정상",
            "corp_code": "00126380",
            "corp_name": "삼성전자(주)",
            "stock_code": "005930",
            "ceo_nm": "한종희",
            "corp_cls": "Y",
            "bizr_no": "124-81-00998",
            "jurir_no": "130111-0006246",
            "adres": "경기도 수원시 영통구 삼성로 129 (매탄동)",
            "hm_url": "www.samsung.com",
            "phn_no": "031-200-1114",
            "induty_code": "264",
            "est_dt": "19690113",
            "acc_mt": "12"
        }"#;
        let profile: CompanyProfileResponse = serde_json::from_str(raw).unwrap();
        assert!(profile.is_ok());
        assert_eq!(profile.ceo_name.as_deref(), Some("한종희"));
        assert_eq!(profile.business_number.as_deref(), Some("124-81-00998"));
        assert_eq!(profile.accounting_month.as_deref(), Some("12"));
    }

    #[test]
    fn disclosure_search_with_business_error_has_empty_list() {
        let raw = r#"{"status":"013","message":"조회된 데이타가 없습니다."}"#;
        let resp: DisclosureSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status, "013");
        assert!(resp.list.is_empty());
    }

    #[test]
    fn statement_item_keeps_amount_strings_verbatim() {
        let raw = r#"{
            "status": "000",
            "message": "정상",
            "list": [{
                "sj_div": "BS",
                "account_id": "ifrs-full_Assets",
                "account_nm": "자산총계",
                "thstrm_amount": "448,424,507,000,000",
                "frmtrm_amount": "-",
                "currency": "KRW"
            }]
        }"#;
        let resp: FinancialStatementResponse = serde_json::from_str(raw).unwrap();
        let item = &resp.list[0];
        assert_eq!(item.thstrm_amount.as_deref(), Some("448,424,507,000,000"));
        assert_eq!(item.frmtrm_amount.as_deref(), Some("-"));
    }
}
