//! Result types for the financial risk assessment.

use serde::Serialize;

/// One evaluated rubric item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskItem {
    pub item_number: i32,
    pub description: String,
    pub is_at_risk: bool,
    pub actual_value: String,
    pub threshold: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Full twelve-item assessment for one (corp, year, report) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub partner_corp_code: String,
    pub partner_company_name: String,
    pub business_year: String,
    pub report_code: String,
    pub risk_items: Vec<RiskItem>,
}

/// One stored reporting period a caller can select manually.
#[derive(Debug, Clone, Serialize)]
pub struct AvailablePeriod {
    pub business_year: String,
    pub report_code: String,
    pub report_name: String,
    pub period_description: String,
    pub item_count: i64,
    /// True when this tuple is what automatic selection would pick today.
    pub auto_selected: bool,
}

/// Human-readable report name for a period code.
pub fn report_name(report_code: &str) -> &'static str {
    match report_code {
        "11011" => "사업보고서",
        "11012" => "반기보고서",
        "11013" => "1분기보고서",
        "11014" => "3분기보고서",
        _ => "알 수 없는 보고서",
    }
}

/// Korean period description, e.g. "2023년 연간".
pub fn period_description(business_year: &str, report_code: &str) -> String {
    match report_code {
        "11011" => format!("{}년 연간", business_year),
        "11012" => format!("{}년 상반기", business_year),
        "11013" => format!("{}년 1분기", business_year),
        "11014" => format!("{}년 3분기", business_year),
        _ => format!("{}년 {}", business_year, report_name(report_code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_cover_all_codes() {
        assert_eq!(report_name("11011"), "사업보고서");
        assert_eq!(report_name("11012"), "반기보고서");
        assert_eq!(report_name("11013"), "1분기보고서");
        assert_eq!(report_name("11014"), "3분기보고서");
        assert_eq!(report_name("99999"), "알 수 없는 보고서");
    }

    #[test]
    fn period_descriptions_are_korean_labels() {
        assert_eq!(period_description("2023", "11011"), "2023년 연간");
        assert_eq!(period_description("2024", "11012"), "2024년 상반기");
        assert_eq!(period_description("2024", "11013"), "2024년 1분기");
        assert_eq!(period_description("2023", "11014"), "2023년 3분기");
    }
}
