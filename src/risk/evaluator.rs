//! Twelve-item financial risk rubric.
//!
//! The evaluation is a pure function of the stored statement rows for one
//! (corp_code, business_year, report_code) tuple: identical rows produce an
//! identical assessment. Data gaps never raise - a missing account yields a
//! "데이터 부족" item with `is_at_risk=false` unless the bare numerator
//! already implies risk (items 4, 9, 11).
//!
//! All monetary math runs on [`Decimal`] with explicit half-up rounding;
//! ratios use four fractional digits during division, turnovers two, matching
//! the published rubric.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use super::types::{RiskAssessment, RiskItem};
use crate::database::FinancialStatementRow;
use crate::eds::ReportCode;

// Account vocabulary as EDS reports it. Matching is by literal account name.
const ACC_REVENUE: &str = "매출액";
const ACC_OPERATING_INCOME: &str = "영업이익";
const ACC_TRADE_RECEIVABLES: &str = "매출채권";
const ACC_TRADE_PAYABLES: &str = "매입채무";
const ACC_CASHFLOW_OPERATING: &str = "영업활동으로인한현금흐름";
const ACC_TOTAL_ASSETS: &str = "자산총계";
const ACC_TOTAL_LIABILITIES: &str = "부채총계";
const ACC_TOTAL_EQUITY: &str = "자본총계";
const ACC_PAID_IN_CAPITAL: &str = "자본금";
const ACC_SHORT_TERM_BORROWINGS: &str = "단기차입금";
const ACC_LONG_TERM_BORROWINGS: &str = "장기차입금";

const MISSING_DATA: &str = "데이터 부족";

/// Which stored amount column a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    /// thstrm_amount - current period
    ThisTerm,
    /// frmtrm_amount - prior period
    PriorTerm,
    /// thstrm_add_amount - current period, quarter-accumulated
    ThisTermAccumulated,
    /// frmtrm_add_amount - prior period, quarter-accumulated
    PriorTermAccumulated,
}

/// Automatic period selection: the most recent filing likely to be public
/// given today's month.
pub fn auto_period(today: NaiveDate) -> (i32, ReportCode) {
    let year = today.year();
    match today.month() {
        1..=3 => (year - 1, ReportCode::ThirdQuarter),
        4..=6 => (year - 1, ReportCode::Annual),
        7..=9 => (year, ReportCode::FirstQuarter),
        _ => (year, ReportCode::HalfYear),
    }
}

/// Strip separators and parse one EDS amount string. `""`, `"-"` and
/// unparseable values are absent.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    match Decimal::from_str(&trimmed.replace(',', "")) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Unparseable amount, treating as absent: value='{}', error={}", raw, e);
            None
        }
    }
}

/// First row matching the account name exactly that carries a parseable
/// value in the requested field.
pub fn find_amount(
    rows: &[FinancialStatementRow],
    account_name: &str,
    field: AmountField,
) -> Option<Decimal> {
    rows.iter()
        .filter(|row| row.account_name == account_name)
        .filter_map(|row| {
            let raw = match field {
                AmountField::ThisTerm => row.thstrm_amount.as_deref(),
                AmountField::PriorTerm => row.frmtrm_amount.as_deref(),
                AmountField::ThisTermAccumulated => row.thstrm_add_amount.as_deref(),
                AmountField::PriorTermAccumulated => row.frmtrm_add_amount.as_deref(),
            };
            raw.and_then(parse_amount)
        })
        .next()
}

/// Evaluate the full rubric over the rows of one tuple.
pub fn evaluate_rows(
    corp_code: &str,
    partner_name: &str,
    business_year: &str,
    report_code: ReportCode,
    rows: &[FinancialStatementRow],
) -> RiskAssessment {
    if rows.is_empty() {
        warn!(
            "No statement rows for assessment: corp_code={}, year={}, report={}",
            corp_code, business_year, report_code
        );
        return RiskAssessment {
            partner_corp_code: corp_code.to_string(),
            partner_company_name: partner_name.to_string(),
            business_year: business_year.to_string(),
            report_code: report_code.as_str().to_string(),
            risk_items: vec![RiskItem {
                item_number: 0,
                description: "재무 정보 조회".to_string(),
                is_at_risk: true,
                actual_value: "데이터 없음".to_string(),
                threshold: "-".to_string(),
                notes: Some(
                    "요청된 조건의 재무제표 데이터가 내부 DB에 없습니다. 데이터 동기화 중이거나 \
                     아직 제공되지 않은 정보일 수 있습니다. 잠시 후 다시 시도해주세요."
                        .to_string(),
                ),
            }],
        };
    }

    let risk_items = vec![
        check_revenue_decrease(rows),
        check_operating_income_decrease(rows),
        check_receivables_turnover(rows),
        check_receivables_to_sales_ratio(rows),
        check_payables_turnover(rows),
        check_operating_loss(rows),
        check_operating_cashflow_deficit(rows),
        check_borrowings_increase(rows),
        check_borrowings_to_assets_ratio(rows),
        check_short_term_borrowings_ratio(rows),
        check_debt_to_equity_ratio(rows),
        check_capital_impairment(rows),
    ];

    RiskAssessment {
        partner_corp_code: corp_code.to_string(),
        partner_company_name: partner_name.to_string(),
        business_year: business_year.to_string(),
        report_code: report_code.as_str().to_string(),
        risk_items,
    }
}

// ---------------------------------------------------------------------------
// Decimal helpers
// ---------------------------------------------------------------------------

/// Period-over-period change in percent: (cur - prev) / |prev| x 100 with
/// the division rounded half-up at four fractional digits. Caller guards
/// prev != 0.
fn change_percent(current: Decimal, previous: Decimal) -> Decimal {
    ((current - previous) / previous.abs())
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::from(100)
}

/// num / den x 100 with the division rounded half-up at four digits.
fn ratio_percent(numerator: Decimal, denominator: Decimal) -> Decimal {
    (numerator / denominator).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::from(100)
}

/// num / den rounded half-up at two digits (turnover counts).
fn turnover(numerator: Decimal, denominator: Decimal) -> Decimal {
    (numerator / denominator).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-point rendering with exactly `dp` fractional digits.
fn fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}

fn format_percent(value: Decimal) -> String {
    format!("{}%", fixed(value, 2))
}

/// Whole-number rendering with thousands separators, e.g. "-1,234,567".
fn format_grouped(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(0);
    let raw = rounded.to_string();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

/// Sum of optional amounts, absent parts counting as zero.
fn sum_amounts(values: &[Option<Decimal>]) -> Decimal {
    values.iter().flatten().copied().sum()
}

fn item(
    number: i32,
    description: &str,
    threshold: &str,
    is_at_risk: bool,
    actual_value: String,
    notes: Option<&str>,
) -> RiskItem {
    RiskItem {
        item_number: number,
        description: description.to_string(),
        is_at_risk,
        actual_value,
        threshold: threshold.to_string(),
        notes: notes.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// The twelve checks
// ---------------------------------------------------------------------------

// 1. 매출액 30% 이상 감소
fn check_revenue_decrease(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "매출액 30% 이상 감소";
    const THRESHOLD: &str = "<= -30%";
    let current = find_amount(rows, ACC_REVENUE, AmountField::ThisTerm);
    let previous = find_amount(rows, ACC_REVENUE, AmountField::PriorTerm);

    match (current, previous) {
        (Some(cur), Some(prev)) => {
            if prev.is_zero() {
                return item(
                    1,
                    DESC,
                    THRESHOLD,
                    false,
                    "전기 매출액 0".to_string(),
                    Some("전기 매출액이 0이므로 증감률 계산 불가"),
                );
            }
            let change = change_percent(cur, prev);
            let at_risk = change <= Decimal::from(-30);
            item(1, DESC, THRESHOLD, at_risk, format_percent(change), None)
        }
        _ => item(
            1,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("매출액(당기 또는 전기) 정보 없음"),
        ),
    }
}

// 2. 영업이익 30% 이상 감소 (전기 영업이익 > 0 인 경우에만 비교)
fn check_operating_income_decrease(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "영업이익 30% 이상 감소";
    const THRESHOLD: &str = "<= -30% (단, 전기 영업이익 > 0)";
    let current = find_amount(rows, ACC_OPERATING_INCOME, AmountField::ThisTerm);
    let previous = find_amount(rows, ACC_OPERATING_INCOME, AmountField::PriorTerm);

    match (current, previous) {
        (Some(cur), Some(prev)) => {
            if prev <= Decimal::ZERO {
                return item(
                    2,
                    DESC,
                    THRESHOLD,
                    false,
                    format!("전기 영업이익: {}", format_grouped(prev)),
                    Some("전기 영업이익이 0 이하이므로 증감률 비교 무의미"),
                );
            }
            let change = change_percent(cur, prev);
            let at_risk = change <= Decimal::from(-30);
            item(2, DESC, THRESHOLD, at_risk, format_percent(change), None)
        }
        _ => item(
            2,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("영업이익(당기 또는 전기) 정보 없음"),
        ),
    }
}

// 3. 매출채권회전율 3회 이하
fn check_receivables_turnover(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "매출채권회전율 3회 이하";
    const THRESHOLD: &str = "<= 3회";
    let revenue = find_amount(rows, ACC_REVENUE, AmountField::ThisTerm);
    let receivables = find_amount(rows, ACC_TRADE_RECEIVABLES, AmountField::ThisTerm);

    match (revenue, receivables) {
        (Some(rev), Some(rec)) => {
            if rec.is_zero() {
                return item(
                    3,
                    DESC,
                    THRESHOLD,
                    false,
                    "매출채권 0".to_string(),
                    Some("매출채권이 0이므로 회전율 계산 불가 (또는 무한대)"),
                );
            }
            let t = turnover(rev, rec);
            let at_risk = t <= Decimal::from(3);
            item(3, DESC, THRESHOLD, at_risk, format!("{}회", fixed(t, 2)), None)
        }
        _ => item(
            3,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("매출액 또는 매출채권 정보 없음"),
        ),
    }
}

// 4. 매출채권 잔액이 매출액의 50% 이상
fn check_receivables_to_sales_ratio(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "매출채권 잔액이 매출액의 50% 이상";
    const THRESHOLD: &str = ">= 50%";
    let revenue = find_amount(rows, ACC_REVENUE, AmountField::ThisTerm);
    let receivables = find_amount(rows, ACC_TRADE_RECEIVABLES, AmountField::ThisTerm);

    match (revenue, receivables) {
        (Some(rev), Some(rec)) => {
            if rev.is_zero() {
                return item(
                    4,
                    DESC,
                    THRESHOLD,
                    rec > Decimal::ZERO,
                    "매출액 0".to_string(),
                    Some("매출액이 0, 매출채권 존재시 100% 이상으로 간주"),
                );
            }
            let ratio = ratio_percent(rec, rev);
            let at_risk = ratio >= Decimal::from(50);
            item(4, DESC, THRESHOLD, at_risk, format_percent(ratio), None)
        }
        _ => item(
            4,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("매출액 또는 매출채권 정보 없음"),
        ),
    }
}

// 5. 매입채무회전율 2회 이하 - 매출원가가 제공되지 않아 매출액으로 근사
fn check_payables_turnover(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "매입채무회전율 2회 이하";
    const THRESHOLD: &str = "<= 2회";
    let revenue = find_amount(rows, ACC_REVENUE, AmountField::ThisTerm);
    let payables = find_amount(rows, ACC_TRADE_PAYABLES, AmountField::ThisTerm);

    match (revenue, payables) {
        (Some(rev), Some(pay)) => {
            if pay.is_zero() {
                return item(
                    5,
                    DESC,
                    THRESHOLD,
                    false,
                    "매입채무 0".to_string(),
                    Some("매입채무가 0이므로 회전율 계산 불가 (또는 무한대)"),
                );
            }
            let t = turnover(rev, pay);
            let at_risk = t <= Decimal::from(2);
            item(
                5,
                DESC,
                THRESHOLD,
                at_risk,
                format!("{}회 (매출액 기준)", fixed(t, 2)),
                Some("매출원가 대신 매출액 사용으로 정확도 낮음"),
            )
        }
        _ => item(
            5,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("매출액(또는 매출원가) 또는 매입채무 정보 없음"),
        ),
    }
}

// 6. 영업손실(적자) 발생
fn check_operating_loss(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "영업손실(적자) 발생";
    const THRESHOLD: &str = "< 0";
    match find_amount(rows, ACC_OPERATING_INCOME, AmountField::ThisTerm) {
        Some(income) => item(
            6,
            DESC,
            THRESHOLD,
            income < Decimal::ZERO,
            format_grouped(income),
            None,
        ),
        None => item(
            6,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("영업이익 정보 없음"),
        ),
    }
}

// 7. 영업활동 현금흐름 적자
fn check_operating_cashflow_deficit(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "영업활동 현금흐름 적자";
    const THRESHOLD: &str = "< 0";
    match find_amount(rows, ACC_CASHFLOW_OPERATING, AmountField::ThisTerm) {
        Some(cashflow) => item(
            7,
            DESC,
            THRESHOLD,
            cashflow < Decimal::ZERO,
            format_grouped(cashflow),
            None,
        ),
        None => item(
            7,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("영업활동 현금흐름 정보 없음"),
        ),
    }
}

// 8. 총차입금 30% 이상 증가 (단기 + 장기)
fn check_borrowings_increase(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "차입금 30% 이상 증가";
    const THRESHOLD: &str = ">= 30%";
    let current = sum_amounts(&[
        find_amount(rows, ACC_SHORT_TERM_BORROWINGS, AmountField::ThisTerm),
        find_amount(rows, ACC_LONG_TERM_BORROWINGS, AmountField::ThisTerm),
    ]);
    let previous = sum_amounts(&[
        find_amount(rows, ACC_SHORT_TERM_BORROWINGS, AmountField::PriorTerm),
        find_amount(rows, ACC_LONG_TERM_BORROWINGS, AmountField::PriorTerm),
    ]);

    if current >= Decimal::ZERO && previous >= Decimal::ZERO {
        if previous.is_zero() {
            return item(
                8,
                DESC,
                THRESHOLD,
                current > Decimal::ZERO,
                format!("당기: {}", format_grouped(current)),
                Some("전기 총차입금 0"),
            );
        }
        let change = change_percent(current, previous);
        let at_risk = change >= Decimal::from(30);
        item(8, DESC, THRESHOLD, at_risk, format_percent(change), None)
    } else {
        item(
            8,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("차입금(당기 또는 전기) 정보 부족"),
        )
    }
}

// 9. 총차입금이 자산총계의 50% 이상
fn check_borrowings_to_assets_ratio(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "차입금이 자산의 50% 이상";
    const THRESHOLD: &str = ">= 50%";
    let borrowings = sum_amounts(&[
        find_amount(rows, ACC_SHORT_TERM_BORROWINGS, AmountField::ThisTerm),
        find_amount(rows, ACC_LONG_TERM_BORROWINGS, AmountField::ThisTerm),
    ]);
    let assets = find_amount(rows, ACC_TOTAL_ASSETS, AmountField::ThisTerm);

    match assets {
        Some(total) if borrowings >= Decimal::ZERO => {
            if total.is_zero() {
                return item(
                    9,
                    DESC,
                    THRESHOLD,
                    borrowings > Decimal::ZERO,
                    "자산총계 0".to_string(),
                    Some("자산총계가 0, 차입금 존재시 100% 이상으로 간주"),
                );
            }
            let ratio = ratio_percent(borrowings, total);
            let at_risk = ratio >= Decimal::from(50);
            item(9, DESC, THRESHOLD, at_risk, format_percent(ratio), None)
        }
        _ => item(
            9,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("총차입금 또는 자산총계 정보 없음"),
        ),
    }
}

// 10. 단기차입금이 전체차입금의 90% 이상
fn check_short_term_borrowings_ratio(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "단기차입금이 전체차입금의 90% 이상";
    const THRESHOLD: &str = ">= 90%";
    let short_term = find_amount(rows, ACC_SHORT_TERM_BORROWINGS, AmountField::ThisTerm);
    let total = sum_amounts(&[
        short_term,
        find_amount(rows, ACC_LONG_TERM_BORROWINGS, AmountField::ThisTerm),
    ]);

    match short_term {
        Some(short) if total > Decimal::ZERO => {
            let ratio = ratio_percent(short, total);
            let at_risk = ratio >= Decimal::from(90);
            item(10, DESC, THRESHOLD, at_risk, format_percent(ratio), None)
        }
        Some(_) => item(
            10,
            DESC,
            THRESHOLD,
            false,
            "총차입금 0".to_string(),
            Some("단기차입금 존재하나 총차입금 0"),
        ),
        None => item(
            10,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("단기차입금 또는 총차입금 정보 없음"),
        ),
    }
}

// 11. 부채비율 200% 이상 - 자본잠식(자본총계 음수)은 그 자체로 위험
fn check_debt_to_equity_ratio(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "부채비율 200% 이상";
    const THRESHOLD: &str = ">= 200%";
    let liabilities = find_amount(rows, ACC_TOTAL_LIABILITIES, AmountField::ThisTerm);
    let equity = find_amount(rows, ACC_TOTAL_EQUITY, AmountField::ThisTerm);

    match (liabilities, equity) {
        (Some(debt), Some(eq)) => {
            if eq.is_zero() {
                return item(
                    11,
                    DESC,
                    THRESHOLD,
                    debt > Decimal::ZERO,
                    "자본총계 0".to_string(),
                    Some("자본총계 0, 부채 존재 시 무한대로 간주"),
                );
            }
            if eq < Decimal::ZERO {
                return item(
                    11,
                    DESC,
                    THRESHOLD,
                    true,
                    format!("자본잠식 {}", format_grouped(eq)),
                    Some("자본총계가 음수(자본잠식)"),
                );
            }
            let ratio = ratio_percent(debt, eq);
            let at_risk = ratio >= Decimal::from(200);
            item(11, DESC, THRESHOLD, at_risk, format_percent(ratio), None)
        }
        _ => item(
            11,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("부채총계 또는 자본총계 정보 없음"),
        ),
    }
}

// 12. 납입자본금 잠식
fn check_capital_impairment(rows: &[FinancialStatementRow]) -> RiskItem {
    const DESC: &str = "납입자본금 잠식";
    const THRESHOLD: &str = "자본총계 < 자본금";
    let equity = find_amount(rows, ACC_TOTAL_EQUITY, AmountField::ThisTerm);
    let capital = find_amount(rows, ACC_PAID_IN_CAPITAL, AmountField::ThisTerm);

    match (equity, capital) {
        (Some(eq), Some(cap)) => item(
            12,
            DESC,
            THRESHOLD,
            eq < cap,
            format!(
                "자본총계: {}, 자본금: {}",
                format_grouped(eq),
                format_grouped(cap)
            ),
            None,
        ),
        _ => item(
            12,
            DESC,
            THRESHOLD,
            false,
            MISSING_DATA.to_string(),
            Some("자본총계 또는 자본금 정보 없음"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(account_name: &str, thstrm: Option<&str>, frmtrm: Option<&str>) -> FinancialStatementRow {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        FinancialStatementRow {
            id: 0,
            corp_code: "00126380".to_string(),
            business_year: "2023".to_string(),
            report_code: "11011".to_string(),
            statement_division: Some("BS".to_string()),
            account_id: Some(format!("acct-{}", account_name)),
            account_name: account_name.to_string(),
            thstrm_nm: None,
            thstrm_amount: thstrm.map(str::to_string),
            thstrm_add_amount: None,
            frmtrm_nm: None,
            frmtrm_amount: frmtrm.map(str::to_string),
            frmtrm_q_nm: None,
            frmtrm_q_amount: None,
            frmtrm_add_amount: None,
            bfefrmtrm_nm: None,
            bfefrmtrm_amount: None,
            currency: Some("KRW".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn assess(rows: &[FinancialStatementRow]) -> RiskAssessment {
        evaluate_rows("00126380", "삼성전자(주)", "2023", ReportCode::Annual, rows)
    }

    fn item_no(assessment: &RiskAssessment, number: i32) -> &RiskItem {
        assessment
            .risk_items
            .iter()
            .find(|i| i.item_number == number)
            .unwrap()
    }

    #[test]
    fn amount_parsing_handles_eds_conventions() {
        assert_eq!(parse_amount("1,000,000,000"), Some(Decimal::from(1_000_000_000)));
        assert_eq!(parse_amount("-2,500"), Some(Decimal::from(-2_500)));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("  "), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn lookup_takes_first_row_with_a_present_value() {
        let rows = vec![
            row(ACC_REVENUE, Some("-"), Some("100")),
            row(ACC_REVENUE, Some("42"), None),
        ];
        assert_eq!(
            find_amount(&rows, ACC_REVENUE, AmountField::ThisTerm),
            Some(Decimal::from(42))
        );
        assert_eq!(
            find_amount(&rows, ACC_REVENUE, AmountField::PriorTerm),
            Some(Decimal::from(100))
        );
    }

    #[test]
    fn revenue_halved_is_at_risk_with_exact_formatting() {
        let rows = vec![row(ACC_REVENUE, Some("1,000,000,000"), Some("2,000,000,000"))];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 1);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "-50.00%");
    }

    #[test]
    fn revenue_mild_decline_is_not_at_risk() {
        let rows = vec![row(ACC_REVENUE, Some("900"), Some("1,000"))];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 1);
        assert!(!result.is_at_risk);
        assert_eq!(result.actual_value, "-10.00%");
    }

    #[test]
    fn revenue_prior_zero_is_not_computable() {
        let rows = vec![row(ACC_REVENUE, Some("500"), Some("0"))];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 1);
        assert!(!result.is_at_risk);
        assert_eq!(result.actual_value, "전기 매출액 0");
        assert_eq!(
            result.notes.as_deref(),
            Some("전기 매출액이 0이므로 증감률 계산 불가")
        );
    }

    #[test]
    fn operating_income_decline_only_counts_from_positive_base() {
        let rows = vec![row(ACC_OPERATING_INCOME, Some("100"), Some("-500"))];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 2);
        assert!(!result.is_at_risk);
        assert_eq!(result.actual_value, "전기 영업이익: -500");

        let rows = vec![row(ACC_OPERATING_INCOME, Some("600"), Some("1,000"))];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 2);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "-40.00%");
    }

    #[test]
    fn receivables_turnover_at_or_below_three_is_risky() {
        let rows = vec![
            row(ACC_REVENUE, Some("1,000"), None),
            row(ACC_TRADE_RECEIVABLES, Some("400"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 3);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "2.50회");
    }

    #[test]
    fn receivables_ratio_flags_heavy_balances() {
        let rows = vec![
            row(ACC_REVENUE, Some("1,000"), None),
            row(ACC_TRADE_RECEIVABLES, Some("600"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 4);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "60.00%");
    }

    #[test]
    fn receivables_with_zero_revenue_are_risky_on_their_own() {
        let rows = vec![
            row(ACC_REVENUE, Some("0"), None),
            row(ACC_TRADE_RECEIVABLES, Some("10"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 4);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "매출액 0");
    }

    #[test]
    fn payables_turnover_carries_the_approximation_note() {
        let rows = vec![
            row(ACC_REVENUE, Some("1,000"), None),
            row(ACC_TRADE_PAYABLES, Some("600"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 5);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "1.67회 (매출액 기준)");
        assert_eq!(
            result.notes.as_deref(),
            Some("매출원가 대신 매출액 사용으로 정확도 낮음")
        );
    }

    #[test]
    fn operating_loss_and_cashflow_deficit_flag_negatives() {
        let rows = vec![
            row(ACC_OPERATING_INCOME, Some("-1,234,567"), None),
            row(ACC_CASHFLOW_OPERATING, Some("-42"), None),
        ];
        let assessment = assess(&rows);
        let loss = item_no(&assessment, 6);
        assert!(loss.is_at_risk);
        assert_eq!(loss.actual_value, "-1,234,567");
        let cash = item_no(&assessment, 7);
        assert!(cash.is_at_risk);
        assert_eq!(cash.actual_value, "-42");
    }

    #[test]
    fn borrowings_doubling_is_at_risk() {
        let rows = vec![
            row(ACC_SHORT_TERM_BORROWINGS, Some("150"), Some("50")),
            row(ACC_LONG_TERM_BORROWINGS, Some("50"), Some("50")),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 8);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "100.00%");
    }

    #[test]
    fn borrowings_from_zero_base_are_risky_when_present() {
        let rows = vec![row(ACC_SHORT_TERM_BORROWINGS, Some("200"), Some("0"))];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 8);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "당기: 200");
        assert_eq!(result.notes.as_deref(), Some("전기 총차입금 0"));
    }

    #[test]
    fn borrowings_to_assets_flags_half_of_balance_sheet() {
        let rows = vec![
            row(ACC_SHORT_TERM_BORROWINGS, Some("300"), None),
            row(ACC_LONG_TERM_BORROWINGS, Some("300"), None),
            row(ACC_TOTAL_ASSETS, Some("1,000"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 9);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "60.00%");
    }

    #[test]
    fn short_term_share_of_borrowings() {
        let rows = vec![
            row(ACC_SHORT_TERM_BORROWINGS, Some("95"), None),
            row(ACC_LONG_TERM_BORROWINGS, Some("5"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 10);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "95.00%");
    }

    #[test]
    fn debt_to_equity_over_two_hundred_percent() {
        let rows = vec![
            row(ACC_TOTAL_LIABILITIES, Some("400"), None),
            row(ACC_TOTAL_EQUITY, Some("100"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 11);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "400.00%");
    }

    #[test]
    fn negative_equity_is_capital_impairment_risk() {
        let rows = vec![
            row(ACC_TOTAL_LIABILITIES, Some("500"), None),
            row(ACC_TOTAL_EQUITY, Some("-100"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 11);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "자본잠식 -100");
        assert_eq!(result.notes.as_deref(), Some("자본총계가 음수(자본잠식)"));
    }

    #[test]
    fn equity_below_paid_in_capital_is_impaired() {
        let rows = vec![
            row(ACC_TOTAL_EQUITY, Some("50"), None),
            row(ACC_PAID_IN_CAPITAL, Some("100"), None),
        ];
        let assessment = assess(&rows);
        let result = item_no(&assessment, 12);
        assert!(result.is_at_risk);
        assert_eq!(result.actual_value, "자본총계: 50, 자본금: 100");
    }

    #[test]
    fn missing_accounts_yield_data_gap_items_not_errors() {
        let rows = vec![row("기타포괄손익", Some("1"), None)];
        let assessment = assess(&rows);
        assert_eq!(assessment.risk_items.len(), 12);
        for result in &assessment.risk_items {
            assert!(!result.is_at_risk, "item {} should not flag", result.item_number);
            assert!(result.notes.is_some());
            if result.item_number == 8 {
                // Absent borrowings sum to zero, so the change check reports
                // a zero prior base instead of a data gap.
                assert_eq!(result.actual_value, "당기: 0");
            } else {
                assert_eq!(result.actual_value, "데이터 부족");
            }
        }
    }

    #[test]
    fn empty_rows_yield_the_single_synthetic_item() {
        let assessment = assess(&[]);
        assert_eq!(assessment.risk_items.len(), 1);
        let synthetic = &assessment.risk_items[0];
        assert_eq!(synthetic.item_number, 0);
        assert_eq!(synthetic.description, "재무 정보 조회");
        assert!(synthetic.is_at_risk);
        assert_eq!(synthetic.actual_value, "데이터 없음");
        assert!(synthetic.notes.as_deref().unwrap().contains("동기화"));
    }

    #[test]
    fn evaluation_is_a_pure_function_of_the_rows() {
        let rows = vec![
            row(ACC_REVENUE, Some("1,000,000"), Some("2,000,000")),
            row(ACC_TOTAL_LIABILITIES, Some("500"), None),
            row(ACC_TOTAL_EQUITY, Some("-100"), None),
        ];
        assert_eq!(assess(&rows), assess(&rows));
    }

    #[test]
    fn automatic_period_follows_the_filing_calendar() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(auto_period(date(2025, 2, 15)), (2024, ReportCode::ThirdQuarter));
        assert_eq!(auto_period(date(2025, 5, 1)), (2024, ReportCode::Annual));
        assert_eq!(auto_period(date(2025, 8, 2)), (2025, ReportCode::FirstQuarter));
        assert_eq!(auto_period(date(2025, 11, 30)), (2025, ReportCode::HalfYear));
    }

    #[test]
    fn grouped_formatting_inserts_thousands_separators() {
        assert_eq!(format_grouped(Decimal::from(-1_234_567)), "-1,234,567");
        assert_eq!(format_grouped(Decimal::from(0)), "0");
        assert_eq!(format_grouped(Decimal::from(999)), "999");
        assert_eq!(format_grouped(Decimal::from(1_000)), "1,000");
    }
}
