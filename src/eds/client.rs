//! Rate-limited HTTP client for the EDS Open API.
//!
//! Four endpoints are consumed: the corp-code archive dump, the company
//! profile, the disclosure search and the single-company full financial
//! statement. Profile lookups degrade to `None` on any failure so ingestion
//! can fall back to the corp-code directory; archive/disclosure/statement
//! transport failures surface as [`ServiceError::ExternalSource`].
//!
//! The API key never appears in logs; see [`EdsConfig::masked_api_key`].

use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::rate_limit::RateLimiter;
use super::types::{
    CompanyProfileResponse, DisclosureItem, DisclosureSearchResponse, FinancialStatementItem,
    FinancialStatementResponse, ReportCode, StatementDivision, STATUS_OK,
};
use crate::config::EdsConfig;
use crate::error::{ServiceError, ServiceResult};

/// Sentinel corp code answered with a full fixture in mock mode.
const MOCK_FULL_PROFILE_CORP_CODE: &str = "00126380";

pub struct EdsClient {
    client: Client,
    config: EdsConfig,
    limiter: Arc<RateLimiter>,
}

impl EdsClient {
    pub fn new(config: EdsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            "EDS client ready - base_url: {}, timeout: {:?}, rate: {}/s, api key: {}",
            config.base_url,
            config.timeout,
            config.rate_per_sec,
            config.masked_api_key()
        );
        if config.mock_mode() {
            warn!("No real EDS API key configured; company profile lookups answer with offline fixtures");
        }

        let limiter = Arc::new(RateLimiter::new(config.rate_per_sec));
        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    /// Download the corp-code ZIP archive.
    pub async fn fetch_corp_code_archive(&self) -> ServiceResult<Bytes> {
        self.limiter.acquire().await;
        info!("Downloading corp-code archive from EDS");

        let url = format!("{}/api/corpCode.xml", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("crtfc_key", self.config.api_key.trim())])
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalSource(format!("corp-code archive request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalSource(format!(
                "corp-code archive download answered {}",
                status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            ServiceError::ExternalSource(format!("corp-code archive body read failed: {}", e))
        })?;
        debug!("Corp-code archive downloaded: {} bytes", body.len());
        Ok(body)
    }

    /// Fetch a company profile. Every failure mode - transport, non-2xx,
    /// unparseable body, business status other than "000" - downgrades to
    /// `None` so the caller can fall back to the corp-code directory.
    pub async fn get_company_profile(
        &self,
        corp_code: &str,
    ) -> ServiceResult<Option<CompanyProfileResponse>> {
        if corp_code.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "corp_code must not be blank".to_string(),
            ));
        }

        if self.config.mock_mode() {
            warn!(
                "EDS mock mode: answering company profile from fixture: corp_code={}",
                corp_code
            );
            return Ok(Some(mock_company_profile(corp_code)));
        }

        self.limiter.acquire().await;
        info!("Fetching company profile: corp_code={}", corp_code);

        let url = format!("{}/api/company.json", self.config.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", self.config.api_key.trim()),
                ("corp_code", corp_code),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Company profile request failed, treating as absent: corp_code={}, error={}",
                    corp_code, e
                );
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Company profile endpoint answered {}, treating as absent: corp_code={}",
                status, corp_code
            );
            return Ok(None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "Company profile body read failed, treating as absent: corp_code={}, error={}",
                    corp_code, e
                );
                return Ok(None);
            }
        };

        let profile: CompanyProfileResponse = match serde_json::from_str(&body) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    "Company profile payload unparseable, treating as absent: corp_code={}, error={}",
                    corp_code, e
                );
                return Ok(None);
            }
        };

        if !profile.is_ok() {
            warn!(
                "Company profile business error: corp_code={}, status={}, message={}",
                corp_code,
                profile.status,
                profile.message.as_deref().unwrap_or("-")
            );
            return Ok(None);
        }

        Ok(Some(profile))
    }

    /// Search disclosures for one company over a date range (YYYYMMDD),
    /// page size 100. A business status other than "000" is an empty result.
    pub async fn search_disclosures(
        &self,
        corp_code: &str,
        begin_date: &str,
        end_date: &str,
    ) -> ServiceResult<Vec<DisclosureItem>> {
        self.limiter.acquire().await;
        info!(
            "Searching disclosures: corp_code={}, range={} ~ {}",
            corp_code, begin_date, end_date
        );

        let url = format!("{}/api/list.json", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", self.config.api_key.trim()),
                ("corp_code", corp_code),
                ("bgn_de", begin_date),
                ("end_de", end_date),
                ("page_count", "100"),
            ])
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalSource(format!("disclosure search request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalSource(format!(
                "disclosure search answered {} for corp_code={}",
                status, corp_code
            )));
        }

        let parsed: DisclosureSearchResponse = response.json().await.map_err(|e| {
            ServiceError::TransientParsing(format!("disclosure search payload unparseable: {}", e))
        })?;

        if parsed.status != STATUS_OK {
            info!(
                "Disclosure search returned no data: corp_code={}, status={}, message={}",
                corp_code,
                parsed.status,
                parsed.message.as_deref().unwrap_or("-")
            );
            return Ok(Vec::new());
        }

        debug!(
            "Disclosure search hit {} items for corp_code={}",
            parsed.list.len(),
            corp_code
        );
        Ok(parsed.list)
    }

    /// Fetch the full single-company statement for one (year, report,
    /// division) tuple. A business status other than "000" yields an empty
    /// list with the reason logged.
    pub async fn get_financial_statement(
        &self,
        corp_code: &str,
        business_year: &str,
        report_code: ReportCode,
        division: StatementDivision,
    ) -> ServiceResult<Vec<FinancialStatementItem>> {
        self.limiter.acquire().await;
        info!(
            "Fetching financial statement: corp_code={}, year={}, report={}, division={}",
            corp_code,
            business_year,
            report_code,
            division.as_str()
        );

        let url = format!("{}/api/fnlttSinglAcntAll.json", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", self.config.api_key.trim()),
                ("corp_code", corp_code),
                ("bsns_year", business_year),
                ("reprt_code", report_code.as_str()),
                ("fs_div", division.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalSource(format!("statement request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalSource(format!(
                "statement fetch answered {} for corp_code={}, year={}, report={}",
                status, corp_code, business_year, report_code
            )));
        }

        let parsed: FinancialStatementResponse = response.json().await.map_err(|e| {
            ServiceError::TransientParsing(format!("statement payload unparseable: {}", e))
        })?;

        if parsed.status != STATUS_OK {
            info!(
                "Statement fetch returned no data: corp_code={}, year={}, report={}, status={}, message={}",
                corp_code,
                business_year,
                report_code,
                parsed.status,
                parsed.message.as_deref().unwrap_or("-")
            );
            return Ok(Vec::new());
        }

        Ok(parsed.list)
    }
}

/// Deterministic offline fixture for development without an API key.
fn mock_company_profile(corp_code: &str) -> CompanyProfileResponse {
    if corp_code == MOCK_FULL_PROFILE_CORP_CODE {
        CompanyProfileResponse {
            status: STATUS_OK.to_string(),
            corp_code: Some(MOCK_FULL_PROFILE_CORP_CODE.to_string()),
            corp_name: Some("삼성전자(주)".to_string()),
            corp_name_eng: Some("SAMSUNG ELECTRONICS CO,.LTD".to_string()),
            stock_code: Some("005930".to_string()),
            stock_name: Some("삼성전자".to_string()),
            ceo_name: Some("한종희".to_string()),
            corp_class: Some("Y".to_string()),
            business_number: Some("124-81-00998".to_string()),
            corporate_registration_number: Some("130111-0006246".to_string()),
            address: Some("경기도 수원시 영통구 삼성로 129 (매탄동)".to_string()),
            homepage_url: Some("www.samsung.com".to_string()),
            phone_number: Some("031-200-1114".to_string()),
            industry_code: Some("26410".to_string()),
            establishment_date: Some("19690113".to_string()),
            accounting_month: Some("12".to_string()),
            ..CompanyProfileResponse::default()
        }
    } else {
        CompanyProfileResponse {
            status: STATUS_OK.to_string(),
            corp_code: Some(corp_code.to_string()),
            corp_name: Some("테스트 회사명".to_string()),
            stock_name: Some("테스트 종목명".to_string()),
            industry_code: Some("12345".to_string()),
            ..CompanyProfileResponse::default()
        }
    }
}
