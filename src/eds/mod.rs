//! EDS Open API integration: typed client, wire DTOs, corp-code archive
//! handling and the shared rate limiter.

pub mod archive;
pub mod client;
pub mod rate_limit;
pub mod types;

pub use archive::{parse_corp_code_archive, sync_directory, CorpCodeEntry};
pub use client::EdsClient;
pub use rate_limit::RateLimiter;
pub use types::{
    CompanyProfileResponse, DisclosureItem, FinancialStatementItem, ReportCode, StatementDivision,
};
