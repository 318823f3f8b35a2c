//! Event payloads carried on the partner topics.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Action carried by a partner event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerEventAction {
    PartnerCompanyRegistered,
    PartnerCompanyUpdated,
    PartnerCompanyRestored,
}

/// Message on the partner-company topic. The producer keys the record by
/// `corp_code` so all events for one company land in one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerEvent {
    #[serde(default)]
    pub corp_code: Option<String>,
    pub action: PartnerEventAction,
    #[serde(default)]
    pub partner_company_id: Option<String>,
    #[serde(default)]
    pub headquarters_id: Option<i64>,
    /// ISO-8601 event time.
    pub timestamp: String,
}

impl PartnerEvent {
    pub fn registered(corp_code: &str) -> Self {
        Self {
            corp_code: Some(corp_code.to_string()),
            action: PartnerEventAction::PartnerCompanyRegistered,
            partner_company_id: None,
            headquarters_id: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn updated(corp_code: &str) -> Self {
        Self {
            corp_code: Some(corp_code.to_string()),
            action: PartnerEventAction::PartnerCompanyUpdated,
            partner_company_id: None,
            headquarters_id: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
