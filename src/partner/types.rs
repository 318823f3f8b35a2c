//! Partner-registry domain types.
//!
//! A partner registration is owned by either a headquarters account or a
//! partner-user account. In memory the owner is the tagged [`Owner`] variant;
//! the two nullable id columns only exist at the storage boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{CompanyProfileRow, PartnerCompanyRow};

pub const USER_TYPE_HEADQUARTERS: &str = "HEADQUARTERS";
pub const USER_TYPE_PARTNER: &str = "PARTNER";
pub const USER_TYPE_UNKNOWN: &str = "UNKNOWN";

/// Owner scope under which partner bookkeeping and name-uniqueness are
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Headquarters(i64),
    Partner(i64),
}

impl Owner {
    /// Resolve the acting owner from the gateway identity headers: the
    /// presence of a partner-user id switches ownership to the partner.
    pub fn from_headers(headquarters_id: i64, partner_id: Option<i64>) -> Self {
        match partner_id {
            Some(id) => Owner::Partner(id),
            None => Owner::Headquarters(headquarters_id),
        }
    }

    pub fn user_type(&self) -> &'static str {
        match self {
            Owner::Headquarters(_) => USER_TYPE_HEADQUARTERS,
            Owner::Partner(_) => USER_TYPE_PARTNER,
        }
    }

    pub fn headquarters_id(&self) -> Option<i64> {
        match self {
            Owner::Headquarters(id) => Some(*id),
            Owner::Partner(_) => None,
        }
    }

    pub fn partner_id(&self) -> Option<i64> {
        match self {
            Owner::Headquarters(_) => None,
            Owner::Partner(id) => Some(*id),
        }
    }
}

/// Partner registration lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartnerStatus {
    Active,
    Inactive,
}

impl PartnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerStatus::Active => "ACTIVE",
            PartnerStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(PartnerStatus::Active),
            "INACTIVE" => Some(PartnerStatus::Inactive),
            _ => None,
        }
    }
}

/// Input for registering a partner company. The company details come from
/// the linked profile, never from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePartnerCompany {
    pub corp_code: String,
    pub contract_start_date: NaiveDate,
}

/// Input for updating a registration. Only these three fields may change;
/// owner identity is fixed at registration time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePartnerCompany {
    pub corp_code: Option<String>,
    pub contract_start_date: Option<NaiveDate>,
    pub status: Option<PartnerStatus>,
}

/// Partner registration with the linked profile denormalized, as handed to
/// the API layer and published on the restore topic.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerCompanyRecord {
    pub id: Uuid,
    pub corp_code: String,
    pub status: PartnerStatus,
    pub contract_start_date: Option<NaiveDate>,
    pub account_created: bool,
    pub headquarters_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when a soft-deleted registration was revived by this call.
    pub restored: bool,

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
    pub company_profile_updated_at: Option<DateTime<Utc>>,
}

impl PartnerCompanyRecord {
    pub fn from_rows(
        partner: &PartnerCompanyRow,
        profile: Option<&CompanyProfileRow>,
        restored: bool,
    ) -> Self {
        Self {
            id: partner.id,
            corp_code: partner.corp_code.clone(),
            status: PartnerStatus::parse(&partner.status).unwrap_or(PartnerStatus::Inactive),
            contract_start_date: partner.contract_start_date,
            account_created: partner.account_created,
            headquarters_id: partner.headquarters_id,
            partner_id: partner.partner_id,
            user_type: partner.user_type.clone(),
            created_at: partner.created_at,
            updated_at: partner.updated_at,
            restored,
            corp_name: profile
                .map(|p| p.corp_name.clone())
                .unwrap_or_else(|| "정보 없음".to_string()),
            corp_name_eng: profile.and_then(|p| p.corp_name_eng.clone()),
            stock_code: profile.and_then(|p| p.stock_code.clone()),
            stock_name: profile.and_then(|p| p.stock_name.clone()),
            ceo_name: profile.and_then(|p| p.ceo_name.clone()),
            corp_class: profile.and_then(|p| p.corp_class.clone()),
            business_number: profile.and_then(|p| p.business_number.clone()),
            corporate_registration_number: profile
                .and_then(|p| p.corporate_registration_number.clone()),
            address: profile.and_then(|p| p.address.clone()),
            homepage_url: profile.and_then(|p| p.homepage_url.clone()),
            ir_url: profile.and_then(|p| p.ir_url.clone()),
            phone_number: profile.and_then(|p| p.phone_number.clone()),
            fax_number: profile.and_then(|p| p.fax_number.clone()),
            industry_code: profile.and_then(|p| p.industry_code.clone()),
            establishment_date: profile.and_then(|p| p.establishment_date.clone()),
            accounting_month: profile.and_then(|p| p.accounting_month.clone()),
            company_profile_updated_at: profile.map(|p| p.updated_at),
        }
    }
}

/// Paginated partner listing.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerCompanyPage {
    pub data: Vec<PartnerCompanyRecord>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Result of the duplicate-name check.
#[derive(Debug, Clone, Serialize)]
pub struct NameDuplicateCheck {
    pub is_duplicate: bool,
    pub message: String,
    pub existing_company_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partner_header_switches_owner_kind() {
        assert_eq!(Owner::from_headers(7, None), Owner::Headquarters(7));
        assert_eq!(Owner::from_headers(7, Some(42)), Owner::Partner(42));
    }

    #[test]
    fn exactly_one_owner_column_is_populated() {
        let hq = Owner::Headquarters(7);
        assert_eq!(hq.headquarters_id(), Some(7));
        assert_eq!(hq.partner_id(), None);
        assert_eq!(hq.user_type(), USER_TYPE_HEADQUARTERS);

        let partner = Owner::Partner(42);
        assert_eq!(partner.headquarters_id(), None);
        assert_eq!(partner.partner_id(), Some(42));
        assert_eq!(partner.user_type(), USER_TYPE_PARTNER);
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        assert_eq!(PartnerStatus::parse("ACTIVE"), Some(PartnerStatus::Active));
        assert_eq!(
            PartnerStatus::parse(PartnerStatus::Inactive.as_str()),
            Some(PartnerStatus::Inactive)
        );
        assert_eq!(PartnerStatus::parse("DELETED"), None);
    }
}
