//! Owner-scoped partner bookkeeping.
//!
//! Registration is the central transactional operation: it guarantees an
//! owner-scoped company profile exists, short-circuits on an ACTIVE
//! duplicate name, revives an INACTIVE registration with the same name, and
//! only then creates a fresh row. Every successful registration path
//! publishes a partner event keyed by corp_code; publish failures are logged
//! and never abort the caller.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bus::{EventPublisher, PartnerEvent};
use crate::config::BusConfig;
use crate::database::{
    CompanyProfileRepository, CompanyProfileRow, CorpCodeRepository, NewCompanyProfile,
    PartnerCompanyRepository, PartnerCompanyRow,
};
use crate::error::{ServiceError, ServiceResult};
use crate::partner::types::{
    CreatePartnerCompany, NameDuplicateCheck, Owner, PartnerCompanyPage, PartnerCompanyRecord,
    PartnerStatus, UpdatePartnerCompany,
};

pub struct PartnerRegistry {
    partners: PartnerCompanyRepository,
    profiles: CompanyProfileRepository,
    directory: CorpCodeRepository,
    publisher: Arc<dyn EventPublisher>,
    bus_config: BusConfig,
}

impl PartnerRegistry {
    pub fn new(
        partners: PartnerCompanyRepository,
        profiles: CompanyProfileRepository,
        directory: CorpCodeRepository,
        publisher: Arc<dyn EventPublisher>,
        bus_config: BusConfig,
    ) -> Self {
        Self {
            partners,
            profiles,
            directory,
            publisher,
            bus_config,
        }
    }

    /// Register a partner company for the acting owner.
    pub async fn create_partner_company(
        &self,
        create: CreatePartnerCompany,
        headquarters_id: i64,
        partner_id: Option<i64>,
    ) -> ServiceResult<PartnerCompanyRecord> {
        let corp_code = create.corp_code.trim().to_string();
        if corp_code.len() != 8 {
            return Err(ServiceError::InvalidArgument(
                "corp_code must be exactly 8 characters".to_string(),
            ));
        }

        let owner = Owner::from_headers(headquarters_id, partner_id);
        info!(
            "Partner registration requested: corp_code={}, owner={:?}",
            corp_code, owner
        );

        let profile = self.ensure_company_profile(owner, &corp_code).await?;

        // An ACTIVE registration with the same display name in this owner
        // scope already covers the request.
        if let Some(existing) = self
            .partners
            .find_by_owner_and_name_and_status(owner, &profile.corp_name, PartnerStatus::Active)
            .await?
        {
            info!(
                "Partner already registered in this scope, returning existing: name={}, id={}",
                profile.corp_name, existing.id
            );
            return Ok(PartnerCompanyRecord::from_rows(&existing, Some(&profile), false));
        }

        // A soft-deleted registration with the same name is revived instead
        // of allocating a new id.
        if let Some(mut inactive) = self
            .partners
            .find_by_owner_and_name_and_status(owner, &profile.corp_name, PartnerStatus::Inactive)
            .await?
        {
            info!(
                "Inactive partner found, restoring: name={}, id={}",
                profile.corp_name, inactive.id
            );
            inactive.company_profile_id = Some(profile.id);
            inactive.corp_code = corp_code.clone();
            inactive.contract_start_date = Some(create.contract_start_date);
            inactive.status = PartnerStatus::Active.as_str().to_string();
            inactive.headquarters_id = owner.headquarters_id();
            inactive.partner_id = owner.partner_id();
            inactive.user_type = owner.user_type().to_string();
            self.partners.update(&inactive).await?;

            self.publish_partner_event(PartnerEvent::registered(&corp_code))
                .await;

            let record = PartnerCompanyRecord::from_rows(&inactive, Some(&profile), true);
            self.publish_restore_notification(&record).await;
            info!("Partner restored: id={}", inactive.id);
            return Ok(record);
        }

        let row = PartnerCompanyRow {
            id: Uuid::new_v4(),
            corp_code: corp_code.clone(),
            company_profile_id: Some(profile.id),
            headquarters_id: owner.headquarters_id(),
            partner_id: owner.partner_id(),
            user_type: owner.user_type().to_string(),
            contract_start_date: Some(create.contract_start_date),
            status: PartnerStatus::Active.as_str().to_string(),
            account_created: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        ServiceError::invariant(
            row.headquarters_id.is_some() != row.partner_id.is_some(),
            "exactly one owner id must be set on a partner registration",
        )?;
        self.partners.insert(&row).await?;

        self.publish_partner_event(PartnerEvent::registered(&corp_code))
            .await;

        info!(
            "Partner registered: id={}, name={}",
            row.id, profile.corp_name
        );
        Ok(PartnerCompanyRecord::from_rows(&row, Some(&profile), false))
    }

    /// Fetch the owner-scoped profile for a corp code, synthesizing it from
    /// the corp-code directory on first reference.
    async fn ensure_company_profile(
        &self,
        owner: Owner,
        corp_code: &str,
    ) -> ServiceResult<CompanyProfileRow> {
        if let Some(profile) = self
            .profiles
            .find_by_owner_and_corp_code(owner, corp_code)
            .await?
        {
            return Ok(profile);
        }

        info!(
            "No owner-scoped profile yet, synthesizing from directory: corp_code={}",
            corp_code
        );
        let entry = self
            .directory
            .find_by_corp_code(corp_code)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "corp code {} is not in the EDS directory",
                    corp_code
                ))
            })?;

        let new = NewCompanyProfile {
            corp_code: corp_code.to_string(),
            headquarters_id: owner.headquarters_id(),
            partner_id: owner.partner_id(),
            user_type: owner.user_type().to_string(),
            corp_name: entry.corp_name.clone(),
            corp_name_eng: entry.corp_name_eng.clone(),
            stock_code: entry.stock_code.clone(),
            // Listed companies reuse the corporate name as the listing name.
            stock_name: entry.stock_code.as_ref().map(|_| entry.corp_name.clone()),
            ..NewCompanyProfile::default()
        };
        let profile = self.profiles.insert(&new).await?;

        // Let the ingestion pipeline enrich the synthesized profile.
        self.publish_partner_event(PartnerEvent::registered(corp_code))
            .await;

        Ok(profile)
    }

    /// Update a registration. Only corp_code, contract start date and status
    /// may change; a corp_code change requires the target profile to exist.
    pub async fn update_partner_company(
        &self,
        id: Uuid,
        update: UpdatePartnerCompany,
    ) -> ServiceResult<PartnerCompanyRecord> {
        let mut row = self.require_partner(id).await?;

        let mut corp_code_changed = false;
        if let Some(corp_code) = update
            .corp_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let profile = self
                .profiles
                .find_by_corp_code(corp_code)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "no company profile for new corp code {}",
                        corp_code
                    ))
                })?;
            row.company_profile_id = Some(profile.id);
            row.corp_code = corp_code.to_string();
            corp_code_changed = true;
            info!("Partner re-pointed to new profile: id={}, corp_code={}", id, corp_code);
        }

        if let Some(date) = update.contract_start_date {
            row.contract_start_date = Some(date);
        }
        if let Some(status) = update.status {
            row.status = status.as_str().to_string();
        }

        self.partners.update(&row).await?;

        if corp_code_changed {
            self.publish_partner_event(PartnerEvent::updated(&row.corp_code))
                .await;
        }

        info!("Partner updated: id={}", id);
        let profile = self.profile_of(&row).await?;
        Ok(PartnerCompanyRecord::from_rows(&row, profile.as_ref(), false))
    }

    /// Soft delete: the registration flips to INACTIVE and stays restorable.
    pub async fn delete_partner_company(&self, id: Uuid) -> ServiceResult<()> {
        let mut row = self.require_partner(id).await?;
        row.status = PartnerStatus::Inactive.as_str().to_string();
        self.partners.update(&row).await?;
        info!("Partner deactivated: id={}", id);
        Ok(())
    }

    pub async fn find_partner_company_by_id(
        &self,
        id: Uuid,
    ) -> ServiceResult<PartnerCompanyRecord> {
        let row = self.require_partner(id).await?;
        let profile = self.profile_of(&row).await?;
        Ok(PartnerCompanyRecord::from_rows(&row, profile.as_ref(), false))
    }

    /// ACTIVE partners of one owner, newest first, optionally filtered by a
    /// name fragment. Page numbers start at 1; page size is clamped to 100.
    pub async fn list_partner_companies(
        &self,
        owner: Owner,
        page: u32,
        page_size: u32,
        name_filter: Option<&str>,
    ) -> ServiceResult<PartnerCompanyPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let offset = i64::from(page - 1) * i64::from(page_size);
        let filter = name_filter.map(str::trim).filter(|f| !f.is_empty());

        let rows = self
            .partners
            .list_by_owner(
                owner,
                PartnerStatus::Active,
                filter,
                i64::from(page_size),
                offset,
            )
            .await?;
        let total = self
            .partners
            .count_by_owner(owner, PartnerStatus::Active, filter)
            .await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            let profile = self.profile_of(row).await?;
            data.push(PartnerCompanyRecord::from_rows(row, profile.as_ref(), false));
        }

        Ok(PartnerCompanyPage {
            data,
            total,
            page,
            page_size,
        })
    }

    /// Distinct display names of every ACTIVE partner in the system.
    pub async fn unique_active_partner_names(&self) -> ServiceResult<Vec<String>> {
        Ok(self.partners.unique_active_names().await?)
    }

    /// Case-insensitive exact-name duplicate check against ACTIVE partners,
    /// optionally excluding one registration (edit-self).
    pub async fn check_company_name_duplicate(
        &self,
        company_name: &str,
        exclude_id: Option<Uuid>,
    ) -> ServiceResult<NameDuplicateCheck> {
        let name = company_name.trim();
        if name.is_empty() {
            return Ok(NameDuplicateCheck {
                is_duplicate: false,
                message: "회사명이 제공되지 않았습니다.".to_string(),
                existing_company_id: None,
            });
        }

        match self.partners.find_active_by_name(name).await? {
            Some(existing) if exclude_id == Some(existing.id) => Ok(NameDuplicateCheck {
                is_duplicate: false,
                message: "수정 중인 자기 자신의 회사명입니다.".to_string(),
                existing_company_id: None,
            }),
            Some(existing) => Ok(NameDuplicateCheck {
                is_duplicate: true,
                message: format!("'{}' 이름의 협력사가 이미 등록되어 있습니다.", name),
                existing_company_id: Some(existing.id),
            }),
            None => Ok(NameDuplicateCheck {
                is_duplicate: false,
                message: "사용 가능한 회사명입니다.".to_string(),
                existing_company_id: None,
            }),
        }
    }

    /// Flip the account-creation flag once the partner's login exists.
    pub async fn update_account_created(&self, id: Uuid, account_created: bool) -> ServiceResult<()> {
        let mut row = self.require_partner(id).await?;
        row.account_created = account_created;
        self.partners.update(&row).await?;
        info!(
            "Partner account flag updated: id={}, account_created={}",
            id, account_created
        );
        Ok(())
    }

    async fn require_partner(&self, id: Uuid) -> ServiceResult<PartnerCompanyRow> {
        self.partners
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("no partner company with id {}", id)))
    }

    async fn profile_of(
        &self,
        row: &PartnerCompanyRow,
    ) -> ServiceResult<Option<CompanyProfileRow>> {
        match row.company_profile_id {
            Some(profile_id) => Ok(self.profiles.find_by_id(profile_id).await?),
            None => Ok(None),
        }
    }

    /// Publish onto the partner-company topic, keyed by corp_code.
    /// Fire-and-forget: the outcome is observed and logged only.
    async fn publish_partner_event(&self, event: PartnerEvent) {
        let key = event.corp_code.clone().unwrap_or_default();
        let payload = match serde_json::to_value(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Partner event serialization failed: {}", e);
                return;
            }
        };
        match self
            .publisher
            .publish(&self.bus_config.partner_company_topic, &key, payload)
            .await
        {
            Ok(()) => info!("Partner event published: corp_code={}", key),
            Err(e) => warn!("Partner event publish failed: corp_code={}, error={:#}", key, e),
        }
    }

    /// Publish the restored record on the outbound topic, keyed by the
    /// partner UUID.
    async fn publish_restore_notification(&self, record: &PartnerCompanyRecord) {
        let payload = match serde_json::to_value(record) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Restore notification serialization failed: {}", e);
                return;
            }
        };
        let key = record.id.to_string();
        match self
            .publisher
            .publish(&self.bus_config.partner_restore_topic, &key, payload)
            .await
        {
            Ok(()) => info!("Restore notification published: id={}", key),
            Err(e) => warn!(
                "Restore notification publish failed: id={}, error={:#}",
                key, e
            ),
        }
    }
}
