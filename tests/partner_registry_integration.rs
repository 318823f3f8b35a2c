//! Partner registry integration tests: register, duplicate-name
//! short-circuit, soft delete and restore.
//!
//! Run with: cargo test --test partner_registry_integration -- --ignored

use std::sync::Arc;

use eds_sync::bus::{EventSubscriber, InMemoryBus};
use eds_sync::config::BusConfig;
use eds_sync::database::{
    CompanyProfileRepository, CorpCodeRepository, DatabaseConfig, DatabaseManager,
    PartnerCompanyRepository,
};
use eds_sync::eds::CorpCodeEntry;
use eds_sync::partner::{CreatePartnerCompany, PartnerRegistry, PartnerStatus};
use uuid::Uuid;

struct TestFixture {
    registry: PartnerRegistry,
    bus: Arc<InMemoryBus>,
    bus_config: BusConfig,
    directory: CorpCodeRepository,
    corp_code: String,
    corp_name: String,
}

impl TestFixture {
    async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let db = DatabaseManager::new(DatabaseConfig::default()).await?;
        db.run_migrations().await?;
        let pool = db.pool().clone();

        let bus_config = BusConfig::default();
        let bus = Arc::new(InMemoryBus::new(bus_config.partitions));
        let directory = CorpCodeRepository::new(pool.clone());
        let registry = PartnerRegistry::new(
            PartnerCompanyRepository::new(pool.clone()),
            CompanyProfileRepository::new(pool.clone()),
            directory.clone(),
            bus.clone(),
            bus_config.clone(),
        );

        let suffix = Uuid::new_v4().simple().to_string()[..8].to_string();
        Ok(Self {
            registry,
            bus,
            bus_config,
            directory,
            corp_code: format!("{:08}", Uuid::new_v4().as_u128() % 100_000_000),
            corp_name: format!("등록테스트 {}", suffix),
        })
    }

    async fn seed_directory(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.directory
            .upsert_all(&[CorpCodeEntry {
                corp_code: self.corp_code.clone(),
                corp_name: self.corp_name.clone(),
                corp_name_eng: None,
                stock_code: Some("005930".to_string()),
                modify_date: "20240101".to_string(),
            }])
            .await?;
        Ok(())
    }

    fn create_input(&self) -> CreatePartnerCompany {
        CreatePartnerCompany {
            corp_code: self.corp_code.clone(),
            contract_start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn drain_partner_events(&self) -> usize {
        let mut receivers = self
            .bus
            .subscribe(&self.bus_config.partner_company_topic, "test-observer");
        let mut n = 0;
        for rx in &mut receivers {
            while rx.try_recv().is_ok() {
                n += 1;
            }
        }
        n
    }
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn register_then_duplicate_then_restore() {
    let fixture = TestFixture::new().await.expect("fixture");
    fixture.seed_directory().await.expect("seed");

    // Fresh registration: synthesized profile, ACTIVE, events published.
    let created = fixture
        .registry
        .create_partner_company(fixture.create_input(), 1, None)
        .await
        .expect("create");
    assert_eq!(created.status, PartnerStatus::Active);
    assert!(!created.restored);
    assert!(!created.account_created);
    assert_eq!(created.corp_name, fixture.corp_name);
    assert_eq!(created.headquarters_id, Some(1));
    assert!(created.partner_id.is_none());
    assert!(fixture.drain_partner_events() >= 1);

    // Same owner, same name: the existing registration is returned.
    let duplicate = fixture
        .registry
        .create_partner_company(fixture.create_input(), 1, None)
        .await
        .expect("duplicate create");
    assert_eq!(duplicate.id, created.id);
    assert!(!duplicate.restored);

    // Soft delete, then re-register: same id comes back ACTIVE.
    fixture
        .registry
        .delete_partner_company(created.id)
        .await
        .expect("delete");
    let deleted = fixture
        .registry
        .find_partner_company_by_id(created.id)
        .await
        .expect("find after delete");
    assert_eq!(deleted.status, PartnerStatus::Inactive);

    let restored = fixture
        .registry
        .create_partner_company(fixture.create_input(), 1, None)
        .await
        .expect("restore");
    assert_eq!(restored.id, created.id, "restore reuses the UUID");
    assert!(restored.restored);
    assert_eq!(restored.status, PartnerStatus::Active);
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn unknown_corp_code_is_not_found() {
    let fixture = TestFixture::new().await.expect("fixture");
    // Directory deliberately not seeded.
    let err = fixture
        .registry
        .create_partner_company(fixture.create_input(), 1, None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn name_duplicate_check_excludes_self() {
    let fixture = TestFixture::new().await.expect("fixture");
    fixture.seed_directory().await.expect("seed");

    let created = fixture
        .registry
        .create_partner_company(fixture.create_input(), 1, None)
        .await
        .expect("create");

    let check = fixture
        .registry
        .check_company_name_duplicate(&fixture.corp_name, None)
        .await
        .expect("check");
    assert!(check.is_duplicate);
    assert_eq!(check.existing_company_id, Some(created.id));

    let self_check = fixture
        .registry
        .check_company_name_duplicate(&fixture.corp_name, Some(created.id))
        .await
        .expect("self check");
    assert!(!self_check.is_duplicate);
}
