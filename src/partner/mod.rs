//! Partner registry: owner-scoped registrations over company profiles.

pub mod registry;
pub mod types;

pub use registry::PartnerRegistry;
pub use types::{
    CreatePartnerCompany, NameDuplicateCheck, Owner, PartnerCompanyPage, PartnerCompanyRecord,
    PartnerStatus, UpdatePartnerCompany,
};
