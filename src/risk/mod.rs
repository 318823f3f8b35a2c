//! Financial risk evaluation over persisted statement rows.

pub mod evaluator;
pub mod service;
pub mod types;

pub use evaluator::{auto_period, evaluate_rows, find_amount, parse_amount, AmountField};
pub use service::RiskAssessmentService;
pub use types::{AvailablePeriod, RiskAssessment, RiskItem};
