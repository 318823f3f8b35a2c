//! Event bus adapter.
//!
//! The publish/subscribe contract is broker-agnostic; the shipped
//! implementation is the in-memory durable log. A broker-backed adapter
//! plugs in behind the same two traits.

pub mod in_memory;
pub mod types;

pub use in_memory::{BusRecord, EventPublisher, EventSubscriber, InMemoryBus};
pub use types::{PartnerEvent, PartnerEventAction};
