//! Dispatch layer between a GATT transport and application code.
//!
//! The [`Router`] owns the endpoint registry and the subscriber directory.
//! Inbound characteristic values are resolved to an endpoint and schema,
//! decoded, and handed to the endpoint's subscriber (on an exact schema
//! match) and to the [`Delegate`]. Outbound writes are encoded with the
//! packet's schema and sent with the acknowledgment mode the registry
//! implies.

pub mod config;
pub mod delegate;
pub mod error;
pub mod event;
pub mod router;
pub mod subscriber;

pub use config::{RouterConfig, UnroutablePolicy};
pub use delegate::Delegate;
pub use error::{Result, RouterError};
pub use event::{DispatchOutcome, InboundEvent, SubscriberOutcome, TransportEvent, Unroutable};
pub use router::{Router, WriteReport};
pub use subscriber::SubscriberDirectory;
