//! Endpoint registry and access-level matrix.
//!
//! An endpoint is a (service, characteristic) pair. For each endpoint the
//! registry records which access levels are active (read, acknowledged
//! write, unacknowledged write, notify) and which packet schema decodes the
//! traffic at each level. Levels are bound and removed independently; an
//! endpoint exists for as long as at least one level is bound.

pub mod access;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod registry;

pub use access::{AccessLevel, AccessLevels};
pub use config::RegistryConfig;
pub use endpoint::{Endpoint, EndpointKey};
pub use error::{RegistryError, Result};
pub use registry::{EndpointRegistry, SchemaType};
