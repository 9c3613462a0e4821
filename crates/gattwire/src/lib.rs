//! Schema-driven packet codec and endpoint dispatch for GATT characteristics.
//!
//! gattwire describes the binary layout of characteristic values as named
//! byte ranges, decodes inbound buffers into typed values, encodes values
//! back into bytes, and routes decoded values to subscribers keyed by
//! (service, characteristic).
//!
//! # Crate Structure
//!
//! - [`transport`]: the abstract radio seam and an in-memory implementation
//! - [`codec`]: packet schemas, field values, `decode` / `encode`
//! - [`registry`]: endpoints and the per-level schema matrix
//! - [`router`]: inbound dispatch and outbound writes (behind `router` feature)

/// Re-export transport types.
pub mod transport {
    pub use gattwire_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use gattwire_codec::*;
}

/// Re-export registry types.
pub mod registry {
    pub use gattwire_registry::*;
}

/// Re-export router types (requires `router` feature).
#[cfg(feature = "router")]
pub mod router {
    pub use gattwire_router::*;
}
