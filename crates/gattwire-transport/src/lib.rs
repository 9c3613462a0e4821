//! Abstract GATT transport interface.
//!
//! The physical radio (scanning, connection lifecycle, read/write/notify
//! primitives) lives outside gattwire. This crate defines the outbound seam,
//! the [`Transport`] trait, together with the plain data types that cross it.
//!
//! [`MemoryTransport`] is an in-process implementation that records every
//! operation, used for tests and session replay.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{Result, TransportError};
pub use memory::{MemoryTransport, Operation};
pub use traits::Transport;
pub use types::{AckMode, Device, ScanFilter, WriteRequest};
