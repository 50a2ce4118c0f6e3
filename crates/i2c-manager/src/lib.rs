//! Multi-bus I2C management for embedded targets with a pair of
//! independent two-wire controllers.
//!
//! Tracks which buses are initialized, performs validated register
//! read/write transactions through a wire-level [`I2cTransport`], and
//! reconciles a registry of observed devices via a presence-scanning
//! protocol with discovery/loss notifications. All operations are
//! synchronous and assume exclusive, serialized access to each
//! transport.

mod bus;
mod device;
mod error;
mod events;
mod manager;
mod transport;

pub mod mock;

pub use bus::{BusConfig, BUS_COUNT};
pub use device::{DeviceInfo, DeviceRegistry};
pub use error::I2cError;
pub use events::{BusEvents, NoopEvents};
pub use manager::{I2cManager, DEFAULT_FREQUENCY, DEFAULT_TIMEOUT_MS};
pub use transport::I2cTransport;
