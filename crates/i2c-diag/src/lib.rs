//! HTTP-style remote diagnostics for the I2C manager.
//!
//! Defines the endpoint-registry contract consumed from the host
//! application, the textual parameter conventions, and the builtin
//! routes that expose bus initialization, scanning, presence probing,
//! and register read/write over a string-parameter RPC surface.

mod endpoint;
mod params;
mod service;

pub use endpoint::{
    CustomEndpoints, Endpoint, EndpointRegistry, ParamKind, ParamSpec, Params,
    Response, ResponseKind,
};
pub use params::{hex_byte_list, hex_param, int_param, MAX_READ_LEN};
pub use service::{I2cDiag, SharedManager};
