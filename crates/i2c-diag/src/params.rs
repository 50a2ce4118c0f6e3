//! Textual parameter parsing conventions.
//!
//! Integers arrive as decimal text; device addresses, register
//! addresses, and byte values are hex with an optional `0x` prefix;
//! byte buffers are comma-separated hex lists.

use std::str::FromStr;

use crate::endpoint::Params;

/// Cap on bulk read length at the remote boundary. An engine-level
/// policy, not a transport limit; larger requests are rejected before
/// reaching the transaction engine.
pub const MAX_READ_LEN: usize = 64;

/// Parse a decimal integer parameter. `None` for absent or
/// unparsable values.
pub fn int_param<T: FromStr>(params: &Params, name: &str) -> Option<T> {
    params.get(name).and_then(|value| value.trim().parse().ok())
}

/// Parse a base-16 parameter such as a device or register address.
pub fn hex_param(params: &Params, name: &str) -> Option<u8> {
    params.get(name).and_then(|value| parse_hex_u8(value))
}

fn parse_hex_u8(text: &str) -> Option<u8> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u8::from_str_radix(digits, 16).ok()
}

/// Parse a comma-separated hex byte list. Whitespace around each
/// segment is trimmed; empty and unparsable segments are skipped.
pub fn hex_byte_list(text: &str) -> Vec<u8> {
    text.split(',').filter_map(parse_hex_u8).collect()
}
