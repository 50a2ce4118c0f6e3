/// Number of independent two-wire controllers the hardware exposes.
///
/// Bus ids form a small closed set, so bus state lives in fixed-size
/// tables indexed by id rather than a general resource pool.
pub const BUS_COUNT: usize = 2;

/// Recorded configuration of one initialized bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub sda_pin: u8,
    pub scl_pin: u8,
    /// Clock frequency in Hz.
    pub frequency: u32,
    /// True iff the transport's `begin` for this bus succeeded.
    pub initialized: bool,
}

impl BusConfig {
    pub(crate) fn new(sda_pin: u8, scl_pin: u8, frequency: u32) -> Self {
        Self { sda_pin, scl_pin, frequency, initialized: false }
    }
}
