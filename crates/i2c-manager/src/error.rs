use derive_more::Display;

/// Errors reported by the transaction engine and scan protocol.
///
/// The discriminants of the first four variants match the transport's
/// completion-status codes, so a nonzero status forwards directly via
/// [`I2cError::from_status`]. `BusNotInitialized` and
/// `InvalidParameters` are engine-side precondition failures with no
/// transport equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum I2cError {
    /// The transaction did not complete within the transport timeout.
    #[display("Timeout")]
    Timeout = 1,
    /// No device acknowledged the address byte.
    #[display("NACK on address")]
    NackOnAddress = 2,
    /// The device refused a data byte.
    #[display("NACK on data")]
    NackOnData = 3,
    /// Any other transport-level failure.
    #[display("Other error")]
    Other = 4,
    /// The target bus was never brought up with `init_bus`.
    #[display("Bus not initialized")]
    BusNotInitialized = 5,
    /// Bus id outside the supported set, reserved address, or an
    /// empty buffer for a bulk transfer.
    #[display("Invalid parameters")]
    InvalidParameters = 6,
}

impl std::error::Error for I2cError {}

impl I2cError {
    /// Translate a transport completion status into a result.
    ///
    /// Status 0 is success; 1..=3 map onto their named variants; any
    /// other nonzero status collapses to [`I2cError::Other`].
    pub fn from_status(status: u8) -> Result<(), I2cError> {
        match status {
            0 => Ok(()),
            1 => Err(I2cError::Timeout),
            2 => Err(I2cError::NackOnAddress),
            3 => Err(I2cError::NackOnData),
            _ => Err(I2cError::Other),
        }
    }
}
