/// Wire-level two-wire transport.
///
/// Implementations wrap one physical controller. The manager owns one
/// transport per supported bus id and serializes all access through
/// `&mut self`; there is no internal locking, and driving a transport
/// reentrantly (from an interrupt or callback context) is unsupported.
///
/// The write phase of a transaction is stateful: `begin_transmission`
/// opens a buffer, `write` queues bytes, and `end_transmission`
/// performs the transfer and reports a completion status. Passing
/// `stop = false` to `end_transmission` keeps the bus claimed so a
/// following `request_from` issues a repeated start, which is how
/// register reads stay atomic against other bus users.
pub trait I2cTransport {
    /// Bring the controller up on the given pins at `frequency` Hz.
    ///
    /// Returns `false` if the controller could not be configured; the
    /// transport must be left safe to retry.
    fn begin(&mut self, sda_pin: u8, scl_pin: u8, frequency: u32) -> bool;

    /// Shut the controller down and release its pins.
    fn end(&mut self);

    /// Bound how long a stalled transaction may block, in milliseconds.
    fn set_timeout(&mut self, timeout_ms: u16);

    /// Open the write phase of a transaction to `address`.
    fn begin_transmission(&mut self, address: u8);

    /// Queue one byte for the open write phase.
    fn write(&mut self, byte: u8);

    /// Transfer the queued bytes and close the write phase.
    ///
    /// Status codes: 0 success, 1 timeout, 2 NACK on address, 3 NACK
    /// on data, anything else an unspecified failure. With
    /// `stop = false` the bus is not released (repeated start).
    fn end_transmission(&mut self, stop: bool) -> u8;

    /// Request `quantity` bytes from `address`, releasing the bus
    /// afterwards if `stop` is set. Returns how many bytes are
    /// actually available to [`read`](Self::read).
    fn request_from(&mut self, address: u8, quantity: usize, stop: bool) -> usize;

    /// Pop the next byte received by [`request_from`](Self::request_from).
    fn read(&mut self) -> u8;
}
