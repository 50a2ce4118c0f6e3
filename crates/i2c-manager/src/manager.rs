use std::time::Instant;

use tracing::{debug, info, warn};

use crate::bus::{BusConfig, BUS_COUNT};
use crate::device::{DeviceInfo, DeviceRegistry};
use crate::error::I2cError;
use crate::events::{BusEvents, NoopEvents};
use crate::transport::I2cTransport;

/// Standard-mode clock, used when a caller does not ask for more.
pub const DEFAULT_FREQUENCY: u32 = 100_000;

/// Default transport stall bound in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u16 = 1000;

/// Multi-bus I2C manager: bus registry, transaction engine, device
/// registry, and scan protocol over a pair of [`I2cTransport`]s.
///
/// The manager owns one transport per supported bus id and serializes
/// every operation through `&mut self`; it performs no locking of its
/// own. All operations are synchronous and return their outcome
/// directly as a `Result` carrying [`I2cError`].
pub struct I2cManager<T: I2cTransport> {
    ports: [T; BUS_COUNT],
    buses: [Option<BusConfig>; BUS_COUNT],
    devices: DeviceRegistry,
    events: Box<dyn BusEvents>,
    timeout_ms: u16,
    epoch: Instant,
}

impl<T: I2cTransport> I2cManager<T> {
    /// Create a manager over the given transports, one per bus id,
    /// with no-op presence notifications.
    pub fn new(ports: [T; BUS_COUNT]) -> Self {
        Self::with_events(ports, Box::new(NoopEvents))
    }

    /// Create a manager that forwards scan discoveries and losses to
    /// `events`.
    pub fn with_events(ports: [T; BUS_COUNT], events: Box<dyn BusEvents>) -> Self {
        Self {
            ports,
            buses: [None; BUS_COUNT],
            devices: DeviceRegistry::new(),
            events,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            epoch: Instant::now(),
        }
    }

    /// Replace the presence-notification sink.
    pub fn set_events(&mut self, events: Box<dyn BusEvents>) {
        self.events = events;
    }

    /// Bring a bus up on the given pins.
    ///
    /// Fails with `InvalidParameters` for a bus id outside the
    /// supported set. Re-initializing an already-initialized bus is a
    /// success no-op that does not touch the transport. A transport
    /// `begin` failure surfaces as `Other` and leaves the bus
    /// uninitialized.
    pub fn init_bus(
        &mut self,
        bus_id: u8,
        sda_pin: u8,
        scl_pin: u8,
        frequency: u32,
    ) -> Result<(), I2cError> {
        let idx = usize::from(bus_id);
        if idx >= BUS_COUNT {
            return Err(I2cError::InvalidParameters);
        }
        if self.buses[idx].is_some_and(|c| c.initialized) {
            return Ok(());
        }

        let port = &mut self.ports[idx];
        port.set_timeout(self.timeout_ms);
        if port.begin(sda_pin, scl_pin, frequency) {
            let mut config = BusConfig::new(sda_pin, scl_pin, frequency);
            config.initialized = true;
            self.buses[idx] = Some(config);
            info!(bus = bus_id, sda = sda_pin, scl = scl_pin, frequency, "i2c bus initialized");
            Ok(())
        } else {
            warn!(bus = bus_id, sda = sda_pin, scl = scl_pin, "i2c bus init failed");
            Err(I2cError::Other)
        }
    }

    /// Whether `init_bus` has succeeded for this bus id.
    pub fn is_bus_initialized(&self, bus_id: u8) -> bool {
        self.buses
            .get(usize::from(bus_id))
            .copied()
            .flatten()
            .is_some_and(|c| c.initialized)
    }

    /// Snapshot of the recorded configuration for a bus, if any.
    pub fn bus_config(&self, bus_id: u8) -> Option<BusConfig> {
        self.buses.get(usize::from(bus_id)).copied().flatten()
    }

    /// The transport handle for a bus, only if it is initialized.
    ///
    /// Escape hatch for multi-step custom transactions beyond the
    /// register helpers; the caller takes over serialization of the
    /// wire protocol while holding the handle.
    pub fn port(&mut self, bus_id: u8) -> Option<&mut T> {
        if self.is_bus_initialized(bus_id) {
            Some(&mut self.ports[usize::from(bus_id)])
        } else {
            None
        }
    }

    /// Current transport stall bound in milliseconds.
    pub fn timeout(&self) -> u16 {
        self.timeout_ms
    }

    /// Change the stall bound, re-applying it to every initialized
    /// transport.
    pub fn set_timeout(&mut self, timeout_ms: u16) {
        self.timeout_ms = timeout_ms;
        for idx in 0..BUS_COUNT {
            if self.buses[idx].is_some_and(|c| c.initialized) {
                self.ports[idx].set_timeout(timeout_ms);
            }
        }
    }

    /// Milliseconds of monotonic uptime since the manager was built.
    pub fn uptime_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Owned snapshot of every known device record.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.snapshot()
    }

    /// Validation preamble shared by every transaction: the bus must
    /// be initialized, and the address must be a usable 7-bit address
    /// (0 is the reserved broadcast address, 127 the top of the
    /// space).
    fn check_bus_and_address(&self, bus_id: u8, address: u8) -> Result<(), I2cError> {
        if !self.is_bus_initialized(bus_id) {
            return Err(I2cError::BusNotInitialized);
        }
        if address == 0 || address > 127 {
            return Err(I2cError::InvalidParameters);
        }
        Ok(())
    }

    fn checked_port(&mut self, bus_id: u8, address: u8) -> Result<&mut T, I2cError> {
        self.check_bus_and_address(bus_id, address)?;
        Ok(&mut self.ports[usize::from(bus_id)])
    }

    /// Write one byte to a device register.
    pub fn write_register(
        &mut self,
        bus_id: u8,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), I2cError> {
        let port = self.checked_port(bus_id, address)?;
        port.begin_transmission(address);
        port.write(register);
        port.write(value);
        I2cError::from_status(port.end_transmission(true))
    }

    /// Write a 16-bit value to a device register, high byte first.
    pub fn write_register16(
        &mut self,
        bus_id: u8,
        address: u8,
        register: u8,
        value: u16,
    ) -> Result<(), I2cError> {
        let port = self.checked_port(bus_id, address)?;
        port.begin_transmission(address);
        port.write(register);
        port.write((value >> 8) as u8);
        port.write((value & 0xFF) as u8);
        I2cError::from_status(port.end_transmission(true))
    }

    /// Write a run of bytes starting at a device register.
    ///
    /// An empty buffer is `InvalidParameters`; so is any preamble
    /// failure here — both failure sources collapse to the same
    /// variant for the bulk operations.
    pub fn write_bytes(
        &mut self,
        bus_id: u8,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), I2cError> {
        if self.check_bus_and_address(bus_id, address).is_err() || data.is_empty() {
            return Err(I2cError::InvalidParameters);
        }
        let port = &mut self.ports[usize::from(bus_id)];
        port.begin_transmission(address);
        port.write(register);
        for &byte in data {
            port.write(byte);
        }
        I2cError::from_status(port.end_transmission(true))
    }

    /// Read one byte from a device register.
    ///
    /// The register is selected with a write phase that holds the bus
    /// (repeated start) before the read request, so the pair is atomic
    /// against other bus users. A nonzero write-phase status surfaces
    /// as that status's error; a short read is a `Timeout`.
    pub fn read_register(
        &mut self,
        bus_id: u8,
        address: u8,
        register: u8,
    ) -> Result<u8, I2cError> {
        let port = self.checked_port(bus_id, address)?;
        port.begin_transmission(address);
        port.write(register);
        I2cError::from_status(port.end_transmission(false))?;

        if port.request_from(address, 1, true) == 1 {
            Ok(port.read())
        } else {
            Err(I2cError::Timeout)
        }
    }

    /// Read a 16-bit register value, reassembled high byte first.
    pub fn read_register16(
        &mut self,
        bus_id: u8,
        address: u8,
        register: u8,
    ) -> Result<u16, I2cError> {
        let port = self.checked_port(bus_id, address)?;
        port.begin_transmission(address);
        port.write(register);
        I2cError::from_status(port.end_transmission(false))?;

        if port.request_from(address, 2, true) == 2 {
            let high = port.read();
            let low = port.read();
            Ok(u16::from(high) << 8 | u16::from(low))
        } else {
            Err(I2cError::Timeout)
        }
    }

    /// Fill `data` starting at a device register, with the same
    /// repeated-start pattern as [`read_register`](Self::read_register).
    ///
    /// Empty buffers and preamble failures collapse to
    /// `InvalidParameters`, matching [`write_bytes`](Self::write_bytes).
    pub fn read_bytes(
        &mut self,
        bus_id: u8,
        address: u8,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), I2cError> {
        if self.check_bus_and_address(bus_id, address).is_err() || data.is_empty() {
            return Err(I2cError::InvalidParameters);
        }
        let port = &mut self.ports[usize::from(bus_id)];
        port.begin_transmission(address);
        port.write(register);
        I2cError::from_status(port.end_transmission(false))?;

        if port.request_from(address, data.len(), true) == data.len() {
            for byte in data.iter_mut() {
                *byte = port.read();
            }
            Ok(())
        } else {
            Err(I2cError::Timeout)
        }
    }

    /// Open the write phase of a custom transaction.
    pub fn begin_transmission(&mut self, bus_id: u8, address: u8) -> Result<(), I2cError> {
        let port = self.checked_port(bus_id, address)?;
        port.begin_transmission(address);
        Ok(())
    }

    /// Close the write phase of a custom transaction. `stop = false`
    /// keeps the bus claimed for a repeated start.
    pub fn end_transmission(&mut self, bus_id: u8, stop: bool) -> Result<(), I2cError> {
        let port = self.port(bus_id).ok_or(I2cError::BusNotInitialized)?;
        I2cError::from_status(port.end_transmission(stop))
    }

    /// Request bytes within a custom transaction. Succeeds only if
    /// exactly `quantity` bytes were returned; a shortfall is a
    /// `Timeout`.
    pub fn request_from(
        &mut self,
        bus_id: u8,
        address: u8,
        quantity: usize,
        stop: bool,
    ) -> Result<(), I2cError> {
        let port = self.checked_port(bus_id, address)?;
        if port.request_from(address, quantity, stop) == quantity {
            Ok(())
        } else {
            Err(I2cError::Timeout)
        }
    }

    /// One-shot presence probe with full validation, equivalent to a
    /// single iteration of the scan sweep. Does not touch the device
    /// registry.
    pub fn is_device_present(&mut self, bus_id: u8, address: u8) -> Result<bool, I2cError> {
        let port = self.checked_port(bus_id, address)?;
        port.begin_transmission(address);
        Ok(port.end_transmission(true) == 0)
    }

    /// Sweep the 7-bit address space of a bus and reconcile the device
    /// registry against what responded.
    ///
    /// Every present address is returned, upserted into the registry
    /// (responsive, last-seen refreshed), and reported through
    /// [`BusEvents::on_device_found`]. Known devices on this bus that
    /// failed to respond are flipped to unresponsive, with exactly one
    /// [`BusEvents::on_device_lost`] per transition. Finding zero
    /// devices is still a successful scan; only an uninitialized bus
    /// is an error.
    pub fn scan_bus(&mut self, bus_id: u8) -> Result<Vec<u8>, I2cError> {
        if !self.is_bus_initialized(bus_id) {
            return Err(I2cError::BusNotInitialized);
        }
        let now = self.uptime_ms();

        let Self { ports, devices, events, .. } = self;
        let port = &mut ports[usize::from(bus_id)];

        let mut found = Vec::new();
        for address in 1..=126u8 {
            port.begin_transmission(address);
            if port.end_transmission(true) == 0 {
                found.push(address);
                events.on_device_found(bus_id, address);
                if devices.mark_seen(bus_id, address, now) {
                    debug!(bus = bus_id, address, "i2c device discovered");
                }
            }
        }

        for address in devices.mark_absent(bus_id, &found) {
            debug!(bus = bus_id, address, "i2c device lost");
            events.on_device_lost(bus_id, address);
        }

        info!(bus = bus_id, count = found.len(), "i2c scan complete");
        Ok(found)
    }
}

impl<T: I2cTransport> Drop for I2cManager<T> {
    fn drop(&mut self) {
        for idx in 0..BUS_COUNT {
            if self.buses[idx].is_some_and(|c| c.initialized) {
                self.ports[idx].end();
            }
        }
    }
}
