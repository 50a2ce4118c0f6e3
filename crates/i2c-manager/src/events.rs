/// Presence-change notifications emitted by the scan protocol.
///
/// This is the extension seam for device-specific drivers: react to a
/// device appearing or disappearing here, and drive any setup or
/// teardown through the generic register primitives. `on_device_found`
/// fires for every present address on every scan, not only on first
/// discovery; `on_device_lost` fires exactly once per
/// responsive-to-unresponsive transition.
pub trait BusEvents {
    fn on_device_found(&mut self, bus_id: u8, address: u8) {
        let _ = (bus_id, address);
    }

    fn on_device_lost(&mut self, bus_id: u8, address: u8) {
        let _ = (bus_id, address);
    }
}

/// Default implementation that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl BusEvents for NoopEvents {}
