/// Snapshot of one device observed on a bus.
///
/// Records are created the first time a scan sees the device respond
/// and are never removed afterwards; a device that stops responding is
/// only flipped to `responsive = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// 7-bit device address.
    pub address: u8,
    /// Bus the device was observed on.
    pub bus_id: u8,
    /// Free-text display name.
    pub name: String,
    /// Whether the most recent scan of its bus saw the device.
    pub responsive: bool,
    /// Monotonic uptime in milliseconds at the last observation.
    pub last_seen: u64,
}

const PLACEHOLDER_NAME: &str = "Unknown Device";

/// Append-only-by-discovery collection of device records.
///
/// Uniqueness per (bus, address) is enforced by linear scan, which is
/// fine at the scale of a handful of devices per bus. Growth is
/// unbounded; callers scanning many transient addresses own the
/// consequences.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: Vec<DeviceInfo>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that (bus, address) responded at `now_ms`.
    ///
    /// Updates the existing record in place, or appends a new one with
    /// the placeholder name. Returns `true` if the record was newly
    /// created.
    pub fn mark_seen(&mut self, bus_id: u8, address: u8, now_ms: u64) -> bool {
        for entry in &mut self.entries {
            if entry.bus_id == bus_id && entry.address == address {
                entry.responsive = true;
                entry.last_seen = now_ms;
                return false;
            }
        }
        self.entries.push(DeviceInfo {
            address,
            bus_id,
            name: PLACEHOLDER_NAME.to_owned(),
            responsive: true,
            last_seen: now_ms,
        });
        true
    }

    /// Flip every still-responsive record on `bus_id` whose address is
    /// not in `present` to unresponsive. Returns the addresses that
    /// transitioned, each exactly once; records already unresponsive
    /// are left untouched.
    pub fn mark_absent(&mut self, bus_id: u8, present: &[u8]) -> Vec<u8> {
        let mut lost = Vec::new();
        for entry in &mut self.entries {
            if entry.bus_id == bus_id
                && entry.responsive
                && !present.contains(&entry.address)
            {
                entry.responsive = false;
                lost.push(entry.address);
            }
        }
        lost
    }

    /// Owned snapshot of every record, across all buses.
    pub fn snapshot(&self) -> Vec<DeviceInfo> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
