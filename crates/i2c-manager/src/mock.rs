//! Scripted transport for tests.
//!
//! Simulates one controller with a set of present devices, each with a
//! byte-addressed register file. Writes land in the register file and
//! reads come back out of it, so register round-trips behave like real
//! hardware. Every wire operation is logged for verification, and
//! failures (begin refusal, forced completion statuses, short reads)
//! can be injected.

use std::collections::{BTreeMap, VecDeque};

use crate::transport::I2cTransport;

/// One logged wire operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    /// Controller brought up.
    Begin { sda_pin: u8, scl_pin: u8, frequency: u32 },
    /// Controller shut down.
    End,
    /// Zero-length address probe.
    Probe { address: u8 },
    /// Write phase: register byte followed by data bytes.
    Write { address: u8, bytes: Vec<u8> },
    /// Read request.
    Read { address: u8, quantity: usize },
}

#[derive(Debug, Default)]
pub struct MockTransport {
    present: Vec<u8>,
    registers: BTreeMap<u8, BTreeMap<u8, u8>>,
    selected: BTreeMap<u8, u8>,
    tx: Option<(u8, Vec<u8>)>,
    read_queue: VecDeque<u8>,
    ops: Vec<MockOp>,
    begun: bool,
    begin_calls: usize,
    timeout_ms: u16,
    fail_begin: bool,
    forced_status: Option<u8>,
    fail_request: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a device respond at `address`.
    pub fn add_device(&mut self, address: u8) {
        if !self.present.contains(&address) {
            self.present.push(address);
        }
    }

    /// Make the device at `address` stop responding. Its register
    /// file is kept, like a device that lost power mid-session.
    pub fn remove_device(&mut self, address: u8) {
        self.present.retain(|&a| a != address);
    }

    /// Pre-load a register value.
    pub fn set_register(&mut self, address: u8, register: u8, value: u8) {
        self.registers.entry(address).or_default().insert(register, value);
    }

    /// Current register value (0 if never written).
    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.registers
            .get(&address)
            .and_then(|regs| regs.get(&register))
            .copied()
            .unwrap_or(0)
    }

    /// Refuse the next (and every later) `begin` call.
    pub fn fail_begin(&mut self, fail: bool) {
        self.fail_begin = fail;
    }

    /// Force the next `end_transmission` to report `status` instead
    /// of the simulated outcome.
    pub fn force_status(&mut self, status: u8) {
        self.forced_status = Some(status);
    }

    /// Make every `request_from` return zero bytes.
    pub fn fail_request(&mut self, fail: bool) {
        self.fail_request = fail;
    }

    /// Logged wire operations, oldest first.
    pub fn ops(&self) -> Vec<MockOp> {
        self.ops.clone()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// How many times `begin` was called, successful or not.
    pub fn begin_calls(&self) -> usize {
        self.begin_calls
    }

    /// Whether the controller is currently up.
    pub fn is_begun(&self) -> bool {
        self.begun
    }

    /// Last timeout applied via `set_timeout`.
    pub fn timeout_ms(&self) -> u16 {
        self.timeout_ms
    }
}

impl I2cTransport for MockTransport {
    fn begin(&mut self, sda_pin: u8, scl_pin: u8, frequency: u32) -> bool {
        self.begin_calls += 1;
        if self.fail_begin {
            return false;
        }
        self.begun = true;
        self.ops.push(MockOp::Begin { sda_pin, scl_pin, frequency });
        true
    }

    fn end(&mut self) {
        self.begun = false;
        self.ops.push(MockOp::End);
    }

    fn set_timeout(&mut self, timeout_ms: u16) {
        self.timeout_ms = timeout_ms;
    }

    fn begin_transmission(&mut self, address: u8) {
        self.tx = Some((address, Vec::new()));
    }

    fn write(&mut self, byte: u8) {
        if let Some((_, bytes)) = self.tx.as_mut() {
            bytes.push(byte);
        }
    }

    fn end_transmission(&mut self, _stop: bool) -> u8 {
        let (address, bytes) = self.tx.take().unwrap_or((0, Vec::new()));
        if bytes.is_empty() {
            self.ops.push(MockOp::Probe { address });
        } else {
            self.ops.push(MockOp::Write { address, bytes: bytes.clone() });
        }

        if let Some(status) = self.forced_status.take() {
            return status;
        }
        if !self.present.contains(&address) {
            return 2; // NACK on address
        }
        if let Some((&register, data)) = bytes.split_first() {
            let regs = self.registers.entry(address).or_default();
            for (offset, &byte) in data.iter().enumerate() {
                regs.insert(register.wrapping_add(offset as u8), byte);
            }
            self.selected.insert(address, register);
        }
        0
    }

    fn request_from(&mut self, address: u8, quantity: usize, _stop: bool) -> usize {
        self.ops.push(MockOp::Read { address, quantity });
        self.read_queue.clear();
        if self.fail_request || !self.present.contains(&address) {
            return 0;
        }
        let register = self.selected.get(&address).copied().unwrap_or(0);
        let regs = self.registers.entry(address).or_default();
        for offset in 0..quantity {
            let value = regs
                .get(&register.wrapping_add(offset as u8))
                .copied()
                .unwrap_or(0);
            self.read_queue.push_back(value);
        }
        quantity
    }

    fn read(&mut self) -> u8 {
        self.read_queue.pop_front().unwrap_or(0)
    }
}
