//! Register-file model of an I2C bus for driver tests.
//!
//! Devices sit either on the root bus or behind a TCA9548A channel. A write
//! sets the register pointer from its first byte and stores any remaining
//! bytes under that register; a read returns the bytes stored at the pointer,
//! zero-padded. Unknown addresses NACK, and the mux can be told to refuse
//! selecting a channel.

use std::collections::BTreeMap;
use std::vec::Vec;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError(pub ErrorKind);

impl embedded_hal::i2c::Error for FakeError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct FakeDevice {
    regs: BTreeMap<u8, Vec<u8>>,
    pointer: u8,
    /// Every write payload (register byte included), in order.
    pub writes: Vec<Vec<u8>>,
    fail_with: Option<ErrorKind>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reg(mut self, reg: u8, bytes: &[u8]) -> Self {
        self.regs.insert(reg, bytes.to_vec());
        self
    }

    /// Every transaction addressed to this device fails with `kind`.
    pub fn failing(mut self, kind: ErrorKind) -> Self {
        self.fail_with = Some(kind);
        self
    }

    pub fn reg(&self, reg: u8) -> &[u8] {
        self.regs.get(&reg).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fail_with(&mut self, kind: Option<ErrorKind>) {
        self.fail_with = kind;
    }

    fn apply(&mut self, operations: &mut [Operation<'_>]) -> Result<(), FakeError> {
        if let Some(kind) = self.fail_with {
            return Err(FakeError(kind));
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&reg, data)) = bytes.split_first() {
                        self.pointer = reg;
                        if !data.is_empty() {
                            self.regs.insert(reg, data.to_vec());
                        }
                    }
                    self.writes.push(bytes.to_vec());
                }
                Operation::Read(buffer) => {
                    let stored = self.reg(self.pointer);
                    for (i, byte) in buffer.iter_mut().enumerate() {
                        *byte = stored.get(i).copied().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeBus {
    mux_address: Option<u8>,
    /// Channel mask last written to the mux.
    pub selected: u8,
    refused: Option<(u8, ErrorKind)>,
    root: BTreeMap<u8, FakeDevice>,
    behind: BTreeMap<(u8, u8), FakeDevice>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mux(mut self, address: u8) -> Self {
        self.mux_address = Some(address);
        self
    }

    /// Writes to the mux that select `channel` fail with `kind`.
    pub fn refusing_channel(mut self, channel: u8, kind: ErrorKind) -> Self {
        self.refuse_channel(channel, kind);
        self
    }

    pub fn refuse_channel(&mut self, channel: u8, kind: ErrorKind) {
        self.refused = Some((1u8 << channel, kind));
    }

    pub fn with_root(mut self, address: u8, device: FakeDevice) -> Self {
        self.root.insert(address, device);
        self
    }

    pub fn with_behind(mut self, channel: u8, address: u8, device: FakeDevice) -> Self {
        self.behind.insert((channel, address), device);
        self
    }

    pub fn root(&self, address: u8) -> &FakeDevice {
        &self.root[&address]
    }

    pub fn root_mut(&mut self, address: u8) -> &mut FakeDevice {
        self.root.get_mut(&address).expect("no such device")
    }

    pub fn behind(&self, channel: u8, address: u8) -> &FakeDevice {
        &self.behind[&(channel, address)]
    }

    fn target(&mut self, address: u8) -> Option<&mut FakeDevice> {
        if self.root.contains_key(&address) {
            return self.root.get_mut(&address);
        }
        let selected = self.selected;
        self.behind
            .iter_mut()
            .find(|((channel, a), _)| *a == address && selected & (1u8 << *channel) != 0)
            .map(|(_, device)| device)
    }
}

impl ErrorType for FakeBus {
    type Error = FakeError;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if Some(address) == self.mux_address {
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        let Some(&mask) = bytes.last() else {
                            continue;
                        };
                        if let Some((refused, kind)) = self.refused
                            && mask & refused != 0
                        {
                            return Err(FakeError(kind));
                        }
                        self.selected = mask;
                    }
                    Operation::Read(buffer) => buffer.fill(self.selected),
                }
            }
            return Ok(());
        }

        match self.target(address) {
            Some(device) => device.apply(operations),
            None => Err(FakeError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            ))),
        }
    }
}
