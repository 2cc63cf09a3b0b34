//! Register transactions against the primary sensor device.
//!
//! The physical transport is injected through [`BusTransport`], a
//! byte-oriented seam that reports accepted-byte counts and a
//! transaction-termination status rather than failing by itself. This
//! layer turns those low-level signals into one distinct error per
//! failure mode and never retries; every failure is surfaced to the
//! caller as-is.

use core::fmt;

/// Byte-oriented serial transport shared by the sensor stack.
///
/// Implementations wrap the platform's bus peripheral. The contract
/// mirrors the controller hardware: writes report how many bytes the
/// device accepted, terminating a transaction yields a status code
/// (zero on success), and reads are requested up front and drained one
/// byte at a time.
pub trait BusTransport {
    /// Opens a write transaction addressed to `device`.
    fn begin(&mut self, device: u8);

    /// Queues bytes into the open transaction; returns how many were
    /// accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Terminates the open transaction and returns its status code,
    /// zero on success. With `restart` set the bus is not released and
    /// the next transfer begins with a repeated start.
    fn end(&mut self, restart: bool) -> u8;

    /// Requests `len` bytes from `device`; returns how many are
    /// available to read. With `stop` set the bus is released after the
    /// transfer.
    fn request(&mut self, device: u8, len: usize, stop: bool) -> usize;

    /// Pulls the next available byte of the current read transfer.
    fn read_byte(&mut self) -> u8;
}

/// Transaction-level failures, each surfaced to the caller without
/// retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum BusError {
    /// The register-select byte was not fully accepted by the device.
    Addressing,
    /// The transaction terminated with a nonzero status code.
    Transaction(u8),
    /// Fewer bytes were available to read than requested.
    ShortRead { requested: usize, available: usize },
    /// Fewer payload bytes were accepted than offered.
    ShortWrite { requested: usize, accepted: usize },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Addressing => write!(f, "register address byte not accepted"),
            BusError::Transaction(status) => {
                write!(f, "transaction terminated with status {status}")
            }
            BusError::ShortRead {
                requested,
                available,
            } => write!(f, "short read: {available} of {requested} bytes available"),
            BusError::ShortWrite {
                requested,
                accepted,
            } => write!(f, "short write: {accepted} of {requested} bytes accepted"),
        }
    }
}

/// Issues fixed-size register reads and writes against one device on
/// the shared bus.
pub struct SensorBus<T> {
    transport: T,
    device: u8,
}

impl<T: BusTransport> SensorBus<T> {
    pub fn new(transport: T, device: u8) -> Self {
        Self { transport, device }
    }

    /// Bus address this layer transacts with.
    pub fn device(&self) -> u8 {
        self.device
    }

    /// Reads `buffer.len()` consecutive registers starting at
    /// `register`.
    ///
    /// Bus ownership is retained across the addressing/data boundary
    /// (repeated start); the device only returns a consistent
    /// multi-register burst when the two phases form one transaction.
    pub fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        self.transport.begin(self.device);
        if self.transport.write(&[register]) != 1 {
            return Err(BusError::Addressing);
        }
        let status = self.transport.end(true);
        if status != 0 {
            return Err(BusError::Transaction(status));
        }

        let available = self.transport.request(self.device, buffer.len(), true);
        if available < buffer.len() {
            return Err(BusError::ShortRead {
                requested: buffer.len(),
                available,
            });
        }
        for slot in buffer.iter_mut() {
            *slot = self.transport.read_byte();
        }
        Ok(())
    }

    /// Writes `bytes` to consecutive registers starting at `register`.
    pub fn write_registers(&mut self, register: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.transport.begin(self.device);
        if self.transport.write(&[register]) != 1 {
            return Err(BusError::Addressing);
        }

        let accepted = self.transport.write(bytes);
        if accepted < bytes.len() {
            return Err(BusError::ShortWrite {
                requested: bytes.len(),
                accepted,
            });
        }

        let status = self.transport.end(false);
        if status != 0 {
            return Err(BusError::Transaction(status));
        }
        Ok(())
    }

    /// Writes a single register value.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        self.write_registers(register, &[value])
    }

    /// Destroys the layer and hands the transport back.
    pub fn release(self) -> T {
        self.transport
    }
}
