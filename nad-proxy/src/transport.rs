//! Serial transport for the amplifier connection.
//!
//! Owns the open serial channel and frames writes and reads: a frame is
//! written in one operation, and a read blocks until the CR terminator
//! arrives. The line settings are dictated by the device specification
//! ("RS-232 Protocol for NAD Products": 115200 bps, 8 data bits, 1 stop bit,
//! no parity, no flow control) and are deliberately not configurable.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use thiserror::Error;

use nad_protocol::{ProtocolError, CR};

/// Fixed line speed from the device specification.
pub const BAUD_RATE: u32 = 115_200;

/// The device contract has no read timeout: a non-responding amplifier
/// blocks the caller indefinitely. serialport requires a finite timeout, so
/// use one far beyond any realistic wait.
const NO_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24);

/// Errors from the serial transport and the amplifier client.
#[derive(Error, Debug)]
pub enum AmpError {
    /// Serial device could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Read or write on the open connection failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame was only partially written. Short writes are not retried.
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The connection reached end of stream before a terminator arrived.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Command or reply violated the wire protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Volume adjustment was requested but is disabled.
    #[error("Volume adjustment is disabled")]
    VolumeDisabled,
}

/// The raw byte channel the transport runs over. Implemented by the real
/// serial port and by in-memory fakes in tests.
pub trait Port: Read + Write + Send {}

impl<T: Read + Write + Send> Port for T {}

/// An open connection to the amplifier.
///
/// Only one request may be in flight at a time; callers serialize the
/// send/read pair externally (see [`crate::client::AmpClient`]).
pub struct Transport {
    port: Box<dyn Port>,
}

impl Transport {
    /// Open the serial device at the fixed protocol settings.
    pub fn open(device: &str) -> Result<Transport, AmpError> {
        let port = serialport::new(device, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(NO_TIMEOUT)
            .open()?;
        Ok(Transport {
            port: Box::new(port),
        })
    }

    /// Wrap an already-open byte channel. Injection seam for tests.
    pub fn from_port(port: Box<dyn Port>) -> Transport {
        Transport { port }
    }

    /// Write the full frame in one operation. A short write is an error.
    pub fn send(&mut self, frame: &[u8]) -> Result<(), AmpError> {
        let written = self.port.write(frame)?;
        if written != frame.len() {
            return Err(AmpError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        self.port.flush()?;
        Ok(())
    }

    /// Block until a CR byte is observed, then return everything read,
    /// terminator included.
    pub fn read_until_terminator(&mut self) -> Result<Vec<u8>, AmpError> {
        let mut reply = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = self.port.read(&mut byte)?;
            if n == 0 {
                return Err(AmpError::ConnectionClosed);
            }
            reply.push(byte[0]);
            if byte[0] == CR {
                return Ok(reply);
            }
        }
    }
}
