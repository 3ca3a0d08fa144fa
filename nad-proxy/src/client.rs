//! Amplifier client: typed operations over the serial transport.

use std::sync::Mutex;

use log::debug;

use nad_protocol::{parse_reply, render, Command, Operator, Reply, Source};

use crate::transport::{AmpError, Transport};

/// Client for a single amplifier connection.
///
/// The transport allows one outstanding request; the mutex is held across
/// the full write-then-blocking-read cycle so concurrent callers serialize
/// here. There is no timeout: a blocked read holds the lock until the device
/// responds.
pub struct AmpClient {
    transport: Mutex<Transport>,
    enable_volume: bool,
}

impl AmpClient {
    /// Open the serial device and build a client around it.
    pub fn open(device: &str, enable_volume: bool) -> Result<AmpClient, AmpError> {
        Ok(AmpClient::new(Transport::open(device)?, enable_volume))
    }

    /// Build a client around an already-open transport.
    pub fn new(transport: Transport, enable_volume: bool) -> AmpClient {
        AmpClient {
            transport: Mutex::new(transport),
            enable_volume,
        }
    }

    /// Whether volume-affecting operations are permitted.
    pub fn volume_enabled(&self) -> bool {
        self.enable_volume
    }

    /// Validate, render and send a command, then read and parse the reply.
    ///
    /// Transport and codec failures surface unchanged. Volume-changing
    /// commands are rejected before any I/O when volume adjustment is
    /// disabled.
    pub fn send_cmd(&self, cmd: Command) -> Result<Reply, AmpError> {
        if !self.enable_volume && cmd.adjusts_volume() {
            return Err(AmpError::VolumeDisabled);
        }
        if !cmd.valid() {
            return Err(nad_protocol::ProtocolError::InvalidCommand(cmd.to_string()).into());
        }
        // Source is a closed enumeration; unknown values fail here instead
        // of being forwarded to the device.
        if cmd.variable.eq_ignore_ascii_case("source") && cmd.operator == Operator::Equals {
            cmd.value.parse::<Source>()?;
        }
        let frame = render(&cmd);
        debug!("Sending command: {}", cmd);
        let raw = self.transact(&frame)?;
        let reply = parse_reply(&raw)?;
        debug!("Received reply: {}{}{}", reply.variable, reply.operator, reply.value);
        Ok(reply)
    }

    /// Send a raw command string, bypassing the codec. The CR terminator is
    /// appended when missing. The reply is returned with its terminator
    /// stripped.
    pub fn send_raw(&self, cmd: &str) -> Result<Vec<u8>, AmpError> {
        let mut frame = cmd.as_bytes().to_vec();
        if frame.last() != Some(&nad_protocol::CR) {
            frame.push(nad_protocol::CR);
        }
        let mut raw = self.transact(&frame)?;
        if raw.last() == Some(&nad_protocol::CR) {
            raw.pop();
        }
        Ok(raw)
    }

    // Holds the lock across the write + blocking read pair.
    fn transact(&self, frame: &[u8]) -> Result<Vec<u8>, AmpError> {
        let mut transport = self
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transport.send(frame)?;
        transport.read_until_terminator()
    }

    /// Switch the amplifier on or off.
    pub fn power(&self, on: bool) -> Result<Reply, AmpError> {
        self.send_cmd(Command::toggle("Power", on))
    }

    /// Mute or unmute.
    pub fn mute(&self, on: bool) -> Result<Reply, AmpError> {
        self.send_cmd(Command::toggle("Mute", on))
    }

    /// Enable or disable speaker group A.
    pub fn speaker_a(&self, on: bool) -> Result<Reply, AmpError> {
        self.send_cmd(Command::toggle("SpeakerA", on))
    }

    /// Enable or disable speaker group B.
    pub fn speaker_b(&self, on: bool) -> Result<Reply, AmpError> {
        self.send_cmd(Command::toggle("SpeakerB", on))
    }

    /// Enable or disable the Tape1 monitor loop.
    pub fn tape1(&self, on: bool) -> Result<Reply, AmpError> {
        self.send_cmd(Command::toggle("Tape1", on))
    }

    /// Select an input source.
    pub fn source(&self, source: Source) -> Result<Reply, AmpError> {
        self.send_cmd(Command::set("Source", source.as_str()))
    }

    /// Query the device model.
    pub fn model(&self) -> Result<String, AmpError> {
        let reply = self.send_cmd(Command::query("Model"))?;
        Ok(reply.value)
    }

    /// Step the volume up. Policy check precedes command construction.
    pub fn volume_up(&self) -> Result<Reply, AmpError> {
        if !self.enable_volume {
            return Err(AmpError::VolumeDisabled);
        }
        self.send_cmd(Command::step("Volume", true))
    }

    /// Step the volume down. Policy check precedes command construction.
    pub fn volume_down(&self) -> Result<Reply, AmpError> {
        if !self.enable_volume {
            return Err(AmpError::VolumeDisabled);
        }
        self.send_cmd(Command::step("Volume", false))
    }
}
