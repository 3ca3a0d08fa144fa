//! RS-232 control protocol for NAD amplifiers.
//!
//! This crate defines the line-oriented command protocol spoken by NAD
//! amplifiers over a serial link, as described in "RS-232 Protocol for NAD
//! Products".
//!
//! # Frame Format
//!
//! ```text
//! +----------+----------+---------+------+
//! | Variable | Operator | Value   | CR   |
//! | ASCII    | = + - ?  | ASCII   | 0x0D |
//! +----------+----------+---------+------+
//! ```
//!
//! The value is present only for `=` commands. Replies use the identical
//! framing: the amplifier echoes the variable and operator it executed,
//! followed by the resulting value.
//!
//! # Example
//!
//! ```rust
//! use nad_protocol::{render, parse_reply, Command, Operator};
//!
//! // Encode a command
//! let cmd = Command::query("Power");
//! let frame = render(&cmd);
//! assert_eq!(&frame[..], b"Power?\r");
//!
//! // Decode a reply
//! let reply = parse_reply(b"Power=On\r").unwrap();
//! assert_eq!(reply.variable, "Power");
//! assert_eq!(reply.operator, Operator::Equals);
//! assert_eq!(reply.value, "On");
//! ```

pub mod codec;
pub mod error;
pub mod types;

pub use codec::{parse_reply, render, CR};
pub use error::ProtocolError;
pub use types::{Command, Operator, Reply, Source};
