//! HTTP API bridge for NAD amplifier serial control.
//!
//! The [`transport`] module owns the serial connection, [`client`] composes
//! the transport with the command codec from `nad-protocol` into typed
//! amplifier operations, and [`web`] adapts HTTP GET/PATCH semantics onto
//! that vocabulary.

pub mod client;
pub mod logging;
pub mod transport;
pub mod web;

pub use client::AmpClient;
pub use transport::{AmpError, Transport};
