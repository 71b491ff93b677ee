//! Control interface between the driver daemon and rendering clients
//!
//! - [`protocol`] - request/response messages and framing
//! - [`server`] - the daemon that owns the device session
//! - [`client`] - [`client::Session`], used by rendering processes

pub mod client;
pub mod protocol;
pub mod server;

pub use client::Session;
pub use protocol::{Request, Response};
pub use server::{Daemon, ServerConfig};
