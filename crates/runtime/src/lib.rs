//! Runtime layer for the WeCom bridge.
//!
//! Owns everything between the typed bot API and the external client
//! automation bridge process:
//!
//! - [`BridgeServer`]: bridge process lifecycle (spawn, shutdown, kill)
//! - [`PipeTransport`]: length-prefixed JSON framing over the bridge's stdio
//! - [`Connection`]: request/response correlation and push delivery
//! - [`Session`] / [`Client`]: the typed seam the bot programs against

pub mod bridge;
pub mod connection;
pub mod error;
pub mod session;
pub mod transport;

pub use bridge::BridgeServer;
pub use connection::Connection;
pub use error::{Error, Result};
pub use session::{Client, Session};
pub use transport::{PipeTransport, TransportParts};
