//! wecom: a bot client for enterprise WeChat, driven through an external
//! client automation bridge.
//!
//! The heavy lifting (login flow, wire protocol, encryption, CDN transfer)
//! lives in the bridge process. This crate is the orchestration layer on
//! top: it opens a session, waits for login, keeps an in-memory directory
//! of rooms and contacts, dispatches inbound messages to per-category
//! handlers, and exposes a send facade.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wecom::{Bot, BotConfig};
//! use wecom_runtime::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (session, pushes) = Session::launch(None).await?;
//!     let bot = Bot::new(Arc::new(session), BotConfig::default());
//!     bot.start(pushes).await?;
//!
//!     // The bot now echoes direct messages and downloads inbound media.
//!     tokio::signal::ctrl_c().await?;
//!     bot.stop().await;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod directory;
pub mod download;
pub mod handlers;

#[cfg(test)]
mod testutil;

pub use bot::Bot;
pub use config::BotConfig;
pub use directory::Directory;

// Re-export the protocol and runtime surface callers need.
pub use wecom_protocol as protocol;
pub use wecom_runtime::{Client, Error, Result, Session};
