//! Bot configuration.

use std::path::PathBuf;
use std::time::Duration;

use wecom_protocol::DEFAULT_PAGE_SIZE;

/// Configuration for a [`Bot`](crate::Bot).
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Open the client in automation ("smart") mode.
    pub smart: bool,
    /// Directory inbound media is downloaded into.
    pub downloads_dir: PathBuf,
    /// Page size for room and contact fetches. Only the first page is
    /// fetched.
    pub page_size: u32,
    /// How long to wait for the operator to complete login.
    pub login_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            smart: true,
            downloads_dir: PathBuf::from("downloads"),
            page_size: DEFAULT_PAGE_SIZE,
            login_timeout: Duration::from_secs(300),
        }
    }
}
