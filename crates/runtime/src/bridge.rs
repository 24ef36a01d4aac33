//! Bridge process management.
//!
//! The bridge is an external executable that automates the enterprise
//! WeChat client and speaks the bridge protocol on its stdio. This module
//! locates, launches, and terminates that process.

use std::path::{Path, PathBuf};

use tokio::process::{Child, Command};

use crate::error::{Error, Result};

/// Environment variable pointing at the bridge executable.
pub const BRIDGE_ENV: &str = "WECOM_BRIDGE";

/// Default executable name looked up on PATH.
pub const BRIDGE_EXE: &str = "wecom-bridge";

/// Manages the bridge child process.
#[derive(Debug)]
pub struct BridgeServer {
    /// The bridge child process.
    ///
    /// Public so the session can take the stdio pipes for the transport.
    pub process: Child,
}

impl BridgeServer {
    /// Resolves the bridge executable: explicit override, then the
    /// `WECOM_BRIDGE` environment variable, then PATH lookup.
    pub fn resolve_executable(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(BRIDGE_ENV) {
            return PathBuf::from(path);
        }
        PathBuf::from(BRIDGE_EXE)
    }

    /// Launches the bridge process with piped stdio.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BridgeNotFound`] if the executable cannot be found
    /// and [`Error::LaunchFailed`] if the process fails to start or exits
    /// immediately.
    pub async fn launch(executable: Option<&Path>) -> Result<Self> {
        let exe = Self::resolve_executable(executable);

        let mut cmd = Command::new(&exe);
        cmd.stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::BridgeNotFound
            } else {
                Error::LaunchFailed(format!("Failed to spawn {}: {e}", exe.display()))
            }
        })?;

        // Give the process a moment, then check it did not die on startup.
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(Error::LaunchFailed(format!(
                    "Bridge exited immediately with status: {status}"
                )));
            }
            Ok(None) => {}
            Err(e) => {
                return Err(Error::LaunchFailed(format!(
                    "Failed to check bridge status: {e}"
                )));
            }
        }

        Ok(Self { process: child })
    }

    /// Shuts the bridge down, waiting briefly for it to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        self.process
            .kill()
            .await
            .map_err(|e| Error::LaunchFailed(format!("Failed to kill bridge: {e}")))?;
        let _ = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            self.process.wait(),
        )
        .await;
        Ok(())
    }

    /// Force-kills the bridge without waiting.
    pub fn start_kill(&mut self) {
        if let Err(e) = self.process.start_kill() {
            tracing::warn!("Failed to kill bridge process: {e}");
        }
    }
}
