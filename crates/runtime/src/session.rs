//! Typed session facade over the bridge connection.
//!
//! [`Client`] is the seam between the bot and the external client library:
//! everything the bot needs from the enterprise WeChat client goes through
//! this trait, so tests can substitute a recording mock. [`Session`] is the
//! live implementation, mapping each call to a named bridge method.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use wecom_protocol::{
    CdnDescriptor, Contact, ContactList, DownloadType, LoginInfo, MemberList, Push, RoomList,
};

use crate::bridge::BridgeServer;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::{PipeTransport, TransportParts};

/// Operations the bot needs from the external messaging client.
///
/// Mirrors the automation library surface: session lifecycle, directory
/// fetches, CDN download, and the seven send operations. All failures are
/// surfaced as [`Error`]; the bot layer decides how to degrade.
#[async_trait]
pub trait Client: Send + Sync {
    /// Opens the client, optionally in automation ("smart") mode.
    async fn open(&self, smart: bool) -> Result<()>;

    /// Blocks until the operator has completed login, up to `timeout`.
    async fn wait_login(&self, timeout: Duration) -> Result<()>;

    /// Fetches the authenticated operator's identity.
    async fn login_info(&self) -> Result<LoginInfo>;

    /// Fetches one page of rooms.
    async fn rooms(&self, page_num: u32, page_size: u32) -> Result<RoomList>;

    /// Fetches one page of external contacts.
    async fn contacts(&self, page_num: u32, page_size: u32) -> Result<ContactList>;

    /// Fetches one page of a single room's member list.
    async fn room_members(
        &self,
        conversation_id: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<MemberList>;

    /// Fetches detail for a single contact.
    async fn contact_detail(&self, user_id: &str) -> Result<Contact>;

    /// Downloads media content from the CDN to a local path.
    async fn cdn_download(
        &self,
        cdn: &CdnDescriptor,
        download_type: DownloadType,
        save_path: &Path,
    ) -> Result<()>;

    async fn send_text(&self, conversation_id: &str, content: &str) -> Result<()>;
    async fn send_image(&self, conversation_id: &str, file_path: &Path) -> Result<()>;
    async fn send_file(&self, conversation_id: &str, file_path: &Path) -> Result<()>;
    async fn send_video(&self, conversation_id: &str, file_path: &Path) -> Result<()>;

    /// Sends a group text message @-mentioning the given user ids.
    async fn send_room_at(
        &self,
        conversation_id: &str,
        content: &str,
        at_list: &[String],
    ) -> Result<()>;

    /// Sends a link card (title, description, url, preview image url).
    async fn send_link_card(
        &self,
        conversation_id: &str,
        title: &str,
        desc: &str,
        url: &str,
        image_url: &str,
    ) -> Result<()>;

    /// Sends a contact card for the given user.
    async fn send_card(&self, conversation_id: &str, user_id: &str) -> Result<()>;

    /// Closes the client session. Best-effort.
    async fn close(&self) -> Result<()>;
}

/// Live session over a bridge connection.
pub struct Session {
    connection: Arc<Connection>,
    bridge: Mutex<Option<BridgeServer>>,
}

impl Session {
    /// Launches the bridge process and connects to it.
    ///
    /// Returns the session and the stream of inbound message pushes.
    pub async fn launch(
        executable: Option<&Path>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Push>)> {
        tracing::debug!("launching WeCom bridge");
        let mut bridge = BridgeServer::launch(executable).await?;

        let stdin = bridge
            .process
            .stdin
            .take()
            .ok_or_else(|| Error::ConnectionFailed("Failed to get bridge stdin".to_string()))?;
        let stdout = bridge
            .process
            .stdout
            .take()
            .ok_or_else(|| Error::ConnectionFailed("Failed to get bridge stdout".to_string()))?;

        let (transport, message_rx) = PipeTransport::new(stdin, stdout);
        let parts = transport.into_transport_parts(message_rx);
        let (session, pushes) = Self::from_transport_parts(parts);
        *session.bridge.lock() = Some(bridge);
        Ok((session, pushes))
    }

    /// Connects a session over pre-built transport parts.
    ///
    /// Used by tests to drive a session through in-memory pipes; `launch`
    /// uses it with the bridge's stdio.
    pub fn from_transport_parts(parts: TransportParts) -> (Self, mpsc::UnboundedReceiver<Push>) {
        let connection = Arc::new(Connection::new(parts));
        let pushes = connection
            .take_pushes()
            .expect("fresh connection always has a push stream");

        let conn_for_loop = Arc::clone(&connection);
        tokio::spawn(async move {
            conn_for_loop.run().await;
        });

        (
            Self {
                connection,
                bridge: Mutex::new(None),
            },
            pushes,
        )
    }

    /// Sends a typed method call to the bridge.
    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
        let params_value = serde_json::to_value(params)?;
        let response = self.connection.call(method, params_value).await?;
        serde_json::from_value(response).map_err(Into::into)
    }

    /// Like [`call`](Self::call), discarding the response payload.
    async fn call_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let _: Value = self.call(method, params).await?;
        Ok(())
    }
}

#[async_trait]
impl Client for Session {
    async fn open(&self, smart: bool) -> Result<()> {
        self.call_no_result("open", json!({ "smart": smart })).await
    }

    async fn wait_login(&self, timeout: Duration) -> Result<()> {
        // The bridge answers this request only once login has completed.
        tokio::time::timeout(timeout, self.call_no_result("wait_login", json!({})))
            .await
            .map_err(|_| Error::Timeout("Timed out waiting for login".to_string()))?
    }

    async fn login_info(&self) -> Result<LoginInfo> {
        self.call("get_login_info", json!({})).await
    }

    async fn rooms(&self, page_num: u32, page_size: u32) -> Result<RoomList> {
        self.call(
            "get_rooms",
            json!({ "page_num": page_num, "page_size": page_size }),
        )
        .await
    }

    async fn contacts(&self, page_num: u32, page_size: u32) -> Result<ContactList> {
        self.call(
            "get_external_contacts",
            json!({ "page_num": page_num, "page_size": page_size }),
        )
        .await
    }

    async fn room_members(
        &self,
        conversation_id: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<MemberList> {
        self.call(
            "get_room_members",
            json!({
                "conversation_id": conversation_id,
                "page_num": page_num,
                "page_size": page_size,
            }),
        )
        .await
    }

    async fn contact_detail(&self, user_id: &str) -> Result<Contact> {
        self.call("get_contact_detail", json!({ "user_id": user_id }))
            .await
    }

    async fn cdn_download(
        &self,
        cdn: &CdnDescriptor,
        download_type: DownloadType,
        save_path: &Path,
    ) -> Result<()> {
        self.call_no_result(
            "c2c_cdn_download",
            json!({
                "file_id": cdn.file_id,
                "aes_key": cdn.aes_key,
                "file_size": cdn.file_size,
                "file_type": download_type,
                "save_path": save_path.to_string_lossy(),
            }),
        )
        .await
    }

    async fn send_text(&self, conversation_id: &str, content: &str) -> Result<()> {
        self.call_no_result(
            "send_text",
            json!({ "conversation_id": conversation_id, "content": content }),
        )
        .await
    }

    async fn send_image(&self, conversation_id: &str, file_path: &Path) -> Result<()> {
        self.call_no_result(
            "send_image",
            json!({
                "conversation_id": conversation_id,
                "file_path": file_path.to_string_lossy(),
            }),
        )
        .await
    }

    async fn send_file(&self, conversation_id: &str, file_path: &Path) -> Result<()> {
        self.call_no_result(
            "send_file",
            json!({
                "conversation_id": conversation_id,
                "file_path": file_path.to_string_lossy(),
            }),
        )
        .await
    }

    async fn send_video(&self, conversation_id: &str, file_path: &Path) -> Result<()> {
        self.call_no_result(
            "send_video",
            json!({
                "conversation_id": conversation_id,
                "file_path": file_path.to_string_lossy(),
            }),
        )
        .await
    }

    async fn send_room_at(
        &self,
        conversation_id: &str,
        content: &str,
        at_list: &[String],
    ) -> Result<()> {
        self.call_no_result(
            "send_room_at_msg",
            json!({
                "conversation_id": conversation_id,
                "content": content,
                "at_list": at_list,
            }),
        )
        .await
    }

    async fn send_link_card(
        &self,
        conversation_id: &str,
        title: &str,
        desc: &str,
        url: &str,
        image_url: &str,
    ) -> Result<()> {
        self.call_no_result(
            "send_link_card",
            json!({
                "conversation_id": conversation_id,
                "title": title,
                "desc": desc,
                "url": url,
                "image_url": image_url,
            }),
        )
        .await
    }

    async fn send_card(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.call_no_result(
            "send_card",
            json!({ "conversation_id": conversation_id, "user_id": user_id }),
        )
        .await
    }

    async fn close(&self) -> Result<()> {
        // Ignore request failures: the bridge may already be gone.
        if let Err(e) = self.call_no_result("close", json!({})).await {
            tracing::debug!("close request failed: {e}");
        }
        let bridge = self.bridge.lock().take();
        if let Some(bridge) = bridge {
            bridge.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut bridge) = self.bridge.lock().take() {
            tracing::debug!("drop: force-killing bridge process");
            bridge.start_kill();
        }
    }
}
