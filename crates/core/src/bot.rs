//! The bot: lifecycle controller, dispatch loop, and send facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::path::Path;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use wecom_protocol::{Contact, InboundMessage, LoginInfo, MessageKind, Push};
use wecom_runtime::{Client, Result};

use crate::config::BotConfig;
use crate::directory::Directory;
use crate::handlers::{self, HandlerTable};

/// State shared between the bot handle, the dispatch task, and handlers.
pub(crate) struct BotShared {
    pub(crate) client: Arc<dyn Client>,
    pub(crate) directory: Directory,
    pub(crate) running: AtomicBool,
    pub(crate) login: Mutex<Option<LoginInfo>>,
    pub(crate) config: BotConfig,
}

impl BotShared {
    /// Returns `true` if `sender` is the logged-in operator.
    pub(crate) fn is_self(&self, sender: &str) -> bool {
        self.login
            .lock()
            .as_ref()
            .is_some_and(|info| info.user_id == sender)
    }
}

/// A WeCom bot over an external client session.
///
/// Owns the directory cache and the running flag; no ambient globals. The
/// dispatch task consumes the push stream one message at a time, so handler
/// execution (and therefore cache mutation) is serialized.
pub struct Bot {
    shared: Arc<BotShared>,
    handlers: Mutex<Option<Arc<HandlerTable>>>,
}

impl Bot {
    /// Creates a bot over the given client. Call [`start`](Self::start) to
    /// bring it up.
    pub fn new(client: Arc<dyn Client>, config: BotConfig) -> Self {
        Self {
            shared: Arc::new(BotShared {
                client,
                directory: Directory::new(),
                running: AtomicBool::new(false),
                login: Mutex::new(None),
                config,
            }),
            handlers: Mutex::new(None),
        }
    }

    /// Starts the bot: opens the client, waits for login, registers the
    /// handler table, populates the directory cache, and arms dispatch.
    ///
    /// Open failure is reported, not retried; the caller decides. Pushes
    /// arriving before startup completes are silently dropped.
    pub async fn start(&self, mut pushes: mpsc::UnboundedReceiver<Push>) -> Result<()> {
        let shared = &self.shared;

        shared.client.open(shared.config.smart).await?;

        tracing::info!("waiting for login");
        shared.client.wait_login(shared.config.login_timeout).await?;

        let info = shared.client.login_info().await?;
        tracing::info!(user = %info.username, "login complete");
        *shared.login.lock() = Some(info);

        let table = Arc::new(handlers::default_table());
        *self.handlers.lock() = Some(Arc::clone(&table));

        // Arm dispatch before populating the cache; the running flag keeps
        // events dropped until population completes.
        let dispatch_shared = Arc::clone(shared);
        tokio::spawn(async move {
            while let Some(push) = pushes.recv().await {
                dispatch_push(&table, &dispatch_shared, push).await;
            }
            tracing::debug!("push stream closed, dispatch loop exiting");
        });

        shared
            .directory
            .refresh_rooms(shared.client.as_ref(), shared.config.page_size)
            .await;
        shared
            .directory
            .refresh_contacts(shared.client.as_ref(), shared.config.page_size)
            .await;
        shared
            .directory
            .refresh_members(shared.client.as_ref(), shared.config.page_size)
            .await;

        shared.running.store(true, Ordering::SeqCst);
        tracing::info!(
            rooms = shared.directory.room_count(),
            contacts = shared.directory.contact_count(),
            "bot started"
        );
        Ok(())
    }

    /// Stops the bot. Idempotent: the first call flips the running flag and
    /// closes the session best-effort; later calls are no-ops.
    pub async fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("stopping bot");
        if let Err(e) = self.shared.client.close().await {
            tracing::warn!("session close failed: {e}");
        }
    }

    /// Returns `true` after a successful start and before stop.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// The operator identity captured at login, if logged in.
    pub fn login_info(&self) -> Option<LoginInfo> {
        self.shared.login.lock().clone()
    }

    /// The directory cache.
    pub fn directory(&self) -> &Directory {
        &self.shared.directory
    }

    /// Fetches contact detail from the client; `None` on failure.
    pub async fn contact_detail(&self, user_id: &str) -> Option<Contact> {
        match self.shared.client.contact_detail(user_id).await {
            Ok(contact) => Some(contact),
            Err(e) => {
                tracing::warn!(user = %user_id, "contact detail fetch failed: {e}");
                None
            }
        }
    }

    // Send facade: thin pass-throughs returning a success indicator. No
    // validation, batching, or rate limiting happens at this layer.

    pub async fn send_text(&self, conversation_id: &str, content: &str) -> bool {
        self.report(
            self.shared.client.send_text(conversation_id, content).await,
            "send_text",
        )
    }

    pub async fn send_image(&self, conversation_id: &str, file_path: &Path) -> bool {
        self.report(
            self.shared.client.send_image(conversation_id, file_path).await,
            "send_image",
        )
    }

    pub async fn send_file(&self, conversation_id: &str, file_path: &Path) -> bool {
        self.report(
            self.shared.client.send_file(conversation_id, file_path).await,
            "send_file",
        )
    }

    pub async fn send_video(&self, conversation_id: &str, file_path: &Path) -> bool {
        self.report(
            self.shared.client.send_video(conversation_id, file_path).await,
            "send_video",
        )
    }

    pub async fn send_room_at(
        &self,
        conversation_id: &str,
        content: &str,
        at_list: &[String],
    ) -> bool {
        self.report(
            self.shared
                .client
                .send_room_at(conversation_id, content, at_list)
                .await,
            "send_room_at",
        )
    }

    pub async fn send_link_card(
        &self,
        conversation_id: &str,
        title: &str,
        desc: &str,
        url: &str,
        image_url: &str,
    ) -> bool {
        self.report(
            self.shared
                .client
                .send_link_card(conversation_id, title, desc, url, image_url)
                .await,
            "send_link_card",
        )
    }

    pub async fn send_card(&self, conversation_id: &str, user_id: &str) -> bool {
        self.report(
            self.shared.client.send_card(conversation_id, user_id).await,
            "send_card",
        )
    }

    fn report(&self, result: Result<()>, op: &str) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(op, "send failed: {e}");
                false
            }
        }
    }

    /// Routes one push through the handler table, as the dispatch task does.
    #[cfg(test)]
    pub(crate) async fn inject_push(&self, push: Push) {
        let table = self.handlers.lock().clone();
        if let Some(table) = table {
            dispatch_push(&table, &self.shared, push).await;
        }
    }
}

/// Routes a push: drop when not running, map the tag to a category,
/// validate the payload, and invoke the registered handler.
async fn dispatch_push(table: &HandlerTable, shared: &Arc<BotShared>, push: Push) {
    if !shared.running.load(Ordering::SeqCst) {
        return;
    }
    let Some(kind) = MessageKind::from_tag(push.kind) else {
        tracing::debug!(tag = push.kind, "unknown push tag ignored");
        return;
    };
    let message = match InboundMessage::parse(kind, push.data) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(tag = push.kind, "malformed push payload dropped: {e}");
            return;
        }
    };
    if let Some(handler) = table.get(&kind) {
        handler(Arc::clone(shared), message).await;
    }
}
