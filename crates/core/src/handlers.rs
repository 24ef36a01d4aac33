//! Per-category message handlers and the handler table.
//!
//! Handlers are registered once at startup in an explicit table keyed by
//! [`MessageKind`]; the dispatch loop looks the handler up per push. Each
//! handler is a pure reaction: logging, at most one download or one echo
//! send, and (for membership changes) a cache refresh. No retries, no
//! progress tracking.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use wecom_protocol::{DownloadType, InboundMessage, MessageKind, is_group_conversation};

use crate::bot::BotShared;
use crate::download;

/// Boxed async handler future.
pub(crate) type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handler function: shared bot state + validated message.
pub(crate) type HandlerFn = Arc<dyn Fn(Arc<BotShared>, InboundMessage) -> HandlerFuture + Send + Sync>;

/// Handler table, built once at startup.
pub(crate) type HandlerTable = HashMap<MessageKind, HandlerFn>;

/// Builds the default table covering all six inbound categories.
pub(crate) fn default_table() -> HandlerTable {
    let mut table: HandlerTable = HashMap::new();
    table.insert(
        MessageKind::Text,
        Arc::new(|shared, message| Box::pin(on_text(shared, message))),
    );
    table.insert(
        MessageKind::Image,
        Arc::new(|shared, message| Box::pin(on_image(shared, message))),
    );
    table.insert(
        MessageKind::File,
        Arc::new(|shared, message| Box::pin(on_file(shared, message))),
    );
    table.insert(
        MessageKind::Voice,
        Arc::new(|shared, message| Box::pin(on_voice(shared, message))),
    );
    table.insert(
        MessageKind::Link,
        Arc::new(|shared, message| Box::pin(on_link(shared, message))),
    );
    table.insert(
        MessageKind::RoomMemberChange,
        Arc::new(|shared, message| Box::pin(on_room_member_change(shared, message))),
    );
    table
}

/// Text: log, and echo direct messages back. Group messages and
/// self-authored echoes are never replied to.
async fn on_text(shared: Arc<BotShared>, message: InboundMessage) {
    let InboundMessage::Text(text) = message else {
        return;
    };

    if shared.is_self(&text.sender) {
        return;
    }

    let is_group = is_group_conversation(&text.conversation_id);
    tracing::info!(
        sender = %text.sender,
        conversation = %text.conversation_id,
        group = is_group,
        "received text: {}",
        text.content
    );

    if !is_group {
        let reply = format!("收到消息: {}", text.content);
        if let Err(e) = shared.client.send_text(&text.conversation_id, &reply).await {
            tracing::warn!("echo reply failed: {e}");
        }
    }
}

/// Image: single fire-and-forget CDN download to `<dir>/<file_id>.jpg`.
async fn on_image(shared: Arc<BotShared>, message: InboundMessage) {
    let InboundMessage::Image(image) = message else {
        return;
    };
    let save_path = download::image_path(&shared.config.downloads_dir, &image.cdn.file_id);
    tracing::info!(file_id = %image.cdn.file_id, path = %save_path.display(), "downloading image");
    if let Err(e) = shared
        .client
        .cdn_download(&image.cdn, DownloadType::Image, &save_path)
        .await
    {
        tracing::warn!("image download failed: {e}");
    }
}

/// File: download to `<dir>/<file_name>`, keeping the original name.
async fn on_file(shared: Arc<BotShared>, message: InboundMessage) {
    let InboundMessage::File(file) = message else {
        return;
    };
    let save_path = download::file_path(&shared.config.downloads_dir, &file.file_name);
    tracing::info!(file = %file.file_name, path = %save_path.display(), "downloading file");
    if let Err(e) = shared
        .client
        .cdn_download(&file.cdn(), DownloadType::File, &save_path)
        .await
    {
        tracing::warn!("file download failed: {e}");
    }
}

/// Voice: download to `<dir>/<file_id>.silk`.
async fn on_voice(shared: Arc<BotShared>, message: InboundMessage) {
    let InboundMessage::Voice(voice) = message else {
        return;
    };
    let save_path = download::voice_path(&shared.config.downloads_dir, &voice.cdn.file_id);
    tracing::info!(file_id = %voice.cdn.file_id, path = %save_path.display(), "downloading voice clip");
    if let Err(e) = shared
        .client
        .cdn_download(&voice.cdn, DownloadType::Voice, &save_path)
        .await
    {
        tracing::warn!("voice download failed: {e}");
    }
}

/// Link cards are only logged.
async fn on_link(shared: Arc<BotShared>, message: InboundMessage) {
    let _ = shared;
    let InboundMessage::Link(link) = message else {
        return;
    };
    tracing::info!(
        title = %link.cdn.title,
        desc = %link.cdn.desc,
        url = %link.cdn.url,
        "received link card"
    );
}

/// Membership change: log the changed members, then refresh the member
/// lists of every cached room. Intentionally non-incremental.
async fn on_room_member_change(shared: Arc<BotShared>, message: InboundMessage) {
    let InboundMessage::RoomMemberChange(change) = message else {
        return;
    };
    for member in &change.member_list {
        tracing::info!(
            room = %change.conversation_id,
            "room member changed: {}({})",
            member.name,
            member.user_id
        );
    }
    shared
        .directory
        .refresh_members(shared.client.as_ref(), shared.config.page_size)
        .await;
}
