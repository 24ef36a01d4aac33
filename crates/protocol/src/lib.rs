//! Wire types for the WeCom bridge protocol.
//!
//! The bridge is an external process that automates the enterprise WeChat
//! client. This crate defines the JSON shapes exchanged with it: request and
//! response envelopes, unsolicited message pushes, the typed payload for each
//! inbound message category, and the directory records (rooms, contacts,
//! members) returned by bulk fetches.
//!
//! No I/O lives here; framing and transport are in `wecom-runtime`.

mod envelope;
mod message;
mod records;

pub use envelope::{ErrorPayload, Message, Push, Request, Response};
pub use message::{
    CdnDescriptor, DownloadType, FilePayload, ImagePayload, InboundMessage, LinkCard, LinkPayload,
    MessageKind, RoomMemberChangePayload, TextPayload, VoicePayload,
};
pub use records::{
    Contact, ContactList, LoginInfo, Member, MemberList, Room, RoomList, DEFAULT_PAGE_SIZE,
};

/// Marker distinguishing group conversations from direct ones.
///
/// Group conversation ids carry an `R:` segment (e.g. `R:1070...`); direct
/// chat ids are bare user-id pairs.
pub const GROUP_CONVERSATION_MARKER: &str = "R:";

/// Returns `true` if the conversation id denotes a group chat.
pub fn is_group_conversation(conversation_id: &str) -> bool {
    conversation_id.contains(GROUP_CONVERSATION_MARKER)
}
