//! Inbound message categories and their typed payloads.
//!
//! The bridge delivers each chat message as a [`Push`](crate::Push) whose
//! `data` field is a category-dependent JSON object. [`InboundMessage::parse`]
//! validates that object into a typed variant at the dispatch boundary, so
//! handlers never see raw JSON.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::records::Member;

/// Inbound message category, with its numeric wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Plain text message.
    Text,
    /// Image message with a CDN descriptor.
    Image,
    /// File message with CDN fields inline.
    File,
    /// Voice message (silk-encoded) with a CDN descriptor.
    Voice,
    /// Link card message.
    Link,
    /// Room membership changed (members added or renamed).
    RoomMemberChange,
}

impl MessageKind {
    /// All six categories, in registration order.
    pub const ALL: [MessageKind; 6] = [
        MessageKind::Text,
        MessageKind::Image,
        MessageKind::File,
        MessageKind::Voice,
        MessageKind::Link,
        MessageKind::RoomMemberChange,
    ];

    /// Returns the numeric wire tag for this category.
    pub fn tag(self) -> u32 {
        match self {
            MessageKind::Text => 11041,
            MessageKind::Image => 11042,
            MessageKind::File => 11043,
            MessageKind::Voice => 11044,
            MessageKind::Link => 11045,
            MessageKind::RoomMemberChange => 11072,
        }
    }

    /// Maps a wire tag back to a category. Unknown tags return `None`.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            11041 => Some(MessageKind::Text),
            11042 => Some(MessageKind::Image),
            11043 => Some(MessageKind::File),
            11044 => Some(MessageKind::Voice),
            11045 => Some(MessageKind::Link),
            11072 => Some(MessageKind::RoomMemberChange),
            _ => None,
        }
    }
}

/// Metadata needed to fetch media content from the CDN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdnDescriptor {
    /// Opaque file identifier on the CDN.
    pub file_id: String,
    /// Decryption key for the transfer (opaque to this client).
    pub aes_key: String,
    /// Size of the file in bytes.
    pub file_size: u64,
}

/// Media type tag passed to the CDN download call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadType {
    Image,
    File,
    Voice,
}

impl DownloadType {
    /// Numeric tag expected by the bridge.
    pub fn tag(self) -> u32 {
        match self {
            DownloadType::Image => 3,
            DownloadType::File => 4,
            DownloadType::Voice => 34,
        }
    }
}

impl Serialize for DownloadType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.tag())
    }
}

/// Payload of a text message.
#[derive(Debug, Clone, Deserialize)]
pub struct TextPayload {
    /// User id of the sender.
    pub sender: String,
    /// Message text.
    #[serde(default)]
    pub content: String,
    /// Conversation the message arrived in.
    pub conversation_id: String,
}

/// Payload of an image message.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagePayload {
    pub conversation_id: String,
    #[serde(default)]
    pub sender: String,
    /// CDN descriptor for the image content.
    pub cdn: CdnDescriptor,
}

/// Payload of a file message. CDN fields arrive inline rather than nested.
#[derive(Debug, Clone, Deserialize)]
pub struct FilePayload {
    pub conversation_id: String,
    #[serde(default)]
    pub sender: String,
    pub file_id: String,
    pub aes_key: String,
    pub file_size: u64,
    /// Original file name, used for the local save path.
    pub file_name: String,
}

impl FilePayload {
    /// Assembles the inline CDN fields into a descriptor.
    pub fn cdn(&self) -> CdnDescriptor {
        CdnDescriptor {
            file_id: self.file_id.clone(),
            aes_key: self.aes_key.clone(),
            file_size: self.file_size,
        }
    }
}

/// Payload of a voice message.
#[derive(Debug, Clone, Deserialize)]
pub struct VoicePayload {
    pub conversation_id: String,
    #[serde(default)]
    pub sender: String,
    /// CDN descriptor for the silk-encoded audio.
    pub cdn: CdnDescriptor,
}

/// Link card contents.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkCard {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub url: String,
}

/// Payload of a link card message.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkPayload {
    pub conversation_id: String,
    #[serde(default)]
    pub sender: String,
    /// Card contents (the bridge nests them under `cdn`).
    pub cdn: LinkCard,
}

/// Payload of a room membership change.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomMemberChangePayload {
    pub conversation_id: String,
    /// Members added or changed. Replaces nothing by itself; the cache does
    /// a full member refresh on receipt.
    #[serde(default)]
    pub member_list: Vec<Member>,
}

/// A validated inbound message, one variant per category.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    Text(TextPayload),
    Image(ImagePayload),
    File(FilePayload),
    Voice(VoicePayload),
    Link(LinkPayload),
    RoomMemberChange(RoomMemberChangePayload),
}

impl InboundMessage {
    /// Validates a push payload into a typed message.
    ///
    /// Fails with the underlying serde error when required fields are
    /// missing or mistyped; the caller logs and drops such events.
    pub fn parse(kind: MessageKind, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            MessageKind::Text => InboundMessage::Text(serde_json::from_value(data)?),
            MessageKind::Image => InboundMessage::Image(serde_json::from_value(data)?),
            MessageKind::File => InboundMessage::File(serde_json::from_value(data)?),
            MessageKind::Voice => InboundMessage::Voice(serde_json::from_value(data)?),
            MessageKind::Link => InboundMessage::Link(serde_json::from_value(data)?),
            MessageKind::RoomMemberChange => {
                InboundMessage::RoomMemberChange(serde_json::from_value(data)?)
            }
        })
    }

    /// Returns the category of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundMessage::Text(_) => MessageKind::Text,
            InboundMessage::Image(_) => MessageKind::Image,
            InboundMessage::File(_) => MessageKind::File,
            InboundMessage::Voice(_) => MessageKind::Voice,
            InboundMessage::Link(_) => MessageKind::Link,
            InboundMessage::RoomMemberChange(_) => MessageKind::RoomMemberChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_tags_roundtrip() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MessageKind::from_tag(0), None);
        assert_eq!(MessageKind::from_tag(99999), None);
    }

    #[test]
    fn download_type_serializes_as_number() {
        assert_eq!(serde_json::to_value(DownloadType::Image).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(DownloadType::File).unwrap(), json!(4));
        assert_eq!(serde_json::to_value(DownloadType::Voice).unwrap(), json!(34));
    }

    #[test]
    fn parse_text_payload() {
        let data = json!({
            "sender": "u1",
            "content": "hello",
            "conversation_id": "R:123"
        });
        let msg = InboundMessage::parse(MessageKind::Text, data).unwrap();
        match msg {
            InboundMessage::Text(text) => {
                assert_eq!(text.sender, "u1");
                assert_eq!(text.content, "hello");
                assert_eq!(text.conversation_id, "R:123");
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn parse_image_payload_with_nested_cdn() {
        let data = json!({
            "conversation_id": "c1",
            "sender": "u2",
            "cdn": {"file_id": "f1", "aes_key": "k1", "file_size": 2048}
        });
        let msg = InboundMessage::parse(MessageKind::Image, data).unwrap();
        match msg {
            InboundMessage::Image(image) => {
                assert_eq!(image.cdn.file_id, "f1");
                assert_eq!(image.cdn.file_size, 2048);
            }
            _ => panic!("expected image"),
        }
    }

    #[test]
    fn parse_file_payload_inline_cdn() {
        let data = json!({
            "conversation_id": "c1",
            "sender": "u2",
            "file_id": "f9",
            "aes_key": "k9",
            "file_size": 10,
            "file_name": "report.pdf"
        });
        let msg = InboundMessage::parse(MessageKind::File, data).unwrap();
        match msg {
            InboundMessage::File(file) => {
                assert_eq!(file.file_name, "report.pdf");
                let cdn = file.cdn();
                assert_eq!(cdn.file_id, "f9");
                assert_eq!(cdn.file_size, 10);
            }
            _ => panic!("expected file"),
        }
    }

    #[test]
    fn parse_member_change_payload() {
        let data = json!({
            "conversation_id": "R:7",
            "member_list": [
                {"user_id": "u1", "name": "Alice"},
                {"user_id": "u2", "name": "Bob"}
            ]
        });
        let msg = InboundMessage::parse(MessageKind::RoomMemberChange, data).unwrap();
        match msg {
            InboundMessage::RoomMemberChange(change) => {
                assert_eq!(change.member_list.len(), 2);
                assert_eq!(change.member_list[0].name, "Alice");
            }
            _ => panic!("expected member change"),
        }
    }

    #[test]
    fn parse_rejects_missing_required_field() {
        // Text without a sender is malformed.
        let data = json!({"content": "x", "conversation_id": "c"});
        assert!(InboundMessage::parse(MessageKind::Text, data).is_err());
    }
}
