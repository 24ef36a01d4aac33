//! Directory records returned by the bridge's bulk fetch calls.

use serde::{Deserialize, Serialize};

/// Page size used for room and contact fetches when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// A group chat known to the client.
///
/// `members` is empty until a member refresh populates it; the room list
/// endpoint does not include membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Conversation id (group ids carry the `R:` marker).
    pub conversation_id: String,
    /// Display name of the room.
    #[serde(default)]
    pub name: String,
    /// User id of the room owner, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Member count as reported by the room list, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
    /// Member records, replaced wholesale on each refresh.
    #[serde(default)]
    pub members: Vec<Member>,
}

/// An external contact snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// User id of the contact.
    pub user_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Remark set by the operator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A room member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// User id of the member.
    pub user_id: String,
    /// Display name within the room.
    #[serde(default)]
    pub name: String,
}

/// Snapshot of the authenticated operator's identity, captured once per
/// session after login completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInfo {
    /// Operator's own user id, used to filter self-authored messages.
    pub user_id: String,
    /// Operator's display name.
    #[serde(default)]
    pub username: String,
    /// Bound mobile number, if exposed by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One page of rooms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomList {
    #[serde(default)]
    pub room_list: Vec<Room>,
}

/// One page of external contacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(default)]
    pub contact_list: Vec<Contact>,
}

/// Member list of a single room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberList {
    #[serde(default)]
    pub member_list: Vec<Member>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_list_defaults_missing_fields() {
        let json = r#"{"room_list": [{"conversation_id": "R:1"}]}"#;
        let rooms: RoomList = serde_json::from_str(json).unwrap();
        assert_eq!(rooms.room_list.len(), 1);
        let room = &rooms.room_list[0];
        assert_eq!(room.conversation_id, "R:1");
        assert!(room.name.is_empty());
        assert!(room.members.is_empty());
    }

    #[test]
    fn empty_object_gives_empty_lists() {
        let rooms: RoomList = serde_json::from_str("{}").unwrap();
        assert!(rooms.room_list.is_empty());
        let contacts: ContactList = serde_json::from_str("{}").unwrap();
        assert!(contacts.contact_list.is_empty());
    }

    #[test]
    fn login_info_decodes_minimal() {
        let json = r#"{"user_id": "me", "username": "operator"}"#;
        let info: LoginInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.user_id, "me");
        assert_eq!(info.username, "operator");
        assert!(info.mobile.is_none());
    }
}
