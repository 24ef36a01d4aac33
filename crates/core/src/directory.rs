//! In-memory directory cache of rooms and contacts.
//!
//! Entries are eventually-consistent snapshots refreshed by bulk fetches
//! against the client. Population happens synchronously during startup,
//! before dispatch is armed; afterwards only the membership-change handler
//! writes here, so no finer-grained locking is needed than the per-map
//! mutexes.

use std::collections::HashMap;

use parking_lot::Mutex;

use wecom_protocol::{Contact, Member, Room};
use wecom_runtime::Client;

/// Cached rooms and contacts, keyed by conversation id and user id.
#[derive(Default)]
pub struct Directory {
    rooms: Mutex<HashMap<String, Room>>,
    contacts: Mutex<HashMap<String, Contact>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the room cache with the first page of rooms.
    ///
    /// A failed fetch leaves the cache empty, mirroring an empty result.
    pub async fn refresh_rooms(&self, client: &dyn Client, page_size: u32) {
        let rooms = match client.rooms(1, page_size).await {
            Ok(list) => list.room_list,
            Err(e) => {
                tracing::warn!("room fetch failed: {e}");
                Vec::new()
            }
        };
        let map: HashMap<String, Room> = rooms
            .into_iter()
            .map(|room| (room.conversation_id.clone(), room))
            .collect();
        tracing::debug!(rooms = map.len(), "room cache refreshed");
        *self.rooms.lock() = map;
    }

    /// Replaces the contact cache with the first page of external contacts.
    pub async fn refresh_contacts(&self, client: &dyn Client, page_size: u32) {
        let contacts = match client.contacts(1, page_size).await {
            Ok(list) => list.contact_list,
            Err(e) => {
                tracing::warn!("contact fetch failed: {e}");
                Vec::new()
            }
        };
        let map: HashMap<String, Contact> = contacts
            .into_iter()
            .map(|contact| (contact.user_id.clone(), contact))
            .collect();
        tracing::debug!(contacts = map.len(), "contact cache refreshed");
        *self.contacts.lock() = map;
    }

    /// Refreshes the member list of every cached room, sequentially,
    /// fetching the first page of each.
    ///
    /// A failed fetch for one room leaves that room's members as they were
    /// and moves on; the remaining rooms are still refreshed.
    pub async fn refresh_members(&self, client: &dyn Client, page_size: u32) {
        for conversation_id in self.room_ids() {
            match client.room_members(&conversation_id, 1, page_size).await {
                Ok(list) => {
                    if let Some(room) = self.rooms.lock().get_mut(&conversation_id) {
                        room.members = list.member_list;
                    }
                }
                Err(e) => {
                    tracing::warn!(room = %conversation_id, "member fetch failed: {e}");
                }
            }
        }
    }

    /// Returns a snapshot of the cached room, if present.
    pub fn room(&self, conversation_id: &str) -> Option<Room> {
        self.rooms.lock().get(conversation_id).cloned()
    }

    /// Returns a snapshot of the cached contact, if present.
    pub fn contact(&self, user_id: &str) -> Option<Contact> {
        self.contacts.lock().get(user_id).cloned()
    }

    /// Returns the members of a cached room (empty if unknown).
    pub fn room_members(&self, conversation_id: &str) -> Vec<Member> {
        self.rooms
            .lock()
            .get(conversation_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    /// Conversation ids of all cached rooms.
    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.lock().keys().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.lock().len()
    }
}
