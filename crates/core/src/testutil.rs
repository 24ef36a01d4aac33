//! Recording [`Client`] mock for bot and directory tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use wecom_protocol::{
    CdnDescriptor, Contact, ContactList, DownloadType, LoginInfo, MemberList, Room, RoomList,
};
use wecom_runtime::{Client, Error, Result};

/// One recorded client call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Open(bool),
    WaitLogin,
    LoginInfo,
    Rooms { page_num: u32, page_size: u32 },
    Contacts { page_num: u32, page_size: u32 },
    RoomMembers {
        conversation_id: String,
        page_num: u32,
        page_size: u32,
    },
    ContactDetail(String),
    CdnDownload { tag: u32, save_path: PathBuf },
    SendText { conversation_id: String, content: String },
    SendImage(PathBuf),
    SendFile(PathBuf),
    SendVideo(PathBuf),
    SendRoomAt { conversation_id: String, at_list: Vec<String> },
    SendLinkCard { conversation_id: String, url: String },
    SendCard { conversation_id: String, user_id: String },
    Close,
}

/// A recorded CDN download, as the tests want to assert on it.
pub(crate) struct DownloadRecord {
    pub(crate) tag: u32,
    pub(crate) save_path: PathBuf,
}

/// A [`Client`] that records every call and serves canned data.
///
/// Logs in as user id `me`. Builder methods configure fetch results and
/// injected failures before the client is shared.
#[derive(Default)]
pub(crate) struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    rooms: Vec<Room>,
    contacts: Vec<Contact>,
    members: Vec<(String, MemberList)>,
    member_failures: Vec<String>,
    fail_fetches: bool,
    fail_open: bool,
    fail_sends: bool,
}

impl RecordingClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    pub(crate) fn with_contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contacts = contacts;
        self
    }

    /// Contacts with the given user ids and empty detail.
    pub(crate) fn with_contacts_named(self, user_ids: &[&str]) -> Self {
        let contacts = user_ids
            .iter()
            .map(|id| Contact {
                user_id: id.to_string(),
                name: id.to_string(),
                remark: None,
                avatar: None,
            })
            .collect();
        self.with_contacts(contacts)
    }

    /// Canned member list for one room.
    pub(crate) fn with_members(mut self, conversation_id: &str, list: MemberList) -> Self {
        self.members.push((conversation_id.to_string(), list));
        self
    }

    /// Member fetches for this room fail.
    pub(crate) fn with_member_failure(mut self, conversation_id: &str) -> Self {
        self.member_failures.push(conversation_id.to_string());
        self
    }

    /// Room and contact page fetches fail.
    pub(crate) fn with_fetch_failures(mut self) -> Self {
        self.fail_fetches = true;
        self
    }

    /// `open` fails.
    pub(crate) fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// All send operations fail.
    pub(crate) fn with_send_failures(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn remote_error(&self, message: &str) -> Error {
        Error::Remote {
            name: "ClientError".to_string(),
            message: message.to_string(),
            code: None,
        }
    }

    fn send_result(&self) -> Result<()> {
        if self.fail_sends {
            Err(self.remote_error("send rejected"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub(crate) fn member_fetch_count(&self) -> usize {
        self.count(|call| matches!(call, Call::RoomMembers { .. }))
    }

    /// `(conversation_id, content)` of every text sent.
    pub(crate) fn sent_texts(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::SendText {
                    conversation_id,
                    content,
                } => Some((conversation_id.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every CDN download that was requested.
    pub(crate) fn downloads(&self) -> Vec<DownloadRecord> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::CdnDownload { tag, save_path } => Some(DownloadRecord {
                    tag: *tag,
                    save_path: save_path.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Client for RecordingClient {
    async fn open(&self, smart: bool) -> Result<()> {
        self.record(Call::Open(smart));
        if self.fail_open {
            Err(self.remote_error("client failed to open"))
        } else {
            Ok(())
        }
    }

    async fn wait_login(&self, _timeout: Duration) -> Result<()> {
        self.record(Call::WaitLogin);
        Ok(())
    }

    async fn login_info(&self) -> Result<LoginInfo> {
        self.record(Call::LoginInfo);
        Ok(LoginInfo {
            user_id: "me".to_string(),
            username: "Operator".to_string(),
            mobile: None,
            avatar: None,
        })
    }

    async fn rooms(&self, page_num: u32, page_size: u32) -> Result<RoomList> {
        self.record(Call::Rooms { page_num, page_size });
        if self.fail_fetches {
            return Err(self.remote_error("room fetch rejected"));
        }
        Ok(RoomList {
            room_list: self.rooms.clone(),
        })
    }

    async fn contacts(&self, page_num: u32, page_size: u32) -> Result<ContactList> {
        self.record(Call::Contacts { page_num, page_size });
        if self.fail_fetches {
            return Err(self.remote_error("contact fetch rejected"));
        }
        Ok(ContactList {
            contact_list: self.contacts.clone(),
        })
    }

    async fn room_members(
        &self,
        conversation_id: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<MemberList> {
        self.record(Call::RoomMembers {
            conversation_id: conversation_id.to_string(),
            page_num,
            page_size,
        });
        if self.member_failures.iter().any(|id| id == conversation_id) {
            return Err(self.remote_error("member fetch rejected"));
        }
        Ok(self
            .members
            .iter()
            .find(|(id, _)| id == conversation_id)
            .map(|(_, list)| list.clone())
            .unwrap_or_default())
    }

    async fn contact_detail(&self, user_id: &str) -> Result<Contact> {
        self.record(Call::ContactDetail(user_id.to_string()));
        self.contacts
            .iter()
            .find(|contact| contact.user_id == user_id)
            .cloned()
            .ok_or_else(|| self.remote_error("unknown contact"))
    }

    async fn cdn_download(
        &self,
        _cdn: &CdnDescriptor,
        download_type: DownloadType,
        save_path: &Path,
    ) -> Result<()> {
        self.record(Call::CdnDownload {
            tag: download_type.tag(),
            save_path: save_path.to_path_buf(),
        });
        Ok(())
    }

    async fn send_text(&self, conversation_id: &str, content: &str) -> Result<()> {
        self.record(Call::SendText {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
        });
        self.send_result()
    }

    async fn send_image(&self, _conversation_id: &str, file_path: &Path) -> Result<()> {
        self.record(Call::SendImage(file_path.to_path_buf()));
        self.send_result()
    }

    async fn send_file(&self, _conversation_id: &str, file_path: &Path) -> Result<()> {
        self.record(Call::SendFile(file_path.to_path_buf()));
        self.send_result()
    }

    async fn send_video(&self, _conversation_id: &str, file_path: &Path) -> Result<()> {
        self.record(Call::SendVideo(file_path.to_path_buf()));
        self.send_result()
    }

    async fn send_room_at(
        &self,
        conversation_id: &str,
        _content: &str,
        at_list: &[String],
    ) -> Result<()> {
        self.record(Call::SendRoomAt {
            conversation_id: conversation_id.to_string(),
            at_list: at_list.to_vec(),
        });
        self.send_result()
    }

    async fn send_link_card(
        &self,
        conversation_id: &str,
        _title: &str,
        _desc: &str,
        url: &str,
        _image_url: &str,
    ) -> Result<()> {
        self.record(Call::SendLinkCard {
            conversation_id: conversation_id.to_string(),
            url: url.to_string(),
        });
        self.send_result()
    }

    async fn send_card(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        self.record(Call::SendCard {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
        });
        self.send_result()
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}
