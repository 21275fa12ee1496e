use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::{
    error::{Error, Result},
    types::{ContactEntry, Directory, OutboundMessage, RoomEntry, RoomMember},
};

/// The three capability profiles a deployment can be configured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Bulk directory fetch, explicit @-mention list, URL pass-through media.
    #[default]
    Bulk,
    /// Per-entity server-side search, mentions embedded in the body,
    /// local-file media upload.
    Search,
    /// Directory enumeration by direct listing, mention-by-id list,
    /// local-file media upload.
    Direct,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bulk => "bulk",
            Self::Search => "search",
            Self::Direct => "direct",
        })
    }
}

/// Normalized backend surface the resolver and dispatcher code against.
///
/// Directory enumeration and server-side search are mutually exclusive
/// capabilities: the bulk and direct profiles implement
/// [`fetch_directory`](Backend::fetch_directory), the search profile
/// implements the `search_*` pair plus [`refresh_index`](Backend::refresh_index).
/// The defaults report the missing half as [`Error::Unsupported`].
#[async_trait]
pub trait Backend: Send + Sync {
    fn profile(&self) -> Profile;

    /// Whether directory entries carry caller-assigned remarks. Profiles
    /// without them resolve by nickname only.
    fn supports_remark(&self) -> bool {
        !matches!(self.profile(), Profile::Search)
    }

    /// Full directory snapshot: every room and friend.
    async fn fetch_directory(&self) -> Result<Directory> {
        Err(Error::unsupported(self.profile(), "fetch_directory"))
    }

    /// Server-side contact lookup (remark first, then nickname).
    async fn search_contact(&self, name: &str) -> Result<Option<ContactEntry>> {
        let _ = name;
        Err(Error::unsupported(self.profile(), "search_contact"))
    }

    /// Server-side room lookup by title. First match wins.
    async fn search_room(&self, title: &str) -> Result<Option<RoomEntry>> {
        let _ = title;
        Err(Error::unsupported(self.profile(), "search_room"))
    }

    /// Refresh the backend-side search indexes. No-op on profiles that
    /// enumerate instead of searching.
    async fn refresh_index(&self) -> Result<()> {
        Ok(())
    }

    /// Fresh member list for one room.
    async fn room_members(&self, room_id: &str) -> Result<Vec<RoomMember>>;

    /// Deliver one message to a contact or room id, rendering the mention
    /// directive in the profile's wire shape.
    async fn send(&self, target: &str, message: &OutboundMessage<'_>) -> Result<()>;
}
