//! Opaque RPC client surfaces, one fixed method set per profile.
//!
//! The adapters in this crate are written against these traits only; the
//! concrete transports are the HTTP bridges in [`crate::http`] and the
//! fakes in the test suites.

use std::path::Path;

use {
    async_trait::async_trait,
    serde::Deserialize,
};

use crate::error::Result;

/// Room and friend id lists, as returned by the bulk profile's directory
/// endpoint before detail hydration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdPartition {
    #[serde(default)]
    pub rooms: Vec<String>,
    #[serde(default)]
    pub friends: Vec<String>,
}

/// Detail record for one contact or room id.
#[derive(Debug, Clone, Deserialize)]
pub struct BriefEntry {
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberRecord {
    pub id: String,
    pub display_name: String,
}

/// Room record with its member list, as the search and direct profiles
/// return it.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

/// Bulk-directory profile. Directory hydration is paginated by the caller
/// (`brief_info` accepts at most [`BRIEF_INFO_BATCH`] ids per call); media
/// sends pass the source URL through unchanged.
#[async_trait]
pub trait BulkRpc: Send + Sync {
    async fn fetch_contact_ids(&self) -> Result<IdPartition>;
    async fn brief_info(&self, ids: &[String]) -> Result<Vec<BriefEntry>>;
    async fn room_members(&self, room_id: &str) -> Result<Vec<MemberRecord>>;
    async fn send_text(&self, target: &str, body: &str, mention_spec: &str) -> Result<()>;
    async fn send_image(&self, target: &str, url: &str) -> Result<()>;
    async fn send_video(&self, target: &str, url: &str) -> Result<()>;
    async fn send_file(&self, target: &str, url: &str, file_name: &str) -> Result<()>;
}

/// Maximum ids per [`BulkRpc::brief_info`] call.
pub const BRIEF_INFO_BATCH: usize = 100;

/// Search-based profile. No bulk enumeration; lookups are server-side and
/// media is uploaded from a local file.
#[async_trait]
pub trait SearchRpc: Send + Sync {
    async fn refresh_friends_index(&self) -> Result<()>;
    async fn refresh_rooms_index(&self) -> Result<()>;
    async fn search_rooms_by_title(&self, title: &str) -> Result<Vec<RoomRecord>>;
    async fn search_friends_by_remark(&self, remark: &str) -> Result<Vec<BriefEntry>>;
    async fn search_friends_by_nickname(&self, name: &str) -> Result<Vec<BriefEntry>>;
    async fn send_to_target(&self, body: &str, target: &str) -> Result<()>;
    async fn send_image(&self, path: &Path, target: &str) -> Result<()>;
    async fn send_video(&self, path: &Path, target: &str) -> Result<()>;
    async fn send_file(&self, path: &Path, target: &str) -> Result<()>;
}

/// Direct-id profile. Enumerates rooms and contacts with plain listings,
/// mentions by member-id list, uploads media from a local file.
#[async_trait]
pub trait DirectRpc: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<RoomRecord>>;
    async fn list_contacts(&self) -> Result<Vec<BriefEntry>>;
    async fn room_members(&self, room_id: &str) -> Result<Vec<MemberRecord>>;
    async fn send_text(&self, target: &str, body: &str) -> Result<()>;
    async fn send_room_mention(&self, target: &str, body: &str, member_ids: &[String])
    -> Result<()>;
    async fn send_image(&self, target: &str, path: &Path) -> Result<()>;
    async fn send_video(&self, target: &str, path: &Path) -> Result<()>;
    async fn send_file(&self, target: &str, path: &Path) -> Result<()>;
}
