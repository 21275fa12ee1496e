use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {async_trait::async_trait, tracing::debug};

use courier_media::MediaFetcher;

use crate::{
    backend::{Backend, Profile},
    error::{Error, Result},
    rpc::{RoomRecord, SearchRpc},
    types::{ContactEntry, MediaKind, Mention, OutboundMessage, RoomEntry, RoomMember},
};

/// Member snapshot kept from the last room search, so member lookups can
/// re-query the backend by title (the search profile has no
/// members-by-room-id call).
struct RoomSnapshot {
    title: String,
    members: Vec<RoomMember>,
}

/// Adapter for the search-based profile.
///
/// Lookups are server-side: contacts by remark first, then by nickname;
/// rooms by title. Mentions are rendered into the message body, and media
/// is downloaded to a local file before upload.
pub struct SearchBackend {
    rpc: Arc<dyn SearchRpc>,
    fetcher: MediaFetcher,
    rooms: RwLock<HashMap<String, RoomSnapshot>>,
}

impl SearchBackend {
    #[must_use]
    pub fn new(rpc: Arc<dyn SearchRpc>, fetcher: MediaFetcher) -> Self {
        Self {
            rpc,
            fetcher,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    fn remember(&self, record: &RoomRecord) {
        let members = record
            .members
            .iter()
            .map(|m| RoomMember {
                id: m.id.clone(),
                display_name: m.display_name.clone(),
            })
            .collect();
        let mut rooms = self.rooms.write().unwrap_or_else(|e| e.into_inner());
        rooms.insert(
            record.id.clone(),
            RoomSnapshot {
                title: record.title.clone(),
                members,
            },
        );
    }

    fn known_title(&self, room_id: &str) -> Option<String> {
        let rooms = self.rooms.read().unwrap_or_else(|e| e.into_inner());
        rooms.get(room_id).map(|s| s.title.clone())
    }
}

#[async_trait]
impl Backend for SearchBackend {
    fn profile(&self) -> Profile {
        Profile::Search
    }

    async fn search_contact(&self, name: &str) -> Result<Option<ContactEntry>> {
        // Remark takes precedence over nickname, same as the cached profiles.
        let mut hits = self.rpc.search_friends_by_remark(name).await?;
        if hits.is_empty() {
            hits = self.rpc.search_friends_by_nickname(name).await?;
        }
        Ok(hits.into_iter().next().map(|e| ContactEntry {
            id: e.id,
            nickname: e.nickname,
            remark: e.remark,
        }))
    }

    async fn search_room(&self, title: &str) -> Result<Option<RoomEntry>> {
        let hits = self.rpc.search_rooms_by_title(title).await?;
        let Some(record) = hits.into_iter().next() else {
            return Ok(None);
        };
        self.remember(&record);
        Ok(Some(RoomEntry {
            id: record.id,
            title: record.title,
        }))
    }

    async fn refresh_index(&self) -> Result<()> {
        self.rpc.refresh_friends_index().await?;
        self.rpc.refresh_rooms_index().await?;
        debug!("search indexes refreshed");
        Ok(())
    }

    async fn room_members(&self, room_id: &str) -> Result<Vec<RoomMember>> {
        let title = self
            .known_title(room_id)
            .ok_or_else(|| Error::unknown_room(room_id))?;
        // Re-search by the remembered title so callers get a fresh list.
        let hits = self.rpc.search_rooms_by_title(&title).await?;
        let record = hits
            .into_iter()
            .find(|r| r.id == room_id)
            .ok_or_else(|| Error::unknown_room(room_id))?;
        self.remember(&record);

        let rooms = self.rooms.read().unwrap_or_else(|e| e.into_inner());
        Ok(rooms
            .get(room_id)
            .map(|s| s.members.clone())
            .unwrap_or_default())
    }

    async fn send(&self, target: &str, message: &OutboundMessage<'_>) -> Result<()> {
        let prefix = message.mention.body_prefix();
        match message.kind {
            MediaKind::Text => {
                let body = format!("{prefix}{}", message.body);
                self.rpc.send_to_target(&body, target).await
            },
            kind => {
                // Mention text travels as its own message ahead of the upload.
                if !prefix.is_empty() {
                    self.rpc.send_to_target(prefix.trim_end(), target).await?;
                }
                let download = self.fetcher.fetch(message.body).await?;
                match kind {
                    MediaKind::Image => self.rpc.send_image(download.path(), target).await,
                    MediaKind::Video => self.rpc.send_video(download.path(), target).await,
                    _ => self.rpc.send_file(download.path(), target).await,
                }
            },
        }
    }
}
