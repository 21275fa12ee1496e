use std::sync::Arc;

use async_trait::async_trait;

use courier_media::MediaFetcher;

use crate::{
    backend::{Backend, Profile},
    error::Result,
    rpc::DirectRpc,
    types::{ContactEntry, Directory, MediaKind, Mention, OutboundMessage, RoomEntry, RoomMember},
};

/// Adapter for the direct-id profile.
///
/// Directory comes from plain listings; mentions go out as a member-id
/// list next to the `@…`-prefixed body. The platform has no true @-all on
/// this profile, so "everyone" is the literal prefix with an empty id
/// list. Media uploads from a local file.
pub struct DirectBackend {
    rpc: Arc<dyn DirectRpc>,
    fetcher: MediaFetcher,
}

impl DirectBackend {
    #[must_use]
    pub fn new(rpc: Arc<dyn DirectRpc>, fetcher: MediaFetcher) -> Self {
        Self { rpc, fetcher }
    }

    async fn send_mention_text(&self, target: &str, message: &OutboundMessage<'_>) -> Result<()> {
        let body = format!("{}{}", message.mention.body_prefix(), message.body);
        let member_ids: Vec<String> = match &message.mention {
            Mention::Members(members) => members.iter().map(|m| m.id.clone()).collect(),
            _ => Vec::new(),
        };
        self.rpc.send_room_mention(target, &body, &member_ids).await
    }
}

#[async_trait]
impl Backend for DirectBackend {
    fn profile(&self) -> Profile {
        Profile::Direct
    }

    async fn fetch_directory(&self) -> Result<Directory> {
        let rooms = self
            .rpc
            .list_rooms()
            .await?
            .into_iter()
            .map(|r| RoomEntry {
                id: r.id,
                title: r.title,
            })
            .collect();
        let friends = self
            .rpc
            .list_contacts()
            .await?
            .into_iter()
            .map(|e| ContactEntry {
                id: e.id,
                nickname: e.nickname,
                remark: e.remark,
            })
            .collect();
        Ok(Directory { rooms, friends })
    }

    async fn room_members(&self, room_id: &str) -> Result<Vec<RoomMember>> {
        let members = self.rpc.room_members(room_id).await?;
        Ok(members
            .into_iter()
            .map(|m| RoomMember {
                id: m.id,
                display_name: m.display_name,
            })
            .collect())
    }

    async fn send(&self, target: &str, message: &OutboundMessage<'_>) -> Result<()> {
        match message.kind {
            MediaKind::Text if message.mention.is_none() => {
                self.rpc.send_text(target, message.body).await
            },
            MediaKind::Text => self.send_mention_text(target, message).await,
            kind => {
                if !message.mention.is_none() {
                    let prefix = message.mention.body_prefix();
                    let member_ids: Vec<String> = match &message.mention {
                        Mention::Members(members) => {
                            members.iter().map(|m| m.id.clone()).collect()
                        },
                        _ => Vec::new(),
                    };
                    self.rpc
                        .send_room_mention(target, prefix.trim_end(), &member_ids)
                        .await?;
                }
                let download = self.fetcher.fetch(message.body).await?;
                match kind {
                    MediaKind::Image => self.rpc.send_image(target, download.path()).await,
                    MediaKind::Video => self.rpc.send_video(target, download.path()).await,
                    _ => self.rpc.send_file(target, download.path()).await,
                }
            },
        }
    }
}
