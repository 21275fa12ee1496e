use std::sync::Arc;

use {async_trait::async_trait, tracing::debug};

use courier_media::file_name_from_url;

use crate::{
    backend::{Backend, Profile},
    error::Result,
    rpc::{BRIEF_INFO_BATCH, BriefEntry, BulkRpc},
    types::{
        ContactEntry, Directory, EVERYONE_TOKEN, MediaKind, Mention, OutboundMessage, RoomEntry,
        RoomMember,
    },
};

/// Adapter for the bulk-directory profile.
///
/// Directory fetches hydrate id lists through `brief_info` in batches of
/// 100; mentions go out as an explicit spec string (comma-joined member
/// ids, or the everyone literal); media URLs are passed through unchanged.
/// Only the text primitive carries a mention spec, so a mentioned media
/// send is announced with its own text message first.
pub struct BulkBackend {
    rpc: Arc<dyn BulkRpc>,
}

impl BulkBackend {
    #[must_use]
    pub fn new(rpc: Arc<dyn BulkRpc>) -> Self {
        Self { rpc }
    }

    async fn hydrate(&self, ids: &[String]) -> Result<Vec<BriefEntry>> {
        let mut entries = Vec::with_capacity(ids.len());
        for batch in ids.chunks(BRIEF_INFO_BATCH) {
            entries.extend(self.rpc.brief_info(batch).await?);
        }
        Ok(entries)
    }

    fn mention_spec(mention: &Mention) -> String {
        match mention {
            Mention::None => String::new(),
            Mention::Everyone => format!("@{EVERYONE_TOKEN}"),
            Mention::Members(members) => {
                let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
                ids.join(",")
            },
        }
    }

    async fn announce_mention(&self, target: &str, mention: &Mention) -> Result<()> {
        if mention.is_none() {
            return Ok(());
        }
        let spec = Self::mention_spec(mention);
        self.rpc
            .send_text(target, mention.body_prefix().trim_end(), &spec)
            .await
    }
}

#[async_trait]
impl Backend for BulkBackend {
    fn profile(&self) -> Profile {
        Profile::Bulk
    }

    async fn fetch_directory(&self) -> Result<Directory> {
        let ids = self.rpc.fetch_contact_ids().await?;
        debug!(
            rooms = ids.rooms.len(),
            friends = ids.friends.len(),
            "hydrating directory"
        );

        let rooms = self
            .hydrate(&ids.rooms)
            .await?
            .into_iter()
            .map(|e| RoomEntry {
                id: e.id,
                title: e.nickname,
            })
            .collect();
        let friends = self
            .hydrate(&ids.friends)
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
            MediaKind::Text => {
                let spec = Self::mention_spec(&message.mention);
                self.rpc.send_text(target, message.body, &spec).await
            },
            MediaKind::Image => {
                self.announce_mention(target, &message.mention).await?;
                self.rpc.send_image(target, message.body).await
            },
            MediaKind::Video => {
                self.announce_mention(target, &message.mention).await?;
                self.rpc.send_video(target, message.body).await
            },
            MediaKind::File => {
                self.announce_mention(target, &message.mention).await?;
                let file_name = file_name_from_url(message.body);
                self.rpc.send_file(target, message.body, &file_name).await
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::rpc::IdPartition;

    #[derive(Default)]
    struct FakeBulkRpc {
        ids: IdPartition,
        batch_sizes: Mutex<Vec<usize>>,
        sends: Mutex<Vec<(String, String, String)>>,
        media_sends: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BulkRpc for FakeBulkRpc {
        async fn fetch_contact_ids(&self) -> Result<IdPartition> {
            Ok(self.ids.clone())
        }

        async fn brief_info(&self, ids: &[String]) -> Result<Vec<BriefEntry>> {
            self.batch_sizes.lock().unwrap().push(ids.len());
            Ok(ids
                .iter()
                .map(|id| BriefEntry {
                    id: id.clone(),
                    nickname: format!("name-{id}"),
                    remark: None,
                })
                .collect())
        }

        async fn room_members(&self, _room_id: &str) -> Result<Vec<crate::rpc::MemberRecord>> {
            Ok(vec![])
        }

        async fn send_text(&self, target: &str, body: &str, mention_spec: &str) -> Result<()> {
            self.sends.lock().unwrap().push((
                target.to_owned(),
                body.to_owned(),
                mention_spec.to_owned(),
            ));
            Ok(())
        }

        async fn send_image(&self, _target: &str, url: &str) -> Result<()> {
            self.media_sends.lock().unwrap().push(url.to_owned());
            Ok(())
        }

        async fn send_video(&self, _target: &str, url: &str) -> Result<()> {
            self.media_sends.lock().unwrap().push(url.to_owned());
            Ok(())
        }

        async fn send_file(&self, _target: &str, url: &str, _file_name: &str) -> Result<()> {
            self.media_sends.lock().unwrap().push(url.to_owned());
            Ok(())
        }
    }

    #[tokio::test]
    async fn directory_hydration_batches_by_100() {
        let rpc = Arc::new(FakeBulkRpc {
            ids: IdPartition {
                rooms: (0..250).map(|i| format!("room-{i}")).collect(),
                friends: vec![],
            },
            ..Default::default()
        });
        let backend = BulkBackend::new(Arc::clone(&rpc) as Arc<dyn BulkRpc>);

        let dir = backend.fetch_directory().await.unwrap();
        assert_eq!(dir.rooms.len(), 250);
        assert_eq!(*rpc.batch_sizes.lock().unwrap(), vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn text_send_renders_member_ids_as_spec() {
        let rpc = Arc::new(FakeBulkRpc::default());
        let backend = BulkBackend::new(Arc::clone(&rpc) as Arc<dyn BulkRpc>);

        let message = OutboundMessage {
            kind: MediaKind::Text,
            body: "hello",
            mention: Mention::Members(vec![
                RoomMember {
                    id: "u1".into(),
                    display_name: "Ann".into(),
                },
                RoomMember {
                    id: "u2".into(),
                    display_name: "Bo".into(),
                },
            ]),
        };
        backend.send("room-1", &message).await.unwrap();

        let sends = rpc.sends.lock().unwrap();
        assert_eq!(sends[0], ("room-1".into(), "hello".into(), "u1,u2".into()));
    }

    #[tokio::test]
    async fn everyone_send_uses_the_literal_spec() {
        let rpc = Arc::new(FakeBulkRpc::default());
        let backend = BulkBackend::new(Arc::clone(&rpc) as Arc<dyn BulkRpc>);

        let message = OutboundMessage {
            kind: MediaKind::Text,
            body: "hello",
            mention: Mention::Everyone,
        };
        backend.send("room-1", &message).await.unwrap();

        assert_eq!(rpc.sends.lock().unwrap()[0].2, "@所有人");
    }

    #[tokio::test]
    async fn mentioned_media_send_announces_the_mention_first() {
        let rpc = Arc::new(FakeBulkRpc::default());
        let backend = BulkBackend::new(Arc::clone(&rpc) as Arc<dyn BulkRpc>);

        let message = OutboundMessage {
            kind: MediaKind::Image,
            body: "https://x/pic.png",
            mention: Mention::Members(vec![RoomMember {
                id: "u1".into(),
                display_name: "Ann".into(),
            }]),
        };
        backend.send("room-1", &message).await.unwrap();

        let sends = rpc.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0], ("room-1".into(), "@Ann".into(), "u1".into()));
        assert_eq!(*rpc.media_sends.lock().unwrap(), vec!["https://x/pic.png".to_owned()]);
    }

    #[tokio::test]
    async fn unaddressed_media_send_skips_the_announcement() {
        let rpc = Arc::new(FakeBulkRpc::default());
        let backend = BulkBackend::new(Arc::clone(&rpc) as Arc<dyn BulkRpc>);

        let message = OutboundMessage {
            kind: MediaKind::Video,
            body: "https://x/clip.mp4",
            mention: Mention::None,
        };
        backend.send("room-1", &message).await.unwrap();

        assert!(rpc.sends.lock().unwrap().is_empty());
        assert_eq!(rpc.media_sends.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_surface_is_unsupported() {
        let backend = BulkBackend::new(Arc::new(FakeBulkRpc::default()));
        let err = backend.search_contact("Ann").await.unwrap_err();
        assert!(matches!(err, crate::Error::Unsupported { .. }));
    }
}
