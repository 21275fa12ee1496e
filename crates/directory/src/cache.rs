use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use tracing::debug;

use courier_backends::{Backend, ContactEntry, Directory, RoomEntry, RoomMember};

use crate::{
    error::{Error, Result},
    slot::CacheSlot,
};

/// Default slot expiry: 24 hours.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache of directory snapshots with independent freshness per slot.
///
/// Refresh is synchronous and caller-triggered; there is no background
/// task. A refresh failure surfaces as an error and leaves the previous
/// slot contents untouched. Callers that need only rooms or only friends
/// refresh only that slot; per-room member lists never force a
/// full-directory refresh.
pub struct DirectoryCache {
    backend: Arc<dyn Backend>,
    expiry: Duration,
    all: CacheSlot<Directory>,
    rooms: CacheSlot<Vec<RoomEntry>>,
    friends: CacheSlot<Vec<ContactEntry>>,
    members: HashMap<String, CacheSlot<Vec<RoomMember>>>,
}

impl DirectoryCache {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, expiry: Duration) -> Self {
        Self {
            backend,
            expiry,
            all: CacheSlot::default(),
            rooms: CacheSlot::default(),
            friends: CacheSlot::default(),
            members: HashMap::new(),
        }
    }

    /// Full directory snapshot. A refresh here updates the rooms and
    /// friends slots as well.
    pub async fn directory(&mut self, force: bool) -> Result<Directory> {
        if force || !self.all.is_fresh(self.expiry) {
            let dir = self.fetch().await?;
            debug!(
                rooms = dir.rooms.len(),
                friends = dir.friends.len(),
                "directory slot refreshed"
            );
            self.rooms.store(dir.rooms.clone());
            self.friends.store(dir.friends.clone());
            self.all.store(dir);
        }
        Ok(self.all.payload().cloned().unwrap_or_default())
    }

    /// Rooms snapshot. Refreshes only the rooms slot.
    pub async fn rooms(&mut self, force: bool) -> Result<&[RoomEntry]> {
        if force || !self.rooms.is_fresh(self.expiry) {
            let dir = self.fetch().await?;
            debug!(rooms = dir.rooms.len(), "rooms slot refreshed");
            return Ok(self.rooms.store(dir.rooms));
        }
        Ok(self.rooms.as_slice())
    }

    /// Friends snapshot. Refreshes only the friends slot.
    pub async fn friends(&mut self, force: bool) -> Result<&[ContactEntry]> {
        if force || !self.friends.is_fresh(self.expiry) {
            let dir = self.fetch().await?;
            debug!(friends = dir.friends.len(), "friends slot refreshed");
            return Ok(self.friends.store(dir.friends));
        }
        Ok(self.friends.as_slice())
    }

    /// Member list for one room, cached in its own slot.
    pub async fn room_members(&mut self, room_id: &str, force: bool) -> Result<&[RoomMember]> {
        let slot = self.members.entry(room_id.to_owned()).or_default();
        if force || !slot.is_fresh(self.expiry) {
            let members = self
                .backend
                .room_members(room_id)
                .await
                .map_err(|e| Error::member_fetch(room_id, e))?;
            debug!(room_id, members = members.len(), "member slot refreshed");
            return Ok(slot.store(members));
        }
        Ok(slot.as_slice())
    }

    /// Drop one room's member slot back to "never fetched".
    pub fn evict_room(&mut self, room_id: &str) {
        self.members.remove(room_id);
    }

    async fn fetch(&self) -> Result<Directory> {
        self.backend
            .fetch_directory()
            .await
            .map_err(Error::directory_fetch)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use {
        super::*,
        courier_backends::{OutboundMessage, Profile},
    };

    #[derive(Default)]
    struct CountingBackend {
        directory_calls: AtomicUsize,
        member_calls: AtomicUsize,
        fail_directory: bool,
    }

    #[async_trait]
    impl Backend for CountingBackend {
        fn profile(&self) -> Profile {
            Profile::Bulk
        }

        async fn fetch_directory(&self) -> courier_backends::Result<Directory> {
            self.directory_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_directory {
                return Err(courier_backends::Error::status(500, "backend down"));
            }
            Ok(Directory {
                rooms: vec![RoomEntry {
                    id: "r1".into(),
                    title: "Team A".into(),
                }],
                friends: vec![ContactEntry {
                    id: "u1".into(),
                    nickname: "Ann".into(),
                    remark: None,
                }],
            })
        }

        async fn room_members(&self, _room_id: &str) -> courier_backends::Result<Vec<RoomMember>> {
            self.member_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RoomMember {
                id: "u1".into(),
                display_name: "Ann".into(),
            }])
        }

        async fn send(
            &self,
            _target: &str,
            _message: &OutboundMessage<'_>,
        ) -> courier_backends::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn fresh_slot_serves_without_backend_calls() {
        let backend = Arc::new(CountingBackend::default());
        let mut cache = DirectoryCache::new(Arc::clone(&backend) as Arc<dyn Backend>, DEFAULT_EXPIRY);

        cache.rooms(false).await.unwrap();
        cache.rooms(false).await.unwrap();
        cache.rooms(false).await.unwrap();

        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_slot_triggers_exactly_one_refresh() {
        let backend = Arc::new(CountingBackend::default());
        // Zero expiry: every read is past the window.
        let mut cache = DirectoryCache::new(Arc::clone(&backend) as Arc<dyn Backend>, Duration::ZERO);

        cache.rooms(false).await.unwrap();
        let first = backend.directory_calls.load(Ordering::SeqCst);
        cache.rooms(false).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn force_bypasses_a_fresh_slot() {
        let backend = Arc::new(CountingBackend::default());
        let mut cache = DirectoryCache::new(Arc::clone(&backend) as Arc<dyn Backend>, DEFAULT_EXPIRY);

        cache.friends(false).await.unwrap();
        cache.friends(true).await.unwrap();

        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_prior_payload() {
        let good = Arc::new(CountingBackend::default());
        let mut cache = DirectoryCache::new(Arc::clone(&good) as Arc<dyn Backend>, DEFAULT_EXPIRY);
        cache.rooms(false).await.unwrap();

        // Swap in a failing backend and force a refresh.
        let bad = Arc::new(CountingBackend {
            fail_directory: true,
            ..Default::default()
        });
        cache.backend = bad as Arc<dyn Backend>;

        let err = cache.rooms(true).await.unwrap_err();
        assert!(matches!(err, Error::DirectoryFetch { .. }));
        assert_eq!(cache.rooms.as_slice().len(), 1);
    }

    #[tokio::test]
    async fn directory_refresh_updates_all_three_slots() {
        let backend = Arc::new(CountingBackend::default());
        let mut cache = DirectoryCache::new(Arc::clone(&backend) as Arc<dyn Backend>, DEFAULT_EXPIRY);

        cache.directory(false).await.unwrap();
        cache.rooms(false).await.unwrap();
        cache.friends(false).await.unwrap();

        // The single directory refresh populated rooms and friends too.
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn member_slots_are_independent_per_room() {
        let backend = Arc::new(CountingBackend::default());
        let mut cache = DirectoryCache::new(Arc::clone(&backend) as Arc<dyn Backend>, DEFAULT_EXPIRY);

        cache.room_members("r1", false).await.unwrap();
        cache.room_members("r1", false).await.unwrap();
        cache.room_members("r2", false).await.unwrap();

        assert_eq!(backend.member_calls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn evicted_room_is_refetched() {
        let backend = Arc::new(CountingBackend::default());
        let mut cache = DirectoryCache::new(Arc::clone(&backend) as Arc<dyn Backend>, DEFAULT_EXPIRY);

        cache.room_members("r1", false).await.unwrap();
        cache.evict_room("r1");
        cache.room_members("r1", false).await.unwrap();

        assert_eq!(backend.member_calls.load(Ordering::SeqCst), 2);
    }
}
