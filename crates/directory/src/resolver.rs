use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use courier_backends::{Backend, ContactEntry, Profile, RoomEntry, RoomMember};

use crate::{
    cache::DirectoryCache,
    error::{EntityKind, Error, Result},
};

/// Resolves names to platform ids through the directory cache.
///
/// The miss policy is lazy invalidation: a total miss on the cached
/// snapshot forces one refresh and repeats the lookup exactly once, so a
/// lookup costs at most two backend refreshes however stale the cache is.
/// On the search profile the same two-attempt shape runs server-side
/// (search, refresh the backend index, search again).
pub struct Resolver {
    backend: Arc<dyn Backend>,
    cache: DirectoryCache,
}

impl Resolver {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, expiry: Duration) -> Self {
        let cache = DirectoryCache::new(Arc::clone(&backend), expiry);
        Self { backend, cache }
    }

    /// Direct cache access, used for eager population at startup.
    pub fn cache_mut(&mut self) -> &mut DirectoryCache {
        &mut self.cache
    }

    /// Resolve a contact name (remark first, then nickname) to its id.
    pub async fn resolve_contact(&mut self, name: &str) -> Result<String> {
        if self.backend.profile() == Profile::Search {
            return self.search_contact(name).await;
        }

        let with_remarks = self.backend.supports_remark();
        if let Some(id) = find_contact(self.cache.friends(false).await?, name, with_remarks) {
            return Ok(id);
        }
        debug!(name, "contact miss, forcing friends refresh");
        find_contact(self.cache.friends(true).await?, name, with_remarks)
            .ok_or_else(|| Error::not_found(EntityKind::Contact, name))
    }

    /// Resolve a room title to its id. First match wins.
    pub async fn resolve_room(&mut self, title: &str) -> Result<String> {
        if self.backend.profile() == Profile::Search {
            return self.search_room(title).await;
        }

        if let Some(id) = find_room(self.cache.rooms(false).await?, title) {
            return Ok(id);
        }
        debug!(title, "room miss, forcing rooms refresh");
        find_room(self.cache.rooms(true).await?, title)
            .ok_or_else(|| Error::not_found(EntityKind::Room, title))
    }

    /// Best-effort batch resolution of member names within one room.
    ///
    /// If any requested name is unresolved against the cached list, the
    /// room's slot is evicted and the whole batch retried once against a
    /// fresh list. On the search profile a name still missing from the
    /// member list falls back to a friends search (remark first, then
    /// nickname). Names unresolved after that are logged and skipped.
    pub async fn resolve_room_members(
        &mut self,
        room_id: &str,
        names: &[&str],
    ) -> Result<Vec<RoomMember>> {
        let mut slots = align_members(self.cache.room_members(room_id, false).await?, names);

        if slots.iter().any(Option::is_none) {
            self.cache.evict_room(room_id);
            slots = align_members(self.cache.room_members(room_id, false).await?, names);
        }

        if slots.iter().any(Option::is_none) && self.backend.profile() == Profile::Search {
            for (slot, name) in slots.iter_mut().zip(names) {
                if slot.is_some() {
                    continue;
                }
                let hit = self
                    .backend
                    .search_contact(name)
                    .await
                    .map_err(Error::directory_fetch)?;
                if let Some(contact) = hit {
                    debug!(room_id, name, "member resolved through friends search");
                    *slot = Some(RoomMember {
                        id: contact.id,
                        display_name: contact.nickname,
                    });
                }
            }
        }

        let missing: Vec<&&str> = names
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            warn!(room_id, ?missing, "some member names did not resolve");
        }
        Ok(slots.into_iter().flatten().collect())
    }

    async fn search_contact(&mut self, name: &str) -> Result<String> {
        let hit = self
            .backend
            .search_contact(name)
            .await
            .map_err(Error::directory_fetch)?;
        if let Some(contact) = hit {
            return Ok(contact.id);
        }
        debug!(name, "contact miss, refreshing search index");
        self.backend
            .refresh_index()
            .await
            .map_err(Error::directory_fetch)?;
        self.backend
            .search_contact(name)
            .await
            .map_err(Error::directory_fetch)?
            .map(|c| c.id)
            .ok_or_else(|| Error::not_found(EntityKind::Contact, name))
    }

    async fn search_room(&mut self, title: &str) -> Result<String> {
        let hit = self
            .backend
            .search_room(title)
            .await
            .map_err(Error::directory_fetch)?;
        if let Some(room) = hit {
            return Ok(room.id);
        }
        debug!(title, "room miss, refreshing search index");
        self.backend
            .refresh_index()
            .await
            .map_err(Error::directory_fetch)?;
        self.backend
            .search_room(title)
            .await
            .map_err(Error::directory_fetch)?
            .map(|r| r.id)
            .ok_or_else(|| Error::not_found(EntityKind::Room, title))
    }
}

/// Exact-match scan: the remark pass runs over the whole list before the
/// nickname pass, so a remark hit anywhere beats a nickname hit.
fn find_contact(friends: &[ContactEntry], name: &str, with_remarks: bool) -> Option<String> {
    if with_remarks
        && let Some(hit) = friends.iter().find(|c| c.remark.as_deref() == Some(name))
    {
        return Some(hit.id.clone());
    }
    friends
        .iter()
        .find(|c| c.nickname == name)
        .map(|c| c.id.clone())
}

fn find_room(rooms: &[RoomEntry], title: &str) -> Option<String> {
    rooms.iter().find(|r| r.title == title).map(|r| r.id.clone())
}

/// One slot per requested name, in request order.
fn align_members(members: &[RoomMember], names: &[&str]) -> Vec<Option<RoomMember>> {
    names
        .iter()
        .map(|name| {
            members
                .iter()
                .find(|m| m.display_name == *name)
                .cloned()
        })
        .collect()
}
