use std::{sync::Arc, time::Duration};

use tracing::{error, info, warn};

use {
    courier_backends::{Backend, MediaKind, Mention, OutboundMessage},
    courier_directory::{Error as DirectoryError, Resolver},
};

use crate::{
    classify::classify,
    error::{Error, Result},
    request::{Origin, SendRequest},
};

/// Routes a structured send request to the single-chat or group-chat path
/// and normalizes it into backend sends.
///
/// Failure policy: backend send errors are logged and re-raised. The only
/// suppressed failures are partial member resolution (logged by the
/// resolver) and the per-entry-point cases documented on [`Origin`].
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    resolver: Resolver,
}

impl Dispatcher {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, cache_expiry: Duration) -> Self {
        let resolver = Resolver::new(Arc::clone(&backend), cache_expiry);
        Self { backend, resolver }
    }

    /// Resolver access, used for eager cache population at startup.
    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    pub async fn dispatch(&mut self, request: &SendRequest) -> Result<()> {
        let kind = classify(&request.body)?;
        let groups: Vec<&str> = request
            .groups
            .iter()
            .map(String::as_str)
            .filter(|g| !g.is_empty())
            .collect();

        if groups.is_empty() {
            return self.dispatch_private(request, kind).await;
        }
        for group in groups {
            self.dispatch_group(group, request, kind).await?;
        }
        Ok(())
    }

    async fn dispatch_group(
        &mut self,
        group: &str,
        request: &SendRequest,
        kind: MediaKind,
    ) -> Result<()> {
        let room_id = self.resolver.resolve_room(group).await?;
        let receivers: Vec<&str> = request
            .receivers
            .iter()
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .collect();

        if receivers.is_empty() {
            self.send_to(&room_id, kind, &request.body, Mention::None)
                .await?;
            info!(group, ?kind, "group message sent");
            return Ok(());
        }

        if request.wants_everyone() {
            self.send_to(&room_id, kind, &request.body, Mention::Everyone)
                .await?;
            info!(group, ?kind, "group message sent to everyone");
            return Ok(());
        }

        let members = self
            .resolver
            .resolve_room_members(&room_id, &receivers)
            .await?;
        if members.is_empty() {
            // Preserved asymmetry between the two entry points.
            match request.origin {
                Origin::Queue => {
                    warn!(group, ?receivers, "no member resolved, sending unaddressed");
                    self.send_to(&room_id, kind, &request.body, Mention::None)
                        .await?;
                },
                Origin::Command => {
                    warn!(group, ?receivers, "no member resolved, skipping send");
                },
            }
            return Ok(());
        }

        let mentioned = members.len();
        self.send_to(&room_id, kind, &request.body, Mention::Members(members))
            .await?;
        info!(group, mentioned, ?kind, "group message sent with mentions");
        Ok(())
    }

    async fn dispatch_private(&mut self, request: &SendRequest, kind: MediaKind) -> Result<()> {
        let receivers: Vec<&str> = request
            .receivers
            .iter()
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .collect();
        if receivers.is_empty() {
            return Err(Error::invalid_request(
                "receiver list is empty for a private send",
            ));
        }

        for name in receivers {
            let contact_id = match self.resolver.resolve_contact(name).await {
                Ok(id) => id,
                Err(e @ DirectoryError::NotFound { .. }) if request.origin == Origin::Queue => {
                    error!(receiver = name, error = %e, "skipping unresolved receiver");
                    continue;
                },
                Err(e) => return Err(e.into()),
            };
            self.send_to(&contact_id, kind, &request.body, Mention::None)
                .await?;
            info!(receiver = name, ?kind, "private message sent");
        }
        Ok(())
    }

    async fn send_to(
        &self,
        target: &str,
        kind: MediaKind,
        body: &str,
        mention: Mention,
    ) -> Result<()> {
        let message = OutboundMessage {
            kind,
            body,
            mention,
        };
        if let Err(e) = self.backend.send(target, &message).await {
            error!(target, error = %e, "backend send failed");
            return Err(e.into());
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use {
        super::*,
        courier_backends::{ContactEntry, Directory, Profile, RoomEntry, RoomMember},
        courier_directory::DEFAULT_EXPIRY,
    };

    #[derive(Debug, Clone, PartialEq)]
    struct SendRecord {
        target: String,
        kind: MediaKind,
        body: String,
        mention: Mention,
    }

    #[derive(Default)]
    struct RecordingBackend {
        members: Vec<RoomMember>,
        member_calls: AtomicUsize,
        sends: Mutex<Vec<SendRecord>>,
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        fn profile(&self) -> Profile {
            Profile::Bulk
        }

        async fn fetch_directory(&self) -> courier_backends::Result<Directory> {
            Ok(Directory {
                rooms: vec![RoomEntry {
                    id: "r-team".into(),
                    title: "Team A".into(),
                }],
                friends: vec![ContactEntry {
                    id: "u-alice".into(),
                    nickname: "Alice".into(),
                    remark: None,
                }],
            })
        }

        async fn room_members(&self, _room_id: &str) -> courier_backends::Result<Vec<RoomMember>> {
            self.member_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.members.clone())
        }

        async fn send(
            &self,
            target: &str,
            message: &OutboundMessage<'_>,
        ) -> courier_backends::Result<()> {
            self.sends.lock().unwrap().push(SendRecord {
                target: target.to_owned(),
                kind: message.kind,
                body: message.body.to_owned(),
                mention: message.mention.clone(),
            });
            Ok(())
        }
    }

    fn dispatcher(backend: &Arc<RecordingBackend>) -> Dispatcher {
        Dispatcher::new(Arc::clone(backend) as Arc<dyn Backend>, DEFAULT_EXPIRY)
    }

    fn request(receivers: &[&str], groups: &[&str], body: &str, origin: Origin) -> SendRequest {
        SendRequest {
            receivers: receivers.iter().map(|s| (*s).to_owned()).collect(),
            groups: groups.iter().map(|s| (*s).to_owned()).collect(),
            body: body.to_owned(),
            origin,
        }
    }

    #[tokio::test]
    async fn private_send_resolves_the_contact() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["Alice"], &[], "hi", Origin::Queue))
            .await
            .unwrap();

        let sends = backend.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].target, "u-alice");
        assert_eq!(sends[0].kind, MediaKind::Text);
        assert_eq!(sends[0].mention, Mention::None);
    }

    #[tokio::test]
    async fn everyone_send_skips_member_enumeration() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["所有人"], &["Team A"], "hello", Origin::Command))
            .await
            .unwrap();

        let sends = backend.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].target, "r-team");
        assert_eq!(sends[0].body, "hello");
        assert_eq!(sends[0].mention, Mention::Everyone);
        assert_eq!(backend.member_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolved_members_are_mentioned() {
        let backend = Arc::new(RecordingBackend {
            members: vec![RoomMember {
                id: "u-bo".into(),
                display_name: "Bo".into(),
            }],
            ..Default::default()
        });
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["Bo"], &["Team A"], "ping", Origin::Command))
            .await
            .unwrap();

        let sends = backend.sends.lock().unwrap();
        assert_eq!(
            sends[0].mention,
            Mention::Members(vec![RoomMember {
                id: "u-bo".into(),
                display_name: "Bo".into(),
            }])
        );
    }

    #[tokio::test]
    async fn empty_receivers_send_plain_to_the_room() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&[], &["Team A"], "notice", Origin::Command))
            .await
            .unwrap();

        let sends = backend.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].mention, Mention::None);
    }

    // The queue and command entry points deliberately diverge when no
    // requested member resolves; both behaviors are pinned here.

    #[tokio::test]
    async fn zero_resolved_members_queue_path_sends_unaddressed() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["Ghost"], &["Team A"], "hi", Origin::Queue))
            .await
            .unwrap();

        let sends = backend.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].mention, Mention::None);
    }

    #[tokio::test]
    async fn zero_resolved_members_command_path_sends_nothing() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["Ghost"], &["Team A"], "hi", Origin::Command))
            .await
            .unwrap();

        assert!(backend.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolved_private_name_queue_path_continues() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["Ghost", "Alice"], &[], "hi", Origin::Queue))
            .await
            .unwrap();

        let sends = backend.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].target, "u-alice");
    }

    #[tokio::test]
    async fn unresolved_private_name_command_path_aborts() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        let err = dispatcher
            .dispatch(&request(&["Ghost", "Alice"], &[], "hi", Origin::Command))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Resolve(DirectoryError::NotFound { .. })));
        assert!(backend.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_room_aborts_the_request() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        let err = dispatcher
            .dispatch(&request(&[], &["No Such Team"], "hi", Origin::Command))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Resolve(DirectoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn unsupported_media_rejects_before_any_resolution() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        let err = dispatcher
            .dispatch(&request(
                &["Alice"],
                &[],
                "https://x/y.unknownext",
                Origin::Queue,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedMedia { .. }));
        assert!(backend.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_private_receivers_are_invalid() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        let err = dispatcher
            .dispatch(&request(&[], &[], "hi", Origin::Command))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn media_url_is_classified_before_sending() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&request(&["Alice"], &[], "https://x/pic.png", Origin::Queue))
            .await
            .unwrap();

        assert_eq!(backend.sends.lock().unwrap()[0].kind, MediaKind::Image);
    }
}
