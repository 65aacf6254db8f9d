//! Host resolution: pick the publishing participant of a room.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ResolveError, SessionResult};

/// Lists who is in a room.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Participant identities in the order the service reports them.
    async fn list_participants(&self, room: &str) -> SessionResult<Vec<String>>;
}

#[derive(Clone)]
pub struct ParticipantResolver {
    service: Arc<dyn SessionService>,
    suffix: String,
}

impl ParticipantResolver {
    pub fn new(service: Arc<dyn SessionService>, suffix: &str) -> Self {
        Self {
            service,
            suffix: suffix.to_string(),
        }
    }

    /// The first participant of `room` whose identity ends with the
    /// publisher suffix.
    ///
    /// Order comes from the service and may differ between calls.
    pub async fn resolve(&self, room: &str) -> Result<String, ResolveError> {
        let identities = self
            .service
            .list_participants(room)
            .await
            .map_err(|source| ResolveError::Session {
                room: room.to_string(),
                source,
            })?;

        if identities.is_empty() {
            return Err(ResolveError::NoParticipants(room.to_string()));
        }

        match pick_host(&identities, &self.suffix) {
            Some(host) => {
                debug!(%room, %host, "resolved host");
                Ok(host.to_string())
            }
            None => Err(ResolveError::NoHostFound(room.to_string())),
        }
    }
}

fn pick_host<'a>(identities: &'a [String], suffix: &str) -> Option<&'a str> {
    identities
        .iter()
        .map(String::as_str)
        .find(|identity| identity.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::SessionError;

    struct StaticRooms(HashMap<&'static str, Vec<&'static str>>);

    #[async_trait]
    impl SessionService for StaticRooms {
        async fn list_participants(&self, room: &str) -> SessionResult<Vec<String>> {
            match self.0.get(room) {
                Some(ids) => Ok(ids.iter().map(|s| s.to_string()).collect()),
                None => Err(SessionError::Status {
                    status: 404,
                    body: "room not found".to_string(),
                }),
            }
        }
    }

    fn resolver(rooms: &[(&'static str, Vec<&'static str>)]) -> ParticipantResolver {
        let service = StaticRooms(rooms.iter().cloned().collect());
        ParticipantResolver::new(Arc::new(service), "_pub_0")
    }

    #[tokio::test]
    async fn publisher_suffix_wins() {
        let r = resolver(&[("room", vec!["u1", "u2_pub_0"])]);
        assert_eq!(r.resolve("room").await.unwrap(), "u2_pub_0");
    }

    #[tokio::test]
    async fn first_match_wins() {
        let r = resolver(&[("room", vec!["a_pub_0", "b_pub_0"])]);
        assert_eq!(r.resolve("room").await.unwrap(), "a_pub_0");
    }

    #[tokio::test]
    async fn no_suffix_match_is_no_host() {
        let r = resolver(&[("room", vec!["u1", "u2"])]);
        assert!(matches!(
            r.resolve("room").await,
            Err(ResolveError::NoHostFound(room)) if room == "room"
        ));
    }

    #[tokio::test]
    async fn empty_room_is_no_participants() {
        let r = resolver(&[("room", vec![])]);
        assert!(matches!(
            r.resolve("room").await,
            Err(ResolveError::NoParticipants(_))
        ));
    }

    #[tokio::test]
    async fn service_failure_carries_room() {
        let r = resolver(&[]);
        match r.resolve("missing").await {
            Err(ResolveError::Session { room, .. }) => assert_eq!(room, "missing"),
            other => panic!("expected session error, got {other:?}"),
        }
    }

    #[test]
    fn suffix_must_be_at_the_end() {
        let ids = vec!["x_pub_0_extra".to_string()];
        assert_eq!(pick_host(&ids, "_pub_0"), None);
    }
}
