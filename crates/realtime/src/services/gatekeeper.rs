//! Connection admission.
//!
//! Runs once per connection. The resulting [`Session`] fixes the identity and
//! access level for the connection's whole lifetime; nothing is re-checked
//! per frame.

use std::sync::Arc;

use tracing::{error, warn};

use crate::entities::Identity;
use crate::repositories::RoomAuthorizer;
use crate::types::{Rejection, RoomAccess, RoomKey, UserId};

/// Who is connected to which room, with what access.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub room: RoomKey,
    pub access: RoomAccess,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn is_privileged(&self) -> bool {
        self.access.is_privileged()
    }
}

#[derive(Clone)]
pub struct Gatekeeper {
    authorizer: Arc<dyn RoomAuthorizer>,
}

impl Gatekeeper {
    pub fn new(authorizer: Arc<dyn RoomAuthorizer>) -> Self {
        Self { authorizer }
    }

    /// Admit `identity` into `room` or explain why not.
    pub async fn admit(
        &self,
        identity: Option<Identity>,
        room: RoomKey,
    ) -> Result<Session, Rejection> {
        let Some(identity) = identity else {
            warn!(%room, "rejecting anonymous connection");
            return Err(Rejection::unauthenticated());
        };

        let access = match self.authorizer.access(&identity, &room).await {
            Ok(access) => access,
            Err(err) => {
                error!(%room, user_id = identity.user_id, error = %err, "room authorization lookup failed");
                return Err(Rejection::unavailable());
            }
        };

        if !access.is_allowed() {
            warn!(%room, user_id = identity.user_id, "rejecting unauthorized connection");
            return Err(Rejection::forbidden(&room));
        }

        Ok(Session {
            identity,
            room,
            access,
        })
    }
}
