mod booking_api;
mod chat_api;
mod helpers;
mod member_api;
mod notification_api;
mod ride_api;
mod search_api;
mod vehicle_api;

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use oso::Oso;

use crate::{api::API, auth::authorizor, db::Store, error::Error, external::Notifier};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Most recent notifications returned with an inbox.
pub const INBOX_LIMIT: usize = 50;

#[derive(Clone, Debug)]
pub struct Settings {
    /// Upper bound on every individual store call.
    pub store_timeout: Duration,
    /// Offset used to read a ride's local `date` and `time`.
    pub timezone: FixedOffset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            timezone: Utc.fix(),
        }
    }
}

pub struct Engine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    authorizor: Oso,
    settings: Settings,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Result<Self, Error> {
        Ok(Self {
            store,
            notifier,
            authorizor: authorizor::new()?,
            settings,
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::unauthorized_error())
    }
}

impl API for Engine {}
