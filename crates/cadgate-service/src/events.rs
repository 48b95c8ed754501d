//! Cache invalidation notifications.
//!
//! Published after a webhook clears or refreshes an entry so connected guests
//! can reload. Delivery is best effort: publishing with no subscribers is not
//! an error, and a subscriber that falls behind skips the missed events.

use cadgate_core::{HashedToken, Tenant};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default capacity of the broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// An "updated" notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CadEvent {
    /// A call service record was cleared or refreshed.
    CallServiceUpdated {
        tenant: Tenant,
        call_service_guid: String,
    },
    /// A region's geofences were cleared.
    GeofencesUpdated { tenant: Tenant, region: u64 },
    /// A guest share's cached record was cleared.
    GuestShareUpdated {
        tenant: Tenant,
        guest_share_id: u64,
        token_hash: HashedToken,
    },
}

impl CadEvent {
    /// Topic the event is delivered on.
    #[must_use]
    pub fn channel(&self) -> String {
        match self {
            Self::CallServiceUpdated {
                tenant,
                call_service_guid,
            } => format!("call-service.updated.{}.{}", tenant, call_service_guid),
            Self::GeofencesUpdated { tenant, region } => {
                format!("geofences.updated.{}.{}", tenant, region)
            }
            Self::GuestShareUpdated {
                tenant,
                guest_share_id,
                ..
            } => format!("guest-share.updated.{}.{}", tenant, guest_share_id),
        }
    }

    #[must_use]
    pub fn tenant(&self) -> &Tenant {
        match self {
            Self::CallServiceUpdated { tenant, .. }
            | Self::GeofencesUpdated { tenant, .. }
            | Self::GuestShareUpdated { tenant, .. } => tenant,
        }
    }

    /// Short event name, used as the SSE event type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallServiceUpdated { .. } => "call-service.updated",
            Self::GeofencesUpdated { .. } => "geofences.updated",
            Self::GuestShareUpdated { .. } => "guest-share.updated",
        }
    }
}

/// Fan-out publisher for [`CadEvent`]s.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<CadEvent>,
}

impl EventPublisher {
    /// Create a publisher whose subscribers buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns how many subscribers received it.
    pub fn publish(&self, event: CadEvent) -> usize {
        let channel = event.channel();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(channel, receivers, "Published event");
                receivers
            }
            Err(_) => {
                debug!(channel, "Published event with no subscribers");
                0
            }
        }
    }

    /// Subscribe to all subsequent events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CadEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
