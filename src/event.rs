//! Service event system.

use tokio::sync::broadcast;

/// Events emitted by the service.
#[derive(Debug, Clone)]
pub enum MarketplaceEvent {
    /// Service has started successfully.
    Started,

    /// Service is shutting down.
    ShuttingDown,

    /// A new account was created on first sign-in.
    UserSignedIn {
        /// Account identifier.
        user_id: String,
    },

    /// A creator published a new piece of content.
    PostCreated {
        /// Content identifier.
        post_id: String,
    },

    /// An entitlement record was written for a confirmed purchase.
    ViewRecorded {
        /// Paying account identifier.
        user_id: String,
        /// Unlocked content identifier.
        post_id: String,
    },

    /// An on-chain purchase settled.
    PurchaseSettled {
        /// Paying account identifier.
        user_id: String,
        /// Purchased content identifier.
        post_id: String,
        /// Settlement transaction hash.
        tx_hash: String,
    },

    /// A post was liked.
    PostLiked {
        /// Content identifier.
        post_id: String,
        /// New like count.
        like_count: i64,
    },

    /// A post was unliked.
    PostUnliked {
        /// Content identifier.
        post_id: String,
        /// New like count.
        like_count: i64,
    },

    /// Error occurred.
    Error {
        /// Error message.
        message: String,
    },
}

/// Channel for receiving service events.
pub type ServiceEventsChannel = broadcast::Receiver<MarketplaceEvent>;

/// Sender for service events.
pub type ServiceEventsSender = broadcast::Sender<MarketplaceEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (ServiceEventsSender, ServiceEventsChannel) {
    broadcast::channel(256)
}
