//! # peekly-service
//!
//! Entitlement and payment-settlement core for the Peekly content
//! marketplace: creators publish priced content, consumers pay (native
//! currency or ERC-20) to unlock viewing.
//!
//! The crate is organised around two collaborating flows:
//!
//! - **Off-chain entitlement records**: one `views` row per
//!   (account, content) pair, written once a purchase is confirmed and
//!   consulted by the rendering layer to decide locked vs unlocked.
//! - **On-chain settlement**: an external contract transfers value from
//!   payer to creator tagged with the content id, and answers
//!   `hasPaid(account, contentId)` on the read path.
//!
//! The on-chain read is authoritative; the local row and the in-process
//! LRU cache act as read-through caches populated only after confirmed
//! settlement. Any lookup failure classifies as locked (fail-closed).

#![warn(missing_docs)]

pub mod config;
pub mod entitlement;
pub mod error;
pub mod event;
pub mod service;
pub mod settlement;
pub mod store;

pub use config::ServiceConfig;
pub use entitlement::{AccessStatus, EntitlementCache, EntitlementEngine, EntitlementSource};
pub use error::{Error, Result};
pub use event::{MarketplaceEvent, ServiceEventsChannel, ServiceEventsSender};
pub use service::{PurchaseInFlight, RunningService, ServiceBuilder};
pub use settlement::{
    PaymentMethod, PurchaseDriver, PurchasePhase, PurchaseReceipt, SettlementContract,
    SettlementError, SettlementResult, TxHash, WalletSession,
};
pub use store::Store;
