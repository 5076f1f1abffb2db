//! Entitlement classification for gated content.
//!
//! The read path that decides locked vs unlocked:
//!
//! ```text
//! check_access(account, content)
//!        │
//!        ▼
//!   price <= 0 ──────────────► FREE
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ local views row  │──hit──► ENTITLED (recorded)
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ LRU cache        │──hit──► ENTITLED (cached)
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ hasPaid read     │──true─► cache + ENTITLED (on-chain)
//! └────────┬─────────┘
//!          ▼
//!   false / any error ───────► LOCKED
//! ```

mod cache;
mod engine;

pub use cache::{CacheStats, EntitlementCache};
pub use engine::{AccessStatus, EntitlementEngine, EntitlementSource};
