//! Access classification combining local records, cache and chain.
//!
//! This is the read path that decides whether content renders in the
//! clear or gated.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::entitlement::cache::EntitlementCache;
use crate::settlement::SettlementContract;
use crate::store::queries::posts::Post;
use crate::store::Store;

/// Where an entitlement was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementSource {
    /// A local `views` row exists.
    Recorded,
    /// The (account, content) pair is in the in-process cache.
    Cached,
    /// The settlement contract's `hasPaid` read returned true.
    OnChain,
}

/// Three-way access classification for one (account, content) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// Non-positive price; always unlocked.
    Free,
    /// The account has paid for this content.
    Entitled(EntitlementSource),
    /// No entitlement found; render gated.
    Locked,
}

impl AccessStatus {
    /// Whether the content may be rendered unlocked.
    #[must_use]
    pub fn can_view(&self) -> bool {
        matches!(self, AccessStatus::Free | AccessStatus::Entitled(_))
    }
}

/// Answers "may this account view this content" with no side effects
/// beyond cache population.
///
/// Sources are consulted cheapest first: the local entitlement record,
/// the LRU cache, then the contract read. The chain is authoritative;
/// the local row and cache exist to avoid re-reading it. Every lookup
/// failure classifies as locked - a storage or network fault must never
/// unlock paid content.
pub struct EntitlementEngine {
    store: Store,
    cache: EntitlementCache,
    contract: Option<Arc<dyn SettlementContract>>,
}

impl EntitlementEngine {
    /// Create a new engine. Without a contract, only local records and
    /// the cache can unlock paid content.
    #[must_use]
    pub fn new(
        store: Store,
        cache: EntitlementCache,
        contract: Option<Arc<dyn SettlementContract>>,
    ) -> Self {
        Self {
            store,
            cache,
            contract,
        }
    }

    /// Classify access for an account (possibly anonymous) and a
    /// content item.
    pub async fn check_access(&self, user_id: Option<&str>, post: &Post) -> AccessStatus {
        if post.is_free() {
            return AccessStatus::Free;
        }
        let Some(user_id) = user_id else {
            return AccessStatus::Locked;
        };

        match self.store.has_viewed(user_id, &post.id).await {
            Ok(true) => return AccessStatus::Entitled(EntitlementSource::Recorded),
            Ok(false) => {}
            Err(e) => {
                // Fail closed on this source, but still try the others.
                warn!("Entitlement record lookup failed for ({user_id}, {}): {e}", post.id);
            }
        }

        if self.cache.contains(user_id, &post.id) {
            return AccessStatus::Entitled(EntitlementSource::Cached);
        }

        let Some(contract) = self.contract.as_deref() else {
            return AccessStatus::Locked;
        };
        let address = match self.store.user(user_id).await {
            Ok(user) => user.address,
            Err(e) => {
                warn!("Account lookup failed for {user_id}: {e}");
                return AccessStatus::Locked;
            }
        };
        let Some(address) = address.filter(|a| !a.is_empty()) else {
            return AccessStatus::Locked;
        };

        match contract.has_paid(&address, &post.id).await {
            Ok(true) => {
                debug!("On-chain payment found for ({user_id}, {})", post.id);
                self.cache.insert(user_id, &post.id);
                AccessStatus::Entitled(EntitlementSource::OnChain)
            }
            Ok(false) => AccessStatus::Locked,
            Err(e) => {
                warn!("hasPaid read failed for ({user_id}, {}): {e}", post.id);
                AccessStatus::Locked
            }
        }
    }

    /// Get cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> crate::entitlement::cache::CacheStats {
        self.cache.stats()
    }
}
