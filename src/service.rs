//! Service wiring - store, entitlement engine, events and shutdown.

use crate::config::ServiceConfig;
use crate::entitlement::{AccessStatus, EntitlementCache, EntitlementEngine};
use crate::error::Result;
use crate::event::{create_event_channel, MarketplaceEvent, ServiceEventsChannel, ServiceEventsSender};
use crate::settlement::{
    PaymentMethod, PurchaseDriver, PurchasePhase, PurchaseReceipt, SettlementContract,
    SettlementError, WalletSession,
};
use crate::store::queries::posts::Post;
use crate::store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Builder for constructing the marketplace service.
pub struct ServiceBuilder {
    config: ServiceConfig,
    contract: Option<Arc<dyn SettlementContract>>,
}

impl ServiceBuilder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            contract: None,
        }
    }

    /// Attach the settlement contract used for on-chain reads and
    /// purchases. Without one, only local entitlement records unlock
    /// paid content and purchases cannot be driven.
    #[must_use]
    pub fn with_contract(mut self, contract: Arc<dyn SettlementContract>) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or database cannot be
    /// opened.
    pub fn build(self) -> Result<RunningService> {
        info!("Building peekly-service with config: {:?}", self.config);

        std::fs::create_dir_all(&self.config.root_dir)?;
        let store = Store::open(&self.config.database_path())?;

        let cache = EntitlementCache::with_capacity(self.config.cache_capacity);
        let contract = self.contract.filter(|_| self.config.settlement.enabled);
        if contract.is_none() {
            warn!("No settlement contract attached - on-chain verification disabled");
        }

        let engine = EntitlementEngine::new(store.clone(), cache.clone(), contract.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, events_rx) = create_event_channel();

        Ok(RunningService {
            config: self.config,
            store,
            cache,
            engine,
            contract,
            shutdown_tx,
            shutdown_rx,
            events_tx,
            events_rx: Some(events_rx),
        })
    }

    /// Build a service over an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn build_in_memory(self) -> Result<RunningService> {
        let store = Store::open_memory()?;
        let cache = EntitlementCache::with_capacity(self.config.cache_capacity);
        let contract = self.contract.filter(|_| self.config.settlement.enabled);
        let engine = EntitlementEngine::new(store.clone(), cache.clone(), contract.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, events_rx) = create_event_channel();

        Ok(RunningService {
            config: self.config,
            store,
            cache,
            engine,
            contract,
            shutdown_tx,
            shutdown_rx,
            events_tx,
            events_rx: Some(events_rx),
        })
    }
}

/// A running marketplace service.
pub struct RunningService {
    config: ServiceConfig,
    store: Store,
    cache: EntitlementCache,
    engine: EntitlementEngine,
    contract: Option<Arc<dyn SettlementContract>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    events_tx: ServiceEventsSender,
    events_rx: Option<ServiceEventsChannel>,
}

impl RunningService {
    /// Get the service's root directory.
    #[must_use]
    pub fn root_dir(&self) -> &PathBuf {
        &self.config.root_dir
    }

    /// Get the store handle.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get the entitlement engine.
    #[must_use]
    pub fn entitlements(&self) -> &EntitlementEngine {
        &self.engine
    }

    /// Get a receiver for service events.
    ///
    /// Note: Can only be called once. Subsequent calls return None.
    pub fn events(&mut self) -> Option<ServiceEventsChannel> {
        self.events_rx.take()
    }

    /// Subscribe to service events.
    #[must_use]
    pub fn subscribe_events(&self) -> ServiceEventsChannel {
        self.events_tx.subscribe()
    }

    /// Classify access for an account and a content item.
    pub async fn check_access(&self, user_id: Option<&str>, post: &Post) -> AccessStatus {
        self.engine.check_access(user_id, post).await
    }

    /// Sign an account in, emitting an event when one is created.
    ///
    /// # Errors
    ///
    /// See [`Store::sign_in`].
    pub async fn sign_in(
        &self,
        address: Option<&str>,
        username: Option<&str>,
    ) -> Result<crate::store::queries::users::User> {
        let user = self.store.sign_in(address, username).await?;
        let _ = self.events_tx.send(MarketplaceEvent::UserSignedIn {
            user_id: user.id.clone(),
        });
        Ok(user)
    }

    /// Publish a new content item, emitting an event on success.
    ///
    /// # Errors
    ///
    /// See [`Store::create_post`].
    pub async fn create_post(
        &self,
        user_id: &str,
        ipfs: &str,
        description: &str,
        price: f64,
        creator_address: Option<&str>,
    ) -> Result<Post> {
        let post = self
            .store
            .create_post(user_id, ipfs, description, price, creator_address)
            .await?;
        let _ = self.events_tx.send(MarketplaceEvent::PostCreated {
            post_id: post.id.clone(),
        });
        Ok(post)
    }

    /// Start a purchase attempt on a background task.
    ///
    /// The returned [`PurchaseInFlight`] carries the phase receiver, so
    /// a UI can render the pending indicator (and disable duplicate
    /// submissions) while settlement proceeds, then collect the receipt
    /// with [`PurchaseInFlight::wait`]. Settlement events are emitted
    /// when the attempt finishes.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no settlement contract is
    /// attached.
    pub fn start_purchase(
        &self,
        session: &WalletSession,
        buyer_id: &str,
        post_id: &str,
        method: PaymentMethod,
    ) -> Result<PurchaseInFlight> {
        let Some(contract) = self.contract.clone() else {
            return Err(crate::Error::Validation(
                "no settlement contract configured".into(),
            ));
        };

        let driver = PurchaseDriver::new(contract, self.store.clone(), self.cache.clone());
        let phases = driver.phases();

        let events_tx = self.events_tx.clone();
        let session = session.clone();
        let buyer_id = buyer_id.to_string();
        let post_id = post_id.to_string();
        let handle = tokio::spawn(async move {
            let result = driver.execute(&session, &buyer_id, &post_id, method).await;
            match &result {
                Ok(receipt) => {
                    let _ = events_tx.send(MarketplaceEvent::PurchaseSettled {
                        user_id: receipt.user_id.clone(),
                        post_id: receipt.post_id.clone(),
                        tx_hash: receipt.tx_hash.clone(),
                    });
                    let _ = events_tx.send(MarketplaceEvent::ViewRecorded {
                        user_id: receipt.user_id.clone(),
                        post_id: receipt.post_id.clone(),
                    });
                }
                Err(e) => {
                    let _ = events_tx.send(MarketplaceEvent::Error {
                        message: format!("purchase of {post_id} failed: {e}"),
                    });
                }
            }
            result
        });

        Ok(PurchaseInFlight { phases, handle })
    }

    /// Drive one purchase attempt end to end and emit settlement
    /// events.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no settlement contract is
    /// attached, otherwise whatever the purchase flow returns.
    pub async fn purchase(
        &self,
        session: &WalletSession,
        buyer_id: &str,
        post_id: &str,
        method: PaymentMethod,
    ) -> Result<PurchaseReceipt> {
        self.start_purchase(session, buyer_id, post_id, method)?
            .wait()
            .await
    }

    /// Like a content item and emit the counter update.
    ///
    /// # Errors
    ///
    /// See [`Store::like_post`].
    pub async fn like_post(&self, post_id: &str, user_id: &str) -> Result<i64> {
        let count = self.store.like_post(post_id, user_id).await?;
        let _ = self.events_tx.send(MarketplaceEvent::PostLiked {
            post_id: post_id.to_string(),
            like_count: count,
        });
        Ok(count)
    }

    /// Unlike a content item and emit the counter update.
    ///
    /// # Errors
    ///
    /// See [`Store::unlike_post`].
    pub async fn unlike_post(&self, post_id: &str, user_id: &str) -> Result<i64> {
        let count = self.store.unlike_post(post_id, user_id).await?;
        let _ = self.events_tx.send(MarketplaceEvent::PostUnliked {
            post_id: post_id.to_string(),
            like_count: count,
        });
        Ok(count)
    }

    /// Run the service until shutdown is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the service encounters a fatal error.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting peekly-service");
        let _ = self.events_tx.send(MarketplaceEvent::Started);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("Shutdown signal received");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown");
                    self.shutdown();
                    break;
                }
            }
        }

        let _ = self.events_tx.send(MarketplaceEvent::ShuttingDown);
        info!("Service shutdown complete");
        Ok(())
    }

    /// Request the service to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// A purchase attempt running on a background task.
///
/// Dropping this does not cancel the attempt; a submitted transaction
/// cannot be retracted, and the entitlement is still recorded once
/// confirmation arrives.
pub struct PurchaseInFlight {
    /// Live phase of the attempt, for pending indicators.
    pub phases: watch::Receiver<PurchasePhase>,
    handle: tokio::task::JoinHandle<Result<PurchaseReceipt>>,
}

impl PurchaseInFlight {
    /// Wait for the attempt to finish and return its receipt.
    ///
    /// # Errors
    ///
    /// Returns whatever the purchase flow returns, or a settlement
    /// error if the background task was aborted.
    pub async fn wait(self) -> Result<PurchaseReceipt> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(SettlementError::Other(format!("purchase task failed: {e}")).into()),
        }
    }
}
