//! Purchase state machine.
//!
//! One [`PurchaseDriver::execute`] call drives a single purchase
//! attempt from validation through on-chain settlement to the local
//! entitlement write. Phases are published on a watch channel so a UI
//! can render a pending indicator and disable duplicate submissions
//! without blocking on the confirmation wait.
//!
//! Closing the phase receiver does not cancel anything: a submitted
//! transaction cannot be retracted, and the entitlement record is still
//! written once confirmation arrives, so a payer who walks away keeps
//! the access they paid for.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::entitlement::EntitlementCache;
use crate::error::{Error, Result};
use crate::settlement::contract::{SettlementContract, TxHash};
use crate::settlement::units::{token_units, NATIVE_DECIMALS};
use crate::store::Store;

/// Phases of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PurchasePhase {
    /// No attempt in flight.
    #[default]
    Idle,
    /// Checking session, content and price preconditions.
    Validating,
    /// Reading the current token allowance (token path only).
    CheckingAllowance,
    /// Waiting for an approval transaction (token path only).
    Approving,
    /// Simulating and submitting the payment transaction.
    Paying,
    /// Waiting for the payment transaction to be mined.
    Confirming,
    /// Payment confirmed and entitlement recorded.
    Settled,
    /// Attempt failed; the error went back to the caller.
    Failed,
}

impl PurchasePhase {
    /// Whether the attempt has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchasePhase::Settled | PurchasePhase::Failed)
    }
}

/// How the purchase is settled.
#[derive(Debug, Clone)]
pub enum PaymentMethod {
    /// Native currency, value attached to the payment call.
    Native,
    /// ERC-20 token transfer drawing on a pre-approved allowance.
    Token {
        /// Token contract address.
        address: String,
        /// Token decimals, for base-unit scaling.
        decimals: u8,
    },
}

/// Wallet and session state, passed explicitly into the flow rather
/// than read from ambient context.
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    /// Connected wallet address, if any.
    pub address: Option<String>,
    /// Whether the session is authenticated.
    pub authenticated: bool,
}

impl WalletSession {
    /// A connected, authenticated session for the given address.
    #[must_use]
    pub fn authenticated(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
            authenticated: true,
        }
    }

    /// Whether a wallet is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.address.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Outcome of a settled purchase.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    /// Hash of the confirmed payment transaction.
    pub tx_hash: TxHash,
    /// Paying account identifier.
    pub user_id: String,
    /// Purchased content identifier.
    pub post_id: String,
    /// Price paid, in the content's currency unit.
    pub amount: f64,
    /// Amount transferred, in token base units.
    pub units: u128,
}

/// Drives purchase attempts against a settlement contract.
pub struct PurchaseDriver<C> {
    contract: C,
    store: Store,
    cache: EntitlementCache,
    phase_tx: watch::Sender<PurchasePhase>,
}

impl<C: SettlementContract> PurchaseDriver<C> {
    /// Create a new driver.
    #[must_use]
    pub fn new(contract: C, store: Store, cache: EntitlementCache) -> Self {
        let (phase_tx, _) = watch::channel(PurchasePhase::Idle);
        Self {
            contract,
            store,
            cache,
            phase_tx,
        }
    }

    /// Subscribe to phase updates for this driver.
    #[must_use]
    pub fn phases(&self) -> watch::Receiver<PurchasePhase> {
        self.phase_tx.subscribe()
    }

    /// Run one purchase attempt to completion.
    ///
    /// No step retries automatically; on failure the attempt is
    /// terminal and a fresh call starts a new one.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the session or content fails
    /// preconditions, a settlement error from the chain path, or a
    /// storage error if the entitlement write fails after confirmation.
    pub async fn execute(
        &self,
        session: &WalletSession,
        buyer_id: &str,
        post_id: &str,
        method: PaymentMethod,
    ) -> Result<PurchaseReceipt> {
        let result = self.run(session, buyer_id, post_id, method).await;
        if let Err(ref e) = result {
            warn!("Purchase attempt for post {post_id} failed: {e}");
            self.set_phase(PurchasePhase::Failed);
        }
        result
    }

    async fn run(
        &self,
        session: &WalletSession,
        buyer_id: &str,
        post_id: &str,
        method: PaymentMethod,
    ) -> Result<PurchaseReceipt> {
        self.set_phase(PurchasePhase::Validating);

        let Some(buyer_address) = session.address.as_deref().filter(|a| !a.is_empty()) else {
            return Err(Error::Validation("connect a wallet to purchase".into()));
        };
        if !session.authenticated {
            return Err(Error::Validation("sign in to purchase".into()));
        }

        let post = self.store.post(post_id).await?;
        let Some(creator) = post.creator_address.as_deref().filter(|a| !a.is_empty()) else {
            return Err(Error::Validation(
                "content has no creator payout address".into(),
            ));
        };
        if post.price <= 0.0 {
            return Err(Error::Validation("content does not require payment".into()));
        }

        let (tx_hash, units) = match method {
            PaymentMethod::Native => {
                let units = token_units(post.price, NATIVE_DECIMALS)?;
                self.set_phase(PurchasePhase::Paying);
                self.contract
                    .simulate_pay_eth(creator, post_id, units)
                    .await?;
                let tx = self.contract.pay_eth(creator, post_id, units).await?;
                (tx, units)
            }
            PaymentMethod::Token { address, decimals } => {
                let units = token_units(post.price, decimals)?;

                self.set_phase(PurchasePhase::CheckingAllowance);
                let current = self.contract.allowance(buyer_address, &address).await?;
                if current < units {
                    debug!(
                        "Allowance {current} below required {units} for token {address}, approving"
                    );
                    self.set_phase(PurchasePhase::Approving);
                    let approval = self.contract.approve(&address, units).await?;
                    self.contract.wait_for_confirmation(&approval).await?;
                }

                self.set_phase(PurchasePhase::Paying);
                self.contract
                    .simulate_pay_token(creator, post_id, units, &address)
                    .await?;
                let tx = self
                    .contract
                    .pay_token(creator, post_id, units, &address)
                    .await?;
                (tx, units)
            }
        };

        self.set_phase(PurchasePhase::Confirming);
        self.contract.wait_for_confirmation(&tx_hash).await?;

        // Settlement is confirmed; the local record is a cache of that
        // fact. A concurrent attempt that confirmed first already wrote
        // the row, which is not an error.
        match self
            .store
            .create_view_content(buyer_id, post_id, post.price, true)
            .await
        {
            Ok(_) => {}
            Err(Error::AlreadyViewed) => {
                debug!("Entitlement for ({buyer_id}, {post_id}) already recorded");
            }
            Err(e) => return Err(e),
        }
        self.cache.insert(buyer_id, post_id);

        self.set_phase(PurchasePhase::Settled);
        info!("Purchase of post {post_id} by {buyer_id} settled in {tx_hash}");

        Ok(PurchaseReceipt {
            tx_hash,
            user_id: buyer_id.to_string(),
            post_id: post_id.to_string(),
            amount: post.price,
            units,
        })
    }

    fn set_phase(&self, phase: PurchasePhase) {
        let _ = self.phase_tx.send(phase);
    }
}
