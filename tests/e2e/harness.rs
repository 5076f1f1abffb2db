//! Test harness wiring an in-memory service to a fake chain.
//!
//! The `TestHarness` provides a unified fixture for E2E tests: an
//! in-memory service with a [`FakeChain`] settlement contract whose
//! ledger the tests can inspect and seed directly.

use async_trait::async_trait;
use parking_lot::Mutex;
use peekly_service::{
    ServiceBuilder, ServiceConfig, SettlementContract, SettlementError, SettlementResult,
};
use peekly_service::{RunningService, TxHash};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-process stand-in for the settlement contract.
///
/// Payments move through the same two-step lifecycle as the real thing:
/// `pay_*` returns a transaction hash for a pending transfer, and
/// `wait_for_confirmation` lands it in the ledger. `has_paid` only sees
/// confirmed transfers, so a test that skips the wait observes an
/// unconfirmed chain.
#[derive(Default)]
pub struct FakeChain {
    /// Confirmed (payer address, content id) transfers.
    ledger: Mutex<HashSet<(String, String)>>,
    /// Submitted but unconfirmed transfers, keyed by tx hash.
    pending: Mutex<HashMap<TxHash, (String, String)>>,
    /// Allowance granted per token address.
    allowances: Mutex<HashMap<String, u128>>,
    /// Payer address attached to submissions.
    payer: Mutex<String>,
    /// When set, every simulation reverts with this message.
    revert: Mutex<Option<String>>,
    next_tx: Mutex<u64>,
}

impl FakeChain {
    /// Create a fake chain that attributes submissions to `payer`.
    pub fn for_payer(payer: &str) -> Self {
        let chain = Self::default();
        *chain.payer.lock() = payer.to_string();
        chain
    }

    /// Seed a confirmed payment directly, as if it had been made from
    /// another device.
    pub fn seed_payment(&self, account: &str, content_id: &str) {
        self.ledger
            .lock()
            .insert((account.to_string(), content_id.to_string()));
    }

    /// Make every subsequent simulation revert.
    pub fn revert_simulations(&self, reason: &str) {
        *self.revert.lock() = Some(reason.to_string());
    }

    /// Number of confirmed transfers in the ledger.
    pub fn confirmed_count(&self) -> usize {
        self.ledger.lock().len()
    }

    fn submit(&self, content_id: &str) -> TxHash {
        let mut next = self.next_tx.lock();
        *next += 1;
        let tx = format!("0xtx{next:04}");
        self.pending
            .lock()
            .insert(tx.clone(), (self.payer.lock().clone(), content_id.to_string()));
        tx
    }

    fn check_simulation(&self) -> SettlementResult<()> {
        match self.revert.lock().as_ref() {
            Some(reason) => Err(SettlementError::SimulationReverted(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SettlementContract for FakeChain {
    async fn has_paid(&self, account: &str, content_id: &str) -> SettlementResult<bool> {
        let paid = self
            .ledger
            .lock()
            .contains(&(account.to_string(), content_id.to_string()));
        Ok(paid)
    }

    async fn simulate_pay_eth(
        &self,
        _creator: &str,
        _content_id: &str,
        _value: u128,
    ) -> SettlementResult<()> {
        self.check_simulation()
    }

    async fn pay_eth(
        &self,
        _creator: &str,
        content_id: &str,
        _value: u128,
    ) -> SettlementResult<TxHash> {
        Ok(self.submit(content_id))
    }

    async fn allowance(&self, _owner: &str, token: &str) -> SettlementResult<u128> {
        Ok(self.allowances.lock().get(token).copied().unwrap_or(0))
    }

    async fn approve(&self, token: &str, amount: u128) -> SettlementResult<TxHash> {
        self.allowances.lock().insert(token.to_string(), amount);
        Ok(format!("0xapprove-{token}"))
    }

    async fn simulate_pay_token(
        &self,
        _creator: &str,
        _content_id: &str,
        _amount: u128,
        _token: &str,
    ) -> SettlementResult<()> {
        self.check_simulation()
    }

    async fn pay_token(
        &self,
        _creator: &str,
        content_id: &str,
        amount: u128,
        token: &str,
    ) -> SettlementResult<TxHash> {
        let granted = self.allowances.lock().get(token).copied().unwrap_or(0);
        if granted < amount {
            return Err(SettlementError::AllowanceTooLow {
                required: amount,
                current: granted,
            });
        }
        Ok(self.submit(content_id))
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> SettlementResult<()> {
        if let Some(transfer) = self.pending.lock().remove(tx_hash) {
            self.ledger.lock().insert(transfer);
        }
        // Approval hashes have no pending transfer; confirming them is
        // a no-op.
        Ok(())
    }
}

/// Test harness managing the complete test environment.
pub struct TestHarness {
    /// The running service under test.
    pub service: RunningService,
    /// The fake chain the service settles against.
    pub chain: Arc<FakeChain>,
}

impl TestHarness {
    /// Set up a service over an in-memory database with a fake chain
    /// attributing payments to `payer_address`.
    pub fn setup(payer_address: &str) -> Self {
        let chain = Arc::new(FakeChain::for_payer(payer_address));
        let service = ServiceBuilder::new(ServiceConfig::default())
            .with_contract(chain.clone())
            .build_in_memory()
            .expect("Failed to build service");
        Self { service, chain }
    }

    /// Set up a service with no settlement contract attached.
    pub fn setup_offline() -> Self {
        let chain = Arc::new(FakeChain::default());
        let service = ServiceBuilder::new(ServiceConfig::default())
            .build_in_memory()
            .expect("Failed to build service");
        Self { service, chain }
    }
}
