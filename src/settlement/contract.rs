//! Settlement contract interface.
//!
//! The on-chain contract and the wallet that signs for it are supplied
//! by the embedding application; the service only consumes this trait.
//! Failures are enumerated rather than carried as free-text messages,
//! so callers never classify errors by substring matching.

use async_trait::async_trait;

/// A submitted transaction hash.
pub type TxHash = String;

/// Structured failure reasons from the settlement layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    /// The wallet refused to sign or submit the transaction.
    #[error("transaction rejected by wallet")]
    Rejected,

    /// The payer cannot cover the transfer plus gas.
    #[error("insufficient funds to complete the payment")]
    InsufficientFunds,

    /// The spender allowance granted to the contract is below the
    /// required amount.
    #[error("token allowance too low: required {required}, current {current}")]
    AllowanceTooLow {
        /// Amount the purchase requires, in token base units.
        required: u128,
        /// Allowance currently granted, in token base units.
        current: u128,
    },

    /// The pre-flight simulation reverted; nothing was submitted.
    #[error("transaction simulation reverted: {0}")]
    SimulationReverted(String),

    /// The settlement layer is missing required configuration.
    #[error("settlement configuration missing: {0}")]
    MissingConfiguration(String),

    /// A network failure during send, read or confirmation wait.
    #[error("settlement network failure: {0}")]
    Network(String),

    /// Any other failure, with the raw underlying text preserved.
    #[error("settlement operation failed: {0}")]
    Other(String),
}

/// Result alias for settlement operations.
pub type SettlementResult<T> = std::result::Result<T, SettlementError>;

/// The payment settlement contract consumed by the purchase flow and
/// the entitlement engine.
///
/// `pay_*` submissions return as soon as the transaction is accepted
/// into the mempool; [`SettlementContract::wait_for_confirmation`] is
/// the suspension point where the flow parks until mining. Submitted
/// transactions cannot be retracted, which is why the purchase driver
/// keeps going after its caller loses interest.
#[async_trait]
pub trait SettlementContract: Send + Sync {
    /// Whether `account` has already paid for `content_id`.
    async fn has_paid(&self, account: &str, content_id: &str) -> SettlementResult<bool>;

    /// Dry-run a native-currency payment without submitting it.
    async fn simulate_pay_eth(
        &self,
        creator: &str,
        content_id: &str,
        value: u128,
    ) -> SettlementResult<()>;

    /// Submit a native-currency payment carrying `value` wei.
    async fn pay_eth(&self, creator: &str, content_id: &str, value: u128)
        -> SettlementResult<TxHash>;

    /// Current spending allowance `owner` has granted the contract for
    /// `token`, in token base units.
    async fn allowance(&self, owner: &str, token: &str) -> SettlementResult<u128>;

    /// Grant the contract an allowance of `amount` base units of
    /// `token`.
    async fn approve(&self, token: &str, amount: u128) -> SettlementResult<TxHash>;

    /// Dry-run a token payment without submitting it.
    async fn simulate_pay_token(
        &self,
        creator: &str,
        content_id: &str,
        amount: u128,
        token: &str,
    ) -> SettlementResult<()>;

    /// Submit a token payment drawing on the already-granted allowance.
    async fn pay_token(
        &self,
        creator: &str,
        content_id: &str,
        amount: u128,
        token: &str,
    ) -> SettlementResult<TxHash>;

    /// Wait until the transaction is mined and confirmed.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> SettlementResult<()>;
}

#[async_trait]
impl<T: SettlementContract + ?Sized> SettlementContract for std::sync::Arc<T> {
    async fn has_paid(&self, account: &str, content_id: &str) -> SettlementResult<bool> {
        (**self).has_paid(account, content_id).await
    }

    async fn simulate_pay_eth(
        &self,
        creator: &str,
        content_id: &str,
        value: u128,
    ) -> SettlementResult<()> {
        (**self).simulate_pay_eth(creator, content_id, value).await
    }

    async fn pay_eth(
        &self,
        creator: &str,
        content_id: &str,
        value: u128,
    ) -> SettlementResult<TxHash> {
        (**self).pay_eth(creator, content_id, value).await
    }

    async fn allowance(&self, owner: &str, token: &str) -> SettlementResult<u128> {
        (**self).allowance(owner, token).await
    }

    async fn approve(&self, token: &str, amount: u128) -> SettlementResult<TxHash> {
        (**self).approve(token, amount).await
    }

    async fn simulate_pay_token(
        &self,
        creator: &str,
        content_id: &str,
        amount: u128,
        token: &str,
    ) -> SettlementResult<()> {
        (**self)
            .simulate_pay_token(creator, content_id, amount, token)
            .await
    }

    async fn pay_token(
        &self,
        creator: &str,
        content_id: &str,
        amount: u128,
        token: &str,
    ) -> SettlementResult<TxHash> {
        (**self).pay_token(creator, content_id, amount, token).await
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> SettlementResult<()> {
        (**self).wait_for_confirmation(tx_hash).await
    }
}
