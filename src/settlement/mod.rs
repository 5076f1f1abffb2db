//! On-chain purchase settlement.
//!
//! One purchase attempt moves through the phases below; any failure is
//! terminal and surfaces to the caller, who may re-initiate.
//!
//! ```text
//!            IDLE
//!             │
//!             ▼
//!        VALIDATING ──────────────────────┐
//!             │                           │
//!     ┌───────┴────────┐                  │
//!   native           token                │
//!     │                │                  │
//!     │        CHECK_ALLOWANCE            │
//!     │        ┌───────┴───────┐          │
//!     │   sufficient      insufficient    │
//!     │        │               │          │
//!     │        │          APPROVING       │
//!     │        └───────┬───────┘          │
//!     ▼                ▼                  ▼
//!   PAYING ◄───────────┘               FAILED
//!     │       (simulate, then submit)     ▲
//!     ▼                                   │
//! CONFIRMING ─────────────────────────────┤
//!     │                                   │
//!     ▼                                   │
//!  SETTLED  (entitlement row + cache) ────┘
//! ```

mod contract;
mod flow;
mod units;

pub use contract::{SettlementContract, SettlementError, SettlementResult, TxHash};
pub use flow::{PaymentMethod, PurchaseDriver, PurchasePhase, PurchaseReceipt, WalletSession};
pub use units::{token_units, NATIVE_DECIMALS};
