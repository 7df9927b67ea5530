use super::account::{Account, AccountNumber};
use super::transaction::{ExecutionOutcome, ExecutionRequest, TransactionId, TransactionRecord};
use crate::error::StoreError;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// An exclusive hold on one account row, returned by
/// [`AccountStore::get_for_update`].
///
/// The lease carries the row snapshot read *after* the lock was acquired, so
/// the holder always sees the last committed state. Dropping the lease
/// releases the lock and ends the holder's claim on the row.
pub struct AccountLease {
    pub account: Account,
    _hold: Box<dyn Any + Send>,
}

impl AccountLease {
    /// Wraps a backend-specific lock guard. The guard is kept alive for the
    /// lifetime of the lease and released on drop.
    pub fn new(account: Account, hold: impl Any + Send) -> Self {
        Self {
            account,
            _hold: Box::new(hold),
        }
    }
}

/// Storage port for account rows.
///
/// Backends must provide transactional read-modify-write semantics and
/// per-row exclusive locking; any store with those capabilities qualifies.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Lock-then-read: acquires the exclusive lock on the identified row,
    /// blocking concurrent callers for the same account number until the
    /// holder's lease is dropped. Returns `None` without locking when the
    /// number does not resolve. Must only be called inside the coordinator's
    /// execution scope.
    async fn get_for_update(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<AccountLease>, StoreError>;

    /// Unlocked snapshot read, for non-mutating queries only.
    async fn get_read_only(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError>;

    /// Writes one execution's write set atomically. Every row's stored
    /// version must equal the submitted version and is incremented on
    /// commit; a mismatch rejects the whole set and writes nothing.
    async fn save(&self, accounts: &[Account]) -> Result<(), StoreError>;
}

/// Storage port for the transaction ledger.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Appends a `Pending` record with a fresh monotonic id. The write is
    /// durable and visible before any account mutation begins, so a crash
    /// mid-execution leaves a discoverable record rather than a silent gap.
    async fn create(&self, request: &ExecutionRequest) -> Result<TransactionRecord, StoreError>;

    /// Applies the single terminal transition for `id` and returns the
    /// finalized record. A record that is already terminal yields
    /// [`StoreError::AlreadyFinal`]; no legal transition exists out of a
    /// terminal state.
    async fn finalize(
        &self,
        id: TransactionId,
        outcome: ExecutionOutcome,
    ) -> Result<TransactionRecord, StoreError>;

    /// Read-only lookup for status queries.
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type TransactionLedgerRef = Arc<dyn TransactionLedger>;
