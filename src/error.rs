use crate::domain::account::{AccountNumber, AccountStatus};
use crate::domain::transaction::{TransactionId, TransactionState};
use rust_decimal::Decimal;
use thiserror::Error;

/// A well-formed request the engine declines to apply for domain reasons.
///
/// Business rejections are recorded in the ledger (state `Error` plus a
/// reason string) and returned to the caller as a finalized record. They are
/// never thrown past the coordinator boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("account {0} not found")]
    AccountNotFound(AccountNumber),

    #[error("account {number} is not active (status {status:?})")]
    AccountNotActive {
        number: AccountNumber,
        status: AccountStatus,
    },

    #[error("insufficient funds on account {number}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        number: AccountNumber,
        balance: Decimal,
        amount: Decimal,
    },
}

/// Failure raised by the balance mutator.
///
/// Non-positive amounts and a missing transfer destination cannot occur once
/// the coordinator has validated the request shape, so they are internal
/// consistency breaches, not business rejections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error("non-positive amount {0} reached the balance mutator")]
    NonPositiveAmount(Decimal),

    #[error("transfer reached the balance mutator without a destination account")]
    MissingDestination,
}

/// Failure raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("version conflict writing account {0}")]
    VersionConflict(AccountNumber),

    #[error("account {0} is not stored")]
    AccountMissing(AccountNumber),

    #[error("transaction {0} not found")]
    RecordNotFound(TransactionId),

    #[error("transaction {0} already finalized as {1:?}")]
    AlreadyFinal(TransactionId, TransactionState),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error returned by
/// [`ExecutionCoordinator::execute`](crate::application::coordinator::ExecutionCoordinator::execute).
///
/// `MalformedRequest` and `Internal` are permanent: redelivering the message
/// cannot change the result. `Store` and `LockWait` are infrastructure
/// failures and safe to redeliver.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("timed out waiting for the lock on account {0}")]
    LockWait(AccountNumber),

    #[error("internal inconsistency: {0}")]
    Internal(String),
}
