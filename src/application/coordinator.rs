use crate::domain::account::{AccountNumber, Amount};
use crate::domain::mutation;
use crate::domain::ports::{AccountLease, AccountStoreRef, TransactionLedgerRef};
use crate::domain::transaction::{
    ExecutionOutcome, ExecutionRequest, TransactionKind, TransactionRecord,
};
use crate::error::{ExecutionError, MutationError, RejectReason, StoreError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Failure inside the locked section of one execution attempt. Business
/// rejections finalize the record and are returned to the caller;
/// infrastructure failures finalize best-effort and then propagate.
enum ApplyError {
    Rejected(RejectReason),
    Infrastructure(ExecutionError),
}

impl From<StoreError> for ApplyError {
    fn from(error: StoreError) -> Self {
        ApplyError::Infrastructure(ExecutionError::Store(error))
    }
}

impl From<MutationError> for ApplyError {
    fn from(error: MutationError) -> Self {
        match error {
            MutationError::Rejected(reason) => ApplyError::Rejected(reason),
            other => ApplyError::Infrastructure(ExecutionError::Internal(other.to_string())),
        }
    }
}

/// Orchestrates one transaction request end to end:
/// create ledger entry → acquire account lock(s) → mutate → finalize.
///
/// The whole sequence runs inside one logical transaction boundary: the
/// account lease(s) are held from the locked read until the write set has
/// committed, so no concurrent execution can read a stale balance for the
/// same account.
pub struct ExecutionCoordinator {
    accounts: AccountStoreRef,
    ledger: TransactionLedgerRef,
    lock_wait: Duration,
}

impl ExecutionCoordinator {
    pub fn new(accounts: AccountStoreRef, ledger: TransactionLedgerRef, lock_wait: Duration) -> Self {
        Self {
            accounts,
            ledger,
            lock_wait,
        }
    }

    /// Executes one pre-validated transaction request.
    ///
    /// Structural violations fail fast with
    /// [`ExecutionError::MalformedRequest`] before any ledger entry exists.
    /// Once the `Pending` entry is created, every reachable exit path
    /// finalizes it exactly once: business rejections come back as the
    /// finalized record (state `Error` plus reason), infrastructure
    /// failures attempt a best-effort `Error` finalize and then propagate
    /// so the transport can redeliver.
    pub async fn execute(
        &self,
        request: ExecutionRequest,
    ) -> Result<TransactionRecord, ExecutionError> {
        validate(&request)?;

        let pending = self.ledger.create(&request).await?;
        let id = pending.id;
        debug!(id = %id, kind = ?request.kind, source = %request.source, "execution started");

        match self.apply(&request).await {
            Ok(()) => {
                let record = self.ledger.finalize(id, ExecutionOutcome::Completed).await?;
                info!(id = %id, kind = ?request.kind, source = %request.source, "execution completed");
                Ok(record)
            }
            Err(ApplyError::Rejected(reason)) => {
                match &reason {
                    // a rejection here means upstream validation raced execution
                    RejectReason::InsufficientFunds {
                        number,
                        balance,
                        amount,
                    } => warn!(
                        id = %id,
                        account = %number,
                        balance = %balance,
                        amount = %amount,
                        "insufficient funds at execution time"
                    ),
                    other => info!(id = %id, reason = %other, "execution rejected"),
                }
                let record = self
                    .ledger
                    .finalize(id, ExecutionOutcome::Failed(reason.to_string()))
                    .await?;
                Ok(record)
            }
            Err(ApplyError::Infrastructure(cause)) => {
                // best-effort terminal write; the store may be the thing
                // that failed, in which case the record stays pending for
                // the out-of-band reconciliation sweep
                if let Err(fin) = self
                    .ledger
                    .finalize(id, ExecutionOutcome::Failed(cause.to_string()))
                    .await
                {
                    error!(id = %id, error = %fin, "could not finalize after infrastructure failure");
                }
                error!(id = %id, error = %cause, "execution failed");
                Err(cause)
            }
        }
    }

    /// The locked section: acquire lease(s), mutate, commit the write set.
    /// Leases drop at the end of this scope, after the commit.
    async fn apply(&self, request: &ExecutionRequest) -> Result<(), ApplyError> {
        match request.kind {
            TransactionKind::Deposit | TransactionKind::Withdrawal => {
                let lease = self.lock(&request.source).await?;
                let update = mutation::apply(request.kind, &lease.account, None, request.amount)?;
                let mut account = lease.account.clone();
                account.balance = update.source;
                self.accounts.save(std::slice::from_ref(&account)).await?;
                Ok(())
            }
            TransactionKind::Transfer => {
                let destination = request.destination.clone().ok_or_else(|| {
                    ApplyError::Infrastructure(ExecutionError::Internal(
                        "transfer request lost its destination after validation".into(),
                    ))
                })?;

                // deterministic order by ascending account number, so two
                // opposite transfers between the same pair cannot deadlock
                let (first, second) = if request.source <= destination {
                    (&request.source, &destination)
                } else {
                    (&destination, &request.source)
                };
                let first_lease = self.lock(first).await?;
                let second_lease = self.lock(second).await?;
                let (source_lease, destination_lease) = if *first == request.source {
                    (&first_lease, &second_lease)
                } else {
                    (&second_lease, &first_lease)
                };

                let update = mutation::apply(
                    TransactionKind::Transfer,
                    &source_lease.account,
                    Some(&destination_lease.account),
                    request.amount,
                )?;
                let destination_balance = update.destination.ok_or_else(|| {
                    ApplyError::Infrastructure(ExecutionError::Internal(
                        "transfer mutation produced no destination balance".into(),
                    ))
                })?;

                let mut source = source_lease.account.clone();
                source.balance = update.source;
                let mut destination = destination_lease.account.clone();
                destination.balance = destination_balance;

                // both legs commit atomically; no partial transfer is observable
                self.accounts.save(&[source, destination]).await?;
                Ok(())
            }
        }
    }

    /// Acquires the row lock with a bounded wait. Lock wait is the only
    /// blocking point in the critical path; on timeout the execution fails
    /// as a retryable infrastructure error.
    async fn lock(&self, number: &AccountNumber) -> Result<AccountLease, ApplyError> {
        match tokio::time::timeout(self.lock_wait, self.accounts.get_for_update(number)).await {
            Err(_) => Err(ApplyError::Infrastructure(ExecutionError::LockWait(
                number.clone(),
            ))),
            Ok(Err(store)) => Err(store.into()),
            Ok(Ok(None)) => Err(ApplyError::Rejected(RejectReason::AccountNotFound(
                number.clone(),
            ))),
            Ok(Ok(Some(lease))) => Ok(lease),
        }
    }
}

/// Request shape validation. Runs before any ledger write, so malformed
/// requests never pollute the ledger with `Pending` records.
fn validate(request: &ExecutionRequest) -> Result<(), ExecutionError> {
    if request.source.as_str().trim().is_empty() {
        return Err(ExecutionError::MalformedRequest(
            "source account number is required".into(),
        ));
    }
    Amount::new(request.amount)?;

    if request.kind == TransactionKind::Transfer {
        match &request.destination {
            None => {
                return Err(ExecutionError::MalformedRequest(
                    "destination account number is required for transfers".into(),
                ));
            }
            Some(destination) if destination.as_str().trim().is_empty() => {
                return Err(ExecutionError::MalformedRequest(
                    "destination account number is required for transfers".into(),
                ));
            }
            Some(destination) if *destination == request.source => {
                return Err(ExecutionError::MalformedRequest(
                    "transfer source and destination must differ".into(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Account, AccountStatus, Balance};
    use crate::domain::ports::AccountStore;
    use crate::domain::transaction::TransactionState;
    use crate::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedger};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn coordinator_with(
        accounts: &[Account],
    ) -> (ExecutionCoordinator, InMemoryAccountStore, InMemoryLedger) {
        let store = InMemoryAccountStore::new();
        for account in accounts {
            store.insert(account.clone()).await;
        }
        let ledger = InMemoryLedger::new();
        let coordinator = ExecutionCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(ledger.clone()),
            Duration::from_secs(5),
        );
        (coordinator, store, ledger)
    }

    fn deposit(source: &str, amount: rust_decimal::Decimal) -> ExecutionRequest {
        ExecutionRequest {
            kind: TransactionKind::Deposit,
            source: source.into(),
            destination: None,
            amount,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_deposit_completes_and_updates_balance() {
        let account = Account::new(
            1,
            "1234567890",
            Balance::new(dec!(100.00)),
            AccountStatus::Active,
        );
        let (coordinator, store, _) = coordinator_with(&[account]).await;

        let record = coordinator
            .execute(deposit("1234567890", dec!(50.50)))
            .await
            .unwrap();

        assert_eq!(record.state, TransactionState::Completed);
        let stored = store
            .get_read_only(&"1234567890".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.balance, Balance::new(dec!(150.50)));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_malformed_request_creates_no_ledger_entry() {
        let (coordinator, _, ledger) = coordinator_with(&[]).await;

        let result = coordinator.execute(deposit("", dec!(10.00))).await;
        assert!(matches!(result, Err(ExecutionError::MalformedRequest(_))));
        assert!(ledger.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_is_rejected_not_thrown() {
        let (coordinator, _, ledger) = coordinator_with(&[]).await;

        let record = coordinator
            .execute(deposit("0000000000", dec!(10.00)))
            .await
            .unwrap();

        assert_eq!(record.state, TransactionState::Error);
        assert!(record.error.as_deref().unwrap().contains("not found"));
        assert_eq!(ledger.records().await.len(), 1);
    }
}
