use crate::domain::account::{Account, AccountNumber};
use crate::domain::ports::{AccountLease, AccountStore, TransactionLedger};
use crate::domain::transaction::{
    ExecutionOutcome, ExecutionRequest, TransactionId, TransactionKind, TransactionRecord,
    TransactionState,
};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

struct Row {
    account: Account,
    /// Per-row pessimistic lock. Held by at most one execution at a time;
    /// the owned guard travels inside the [`AccountLease`].
    lock: Arc<Mutex<()>>,
}

/// Thread-safe in-memory account store with per-row exclusive locking.
///
/// Rows are keyed by external account number, which the onboarding contract
/// guarantees to be unique. `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    rows: Arc<RwLock<HashMap<AccountNumber, Row>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account row. Account creation belongs to the external
    /// onboarding process, so this is not part of the [`AccountStore`] port.
    pub async fn insert(&self, account: Account) {
        let mut rows = self.rows.write().await;
        rows.insert(
            account.number.clone(),
            Row {
                account,
                lock: Arc::new(Mutex::new(())),
            },
        );
    }

    /// Snapshot of all accounts, ordered by account number.
    pub async fn accounts(&self) -> Vec<Account> {
        let rows = self.rows.read().await;
        let mut accounts: Vec<Account> = rows.values().map(|row| row.account.clone()).collect();
        accounts.sort_by(|a, b| a.number.cmp(&b.number));
        accounts
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_for_update(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<AccountLease>, StoreError> {
        // resolve the row lock without holding the map lock across the wait
        let lock = {
            let rows = self.rows.read().await;
            match rows.get(number) {
                Some(row) => Arc::clone(&row.lock),
                None => return Ok(None),
            }
        };
        let guard = lock.lock_owned().await;

        // re-read after acquisition so the lease sees the last committed state
        let rows = self.rows.read().await;
        match rows.get(number) {
            Some(row) => Ok(Some(AccountLease::new(row.account.clone(), guard))),
            None => Ok(None),
        }
    }

    async fn get_read_only(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(number).map(|row| row.account.clone()))
    }

    async fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        // validate the whole write set before touching any row
        for account in accounts {
            match rows.get(&account.number) {
                None => return Err(StoreError::AccountMissing(account.number.clone())),
                Some(row) if row.account.version != account.version => {
                    return Err(StoreError::VersionConflict(account.number.clone()));
                }
                Some(_) => {}
            }
        }

        for account in accounts {
            if let Some(row) = rows.get_mut(&account.number) {
                row.account = account.clone();
                row.account.version += 1;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct LedgerInner {
    next_id: u64,
    records: BTreeMap<TransactionId, TransactionRecord>,
}

/// In-memory append/update transaction ledger with engine-assigned
/// monotonic ids and a single terminal transition per record.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in id order.
    pub async fn records(&self) -> Vec<TransactionRecord> {
        let inner = self.inner.read().await;
        inner.records.values().cloned().collect()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn create(&self, request: &ExecutionRequest) -> Result<TransactionRecord, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = TransactionId(inner.next_id);
        let record = TransactionRecord {
            id,
            source_account_number: request.source.clone(),
            destination_account_number: request
                .destination
                .clone()
                .filter(|_| request.kind == TransactionKind::Transfer),
            kind: request.kind,
            amount: request.amount,
            description: request.description.clone(),
            timestamp: Utc::now(),
            state: TransactionState::Pending,
            error: None,
            version: 0,
        };
        inner.records.insert(id, record.clone());
        Ok(record)
    }

    async fn finalize(
        &self,
        id: TransactionId,
        outcome: ExecutionOutcome,
    ) -> Result<TransactionRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(StoreError::RecordNotFound(id))?;
        if record.state.is_terminal() {
            return Err(StoreError::AlreadyFinal(id, record.state));
        }
        match outcome {
            ExecutionOutcome::Completed => record.state = TransactionState::Completed,
            ExecutionOutcome::Failed(reason) => {
                record.state = TransactionState::Error;
                record.error = Some(reason);
            }
        }
        record.version += 1;
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).cloned())
    }
}
