//! Read-only status surface backed by the ledger and unlocked account
//! reads. HTTP hosting is an external collaborator; this module only
//! provides the lookups and response shapes it serves.

use crate::domain::account::{Account, AccountNumber};
use crate::domain::ports::{AccountStoreRef, TransactionLedgerRef};
use crate::domain::transaction::{
    TransactionId, TransactionKind, TransactionRecord, TransactionState,
};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Response body for a transaction status lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    pub transaction_id: TransactionId,
    pub state: TransactionState,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<TransactionRecord> for TransactionStatusResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            transaction_id: record.id,
            state: record.state,
            kind: record.kind,
            amount: record.amount,
            timestamp: record.timestamp,
            description: record.description,
            error_message: record.error,
        }
    }
}

/// Response body for the service health probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Query handler for the status endpoints.
pub struct StatusQuery {
    ledger: TransactionLedgerRef,
    accounts: AccountStoreRef,
}

impl StatusQuery {
    pub fn new(ledger: TransactionLedgerRef, accounts: AccountStoreRef) -> Self {
        Self { ledger, accounts }
    }

    /// Looks up one transaction by id. `None` maps to a 404 at the HTTP
    /// layer. Terminal records never change, so repeated lookups return
    /// identical snapshots.
    pub async fn status(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionStatusResponse>, StoreError> {
        let record = self.ledger.find_by_id(id).await?;
        Ok(record.map(TransactionStatusResponse::from))
    }

    /// Unlocked account snapshot, never part of an execution.
    pub async fn account(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError> {
        self.accounts.get_read_only(number).await
    }

    pub fn health() -> HealthResponse {
        HealthResponse {
            status: "UP",
            service: "transaction executor",
        }
    }
}
