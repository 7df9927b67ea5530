use crate::domain::account::AccountNumber;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-assigned monotonic id of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

/// State machine of a transaction record: `Pending` → `Completed` | `Error`.
/// Terminal states are final; a failed record is never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    Pending,
    Completed,
    Error,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

/// One transaction request routed to the coordinator.
///
/// Carries the raw, transport-decoded fields; shape validation happens
/// inside [`ExecutionCoordinator::execute`](crate::application::coordinator::ExecutionCoordinator::execute),
/// before any ledger entry is created.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub kind: TransactionKind,
    pub source: AccountNumber,
    pub destination: Option<AccountNumber>,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Terminal outcome applied by the ledger's finalize step.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Completed,
    /// Rejection or failure, with the reason recorded in the ledger.
    Failed(String),
}

/// The durable, auditable representation of one execution attempt.
///
/// Created in `Pending` state before any balance mutation begins and
/// finalized exactly once within the same attempt. Retained indefinitely for
/// audit and status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub source_account_number: AccountNumber,
    /// Present only for transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_number: Option<AccountNumber>,
    pub kind: TransactionKind,
    /// Positive by the coordinator's shape validation.
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub state: TransactionState,
    /// Reason string written on every rejection path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_names() {
        let kind: TransactionKind = serde_json::from_str("\"TRANSFER\"").unwrap();
        assert_eq!(kind, TransactionKind::Transfer);
        assert_eq!(
            serde_json::to_string(&TransactionKind::Withdrawal).unwrap(),
            "\"WITHDRAWAL\""
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionState::Pending.is_terminal());
        assert!(TransactionState::Completed.is_terminal());
        assert!(TransactionState::Error.is_terminal());
    }
}
