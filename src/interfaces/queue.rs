//! Queue-facing ingestion adapter.
//!
//! Each transaction kind has one logical channel; a [`ChannelConsumer`]
//! drains it with a bounded worker pool and routes every payload through
//! the shared coordinator. Outcomes map to transport dispositions: business
//! results acknowledge, undeliverable payloads dead-letter, infrastructure
//! failures request redelivery. Retry and dead-letter policy itself belongs
//! to the transport.

use crate::application::coordinator::ExecutionCoordinator;
use crate::domain::account::AccountNumber;
use crate::domain::transaction::{ExecutionRequest, TransactionKind, TransactionState};
use crate::error::ExecutionError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Wire payload of one transaction request, as produced by the upstream
/// validator. Unknown fields are tolerated; missing required fields fail
/// deserialization and dead-letter the message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub source_account_number: String,
    #[serde(default)]
    pub destination_account_number: Option<String>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub request_timestamp: Option<NaiveDateTime>,
}

impl TransactionRequest {
    fn into_execution(self) -> ExecutionRequest {
        ExecutionRequest {
            kind: self.kind,
            source: AccountNumber::new(self.source_account_number),
            destination: self.destination_account_number.map(AccountNumber::new),
            amount: self.amount,
            description: self.description,
        }
    }
}

/// Transport-level outcome for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Message consumed. Set for successes *and* business rejections: the
    /// ledger record is the authoritative outcome either way, and
    /// redelivering would not change the result.
    Ack,
    /// Permanent failure; the transport should park the message.
    DeadLetter,
    /// Transient infrastructure failure; the transport should redeliver.
    Retry,
}

/// One message taken off a channel, with a reply handle for its
/// disposition.
#[derive(Debug)]
pub struct Delivery {
    pub payload: Vec<u8>,
    pub reply: oneshot::Sender<Disposition>,
}

impl Delivery {
    pub fn new(payload: impl Into<Vec<u8>>) -> (Self, oneshot::Receiver<Disposition>) {
        let (reply, disposition) = oneshot::channel();
        (
            Self {
                payload: payload.into(),
                reply,
            },
            disposition,
        )
    }
}

/// Consumes one logical channel bound to a single transaction kind.
///
/// The kind binding is fixed at configuration time; a payload declaring a
/// different kind was misrouted and is dead-lettered without execution.
#[derive(Clone)]
pub struct ChannelConsumer {
    coordinator: Arc<ExecutionCoordinator>,
    expected_kind: TransactionKind,
    concurrency: usize,
}

impl ChannelConsumer {
    pub fn new(
        coordinator: Arc<ExecutionCoordinator>,
        expected_kind: TransactionKind,
        concurrency: usize,
    ) -> Self {
        Self {
            coordinator,
            expected_kind,
            concurrency,
        }
    }

    /// Drains the channel until every sender is dropped, processing at most
    /// `concurrency` deliveries at a time.
    pub async fn run(self, receiver: mpsc::Receiver<Delivery>) {
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency.max(1) {
            let consumer = self.clone();
            let receiver = Arc::clone(&receiver);
            workers.spawn(async move {
                loop {
                    let delivery = { receiver.lock().await.recv().await };
                    let Some(delivery) = delivery else { break };
                    let disposition = consumer.handle(&delivery.payload).await;
                    if delivery.reply.send(disposition).is_err() {
                        debug!(worker, "disposition receiver dropped");
                    }
                }
            });
        }
        while workers.join_next().await.is_some() {}
    }

    /// Processes one payload end to end and decides its disposition.
    pub async fn handle(&self, payload: &[u8]) -> Disposition {
        let request: TransactionRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(parse_error) => {
                warn!(
                    kind = ?self.expected_kind,
                    error = %parse_error,
                    "undeliverable payload"
                );
                return Disposition::DeadLetter;
            }
        };

        if request.kind != self.expected_kind {
            warn!(
                expected = ?self.expected_kind,
                declared = ?request.kind,
                "transaction kind does not match its channel"
            );
            return Disposition::DeadLetter;
        }

        match self.coordinator.execute(request.into_execution()).await {
            Ok(record) if record.state == TransactionState::Completed => {
                info!(id = %record.id, kind = ?record.kind, "acknowledged");
                Disposition::Ack
            }
            Ok(record) => {
                // rejected, but finalized: the ledger record is the outcome
                info!(
                    id = %record.id,
                    kind = ?record.kind,
                    reason = record.error.as_deref().unwrap_or("unknown"),
                    "acknowledged after business rejection"
                );
                Disposition::Ack
            }
            Err(cause @ (ExecutionError::MalformedRequest(_) | ExecutionError::Internal(_))) => {
                warn!(kind = ?self.expected_kind, error = %cause, "permanent execution failure");
                Disposition::DeadLetter
            }
            Err(cause) => {
                error!(kind = ?self.expected_kind, error = %cause, "requesting redelivery");
                Disposition::Retry
            }
        }
    }
}
