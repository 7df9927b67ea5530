//! Application layer: the execution coordinator.
//!
//! One coordinator instance is shared by every ingestion channel; it owns
//! the transaction boundary of a single execution attempt and the
//! finalize-exactly-once guarantee.

pub mod coordinator;
