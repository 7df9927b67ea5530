//! Interface adapters: the queue-facing ingestion side and the read-only
//! status surface. Wire formats live here, not in the domain.

pub mod queue;
pub mod status;
