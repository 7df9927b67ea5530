//! Storage backends implementing the domain ports.
//!
//! The production deployment sits on a relational store with row-level
//! locking; the in-memory backend here implements the same capabilities
//! (per-row exclusive locks, version-checked atomic write sets) behind the
//! identical port surface.

pub mod in_memory;
