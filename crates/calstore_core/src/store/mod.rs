//! Calendar store facade.
//!
//! # Responsibility
//! - Expose the calendar subscription persistence operations to callers.
//! - Translate every repository failure into one data access error kind.
//!
//! # Invariants
//! - Store APIs never bypass repository validation/persistence contracts.
//! - The store keeps no state between calls.

pub mod calendar_store;
