//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the unit-of-work contract the calendar store is written against.
//! - Isolate SQLite query details from the store facade.
//!
//! # Invariants
//! - Repository writes must enforce `CalendarConfiguration::validate()`
//!   before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Transient`) in
//!   addition to DB transport errors.

pub mod calendar_repo;
