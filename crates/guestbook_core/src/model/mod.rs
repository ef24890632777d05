//! Guest list domain model.
//!
//! # Responsibility
//! - Define the typed guest record and the ordered ledger that owns them.
//! - Convert between typed records and canonical tabular rows.
//!
//! # Invariants
//! - Headcounts in a `GuestRecord` are never negative.
//! - A `Ledger` is the single in-memory source of truth for a session.

pub mod guest;
pub mod ledger;
