//! Domain events.
//!
//! Ledger entries are the only events the stock engine produces; reporting
//! layers read them through the [`Event`] trait without depending on the
//! inventory crate's concrete types.

pub mod event;

pub use event::Event;
