//! Per-test expectation data
//!
//! Two instances of the same table type, one per [`Mode`], hold the
//! real-browser truth and the emulator's current state.

pub mod members;
mod table;

pub use table::{ExpectationKey, ExpectationTable, Expectations, Mode, DEFAULT_KEY};
