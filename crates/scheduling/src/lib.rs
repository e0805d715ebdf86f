//! Availability scheduling: find free meeting blocks between busy intervals
//! under a working-hour window.
//!
//! Pure functions over `chrono` types — no I/O, no hidden state. Callers
//! convert busy intervals into the resolved timezone before the sweep, never
//! during it.

pub mod availability;
pub mod format;

pub use {
    availability::{BusyInterval, DayAvailability, FreeBlock, WorkingHours, find_free_blocks},
    format::format_availability,
};
