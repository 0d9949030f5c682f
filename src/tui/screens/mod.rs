//! Screen rendering and input handling.

mod directions;
mod entry;

pub use directions::DirectionsScreen;
pub use entry::{EntryScreen, EscOutcome};
