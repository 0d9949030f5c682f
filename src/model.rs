//! Core data model for Wayfarer.
//!
//! A trip is three waypoint slots (start, first stop, second stop). Each
//! slot tracks its typed text and whether that text has been confirmed to
//! a concrete place; a valid trip produces the ordered route handed to the
//! directions screen.

mod place;
mod slot;
mod trip;

pub use place::{Coordinates, Place};
pub use slot::{Resolution, Slot, SlotState};
pub use trip::{RouteError, Trip, Waypoint};
