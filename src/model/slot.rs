//! Waypoint slots: the roles a trip point can fill and their per-slot state.

use std::sync::atomic::{AtomicU64, Ordering};

use super::Place;

/// Source of generation stamps, shared by every slot record. Starts at 1;
/// a fresh record's stamp of 0 is never issued to a request.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// One of the three waypoint roles on the entry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Start,
    FirstStop,
    SecondStop,
}

impl Slot {
    /// All slots in form order.
    pub const ALL: [Slot; 3] = [Slot::Start, Slot::FirstStop, Slot::SecondStop];

    /// Display label used on the form and the directions screen.
    pub fn label(self) -> &'static str {
        match self {
            Slot::Start => "Start",
            Slot::FirstStop => "First stop",
            Slot::SecondStop => "Second stop",
        }
    }
}

/// Where a slot stands between free text and a confirmed place.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Resolution {
    /// No confirmed place; whatever text is present is unvalidated.
    #[default]
    Empty,

    /// A geocode request for the current text is in flight.
    Resolving,

    /// The text was confirmed to this place.
    Resolved(Place),
}

/// Per-slot state: the typed text, its resolution, and a generation stamp.
///
/// The stamp marks every background request spawned for the slot.
/// Anything that changes what the slot means (an edit, a new confirm, a
/// swap) draws a fresh stamp, so a completion carrying an old stamp is
/// recognized as stale and dropped instead of landing on contents it no
/// longer describes. Stamps come from one process-wide counter: no two
/// records ever hold the same stamp, so a completion cannot land on the
/// wrong record even after a swap moves records between slots.
#[derive(Debug, Clone, Default)]
pub struct SlotState {
    pub text: String,
    resolution: Resolution,
    generation: u64,
}

impl SlotState {
    /// A slot seeded with unconfirmed text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Appends a typed character. Any edit discards the previous
    /// resolution: a confirmed place no longer matches the displayed text.
    pub fn push_char(&mut self, c: char) {
        self.text.push(c);
        self.clear();
    }

    /// Removes the last character. Same edit rule as [`Self::push_char`];
    /// backspacing an already-empty field changes nothing.
    pub fn pop_char(&mut self) {
        if self.text.pop().is_some() {
            self.clear();
        }
    }

    /// Starts a new resolution attempt, superseding any in-flight one.
    /// Returns the generation to stamp the request with.
    pub fn begin_resolving(&mut self) -> u64 {
        self.generation = next_generation();
        self.resolution = Resolution::Resolving;
        self.generation
    }

    /// Applies a successful completion. Returns false when the stamp is
    /// stale and nothing was applied.
    pub fn complete(&mut self, generation: u64, place: Place) -> bool {
        if generation != self.generation {
            return false;
        }
        self.resolution = Resolution::Resolved(place);
        true
    }

    /// Applies a failed completion (no candidates, or a service error).
    /// Returns false when the stamp is stale and nothing was applied.
    pub fn fail(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.resolution = Resolution::Empty;
        true
    }

    /// Invalidates any in-flight request without touching text or an
    /// existing resolved place. Used when slot contents move between
    /// positions: a completion spawned for the old contents must not land
    /// on the new ones.
    pub fn invalidate(&mut self) {
        self.generation = next_generation();
        if self.resolution == Resolution::Resolving {
            self.resolution = Resolution::Empty;
        }
    }

    /// Fills the slot wholesale from an automatic source, such as the
    /// startup position fix.
    pub fn set_resolved(&mut self, place: Place) {
        self.generation = next_generation();
        self.text = place.address.clone();
        self.resolution = Resolution::Resolved(place);
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn resolved_place(&self) -> Option<&Place> {
        match &self.resolution {
            Resolution::Resolved(place) => Some(place),
            Resolution::Empty | Resolution::Resolving => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(_))
    }

    pub fn is_resolving(&self) -> bool {
        self.resolution == Resolution::Resolving
    }

    /// True while `generation` is still the slot's current stamp.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// True when the user has not typed into the slot and nothing has
    /// resolved it.
    pub fn is_untouched(&self) -> bool {
        self.text.is_empty() && self.resolution == Resolution::Empty
    }

    fn clear(&mut self) {
        self.generation = next_generation();
        self.resolution = Resolution::Empty;
    }
}
