//! Address entry screen: three waypoint fields, confirm and swap actions,
//! and the disambiguation and alert overlays.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::geo::{GeoError, GeoEvent, Resolver};
use crate::model::{Place, Resolution, Slot, SlotState, Trip, Waypoint};

/// Rows of header shown above the form when idle.
const TOP_MARGIN: u16 = 6;

/// Rows the header gives up while a field is being edited, keeping the
/// form high on the screen.
const EDIT_LIFT: u16 = 4;

const ADDRESS_NOT_FOUND: &str = "Address not found.";
const INVALID_ROUTE: &str =
    "Please enter a valid starting point and at least one destination.";

/// A modal layer over the form.
enum Overlay {
    /// Candidate addresses for a slot, awaiting the user's pick.
    Picker {
        slot: Slot,
        generation: u64,
        candidates: Vec<Place>,
        selected: usize,
    },

    /// A blocking message dismissed with Enter or Esc.
    Alert(String),
}

/// What Esc meant in the current screen state.
pub enum EscOutcome {
    /// Consumed: dismissed an overlay or ended editing.
    Handled,

    /// Nothing to dismiss; the app should quit.
    Quit,
}

/// The address entry screen.
///
/// All geocoding runs off-thread through the [`Resolver`]; completions
/// come back through [`Self::on_geo_event`]. While an overlay is up the
/// form is modal: typing and focus movement are ignored, and further
/// search completions wait their turn so one overlay never replaces
/// another mid-decision.
pub struct EntryScreen {
    trip: Trip,
    focus: Slot,
    overlay: Option<Overlay>,
    deferred: Vec<GeoEvent>,
    resolver: Resolver,
    top_margin: u16,
}

impl EntryScreen {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            trip: Trip::default(),
            focus: Slot::Start,
            overlay: None,
            deferred: Vec::new(),
            resolver,
            top_margin: TOP_MARGIN,
        }
    }

    /// Seeds a field with launch-flag text. Unconfirmed like any typed
    /// address.
    pub fn seed(&mut self, slot: Slot, text: String) {
        *self.trip.slot_mut(slot) = SlotState::with_text(text);
    }

    /// Kicks off the startup position fix.
    pub fn request_prefill(&self) {
        self.resolver.spawn_prefill();
    }

    // ── Key handlers ──

    pub fn on_char(&mut self, c: char) {
        if self.overlay.is_some() {
            return;
        }
        self.begin_editing();
        self.trip.slot_mut(self.focus).push_char(c);
    }

    pub fn on_backspace(&mut self) {
        if self.overlay.is_some() {
            return;
        }
        self.begin_editing();
        self.trip.slot_mut(self.focus).pop_char();
    }

    pub fn on_up(&mut self) {
        match &mut self.overlay {
            Some(Overlay::Picker { selected, .. }) => {
                *selected = selected.saturating_sub(1);
            }
            Some(Overlay::Alert(_)) => {}
            None => self.focus_previous(),
        }
    }

    pub fn on_down(&mut self) {
        match &mut self.overlay {
            Some(Overlay::Picker {
                candidates,
                selected,
                ..
            }) => {
                if *selected + 1 < candidates.len() {
                    *selected += 1;
                }
            }
            Some(Overlay::Alert(_)) => {}
            None => self.focus_next(),
        }
    }

    pub fn on_focus_next(&mut self) {
        if self.overlay.is_none() {
            self.focus_next();
        }
    }

    pub fn on_focus_previous(&mut self) {
        if self.overlay.is_none() {
            self.focus_previous();
        }
    }

    /// Enter: pick from the picker, dismiss an alert, or confirm the
    /// focused field.
    pub fn on_enter(&mut self) {
        match self.overlay.take() {
            Some(Overlay::Picker {
                slot,
                generation,
                candidates,
                selected,
            }) => {
                if let Some(place) = candidates.into_iter().nth(selected) {
                    if !self.trip.slot_mut(slot).complete(generation, place) {
                        tracing::debug!(?slot, "discarding pick for superseded request");
                    }
                }
                self.drain_deferred();
            }
            Some(Overlay::Alert(_)) => self.drain_deferred(),
            None => self.confirm_focused(),
        }
    }

    /// Esc: dismiss the overlay, else end editing, else ask to quit.
    pub fn on_esc(&mut self) -> EscOutcome {
        if let Some(overlay) = self.overlay.take() {
            if let Overlay::Picker {
                slot, generation, ..
            } = overlay
            {
                // Declining every candidate leaves the slot unconfirmed.
                self.trip.slot_mut(slot).fail(generation);
            }
            self.drain_deferred();
            return EscOutcome::Handled;
        }
        if self.is_editing() {
            self.end_editing();
            return EscOutcome::Handled;
        }
        EscOutcome::Quit
    }

    /// Swaps the two stop fields: text, resolution, and confirm marks move
    /// together.
    pub fn on_swap(&mut self) {
        if self.overlay.is_some() {
            return;
        }
        self.trip.swap_stops();
    }

    /// Validates the trip and hands back the route for the directions
    /// screen, or raises the invalid-route alert.
    pub fn on_get_directions(&mut self) -> Option<Vec<Waypoint>> {
        if self.overlay.is_some() {
            return None;
        }
        self.end_editing();
        match self.trip.route() {
            Ok(waypoints) => Some(waypoints),
            Err(_) => {
                self.show_alert(INVALID_ROUTE);
                None
            }
        }
    }

    // ── Background completions ──

    /// Applies a lookup completion, or holds it while an overlay is up so
    /// one overlay never replaces another.
    pub fn on_geo_event(&mut self, event: GeoEvent) {
        if self.overlay.is_some() && matches!(event, GeoEvent::Search { .. }) {
            self.deferred.push(event);
            return;
        }
        self.apply_geo_event(event);
    }

    fn apply_geo_event(&mut self, event: GeoEvent) {
        match event {
            GeoEvent::Search {
                slot,
                generation,
                outcome,
            } => self.on_search_done(slot, generation, outcome),
            GeoEvent::Prefill(outcome) => self.on_prefill_done(outcome),
        }
    }

    fn drain_deferred(&mut self) {
        while self.overlay.is_none() && !self.deferred.is_empty() {
            let event = self.deferred.remove(0);
            self.apply_geo_event(event);
        }
    }

    fn on_search_done(
        &mut self,
        slot: Slot,
        generation: u64,
        outcome: Result<Vec<Place>, GeoError>,
    ) {
        if !self.trip.slot(slot).is_current(generation) {
            tracing::debug!(?slot, "dropping stale geocode completion");
            return;
        }
        match outcome {
            Ok(mut candidates) => {
                if candidates.is_empty() {
                    self.trip.slot_mut(slot).fail(generation);
                    self.show_alert(ADDRESS_NOT_FOUND);
                } else if candidates.len() == 1 {
                    if let Some(place) = candidates.pop() {
                        self.trip.slot_mut(slot).complete(generation, place);
                    }
                } else {
                    self.overlay = Some(Overlay::Picker {
                        slot,
                        generation,
                        candidates,
                        selected: 0,
                    });
                }
            }
            Err(error) => {
                tracing::warn!(?slot, error = %error, "geocode failed");
                self.trip.slot_mut(slot).fail(generation);
                self.show_alert(ADDRESS_NOT_FOUND);
            }
        }
    }

    fn on_prefill_done(&mut self, outcome: Result<Place, GeoError>) {
        match outcome {
            Ok(place) => {
                let start = self.trip.slot_mut(Slot::Start);
                if start.is_untouched() {
                    tracing::info!(
                        address = %place.address,
                        "start prefilled from current position"
                    );
                    start.set_resolved(place);
                } else {
                    tracing::debug!("discarding position prefill; start already has input");
                }
            }
            // The trip can be planned by hand; the user is only told
            // through the log.
            Err(error) => tracing::info!(error = %error, "current position unavailable"),
        }
    }

    // ── Internals ──

    fn confirm_focused(&mut self) {
        self.end_editing();
        let slot = self.focus;
        let query = self.trip.slot(slot).text.trim().to_string();
        if query.is_empty() {
            // Same outcome the service would report, without the round trip.
            self.show_alert(ADDRESS_NOT_FOUND);
            return;
        }
        let generation = self.trip.slot_mut(slot).begin_resolving();
        self.resolver.spawn_search(slot, generation, query);
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            Slot::Start => Slot::FirstStop,
            Slot::FirstStop => Slot::SecondStop,
            Slot::SecondStop => Slot::Start,
        };
        self.begin_editing();
    }

    fn focus_previous(&mut self) {
        self.focus = match self.focus {
            Slot::Start => Slot::SecondStop,
            Slot::FirstStop => Slot::Start,
            Slot::SecondStop => Slot::FirstStop,
        };
        self.begin_editing();
    }

    fn show_alert(&mut self, message: &str) {
        self.overlay = Some(Overlay::Alert(message.to_string()));
    }

    /// Shrinks the header while editing. Applied once; repeated edits and
    /// focus moves are no-ops until editing ends.
    fn begin_editing(&mut self) {
        if self.top_margin != TOP_MARGIN {
            return;
        }
        self.top_margin = TOP_MARGIN - EDIT_LIFT;
    }

    /// Restores the idle layout. No-op when already idle.
    fn end_editing(&mut self) {
        if self.top_margin == TOP_MARGIN {
            return;
        }
        self.top_margin = TOP_MARGIN;
    }

    fn is_editing(&self) -> bool {
        self.top_margin != TOP_MARGIN
    }

    // ── Rendering ──

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Length(self.top_margin), // header, collapses while editing
            Constraint::Min(0),                  // form
            Constraint::Length(1),               // help
        ])
        .split(area);

        self.render_header(frame, chunks[0]);
        self.render_form(frame, chunks[1]);
        self.render_help(frame, chunks[2]);

        match &self.overlay {
            Some(Overlay::Picker {
                candidates,
                selected,
                ..
            }) => render_picker(frame, area, candidates, *selected),
            Some(Overlay::Alert(message)) => render_alert(frame, area, message),
            None => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let muted = Style::default().fg(Color::DarkGray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![Line::from(Span::styled("Wayfarer", highlight))];
        if !self.is_editing() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Plan a short trip: a start, up to two stops, directions.",
                muted,
            )));
        }
        let header =
            Paragraph::new(lines).block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(header, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let muted = Style::default().fg(Color::DarkGray);
        let normal = Style::default().fg(Color::Gray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        let mut lines = Vec::new();
        for slot in Slot::ALL {
            let state = self.trip.slot(slot);
            let focused = slot == self.focus;

            let mut label = vec![Span::styled(
                slot.label(),
                if focused { highlight } else { muted },
            )];
            match state.resolution() {
                Resolution::Resolved(_) => label.push(Span::styled(" ✓", highlight)),
                Resolution::Resolving => label.push(Span::styled(" …", muted)),
                Resolution::Empty => {}
            }
            lines.push(Line::from(label));

            let mut field = vec![Span::styled(
                if focused { "› " } else { "  " },
                highlight,
            )];
            field.push(Span::styled(
                state.text.as_str(),
                if focused {
                    Style::default().fg(Color::White)
                } else {
                    normal
                },
            ));
            if focused {
                field.push(Span::styled("█", muted));
            }
            lines.push(Line::from(field));
            lines.push(Line::default());
        }

        let form = Paragraph::new(lines).block(Block::default().padding(Padding::new(2, 2, 0, 0)));
        frame.render_widget(form, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let muted = Style::default().fg(Color::DarkGray);
        let text = match &self.overlay {
            Some(Overlay::Picker { .. }) => " ↑↓ choose  ⏎ select  esc cancel",
            Some(Overlay::Alert(_)) => " ⏎ dismiss",
            None => " tab next field  ⏎ confirm  ctrl-x swap stops  ctrl-r directions  esc quit",
        };
        frame.render_widget(Paragraph::new(Line::from(Span::styled(text, muted))), area);
    }
}

fn render_picker(frame: &mut Frame, area: Rect, candidates: &[Place], selected: usize) {
    let muted = Style::default().fg(Color::DarkGray);
    let normal = Style::default().fg(Color::Gray);
    let highlight = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let width = area.width.saturating_sub(8).clamp(24, 72);
    let height = u16::try_from(candidates.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(area.height.saturating_sub(2));
    let popup = centered_rect(area, width, height);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = candidates
        .iter()
        .enumerate()
        .map(|(i, place)| {
            let style = if i == selected { highlight } else { normal };
            let pointer = if i == selected { "› " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(pointer, style),
                Span::styled(place.address.clone(), style),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::bordered()
            .title(" Which address? ")
            .border_style(muted),
    );
    frame.render_widget(list, popup);
}

fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let muted = Style::default().fg(Color::DarkGray);

    let width = area.width.saturating_sub(8).clamp(24, 60);
    let popup = centered_rect(area, width, 5);
    frame.render_widget(Clear, popup);

    let alert = Paragraph::new(message)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White))
        .block(Block::bordered().border_style(muted).padding(Padding::new(1, 1, 1, 0)));
    frame.render_widget(alert, popup);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
