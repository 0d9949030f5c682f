//! Application loop and screen routing.

use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::geo::{Geocoder, Locator, Resolver};
use crate::model::Slot;

use super::screens::{DirectionsScreen, EntryScreen, EscOutcome};

/// How long to wait for a key before checking the lookup channel again.
const TICK: Duration = Duration::from_millis(50);

/// Everything the UI needs at startup.
pub struct Launch {
    pub geocoder: Arc<dyn Geocoder>,
    pub locator: Arc<dyn Locator>,

    /// Whether the start field may be prefilled from the current position.
    pub locate_on_start: bool,

    /// Address text to seed fields with, still unconfirmed.
    pub start_text: Option<String>,
    pub stop_texts: Vec<String>,
}

/// Which screen is currently displayed.
enum Screen {
    Entry(EntryScreen),

    /// The entry screen rides along so Esc returns to it intact.
    Directions {
        directions: DirectionsScreen,
        entry: EntryScreen,
    },
}

/// What a key press did to the screen state.
enum Step {
    Continue(Screen),
    Quit,
}

/// Runs the TUI event loop until the user quits.
pub fn run(launch: Launch) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, launch);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, launch: Launch) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();
    let resolver = Resolver::new(launch.geocoder, launch.locator, tx);

    let mut entry = EntryScreen::new(resolver);
    if let Some(text) = launch.start_text {
        entry.seed(Slot::Start, text);
    }
    for (slot, text) in [Slot::FirstStop, Slot::SecondStop]
        .into_iter()
        .zip(launch.stop_texts)
    {
        entry.seed(slot, text);
    }
    if launch.locate_on_start {
        entry.request_prefill();
    } else {
        tracing::debug!("location prefill disabled");
    }

    let mut screen = Screen::Entry(entry);

    loop {
        terminal.draw(|frame| match &screen {
            Screen::Entry(entry) => entry.render(frame),
            Screen::Directions { directions, .. } => directions.render(frame),
        })?;

        // Apply lookup completions wherever the entry screen lives.
        while let Ok(geo_event) = rx.try_recv() {
            match &mut screen {
                Screen::Entry(entry) | Screen::Directions { entry, .. } => {
                    entry.on_geo_event(geo_event);
                }
            }
        }

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(screen, key) {
            Step::Continue(next) => screen = next,
            Step::Quit => return Ok(()),
        }
    }
}

fn handle_key(screen: Screen, key: KeyEvent) -> Step {
    match screen {
        Screen::Entry(mut entry) => {
            match (key.code, key.modifiers) {
                (KeyCode::Char('r'), m) if m.contains(KeyModifiers::CONTROL) => {
                    if let Some(waypoints) = entry.on_get_directions() {
                        return Step::Continue(Screen::Directions {
                            directions: DirectionsScreen::new(&waypoints),
                            entry,
                        });
                    }
                }
                (KeyCode::Char('x'), m) if m.contains(KeyModifiers::CONTROL) => entry.on_swap(),
                (KeyCode::Char(c), m)
                    if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    entry.on_char(c);
                }
                (KeyCode::Backspace, _) => entry.on_backspace(),
                (KeyCode::Enter, _) => entry.on_enter(),
                (KeyCode::Tab, _) => entry.on_focus_next(),
                (KeyCode::BackTab, _) => entry.on_focus_previous(),
                (KeyCode::Up, _) => entry.on_up(),
                (KeyCode::Down, _) => entry.on_down(),
                (KeyCode::Esc, _) => {
                    if matches!(entry.on_esc(), EscOutcome::Quit) {
                        return Step::Quit;
                    }
                }
                _ => {}
            }
            Step::Continue(Screen::Entry(entry))
        }
        Screen::Directions {
            mut directions,
            entry,
        } => {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    return Step::Continue(Screen::Entry(entry));
                }
                KeyCode::Up | KeyCode::Char('k') => directions.on_scroll_up(),
                KeyCode::Down | KeyCode::Char('j') => directions.on_scroll_down(),
                _ => {}
            }
            Step::Continue(Screen::Directions { directions, entry })
        }
    }
}
