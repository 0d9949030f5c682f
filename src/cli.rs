//! CLI interface for Wayfarer.
//!
//! The app itself is interactive; flags only shape the launch: where the
//! config file lives, whether the start field is prefilled from the
//! machine's position, and optional address text to seed fields with.

use std::path::PathBuf;

use clap::Parser;

/// Wayfarer — plan a short trip from the terminal.
#[derive(Debug, Parser)]
#[command(name = "wayfarer", version, after_long_help = KEYS_HELP)]
pub struct Cli {
    /// Path to the config file (default: ~/.wayfarer/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Prefill the start field from the current position, whatever the
    /// config says.
    #[arg(long, overrides_with = "no_locate")]
    pub locate: bool,

    /// Never contact the location service, whatever the config says.
    #[arg(long, overrides_with = "locate")]
    pub no_locate: bool,

    /// Seed the start field with this address text. It still has to be
    /// confirmed like any typed address.
    #[arg(long, value_name = "ADDRESS")]
    pub start: Option<String>,

    /// Seed a stop field with this address text; may be given twice.
    #[arg(long = "to", value_name = "ADDRESS")]
    pub to: Vec<String>,
}

const KEYS_HELP: &str = "Keys inside the app:
  tab / shift-tab   move between fields
  enter             confirm the focused field's address
  ctrl-x            swap the two stop fields
  ctrl-r            get directions for the confirmed route
  esc               dismiss overlay, stop editing, or quit";

impl Cli {
    /// Location consent from the flags: `Some` overrides the config,
    /// `None` defers to it. When both flags appear the later one wins.
    pub fn locate_override(&self) -> Option<bool> {
        if self.locate {
            Some(true)
        } else if self.no_locate {
            Some(false)
        } else {
            None
        }
    }
}
