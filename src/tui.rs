//! Terminal user interface: screen routing and the event loop.

mod app;
mod screens;

pub use app::{Launch, run};
