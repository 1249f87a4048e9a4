//! Ratatui front-end: a catalog browser and a per-chant detail view driven by
//! a screen/mode state machine.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
