//! Score rendering: the static/live switch, the notation engine seam and the
//! background dispatcher that keeps only the newest render.

mod engine;
mod worker;

use thiserror::Error;

pub use engine::{render_score, GregorioEngine, NotationEngine, ScoreLayout};
pub use worker::{BackgroundEvent, RenderDispatcher, RenderTicket};

/// Which score the detail view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
    /// Pre-rendered image served by the score image service.
    #[default]
    Static,
    /// Processed GABC laid out locally by a [`NotationEngine`].
    Live,
}

impl ScoreMode {
    pub fn from_live(live: bool) -> Self {
        if live {
            ScoreMode::Live
        } else {
            ScoreMode::Static
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// No source to render, or a required tool is missing.
    #[error("notation engine unavailable: {0}")]
    EngineUnavailable(String),
    /// The engine ran but rejected the source or failed mid-way.
    #[error("layout failed: {0}")]
    Layout(String),
    #[error("render workspace error")]
    Io(#[from] std::io::Error),
}
