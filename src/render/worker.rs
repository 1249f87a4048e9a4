use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use super::engine::{render_score, NotationEngine};
use super::RenderError;
use crate::export::ExportError;

/// Identifies one render request. Only the most recently issued ticket is
/// current; results carrying an older ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

/// Results posted back to the UI thread by background jobs.
#[derive(Debug)]
pub enum BackgroundEvent {
    Rendered {
        ticket: RenderTicket,
        chant_id: i64,
        result: Result<String, RenderError>,
    },
    SvgFetched {
        chant_id: i64,
        result: Result<String, ExportError>,
    },
}

/// Starts live renders on worker threads and tracks which one is current.
pub struct RenderDispatcher {
    engine: Arc<dyn NotationEngine>,
    width_px: u32,
    issued: u64,
    current: Option<RenderTicket>,
    events: Sender<BackgroundEvent>,
}

impl RenderDispatcher {
    pub fn new(
        engine: Arc<dyn NotationEngine>,
        width_px: u32,
        events: Sender<BackgroundEvent>,
    ) -> Self {
        Self {
            engine,
            width_px,
            issued: 0,
            current: None,
            events,
        }
    }

    /// Issue a new ticket and render `source` in the background. Any render
    /// still in flight becomes stale.
    pub fn request(&mut self, chant_id: i64, source: String) -> RenderTicket {
        self.issued += 1;
        let ticket = RenderTicket(self.issued);
        self.current = Some(ticket);

        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        let width_px = self.width_px;
        debug!(chant_id, ticket = ticket.0, "starting live render");

        thread::spawn(move || {
            let result = render_score(engine.as_ref(), &source, width_px);
            if let Err(err) = &result {
                warn!(chant_id, error = %err, "live render failed");
            }
            // The receiver is gone once the UI has shut down.
            let _ = events.send(BackgroundEvent::Rendered {
                ticket,
                chant_id,
                result,
            });
        });

        ticket
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.current == Some(ticket)
    }

    /// Forget the current ticket so nothing in flight is applied.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn sender(&self) -> Sender<BackgroundEvent> {
        self.events.clone()
    }
}
