//! Grid rendering
//!
//! Renderers consume a [`GridSnapshot`], never the live grid, so no cell guard
//! is held while output is produced.

use crate::grid::{Grid, GridSnapshot};
use crate::shutdown::ShutdownSignal;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Snapshot-printing collaborator
pub trait Renderer: Send + Sync {
    /// Produce one human-readable dump of `snapshot`
    fn render(&self, snapshot: &GridSnapshot);
}

/// Text block for one render: a blank line, one line per row, a blank line
pub fn render_text(snapshot: &GridSnapshot) -> String {
    format!("\n{snapshot}\n")
}

/// Writes [`render_text`] blocks to any `Write` target
///
/// Renders from different threads are serialized by the writer lock, so two
/// grids never interleave on the output.
#[derive(Debug)]
pub struct TextRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl TextRenderer<io::Stdout> {
    /// Renderer printing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TextRenderer<W> {
    /// Renderer writing to `out`
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer (used by tests writing into a `Vec<u8>`)
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&self, snapshot: &GridSnapshot) {
        let text = render_text(snapshot);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!("Grid render failed: {e}");
        }
    }
}

/// Keeps every snapshot it is asked to render
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    renders: Mutex<Vec<GridSnapshot>>,
}

impl RecordingRenderer {
    /// Renderer with no recorded frames
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of renders so far
    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every rendered snapshot, oldest first
    pub fn renders(&self) -> Vec<GridSnapshot> {
        self.renders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, snapshot: &GridSnapshot) {
        self.renders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}

/// Unit that renders the whole grid on a fixed interval
pub struct PeriodicRenderer {
    grid: Arc<Grid>,
    renderer: Arc<dyn Renderer>,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl PeriodicRenderer {
    /// Unit rendering `grid` every `interval` until `shutdown` fires
    pub fn new(
        grid: Arc<Grid>,
        renderer: Arc<dyn Renderer>,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            grid,
            renderer,
            interval,
            shutdown,
        }
    }

    /// Render immediately, then once per interval until shutdown
    pub fn run(&self) {
        loop {
            debug!("Periodic grid render");
            self.renderer.render(&self.grid.snapshot());
            if !self.shutdown.sleep(self.interval) {
                break;
            }
        }
    }
}
