//! Per-tick flip driver and display sinks.
//!
//! [`FrameDriver::tick`] recomputes the flipped frame from the untouched
//! source every call; nothing is cached between ticks. The display sink is
//! injected at construction. A failed tick is logged and leaves the sink
//! showing the previous frame.

use imgflip_core::{FlipToggles, Image};
use tracing::{debug, warn};

use crate::dispatcher::FlipExecutor;
use crate::ComputeResult;

/// Screen and camera geometry for a presented frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Screen width in world units (one unit per pixel).
    pub width: u32,
    /// Screen height in world units.
    pub height: u32,
    /// Orthographic camera half-height: `height / 2`, truncated.
    pub ortho_size: u32,
}

impl Viewport {
    /// Viewport that fits `frame` exactly.
    pub fn for_frame(frame: &Image) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            ortho_size: frame.height() / 2,
        }
    }
}

/// Consumer of flipped frames.
pub trait DisplaySink {
    /// Show `frame`, resizing to `viewport`.
    fn present(&mut self, frame: &Image, viewport: Viewport);
}

/// Sink that keeps the last presented frame in memory.
#[derive(Debug, Default)]
pub struct ViewportSink {
    frame: Option<Image>,
    viewport: Option<Viewport>,
    presented: u64,
}

impl ViewportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last presented frame.
    pub fn frame(&self) -> Option<&Image> {
        self.frame.as_ref()
    }

    /// Viewport of the last presented frame.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Number of frames presented.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for ViewportSink {
    fn present(&mut self, frame: &Image, viewport: Viewport) {
        self.frame = Some(frame.clone());
        self.viewport = Some(viewport);
        self.presented += 1;
    }
}

/// Re-runs the enabled flips on every tick and presents the result.
pub struct FrameDriver<D: FlipExecutor, S: DisplaySink> {
    dispatcher: D,
    source: Image,
    toggles: FlipToggles,
    sink: S,
    ticks: u64,
    failures: u64,
}

impl<D: FlipExecutor, S: DisplaySink> FrameDriver<D, S> {
    /// Create a driver for `source`, presenting into `sink`.
    pub fn new(dispatcher: D, source: Image, toggles: FlipToggles, sink: S) -> Self {
        Self {
            dispatcher,
            source,
            toggles,
            sink,
            ticks: 0,
            failures: 0,
        }
    }

    /// Flip the source with the current toggles and present it.
    ///
    /// On error the sink is not touched and the error is returned.
    pub fn tick(&mut self) -> ComputeResult<Viewport> {
        self.ticks += 1;
        match self.dispatcher.apply(&self.source, self.toggles) {
            Ok(frame) => {
                let viewport = Viewport::for_frame(&frame);
                debug!(tick = self.ticks, w = viewport.width, h = viewport.height, "present");
                self.sink.present(&frame, viewport);
                Ok(viewport)
            }
            Err(e) => {
                self.failures += 1;
                warn!(tick = self.ticks, backend = self.dispatcher.name(), error = %e, "flip failed, keeping previous frame");
                Err(e)
            }
        }
    }

    /// Current toggles.
    pub fn toggles(&self) -> FlipToggles {
        self.toggles
    }

    /// Change toggles; takes effect on the next tick.
    pub fn set_toggles(&mut self, toggles: FlipToggles) {
        self.toggles = toggles;
    }

    /// Source image.
    pub fn source(&self) -> &Image {
        &self.source
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that failed.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the driver and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
