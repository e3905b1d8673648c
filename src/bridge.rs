//! Frame-coalescing bridge between raw page events and the rendering module.
//!
//! Wheel events may arrive far faster than the display refreshes. The bridge
//! folds them into one absolute scroll offset and hands the rendering module
//! at most one `translate` per refresh. Resize notifications are checked
//! against the current backing store so a no-op layout pass never reaches
//! the module.

use crate::error::Result;
use crate::module::{RenderHandle, RenderModule};
use crate::surface::{self, DisplaySurface, PixelSize};

/// Unit of a wheel delta, numbered like the DOM `WheelEvent.deltaMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    /// Maps a DOM `deltaMode` value; unknown values are treated as pixels.
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => Self::Line,
            2 => Self::Page,
            _ => Self::Pixel,
        }
    }
}

/// Vertical component of a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDelta {
    pub value: f64,
    pub mode: DeltaMode,
}

impl WheelDelta {
    pub const fn pixels(value: f64) -> Self {
        Self {
            value,
            mode: DeltaMode::Pixel,
        }
    }

    /// Converts the delta to pixels given a line height and a page height.
    pub fn to_pixels(self, line_height: f64, page_height: f64) -> f64 {
        match self.mode {
            DeltaMode::Pixel => self.value,
            DeltaMode::Line => self.value * line_height,
            DeltaMode::Page => self.value * page_height,
        }
    }
}

/// What the caller must do after a wheel event was accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDecision {
    /// No flush is outstanding: schedule `flush_scroll` for the next refresh.
    Schedule,
    /// A flush is already scheduled and will pick this delta up.
    Coalesced,
}

/// Accumulated scroll offset plus the in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollCoalescer {
    scroll_y: f64,
    flush_pending: bool,
}

impl ScrollCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `delta_y` into the offset. Non-finite deltas are dropped so a
    /// single bad event cannot poison every later flush.
    pub fn push(&mut self, delta_y: f64) -> WheelDecision {
        if !delta_y.is_finite() {
            log::warn!("ignoring non-finite wheel delta {delta_y}");
            return WheelDecision::Coalesced;
        }
        self.scroll_y += delta_y;
        if self.flush_pending {
            return WheelDecision::Coalesced;
        }
        self.flush_pending = true;
        WheelDecision::Schedule
    }

    /// Ends the current coalescing window, returning the offset to flush.
    pub fn take_flush(&mut self) -> Option<f64> {
        if !self.flush_pending {
            return None;
        }
        self.flush_pending = false;
        Some(self.scroll_y)
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn is_flush_pending(&self) -> bool {
        self.flush_pending
    }
}

/// One bridge per page view: owns the rendering module, its handle and the
/// display surface.
#[derive(Debug)]
pub struct FrameBridge<M, S> {
    module: M,
    handle: RenderHandle,
    surface: S,
    scroll: ScrollCoalescer,
    line_height: f64,
}

impl<M, S> FrameBridge<M, S>
where
    M: RenderModule,
    S: DisplaySurface,
{
    /// Fits the surface, initializes the module at the fitted size and
    /// draws the first frame. Nothing else is called if `init` fails.
    pub fn start(mut module: M, mut surface: S, line_height: f64) -> Result<Self> {
        let size = surface::initial_fit(&mut surface);
        let handle = module.init(size.width, size.height)?;
        log::info!("rendering module initialized at {size} ({handle})");
        module.on_animation_frame(handle);
        Ok(Self {
            module,
            handle,
            surface,
            scroll: ScrollCoalescer::new(),
            line_height,
        })
    }

    /// Accumulates a pixel delta.
    pub fn on_wheel(&mut self, delta_y: f64) -> WheelDecision {
        let decision = self.scroll.push(delta_y);
        log::trace!(
            "wheel {delta_y:+} -> scroll_y {} ({decision:?})",
            self.scroll.scroll_y()
        );
        decision
    }

    /// Normalizes a line or page delta to pixels, then accumulates it.
    pub fn on_wheel_event(&mut self, delta: WheelDelta) -> WheelDecision {
        let (_, page_height) = self.surface.css_size();
        self.on_wheel(delta.to_pixels(self.line_height, page_height))
    }

    /// Display-refresh callback for a scheduled scroll flush.
    pub fn flush_scroll(&mut self) -> Option<f64> {
        let scroll_y = self.scroll.take_flush()?;
        self.module.translate(self.handle, scroll_y);
        Some(scroll_y)
    }

    /// Refits the backing store. Returns `true` when the size changed and
    /// the module was told about it.
    pub fn on_resize(&mut self) -> bool {
        match surface::fit_to_display(&mut self.surface) {
            Some(size) => {
                log::debug!("backing store resized to {size}");
                self.module.resize_surface(self.handle, size.width, size.height);
                true
            }
            None => {
                log::trace!(
                    "resize ignored, backing store already {}",
                    self.backing_size()
                );
                false
            }
        }
    }

    pub fn render_frame(&mut self) {
        self.module.on_animation_frame(self.handle);
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll.scroll_y()
    }

    pub fn is_flush_pending(&self) -> bool {
        self.scroll.is_flush_pending()
    }

    pub fn backing_size(&self) -> PixelSize {
        self.surface.backing_size()
    }

    pub fn handle(&self) -> RenderHandle {
        self.handle
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
