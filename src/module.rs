use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Opaque state handle returned by the rendering module's `init`.
///
/// The bridge only stores and forwards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(u32);

impl RenderHandle {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric call surface of a precompiled rendering module.
///
/// Only `init` can fail: without a state handle nothing else is callable.
/// Later calls are assumed to succeed.
pub trait RenderModule {
    fn init(&mut self, width: u32, height: u32) -> Result<RenderHandle>;
    fn translate(&mut self, handle: RenderHandle, scroll_y: f64);
    fn resize_surface(&mut self, handle: RenderHandle, width: u32, height: u32);
    fn on_animation_frame(&mut self, handle: RenderHandle);
}

/// One call made into a [`RenderModule`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCall {
    Init {
        width: u32,
        height: u32,
        handle: RenderHandle,
    },
    Translate {
        handle: RenderHandle,
        scroll_y: f64,
    },
    ResizeSurface {
        handle: RenderHandle,
        width: u32,
        height: u32,
    },
    AnimationFrame {
        handle: RenderHandle,
    },
}

impl fmt::Display for RenderCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init {
                width,
                height,
                handle,
            } => write!(f, "init {width}x{height} -> {handle}"),
            Self::Translate { handle, scroll_y } => write!(f, "translate {handle} {scroll_y}"),
            Self::ResizeSurface {
                handle,
                width,
                height,
            } => write!(f, "resize_surface {handle} {width}x{height}"),
            Self::AnimationFrame { handle } => write!(f, "on_animation_frame {handle}"),
        }
    }
}

/// Rendering module that draws nothing and records every call it receives.
///
/// Clones share the same call log, so a caller can keep one clone for
/// inspection after handing the other to a bridge.
#[derive(Debug, Clone, Default)]
pub struct RecordingModule {
    calls: Arc<Mutex<Vec<RenderCall>>>,
    next_handle: u32,
}

impl RecordingModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// Removes and returns the recorded calls.
    pub fn drain(&self) -> Vec<RenderCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn translate_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RenderCall::Translate { .. }))
            .count()
    }

    pub fn resize_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RenderCall::ResizeSurface { .. }))
            .count()
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().push(call);
    }
}

impl RenderModule for RecordingModule {
    fn init(&mut self, width: u32, height: u32) -> Result<RenderHandle> {
        self.next_handle += 1;
        let handle = RenderHandle::from_raw(self.next_handle);
        self.record(RenderCall::Init {
            width,
            height,
            handle,
        });
        Ok(handle)
    }

    fn translate(&mut self, handle: RenderHandle, scroll_y: f64) {
        self.record(RenderCall::Translate { handle, scroll_y });
    }

    fn resize_surface(&mut self, handle: RenderHandle, width: u32, height: u32) {
        self.record(RenderCall::ResizeSurface {
            handle,
            width,
            height,
        });
    }

    fn on_animation_frame(&mut self, handle: RenderHandle) {
        self.record(RenderCall::AnimationFrame { handle });
    }
}
