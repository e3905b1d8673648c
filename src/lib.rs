//! Browser-side bridge between a WebGL2 canvas and a precompiled rendering
//! module.
//!
//! The core ([`FrameBridge`]) takes plain numbers and returns plain
//! decisions: wheel deltas are coalesced into at most one `translate` per
//! display refresh and resize notifications only reach the module when the
//! canvas backing store actually changes size. The `web` module is the thin
//! DOM adapter around it and only exists on `wasm32`.

pub mod bridge;
pub mod config;
pub mod error;
pub mod module;
pub mod replay;
pub mod surface;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bridge::{DeltaMode, FrameBridge, ScrollCoalescer, WheelDecision, WheelDelta};
pub use config::{BridgeConfig, ContextAttributes};
pub use error::{BridgeError, Result};
pub use module::{RecordingModule, RenderCall, RenderHandle, RenderModule};
pub use surface::{DisplaySurface, PixelSize, VirtualSurface};
