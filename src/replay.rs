//! Headless replay of page events against a recording rendering module.
//!
//! A trace is a line-oriented script:
//!
//! ```text
//! # comment
//! wheel 10            # pixel delta
//! wheel 3 line        # also `page`
//! layout 1024 768 2   # css width, css height, optional pixel ratio
//! resize
//! frame               # one display refresh
//! ```

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::bridge::{DeltaMode, FrameBridge, WheelDelta};
use crate::module::{RecordingModule, RenderCall};
use crate::surface::VirtualSurface;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceCommand {
    Wheel(WheelDelta),
    Layout {
        css_width: f64,
        css_height: f64,
        ratio: Option<f64>,
    },
    Resize,
    Frame,
}

impl FromStr for TraceCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            bail!("empty trace line");
        };
        let args: Vec<&str> = words.collect();
        match (command, args.as_slice()) {
            ("wheel", [value]) => Ok(Self::Wheel(WheelDelta::pixels(number(value)?))),
            ("wheel", [value, unit]) => Ok(Self::Wheel(WheelDelta {
                value: number(value)?,
                mode: delta_mode(unit)?,
            })),
            ("layout", [width, height]) => Ok(Self::Layout {
                css_width: number(width)?,
                css_height: number(height)?,
                ratio: None,
            }),
            ("layout", [width, height, ratio]) => Ok(Self::Layout {
                css_width: number(width)?,
                css_height: number(height)?,
                ratio: Some(number(ratio)?),
            }),
            ("resize", []) => Ok(Self::Resize),
            ("frame", []) => Ok(Self::Frame),
            _ => Err(anyhow!("unrecognized trace line `{line}`")),
        }
    }
}

fn number(text: &str) -> Result<f64> {
    let value = text
        .parse::<f64>()
        .with_context(|| format!("`{text}` is not a number"))?;
    if !value.is_finite() {
        bail!("`{text}` is not a finite number");
    }
    Ok(value)
}

fn delta_mode(unit: &str) -> Result<DeltaMode> {
    match unit {
        "pixel" | "px" => Ok(DeltaMode::Pixel),
        "line" => Ok(DeltaMode::Line),
        "page" => Ok(DeltaMode::Page),
        other => Err(anyhow!("unknown wheel unit `{other}`")),
    }
}

/// Parses a whole trace, skipping blank lines and `#` comments.
pub fn parse_trace(source: &str) -> Result<Vec<TraceCommand>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.split('#').next().unwrap_or("").trim();
            (!line.is_empty()).then_some((index + 1, line))
        })
        .map(|(number, line)| {
            line.parse::<TraceCommand>()
                .with_context(|| format!("line {number}"))
        })
        .collect()
}

/// Drives a [`FrameBridge`] from trace commands and collects the calls it
/// makes into the rendering module.
pub struct Replay {
    bridge: FrameBridge<RecordingModule, VirtualSurface>,
    calls: RecordingModule,
}

impl Replay {
    pub fn new(surface: VirtualSurface, line_height: f64) -> Result<Self> {
        let calls = RecordingModule::new();
        let bridge = FrameBridge::start(calls.clone(), surface, line_height)
            .context("failed to start the bridge")?;
        Ok(Self { bridge, calls })
    }

    /// Applies one command and returns the calls it caused.
    pub fn apply(&mut self, command: TraceCommand) -> Vec<RenderCall> {
        match command {
            TraceCommand::Wheel(delta) => {
                self.bridge.on_wheel_event(delta);
            }
            TraceCommand::Layout {
                css_width,
                css_height,
                ratio,
            } => {
                let surface = self.bridge.surface_mut();
                surface.set_layout(css_width, css_height);
                if let Some(ratio) = ratio {
                    surface.set_device_pixel_ratio(ratio);
                }
            }
            TraceCommand::Resize => {
                self.bridge.on_resize();
            }
            TraceCommand::Frame => {
                self.bridge.flush_scroll();
            }
        }
        self.calls.drain()
    }

    /// Calls made by startup that have not been collected yet.
    pub fn take_pending(&mut self) -> Vec<RenderCall> {
        self.calls.drain()
    }

    pub fn bridge(&self) -> &FrameBridge<RecordingModule, VirtualSurface> {
        &self.bridge
    }
}

/// Totals printed after a replay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReplaySummary {
    pub translate_calls: usize,
    pub resize_calls: usize,
    pub scroll_y: f64,
}

impl ReplaySummary {
    pub fn record(&mut self, call: &RenderCall) {
        match call {
            RenderCall::Translate { .. } => self.translate_calls += 1,
            RenderCall::ResizeSurface { .. } => self.resize_calls += 1,
            RenderCall::Init { .. } | RenderCall::AnimationFrame { .. } => {}
        }
    }
}

impl std::fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "summary: translate={} resize={} scroll_y={}",
            self.translate_calls, self.resize_calls, self.scroll_y
        )
    }
}
