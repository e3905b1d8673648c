use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};

use canvas_bridge::replay::{parse_trace, Replay, ReplaySummary};
use canvas_bridge::{BridgeConfig, VirtualSurface};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let config = match &options.config {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path}"))?;
            BridgeConfig::from_json(&source)
                .with_context(|| format!("failed to load config {path}"))?
        }
        None => BridgeConfig::default(),
    };

    let source = fs::read_to_string(&options.trace)
        .with_context(|| format!("failed to read trace {}", options.trace))?;
    let commands = parse_trace(&source).context("failed to parse trace")?;
    log::info!("replaying {} trace command(s)", commands.len());

    let (width, height) = options.size;
    let mut replay = Replay::new(
        VirtualSurface::new(width, height, options.ratio),
        config.line_height_px,
    )?;
    let mut summary = ReplaySummary::default();
    let mut print = |call: &canvas_bridge::RenderCall| {
        summary.record(call);
        println!("{call}");
    };
    replay.take_pending().iter().for_each(&mut print);
    for command in commands {
        replay.apply(command).iter().for_each(&mut print);
    }
    summary.scroll_y = replay.bridge().scroll_y();
    println!("{summary}");
    Ok(())
}

struct CliOptions {
    trace: String,
    size: (f64, f64),
    ratio: f64,
    config: Option<String>,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(trace) = args.next() else {
            return Err(anyhow!(
                "Usage: canvas-bridge <trace> [--size WxH] [--ratio R] [--config FILE]"
            ));
        };
        let mut options = Self {
            trace,
            size: (800.0, 600.0),
            ratio: 1.0,
            config: None,
        };
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value"))
            };
            match arg.as_str() {
                "--size" => options.size = parse_size(&value()?)?,
                "--ratio" => {
                    let text = value()?;
                    options.ratio = text
                        .parse()
                        .with_context(|| format!("invalid ratio `{text}`"))?;
                }
                "--config" => options.config = Some(value()?),
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --size, --ratio or --config"
                    ));
                }
            }
        }
        Ok(options)
    }
}

fn parse_size(text: &str) -> Result<(f64, f64)> {
    let (width, height) = text
        .split_once('x')
        .ok_or_else(|| anyhow!("size must look like WIDTHxHEIGHT, got `{text}`"))?;
    let width = width
        .parse()
        .with_context(|| format!("invalid width `{width}`"))?;
    let height = height
        .parse()
        .with_context(|| format!("invalid height `{height}`"))?;
    Ok((width, height))
}
