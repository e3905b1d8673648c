use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_file(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp file");
    tmp.write_all(contents.as_bytes()).expect("write temp file");
    tmp
}

#[test]
fn cli_coalesces_wheel_burst_and_skips_noop_resize() {
    let trace = write_file(
        "# three deltas inside one refresh window\n\
         wheel 10\n\
         wheel -5\n\
         wheel 20\n\
         frame\n\
         frame\n\
         resize\n\
         layout 1024 600\n\
         resize\n",
    );
    let mut cmd = Command::cargo_bin("canvas-bridge").expect("binary exists");
    cmd.arg(trace.path()).args(["--size", "800x600", "--ratio", "2"]);
    cmd.assert()
        .success()
        .stdout(contains("init 1600x1200 -> #1"))
        .stdout(contains("on_animation_frame #1"))
        .stdout(contains("translate #1 25"))
        .stdout(contains("resize_surface #1 2048x1200"))
        .stdout(contains("summary: translate=1 resize=1 scroll_y=25"));
}

#[test]
fn cli_normalizes_line_deltas_with_configured_line_height() {
    let trace = write_file("wheel 2 line\nframe\n");
    let config = write_file(r#"{"line_height_px": 20}"#);
    let mut cmd = Command::cargo_bin("canvas-bridge").expect("binary exists");
    cmd.arg(trace.path()).arg("--config").arg(config.path());
    cmd.assert()
        .success()
        .stdout(contains("init 800x600 -> #1"))
        .stdout(contains("translate #1 40"));
}

#[test]
fn cli_rejects_malformed_trace() {
    let trace = write_file("wheel\n");
    let mut cmd = Command::cargo_bin("canvas-bridge").expect("binary exists");
    cmd.arg(trace.path());
    cmd.assert()
        .failure()
        .stderr(contains("failed to parse trace"));
}

#[test]
fn cli_requires_a_trace_argument() {
    let mut cmd = Command::cargo_bin("canvas-bridge").expect("binary exists");
    cmd.assert().failure().stderr(contains("Usage: canvas-bridge"));
}

#[test]
fn cli_rejects_non_finite_wheel_delta() {
    let trace = write_file("wheel 10\nwheel NaN\nframe\n");
    let mut cmd = Command::cargo_bin("canvas-bridge").expect("binary exists");
    cmd.arg(trace.path());
    cmd.assert()
        .failure()
        .stderr(contains("line 2"))
        .stderr(contains("not a finite number"));
}
