//! Command-line behavior that does not need a browser.
//!
//! Every case points `CHROME` at a nonexistent executable: a launch attempt
//! would surface as a "Runtime Error", so its absence shows validation ran
//! before any browser was started.

use std::process::{Command, Output};
use tempfile::TempDir;

fn mmap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mmap"))
        .args(args)
        .env("CHROME", "/nonexistent/chromium")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .output()
        .expect("failed to run mmap")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn scratch_html() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    std::fs::write(&path, "<html><body><svg id=\"mindmap\"></svg></body></html>").unwrap();
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

#[test]
fn test_missing_input_exits_with_code_1() {
    let output = mmap(&["-i", "no/such/map.html", "-o", "out.pdf"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Cannot find input file \"no/such/map.html\""), "{err}");
    assert!(!err.contains("Runtime Error"), "{err}");
}

#[test]
fn test_unsupported_extension_exits_with_code_1() {
    let (dir, input) = scratch_html();
    let out = dir.path().join("map.jpg");

    let output = mmap(&["-i", &input, "-o", out.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Output file must end with .pdf or .png"), "{err}");
    assert!(!err.contains("Runtime Error"), "{err}");
    assert!(!out.exists());
}

#[test]
fn test_invalid_scale_exits_with_code_1() {
    let (dir, input) = scratch_html();
    let out = dir.path().join("map.png");

    for scale in ["0", "-2", "NaN", "big"] {
        let output = mmap(&["-i", &input, "-o", out.to_str().unwrap(), "--scale", scale]);

        assert_eq!(output.status.code(), Some(1), "scale {scale}");
        let err = stderr(&output);
        assert!(err.contains("Scale must be a finite number greater than 0"), "{err}");
        assert!(!err.contains("Runtime Error"), "{err}");
    }
}

#[test]
fn test_negative_short_scale_reaches_validation() {
    let (dir, input) = scratch_html();
    let out = dir.path().join("map.png");

    let output = mmap(&["-i", &input, "-o", out.to_str().unwrap(), "-s", "-1.5"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("(got \"-1.5\")"), "{err}");
    assert!(!err.contains("unexpected argument"), "{err}");
}

#[test]
fn test_missing_required_flags() {
    let output = mmap(&["-i", "map.html"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--output"));
}

#[test]
fn test_browser_launch_failure_exits_nonzero() {
    let (dir, input) = scratch_html();
    let out = dir.path().join("map.pdf");

    let output = mmap(&["-i", &input, "-o", out.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Runtime Error"));
    assert!(!out.exists());
}

#[test]
fn test_version_flag() {
    let output = mmap(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
