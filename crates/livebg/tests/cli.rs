use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const SMALL_VIEWPORT_CONFIG: &str = r#"
version = 1

[policy]
mobile_breakpoint = 32

[surface]
width = 64
height = 48
"#;

fn livebg(config_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_livebg"));
    command
        .env("LIVEBG_CONFIG_DIR", config_dir)
        .env_remove("LIVEBG_CONFIG")
        .env("RUST_LOG", "warn");
    command
}

fn write_config(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("livebg.toml"), SMALL_VIEWPORT_CONFIG).unwrap();
}

fn png_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".png"))
        .collect();
    names.sort();
    names
}

#[test]
fn still_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out/still.png");

    let status = livebg(&root.path().join("config"))
        .args(["still", "--size", "120x80", "--tick", "42", "--out"])
        .arg(&out)
        .status()
        .expect("failed to run livebg still");

    assert!(status.success());
    let image = image::open(&out).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (120, 80));
    assert_eq!(image.get_pixel(0, 0).0[3], 255);
}

#[test]
fn render_exports_requested_frames() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    write_config(&config_dir);
    let out = root.path().join("frames");

    let status = livebg(&config_dir)
        .args(["render", "--frames", "5", "--refresh-hz", "60", "--out"])
        .arg(&out)
        .status()
        .expect("failed to run livebg render");

    assert!(status.success());
    assert_eq!(
        png_files(&out),
        [
            "frame-00000.png",
            "frame-00001.png",
            "frame-00002.png",
            "frame-00003.png",
            "frame-00004.png",
        ]
    );
    let first = image::open(out.join("frame-00000.png")).unwrap().to_rgba8();
    let last = image::open(out.join("frame-00004.png")).unwrap().to_rgba8();
    assert_eq!(first.dimensions(), (64, 48));
    assert_ne!(first.as_raw(), last.as_raw());
}

#[test]
fn reduced_motion_render_stops_after_static_frame() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    write_config(&config_dir);
    let out = root.path().join("frames");

    let status = livebg(&config_dir)
        .args(["render", "--frames", "10", "--reduced-motion", "--out"])
        .arg(&out)
        .status()
        .expect("failed to run livebg render");

    assert!(status.success());
    assert_eq!(png_files(&out), ["frame-00000.png"]);
}

#[test]
fn explicit_config_overrides_config_dir() {
    let root = TempDir::new().unwrap();
    let explicit = root.path().join("custom.toml");
    fs::write(&explicit, "version = 1\n[surface]\nwidth = 30\nheight = 20\n").unwrap();
    let out = root.path().join("still.png");

    let status = livebg(&root.path().join("config"))
        .arg("--config")
        .arg(&explicit)
        .args(["still", "--out"])
        .arg(&out)
        .status()
        .expect("failed to run livebg still");

    assert!(status.success());
    let image = image::open(&out).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (30, 20));
}

#[test]
fn invalid_config_is_rejected() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("livebg.toml"), "version = 1\n[pacing]\nrefresh_hz = 0\n").unwrap();

    let output = livebg(&config_dir)
        .args(["config", "check"])
        .output()
        .expect("failed to run livebg config check");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("refresh_hz"));
}

#[test]
fn malformed_size_is_a_usage_error() {
    let root = TempDir::new().unwrap();
    let output = livebg(&root.path().join("config"))
        .args(["still", "--size", "big", "--out", "x.png"])
        .output()
        .expect("failed to run livebg still");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("WIDTHxHEIGHT"));
}

#[test]
fn run_reports_json_stats() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    write_config(&config_dir);
    let snapshot = root.path().join("snap.png");

    let output = livebg(&config_dir)
        .args(["run", "--duration", "200ms", "--refresh-hz", "120", "--stats-json", "--snapshot"])
        .arg(&snapshot)
        .output()
        .expect("failed to run livebg run");

    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(stats["painted"].as_u64().unwrap() >= 1);
    assert_eq!(stats["width"], 64);
    assert_eq!(image::open(&snapshot).unwrap().to_rgba8().dimensions(), (64, 48));
}
