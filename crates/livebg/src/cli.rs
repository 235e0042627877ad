use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "livebg",
    author,
    version,
    about = "Procedural animated background renderer"
)]
pub struct Cli {
    /// Configuration file; defaults to `livebg.toml` in the config directory.
    #[arg(long, global = true, value_name = "FILE", env = "LIVEBG_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a single frame at a fixed tick and write it as PNG.
    Still(StillArgs),
    /// Drive the headless host on a simulated clock and export painted frames.
    Render(RenderArgs),
    /// Run the real-time host for a while and report frame statistics.
    Run(RunArgs),
    /// Inspect configuration locations.
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone)]
pub struct SurfaceArgs {
    /// Viewport size (e.g. `1280x720`); overrides `[surface]` from the config.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Behave as if the user prefers reduced motion.
    #[arg(long)]
    pub reduced_motion: bool,

    /// Pointer position in surface pixels (e.g. `640,360`).
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<(f64, f64)>,
}

#[derive(Args, Debug)]
pub struct StillArgs {
    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// Logical tick to evaluate the waves and stars at.
    #[arg(long, value_name = "TICK", default_value_t = 0)]
    pub tick: u64,

    /// Destination PNG path.
    #[arg(long, value_name = "PATH", value_parser = parse_png_path)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// Number of painted frames to export.
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub frames: u32,

    /// Simulated display refresh rate; overrides `pacing.refresh_hz`.
    #[arg(long, value_name = "HZ")]
    pub refresh_hz: Option<f32>,

    /// Directory receiving `frame-NNNNN.png` files.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// How long to keep the host running (e.g. `3s`, `500ms`).
    #[arg(long, value_name = "DURATION", default_value = "3s", value_parser = parse_duration)]
    pub duration: Duration,

    /// Refresh rate of the vsync ticker; overrides `pacing.refresh_hz`.
    #[arg(long, value_name = "HZ")]
    pub refresh_hz: Option<f32>,

    /// Write the final surface to this PNG path.
    #[arg(long, value_name = "PATH", value_parser = parse_png_path)]
    pub snapshot: Option<PathBuf>,

    /// Print run statistics as JSON instead of a summary line.
    #[arg(long)]
    pub stats_json: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration directory and file.
    Where,
    /// Parse and validate the configuration, then print the effective values.
    Check,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1920x1080".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_pointer(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value
        .trim()
        .split_once(',')
        .ok_or_else(|| "expected X,Y, e.g. 640,360".to_string())?;
    let x = x
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid pointer x '{}'", x.trim()))?;
    let y = y
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid pointer y '{}'", y.trim()))?;
    if !x.is_finite() || !y.is_finite() {
        return Err("pointer coordinates must be finite".into());
    }
    Ok((x, y))
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value.trim()).map_err(|err| format!("invalid duration '{value}': {err}"))
}

pub fn parse_png_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(path),
        None => Err("output path has no extension; expected .png".to_string()),
        Some(other) => Err(format!("unsupported output format '.{other}'; expected .png")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("widexhigh").is_err());
    }

    #[test]
    fn parses_pointer_positions() {
        assert_eq!(parse_pointer("640,360").unwrap(), (640.0, 360.0));
        assert_eq!(parse_pointer("-10.5, 2").unwrap(), (-10.5, 2.0));
        assert!(parse_pointer("640").is_err());
        assert!(parse_pointer("inf,0").is_err());
    }

    #[test]
    fn png_paths_only() {
        assert!(parse_png_path("frame.PNG").is_ok());
        assert!(parse_png_path("frame.exr").is_err());
        assert!(parse_png_path("frame").is_err());
    }

    #[test]
    fn durations_accept_humantime() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn render_defaults() {
        let cli = Cli::try_parse_from(["livebg", "render", "--out", "frames"]).unwrap();
        match cli.command {
            Command::Render(args) => {
                assert_eq!(args.frames, 30);
                assert!(args.refresh_hz.is_none());
                assert!(!args.surface.reduced_motion);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
