use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bgconfig::{BackgroundConfig, MAX_REFRESH_HZ, MIN_REFRESH_HZ};
use renderer::scene::{paint_backdrop, paint_stars, paint_waves};
use renderer::{
    AnimationPolicy, BackgroundOptions, FrameOutcome, HeadlessHost, HostEvent, HostRuntime,
    PixelSurface, Point, RuntimeConfig, StaticProbe, Surface, WAVES,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigAction, RenderArgs, RunArgs, StillArgs, SurfaceArgs};
use crate::paths::AppPaths;

/// Interval between synthetic pointer moves while `run` sweeps the viewport.
const POINTER_SWEEP_STEP: Duration = Duration::from_millis(50);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = load_config(cli.config.as_deref(), &paths.config_file())?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        source = ?loaded.source,
        "resolved livebg configuration"
    );

    match cli.command {
        Command::Still(args) => run_still(loaded.config, &args),
        Command::Render(args) => run_render(loaded.config, &args),
        Command::Run(args) => run_realtime(loaded.config, &args),
        Command::Config(cmd) => match cmd.action {
            ConfigAction::Where => run_config_where(&paths, &loaded),
            ConfigAction::Check => run_config_check(&loaded),
        },
    }
}

/// Validated configuration together with where it was read from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: BackgroundConfig,
    /// File the configuration came from; `None` means built-in defaults.
    pub source: Option<PathBuf>,
}

/// Loads an explicitly named config file, or `livebg.toml` from the config
/// directory when present. A missing default file yields the built-in values.
pub fn load_config(explicit: Option<&Path>, default_file: &Path) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => path,
        None if default_file.is_file() => default_file,
        None => {
            tracing::debug!(path = %default_file.display(), "no config file; using defaults");
            return Ok(LoadedConfig {
                config: BackgroundConfig::default(),
                source: None,
            });
        }
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = BackgroundConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    Ok(LoadedConfig {
        config,
        source: Some(path.to_path_buf()),
    })
}

fn apply_surface_overrides(config: &mut BackgroundConfig, args: &SurfaceArgs) {
    if let Some((width, height)) = args.size {
        config.surface.width = width;
        config.surface.height = height;
    }
    if args.reduced_motion {
        config.policy.reduced_motion = true;
    }
}

fn apply_refresh_override(config: &mut BackgroundConfig, refresh_hz: Option<f32>) -> Result<()> {
    if let Some(hz) = refresh_hz {
        if !(MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&hz) {
            bail!("--refresh-hz must be between {MIN_REFRESH_HZ} and {MAX_REFRESH_HZ}, got {hz}");
        }
        config.pacing.refresh_hz = hz;
    }
    Ok(())
}

fn centre_or(pointer: Option<(f64, f64)>, width: u32, height: u32) -> Point {
    pointer
        .map(|(x, y)| Point::new(x, y))
        .unwrap_or_else(|| Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn run_still(mut config: BackgroundConfig, args: &StillArgs) -> Result<()> {
    apply_surface_overrides(&mut config, &args.surface);
    let (width, height) = (config.surface.width, config.surface.height);
    let options = BackgroundOptions::from(&config);
    let policy = AnimationPolicy::from_signals(
        config.policy.reduced_motion,
        width,
        options.mobile_breakpoint,
    );

    let mut surface = PixelSurface::new(width, height)?;
    paint_backdrop(&mut surface);
    if policy.animates() {
        let pointer = centre_or(args.surface.pointer, width, height);
        paint_stars(&mut surface, policy.star_count(&options.stars), args.tick);
        paint_waves(&mut surface, &WAVES, args.tick, pointer);
    }
    surface.present();

    ensure_parent(&args.out)?;
    surface
        .save_png(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    tracing::info!(
        width,
        height,
        tick = args.tick,
        animated = policy.animates(),
        "rendered still frame"
    );
    println!("{}", args.out.display());
    Ok(())
}

fn run_render(mut config: BackgroundConfig, args: &RenderArgs) -> Result<()> {
    apply_surface_overrides(&mut config, &args.surface);
    apply_refresh_override(&mut config, args.refresh_hz)?;
    config.validate()?;

    let (width, height) = (config.surface.width, config.surface.height);
    let probe = StaticProbe::new(width, height).with_reduced_motion(config.policy.reduced_motion);
    let surface = PixelSurface::new(width, height)?;
    let mut host = HeadlessHost::new(
        Some(surface),
        probe,
        BackgroundOptions::from(&config),
        config.pacing.refresh_hz,
    );
    if let Some((x, y)) = args.surface.pointer {
        host.dispatch(HostEvent::PointerMove { x, y });
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output directory {}", args.out.display()))?;

    let mut written = 0u32;
    let mut steps = 0u64;
    while written < args.frames && host.background().scheduler().has_pending() {
        for outcome in host.step() {
            if !matches!(outcome, FrameOutcome::Painted { .. } | FrameOutcome::StaticPainted) {
                continue;
            }
            let path = args.out.join(format!("frame-{written:05}.png"));
            if let Some(surface) = host.background().surface() {
                surface
                    .save_png(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            tracing::debug!(?outcome, path = %path.display(), "exported frame");
            written += 1;
        }
        steps += 1;
    }
    host.unmount();

    let stats = host.background().stats();
    tracing::info!(
        written,
        steps,
        simulated_ms = host.now_ms(),
        throttled = stats.throttled,
        "headless render finished"
    );
    if written < args.frames {
        tracing::warn!(
            requested = args.frames,
            written,
            "animation loop stopped early; static backdrop only"
        );
    }
    println!("wrote {written} frame(s) to {}", args.out.display());
    Ok(())
}

fn run_realtime(mut config: BackgroundConfig, args: &RunArgs) -> Result<()> {
    apply_surface_overrides(&mut config, &args.surface);
    apply_refresh_override(&mut config, args.refresh_hz)?;
    config.validate()?;

    let (width, height) = (config.surface.width, config.surface.height);
    let runtime = HostRuntime::spawn(RuntimeConfig::from(&config))?;
    tracing::info!(duration = ?args.duration, "running live background");

    let started = Instant::now();
    if let Some((x, y)) = args.surface.pointer {
        runtime.send(HostEvent::PointerMove { x, y })?;
    }
    loop {
        let elapsed = started.elapsed();
        if elapsed >= args.duration {
            break;
        }
        if args.surface.pointer.is_none() {
            let progress = elapsed.as_secs_f64() / args.duration.as_secs_f64();
            runtime.send(HostEvent::PointerMove {
                x: progress * f64::from(width),
                y: f64::from(height) / 2.0,
            })?;
        }
        thread::sleep(POINTER_SWEEP_STEP.min(args.duration - elapsed));
    }

    if let Some(path) = &args.snapshot {
        let image = runtime.snapshot()?;
        ensure_parent(path)?;
        image
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved snapshot");
    }

    let stats = runtime.shutdown()?;
    if args.stats_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "painted={} throttled={} static={} requested={} cancelled={} tick={} size={}x{}",
            stats.painted,
            stats.throttled,
            stats.static_paints,
            stats.frames_requested,
            stats.frames_cancelled,
            stats.final_tick,
            stats.width,
            stats.height
        );
    }
    Ok(())
}

fn run_config_where(paths: &AppPaths, loaded: &LoadedConfig) -> Result<()> {
    let file = paths.config_file();
    println!("Configuration:");
    println!("  dir:     {}", paths.config_dir().display());
    println!(
        "  file:    {} ({})",
        file.display(),
        if file.is_file() { "present" } else { "missing" }
    );
    match &loaded.source {
        Some(source) => println!("  active:  {}", source.display()),
        None => println!("  active:  built-in defaults"),
    }
    Ok(())
}

fn run_config_check(loaded: &LoadedConfig) -> Result<()> {
    let config = &loaded.config;
    config.validate()?;
    println!("version            {}", config.version);
    println!(
        "frame_interval     {}",
        humantime::format_duration(config.pacing.frame_interval)
    );
    println!("refresh_hz         {}", config.pacing.refresh_hz);
    println!("mobile_breakpoint  {}", config.policy.mobile_breakpoint);
    println!("reduced_motion     {}", config.policy.reduced_motion);
    println!(
        "stars              {} animated, {} reduced",
        config.stars.animated, config.stars.reduced
    );
    println!(
        "surface            {}x{}",
        config.surface.width, config.surface.height
    );
    Ok(())
}
