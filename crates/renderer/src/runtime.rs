use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use bgconfig::BackgroundConfig;
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};
use image::RgbaImage;
use scheduler::{clamp_refresh_hz, ManualScheduler};
use serde::Serialize;
use tracing::{debug, info};

use crate::background::LiveBackground;
use crate::environment::StaticProbe;
use crate::host::{dispatch_event, fire_due, HostEvent, HostedBackground};
use crate::raster::PixelSurface;
use crate::surface::Surface;
use crate::types::BackgroundOptions;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Start-up parameters for [`HostRuntime`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub options: BackgroundOptions,
    pub viewport: (u32, u32),
    pub reduced_motion: bool,
    /// Rate of the vsync stand-in that fires frame callbacks.
    pub refresh_hz: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(&BackgroundConfig::default())
    }
}

impl From<&BackgroundConfig> for RuntimeConfig {
    fn from(config: &BackgroundConfig) -> Self {
        Self {
            options: BackgroundOptions::from(config),
            viewport: (config.surface.width, config.surface.height),
            reduced_motion: config.policy.reduced_motion,
            refresh_hz: config.pacing.refresh_hz,
        }
    }
}

/// Counters reported when the runtime stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub painted: u64,
    pub throttled: u64,
    pub static_paints: u64,
    pub frames_requested: u64,
    pub frames_cancelled: u64,
    pub final_tick: u64,
    pub width: u32,
    pub height: u32,
}

impl RunStats {
    fn collect(background: &HostedBackground<PixelSurface>) -> Self {
        let frames = background.stats();
        let scheduler = background.scheduler().stats();
        let (width, height) = background.surface().map(|s| s.size()).unwrap_or_default();
        Self {
            painted: frames.painted,
            throttled: frames.throttled,
            static_paints: frames.static_paints,
            frames_requested: scheduler.requested,
            frames_cancelled: scheduler.cancelled,
            final_tick: background.state().map(|s| s.time).unwrap_or_default(),
            width,
            height,
        }
    }
}

#[derive(Debug)]
enum RuntimeCommand {
    Host(HostEvent),
    Snapshot(Sender<RgbaImage>),
    Stats(Sender<RunStats>),
    Shutdown,
}

/// Real-time host running the background on its own thread.
///
/// Host events travel over a channel and are applied between frames; a
/// ticker at the configured refresh rate plays the role of vsync.
pub struct HostRuntime {
    commands: Sender<RuntimeCommand>,
    join_handle: Option<JoinHandle<Result<RunStats>>>,
}

impl HostRuntime {
    pub fn spawn(config: RuntimeConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (command_tx, command_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("livebg-host".into())
            .spawn(move || run_host_thread(config, command_rx, ready_tx))
            .map_err(|err| anyhow!("failed to spawn host thread: {err}"))?;

        ready_rx
            .recv()
            .map_err(|err| anyhow!("host thread failed to initialise: {err}"))??;

        Ok(Self {
            commands: command_tx,
            join_handle: Some(handle),
        })
    }

    pub fn send(&self, event: HostEvent) -> Result<()> {
        self.commands
            .send(RuntimeCommand::Host(event))
            .map_err(|err| anyhow!("host thread is gone: {err}"))
    }

    /// Copy of the surface as of the last processed command.
    pub fn snapshot(&self) -> Result<RgbaImage> {
        let (tx, rx) = bounded(1);
        self.commands
            .send(RuntimeCommand::Snapshot(tx))
            .map_err(|err| anyhow!("host thread is gone: {err}"))?;
        rx.recv_timeout(REPLY_TIMEOUT)
            .map_err(|err| anyhow!("no snapshot from host thread: {err}"))
    }

    pub fn stats(&self) -> Result<RunStats> {
        let (tx, rx) = bounded(1);
        self.commands
            .send(RuntimeCommand::Stats(tx))
            .map_err(|err| anyhow!("host thread is gone: {err}"))?;
        rx.recv_timeout(REPLY_TIMEOUT)
            .map_err(|err| anyhow!("no stats from host thread: {err}"))
    }

    /// Unmounts the background and waits for the host thread to exit.
    pub fn shutdown(mut self) -> Result<RunStats> {
        let handle = self
            .join_handle
            .take()
            .ok_or_else(|| anyhow!("host runtime already stopped"))?;
        let _ = self.commands.send(RuntimeCommand::Shutdown);
        handle
            .join()
            .map_err(|err| anyhow!("host thread panicked: {err:?}"))?
    }
}

impl Drop for HostRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.commands.send(RuntimeCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_host_thread(
    config: RuntimeConfig,
    commands: Receiver<RuntimeCommand>,
    ready_tx: Sender<Result<()>>,
) -> Result<RunStats> {
    let (width, height) = config.viewport;
    let surface = match PixelSurface::new(width, height) {
        Ok(surface) => surface,
        Err(err) => {
            let message = format!("failed to allocate background surface: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let probe = StaticProbe::new(width, height).with_reduced_motion(config.reduced_motion);
    let mut background =
        LiveBackground::mount(Some(surface), probe, ManualScheduler::new(), config.options);

    let refresh_hz = clamp_refresh_hz(config.refresh_hz);
    let vsync = tick(Duration::from_secs_f32(1.0 / refresh_hz));
    let origin = Instant::now();
    info!(width, height, refresh_hz, "host runtime started");
    let _ = ready_tx.send(Ok(()));

    loop {
        select! {
            recv(commands) -> command => match command {
                Ok(RuntimeCommand::Host(event)) => dispatch_event(&mut background, event),
                Ok(RuntimeCommand::Snapshot(reply)) => {
                    if let Some(surface) = background.surface() {
                        let _ = reply.send(surface.to_image());
                    }
                }
                Ok(RuntimeCommand::Stats(reply)) => {
                    let _ = reply.send(RunStats::collect(&background));
                }
                Ok(RuntimeCommand::Shutdown) | Err(_) => break,
            },
            recv(vsync) -> instant => {
                let now = instant.unwrap_or_else(|_| Instant::now());
                let now_ms = now.saturating_duration_since(origin).as_secs_f64() * 1000.0;
                fire_due(&mut background, now_ms);
            }
        }
    }

    background.teardown();
    let stats = RunStats::collect(&background);
    debug!(?stats, "host runtime stopped");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RuntimeConfig {
        RuntimeConfig {
            viewport: (96, 64),
            refresh_hz: 240.0,
            options: BackgroundOptions {
                mobile_breakpoint: 32,
                ..BackgroundOptions::default()
            },
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn runtime_paints_and_shuts_down() {
        let runtime = HostRuntime::spawn(small_config()).expect("spawn runtime");
        thread::sleep(Duration::from_millis(150));
        let stats = runtime.shutdown().expect("shutdown");
        assert!(stats.painted >= 1);
        assert_eq!((stats.width, stats.height), (96, 64));
        assert_eq!(stats.final_tick, stats.painted);
    }

    #[test]
    fn hidden_runtime_stops_painting() {
        let runtime = HostRuntime::spawn(small_config()).expect("spawn runtime");
        thread::sleep(Duration::from_millis(60));
        runtime
            .send(HostEvent::Visibility { visible: false })
            .unwrap();
        let before = runtime.stats().unwrap();
        thread::sleep(Duration::from_millis(100));
        let after = runtime.stats().unwrap();
        assert_eq!(before.painted, after.painted);
        assert_eq!(before.final_tick, after.final_tick);
    }

    #[test]
    fn snapshot_matches_viewport() {
        let runtime = HostRuntime::spawn(small_config()).expect("spawn runtime");
        runtime
            .send(HostEvent::Resize {
                width: 48,
                height: 40,
            })
            .unwrap();
        let image = runtime.snapshot().unwrap();
        assert_eq!(image.dimensions(), (48, 40));
    }

    #[test]
    fn zero_viewport_fails_to_start() {
        let config = RuntimeConfig {
            viewport: (0, 0),
            ..small_config()
        };
        assert!(HostRuntime::spawn(config).is_err());
    }

    #[test]
    fn subnormal_refresh_rate_still_starts() {
        let config = RuntimeConfig {
            refresh_hz: 1e-39,
            ..small_config()
        };
        let runtime = HostRuntime::spawn(config).expect("spawn runtime");
        let stats = runtime.shutdown().unwrap();
        assert_eq!((stats.width, stats.height), (96, 64));
    }

    #[test]
    fn static_policy_paints_exactly_once() {
        let config = RuntimeConfig {
            reduced_motion: true,
            ..small_config()
        };
        let runtime = HostRuntime::spawn(config).expect("spawn runtime");
        thread::sleep(Duration::from_millis(80));
        let stats = runtime.shutdown().unwrap();
        assert_eq!(stats.static_paints, 1);
        assert_eq!(stats.painted, 0);
    }
}
