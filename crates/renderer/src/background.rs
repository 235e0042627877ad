use scheduler::{FrameHandle, FrameScheduler, FrameThrottle};
use tracing::{debug, trace};

use crate::environment::{EnvironmentProbe, ListenerId, ListenerKind};
use crate::policy::AnimationPolicy;
use crate::scene::{self, WaveParams, WAVES};
use crate::surface::Surface;
use crate::types::{BackgroundOptions, Point, StarCounts};

/// Where the render loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// A frame is pending or about to be requested.
    Running,
    /// The page is hidden; no frame is pending.
    Suspended,
    /// The static backdrop was painted; the loop will not run again.
    Static,
    /// Teardown ran; events and frame callbacks are ignored.
    TornDown,
}

/// Result of delivering one frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Arrived inside the throttle window; another frame was requested.
    Throttled,
    /// A dynamic frame was painted at this tick.
    Painted { tick: u64 },
    /// The static backdrop was painted and the loop stopped.
    StaticPainted,
    /// Stale handle or the background is inert or torn down.
    Ignored,
}

/// Per-mount counters, mostly for hosts that report run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Dynamic frames painted.
    pub painted: u64,
    /// Callbacks that arrived inside the throttle window.
    pub throttled: u64,
    /// Zero or one; the static backdrop is painted at most once.
    pub static_paints: u64,
}

/// Mutable per-mount state owned by the render loop.
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Logical tick; advances once per painted dynamic frame.
    pub time: u64,
    /// Last pointer position in surface pixels.
    pub pointer: Point,
    pending: Option<FrameHandle>,
}

impl RenderState {
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }
}

struct Mounted<S> {
    surface: S,
    state: RenderState,
    policy: AnimationPolicy,
    throttle: FrameThrottle,
    stars: StarCounts,
    waves: [WaveParams; 3],
    listeners: Vec<ListenerId>,
    phase: LoopPhase,
    stats: FrameStats,
}

/// Procedural animated background bound to one host mount.
///
/// The background owns its surface and render state for the whole mount.
/// Hosts forward resize, pointer, and visibility events through the `on_*`
/// methods, and deliver each fired frame callback through
/// [`LiveBackground::on_frame`]. Dropping the background tears it down.
pub struct LiveBackground<S, P, F>
where
    S: Surface,
    P: EnvironmentProbe,
    F: FrameScheduler,
{
    mounted: Option<Mounted<S>>,
    probe: P,
    scheduler: F,
}

impl<S, P, F> LiveBackground<S, P, F>
where
    S: Surface,
    P: EnvironmentProbe,
    F: FrameScheduler,
{
    /// Mounts the background onto `surface`.
    ///
    /// `None` stands for a host that could not provide a drawing context; the
    /// result is inert and never touches the probe or the scheduler.
    pub fn mount(surface: Option<S>, mut probe: P, mut scheduler: F, options: BackgroundOptions) -> Self {
        let Some(mut surface) = surface else {
            debug!("drawing surface unavailable; background stays inert");
            return Self {
                mounted: None,
                probe,
                scheduler,
            };
        };

        let width = probe.viewport_width().max(1);
        let height = probe.viewport_height().max(1);
        surface.resize(width, height);

        let policy = AnimationPolicy::evaluate(&probe, options.mobile_breakpoint);
        let listeners = vec![
            probe.subscribe(ListenerKind::Resize),
            probe.subscribe(ListenerKind::PointerMove),
            probe.subscribe(ListenerKind::VisibilityChange),
        ];

        let (pending, phase) = if probe.is_page_visible() {
            (Some(scheduler.request_frame()), LoopPhase::Running)
        } else {
            (None, LoopPhase::Suspended)
        };

        debug!(
            width,
            height,
            static_only = policy.reduced_motion_or_mobile(),
            ?phase,
            "mounted live background"
        );

        Self {
            mounted: Some(Mounted {
                surface,
                state: RenderState {
                    time: 0,
                    pointer: Point::new(width as f64 / 2.0, height as f64 / 2.0),
                    pending,
                },
                policy,
                throttle: FrameThrottle::new(options.frame_interval),
                stars: options.stars,
                waves: WAVES,
                listeners,
                phase,
                stats: FrameStats::default(),
            }),
            probe,
            scheduler,
        }
    }

    /// True when mounted without a surface.
    pub fn is_inert(&self) -> bool {
        self.mounted.is_none()
    }

    /// `None` for an inert background.
    pub fn phase(&self) -> Option<LoopPhase> {
        self.mounted.as_ref().map(|m| m.phase)
    }

    /// Policy fixed at mount.
    pub fn policy(&self) -> Option<AnimationPolicy> {
        self.mounted.as_ref().map(|m| m.policy)
    }

    pub fn state(&self) -> Option<&RenderState> {
        self.mounted.as_ref().map(|m| &m.state)
    }

    pub fn stats(&self) -> FrameStats {
        self.mounted.as_ref().map(|m| m.stats).unwrap_or_default()
    }

    /// The owned surface, also after teardown.
    pub fn surface(&self) -> Option<&S> {
        self.mounted.as_ref().map(|m| &m.surface)
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Hosts update the probe before forwarding the matching event.
    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    /// Hosts drain due callbacks through this.
    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    /// Resizes the surface; the next paint reads the new dimensions.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let Some(mounted) = self.live_mut() else {
            return;
        };
        mounted.surface.resize(width.max(1), height.max(1));
        trace!(width, height, "surface resized");
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        if let Some(mounted) = self.live_mut() {
            mounted.state.pointer = Point::new(x, y);
        }
    }

    /// Suspends the loop while hidden and resumes it when visible again.
    /// The tick is left untouched, so animation continues where it stopped.
    pub fn on_visibility_change(&mut self, visible: bool) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        match (visible, mounted.phase) {
            (false, LoopPhase::Running) => {
                if let Some(handle) = mounted.state.pending.take() {
                    self.scheduler.cancel_frame(handle);
                }
                mounted.phase = LoopPhase::Suspended;
                debug!(tick = mounted.state.time, "page hidden; render loop suspended");
            }
            (true, LoopPhase::Suspended) => {
                if mounted.state.pending.is_none() {
                    mounted.state.pending = Some(self.scheduler.request_frame());
                }
                mounted.phase = LoopPhase::Running;
                debug!(tick = mounted.state.time, "page visible; render loop resumed");
            }
            _ => {}
        }
    }

    /// Runs one frame callback fired at `now_ms` (host clock, milliseconds).
    pub fn on_frame(&mut self, handle: FrameHandle, now_ms: f64) -> FrameOutcome {
        let Some(mounted) = self.mounted.as_mut() else {
            return FrameOutcome::Ignored;
        };
        if mounted.state.pending != Some(handle) {
            trace!(handle = handle.id(), "ignoring stale frame callback");
            return FrameOutcome::Ignored;
        }
        mounted.state.pending = None;

        if !mounted.throttle.accept(now_ms) {
            mounted.state.pending = Some(self.scheduler.request_frame());
            mounted.stats.throttled += 1;
            return FrameOutcome::Throttled;
        }

        if mounted.policy.reduced_motion_or_mobile() {
            scene::paint_backdrop(&mut mounted.surface);
            mounted.surface.present();
            mounted.phase = LoopPhase::Static;
            mounted.stats.static_paints += 1;
            debug!("static backdrop painted; render loop finished");
            return FrameOutcome::StaticPainted;
        }

        let tick = mounted.state.time;
        scene::paint_backdrop(&mut mounted.surface);
        scene::paint_stars(
            &mut mounted.surface,
            mounted.policy.star_count(&mounted.stars),
            tick,
        );
        scene::paint_waves(&mut mounted.surface, &mounted.waves, tick, mounted.state.pointer);
        mounted.surface.present();
        mounted.state.time += 1;
        mounted.stats.painted += 1;
        mounted.state.pending = Some(self.scheduler.request_frame());
        trace!(tick, now_ms, "frame painted");
        FrameOutcome::Painted { tick }
    }

    /// Cancels the pending frame and drops every listener. Safe to repeat.
    pub fn teardown(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        if mounted.phase == LoopPhase::TornDown {
            return;
        }
        if let Some(handle) = mounted.state.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        for id in mounted.listeners.drain(..) {
            self.probe.unsubscribe(id);
        }
        mounted.phase = LoopPhase::TornDown;
        debug!(tick = mounted.state.time, "live background torn down");
    }

    fn live_mut(&mut self) -> Option<&mut Mounted<S>> {
        self.mounted
            .as_mut()
            .filter(|m| m.phase != LoopPhase::TornDown)
    }
}

impl<S, P, F> Drop for LiveBackground<S, P, F>
where
    S: Surface,
    P: EnvironmentProbe,
    F: FrameScheduler,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
