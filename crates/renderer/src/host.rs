use scheduler::{ManualScheduler, RefreshClock};
use tracing::trace;

use crate::background::{FrameOutcome, LiveBackground};
use crate::environment::{ListenerKind, StaticProbe};
use crate::surface::Surface;
use crate::types::BackgroundOptions;

/// Event raised by the host page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resize { width: u32, height: u32 },
    PointerMove { x: f64, y: f64 },
    Visibility { visible: bool },
}

impl HostEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            HostEvent::Resize { .. } => ListenerKind::Resize,
            HostEvent::PointerMove { .. } => ListenerKind::PointerMove,
            HostEvent::Visibility { .. } => ListenerKind::VisibilityChange,
        }
    }
}

pub type HostedBackground<S> = LiveBackground<S, StaticProbe, ManualScheduler>;

/// Applies a host event to the probe, then forwards it to the background if
/// a listener for that kind is still registered.
pub fn dispatch_event<S: Surface>(background: &mut HostedBackground<S>, event: HostEvent) {
    let probe = background.probe_mut();
    match event {
        HostEvent::Resize { width, height } => probe.set_viewport(width, height),
        HostEvent::Visibility { visible } => probe.set_visible(visible),
        HostEvent::PointerMove { .. } => {}
    }
    if !background.probe().is_subscribed(event.kind()) {
        trace!(?event, "no listener registered; event dropped");
        return;
    }
    match event {
        HostEvent::Resize { width, height } => background.on_resize(width, height),
        HostEvent::PointerMove { x, y } => background.on_pointer_move(x, y),
        HostEvent::Visibility { visible } => background.on_visibility_change(visible),
    }
}

/// Fires every due frame callback at `now_ms`.
pub fn fire_due<S: Surface>(background: &mut HostedBackground<S>, now_ms: f64) -> Vec<FrameOutcome> {
    let due = background.scheduler_mut().take_due();
    due.into_iter()
        .map(|handle| background.on_frame(handle, now_ms))
        .collect()
}

/// Single-threaded host driven by a simulated display clock.
///
/// Each [`HeadlessHost::step`] fires the pending frame callbacks at the
/// current vsync timestamp and then advances the clock by one refresh.
pub struct HeadlessHost<S: Surface> {
    background: HostedBackground<S>,
    clock: RefreshClock,
}

impl<S: Surface> HeadlessHost<S> {
    pub fn new(surface: Option<S>, probe: StaticProbe, options: BackgroundOptions, refresh_hz: f32) -> Self {
        Self {
            background: LiveBackground::mount(surface, probe, ManualScheduler::new(), options),
            clock: RefreshClock::new(refresh_hz),
        }
    }

    pub fn background(&self) -> &HostedBackground<S> {
        &self.background
    }

    pub fn background_mut(&mut self) -> &mut HostedBackground<S> {
        &mut self.background
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now()
    }

    pub fn dispatch(&mut self, event: HostEvent) {
        dispatch_event(&mut self.background, event);
    }

    pub fn step(&mut self) -> Vec<FrameOutcome> {
        let outcomes = fire_due(&mut self.background, self.clock.now());
        self.clock.advance();
        outcomes
    }

    /// Lets `duration` of wall time pass without firing callbacks.
    pub fn idle(&mut self, duration: std::time::Duration) {
        self.clock.skip(duration);
    }

    pub fn unmount(&mut self) {
        self.background.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PixelSurface;
    use crate::recording::RecordingSurface;
    use std::time::Duration;

    fn painted(outcomes: &[FrameOutcome]) -> usize {
        outcomes
            .iter()
            .filter(|o| matches!(o, FrameOutcome::Painted { .. }))
            .count()
    }

    #[test]
    fn sixty_hertz_paints_every_other_vsync() {
        let mut host = HeadlessHost::new(
            Some(RecordingSurface::new(1, 1)),
            StaticProbe::new(1024, 768),
            BackgroundOptions::default(),
            60.0,
        );
        let total: usize = (0..60).map(|_| painted(&host.step())).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn events_after_unmount_are_dropped() {
        let mut host = HeadlessHost::new(
            Some(RecordingSurface::new(1, 1)),
            StaticProbe::new(1024, 768),
            BackgroundOptions::default(),
            60.0,
        );
        host.unmount();
        host.dispatch(HostEvent::Visibility { visible: false });
        host.dispatch(HostEvent::Visibility { visible: true });
        assert!(host.step().is_empty());
        assert_eq!(host.background().probe().listener_count(), 0);
    }

    #[test]
    fn hidden_tab_burns_no_frames() {
        let mut host = HeadlessHost::new(
            Some(RecordingSurface::new(1, 1)),
            StaticProbe::new(1024, 768),
            BackgroundOptions::default(),
            60.0,
        );
        host.step();
        host.dispatch(HostEvent::Visibility { visible: false });
        for _ in 0..30 {
            assert!(host.step().is_empty());
        }
        host.idle(Duration::from_secs(5));
        host.dispatch(HostEvent::Visibility { visible: true });
        assert_eq!(host.step(), [FrameOutcome::Painted { tick: 1 }]);
    }

    #[test]
    fn identical_scripts_render_identical_pixels() {
        let render = || {
            let mut host = HeadlessHost::new(
                PixelSurface::new(1, 1).ok(),
                StaticProbe::new(160, 90),
                BackgroundOptions {
                    mobile_breakpoint: 100,
                    ..BackgroundOptions::default()
                },
                60.0,
            );
            host.dispatch(HostEvent::PointerMove { x: 80.0, y: 45.0 });
            for _ in 0..8 {
                host.step();
            }
            host.background()
                .surface()
                .map(|surface| surface.to_image().into_raw())
                .unwrap_or_default()
        };
        let first = render();
        assert!(!first.is_empty());
        assert_eq!(first, render());
    }
}
