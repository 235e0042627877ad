use crate::environment::EnvironmentProbe;
use crate::types::StarCounts;

/// Decision, fixed at mount, between full animation and a single static paint.
///
/// Viewport resizes never re-evaluate the policy: a window widened past the
/// mobile breakpoint stays static until the background is remounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationPolicy {
    reduced_motion_or_mobile: bool,
}

impl AnimationPolicy {
    pub fn from_signals(prefers_reduced_motion: bool, viewport_width: u32, breakpoint: u32) -> Self {
        Self {
            reduced_motion_or_mobile: prefers_reduced_motion || viewport_width < breakpoint,
        }
    }

    pub fn evaluate<P: EnvironmentProbe + ?Sized>(probe: &P, breakpoint: u32) -> Self {
        Self::from_signals(probe.is_reduced_motion(), probe.viewport_width(), breakpoint)
    }

    pub fn reduced_motion_or_mobile(&self) -> bool {
        self.reduced_motion_or_mobile
    }

    pub fn animates(&self) -> bool {
        !self.reduced_motion_or_mobile
    }

    pub fn star_count(&self, counts: &StarCounts) -> usize {
        if self.reduced_motion_or_mobile {
            counts.reduced
        } else {
            counts.animated
        }
    }
}
