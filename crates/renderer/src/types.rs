use std::time::Duration;

use bgconfig::BackgroundConfig;

pub use vello_cpu::kurbo::{BezPath, Circle, PathEl, Point, Rect};

/// Opaque 8-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha,
        }
    }
}

/// Straight (non-premultiplied) colour with a floating point alpha in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient, `0.0` at the start line.
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Gradient running top to bottom between two y coordinates. Outside the
/// span the end colours extend.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalGradient {
    pub start_y: f64,
    pub end_y: f64,
    pub stops: Vec<ColorStop>,
}

impl VerticalGradient {
    pub fn new(start_y: f64, end_y: f64, stops: Vec<ColorStop>) -> Self {
        Self {
            start_y,
            end_y,
            stops,
        }
    }
}

/// Fill style handed to a [`crate::Surface`].
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Vertical(VerticalGradient),
}

/// Star counts for the two policy branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarCounts {
    pub animated: usize,
    pub reduced: usize,
}

impl Default for StarCounts {
    fn default() -> Self {
        Self {
            animated: bgconfig::DEFAULT_ANIMATED_STARS,
            reduced: bgconfig::DEFAULT_REDUCED_STARS,
        }
    }
}

/// Tunables handed to [`crate::LiveBackground::mount`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundOptions {
    /// Minimum time between painted frames.
    pub frame_interval: Duration,
    /// Viewports narrower than this render the static backdrop only.
    pub mobile_breakpoint: u32,
    pub stars: StarCounts,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            frame_interval: bgconfig::DEFAULT_FRAME_INTERVAL,
            mobile_breakpoint: bgconfig::DEFAULT_MOBILE_BREAKPOINT,
            stars: StarCounts::default(),
        }
    }
}

impl From<&BackgroundConfig> for BackgroundOptions {
    fn from(config: &BackgroundConfig) -> Self {
        Self {
            frame_interval: config.pacing.frame_interval,
            mobile_breakpoint: config.policy.mobile_breakpoint,
            stars: StarCounts {
                animated: config.stars.animated,
                reduced: config.stars.reduced,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let mut config = BackgroundConfig::default();
        config.policy.mobile_breakpoint = 500;
        config.stars.animated = 12;
        let options = BackgroundOptions::from(&config);
        assert_eq!(options.mobile_breakpoint, 500);
        assert_eq!(options.stars.animated, 12);
        assert_eq!(options.frame_interval, Duration::from_millis(33));
    }
}
