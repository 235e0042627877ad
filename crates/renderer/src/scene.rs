//! Drawing math for the backdrop, star field, and wave bands.
//!
//! Everything here is a pure function of the surface size, the logical tick,
//! and the pointer position, so two runs fed the same inputs paint the same
//! frames.

use std::f64::consts::FRAC_PI_3;

use crate::surface::Surface;
use crate::types::{BezPath, Circle, ColorStop, Paint, Point, Rect, Rgb, Rgba, VerticalGradient};

pub const POINTER_FALLOFF_RADIUS: f64 = 300.0;
pub const POINTER_LIFT: f64 = 30.0;
pub const BREATHING_AMPLITUDE: f64 = 20.0;
pub const BREATHING_RATE: f64 = 0.01;
/// Horizontal distance between wave samples, in pixels.
pub const WAVE_SAMPLE_STEP: usize = 8;
pub const WAVE_BAND_SPACING: f64 = 30.0;
pub const WAVE_BAND_BASE_OFFSET: f64 = -45.0;
pub const WAVE_OUTLINE_WIDTH: f64 = 1.5;
pub const TWINKLE_RATE: f64 = 0.003;
pub const STAR_RADIUS: f64 = 1.0;
pub const STAR_GLOW_RADIUS: f64 = 2.5;
pub const STAR_GLOW_WIDTH: f64 = 0.5;

const BACKDROP_EDGE: Rgb = Rgb::new(0x0a, 0x0a, 0x1a);
const BACKDROP_CENTER: Rgb = Rgb::new(0x0f, 0x05, 0x20);
const STAR_CORE: Rgb = Rgb::new(255, 255, 255);
const STAR_GLOW: Rgb = Rgb::new(200, 200, 255);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub amplitude: f64,
    pub frequency: f64,
    pub speed: f64,
    pub phase: f64,
    pub color: Rgb,
}

/// The three layered bands, back to front: violet, indigo, blue.
pub const WAVES: [WaveParams; 3] = [
    WaveParams {
        amplitude: 36.0,
        frequency: 0.005,
        speed: 0.004,
        phase: 0.0,
        color: Rgb::new(138, 43, 226),
    },
    WaveParams {
        amplitude: 48.0,
        frequency: 0.0035,
        speed: 0.005,
        phase: FRAC_PI_3,
        color: Rgb::new(75, 0, 130),
    },
    WaveParams {
        amplitude: 42.0,
        frequency: 0.0045,
        speed: 0.0055,
        phase: 2.0 * FRAC_PI_3,
        color: Rgb::new(0, 100, 200),
    },
];

/// Lift applied to a wave sample near the pointer: 30px at the pointer,
/// fading linearly to nothing at 300px and beyond.
pub fn pointer_influence(distance: f64) -> f64 {
    (1.0 - distance / POINTER_FALLOFF_RADIUS).max(0.0) * POINTER_LIFT
}

/// Slow vertical drift shared by every band.
pub fn breathing(time: u64) -> f64 {
    (time as f64 * BREATHING_RATE).sin() * BREATHING_AMPLITUDE
}

/// Resting y coordinate of band `index` on a surface of `height` pixels.
pub fn band_midline(height: f64, index: usize) -> f64 {
    height / 2.0 + index as f64 * WAVE_BAND_SPACING + WAVE_BAND_BASE_OFFSET
}

impl WaveParams {
    pub fn sample_y(&self, x: f64, midline: f64, time: u64, pointer: Point) -> f64 {
        let t = time as f64;
        let influence = pointer_influence(pointer.distance(Point::new(x, midline)));
        midline
            + (x * self.frequency + t * self.speed + self.phase).sin() * self.amplitude
            + breathing(time)
            + influence
    }

    /// Sample points from `x = 0` to `x <= width`, every [`WAVE_SAMPLE_STEP`].
    pub fn samples(&self, index: usize, width: u32, height: u32, time: u64, pointer: Point) -> Vec<Point> {
        let midline = band_midline(height as f64, index);
        (0..=width as usize)
            .step_by(WAVE_SAMPLE_STEP)
            .map(|x| {
                let x = x as f64;
                Point::new(x, self.sample_y(x, midline, time, pointer))
            })
            .collect()
    }

    /// Closed band outline: along the wave, then down and back along the
    /// bottom edge of the surface.
    pub fn band_path(&self, index: usize, width: u32, height: u32, time: u64, pointer: Point) -> BezPath {
        let (w, h) = (width as f64, height as f64);
        let mut path = BezPath::new();
        path.move_to((0.0, band_midline(h, index)));
        for point in self.samples(index, width, height, time, pointer) {
            path.line_to(point);
        }
        path.line_to((w, h));
        path.line_to((0.0, h));
        path.close_path();
        path
    }

    pub fn fill_paint(&self, height: u32) -> Paint {
        Paint::Vertical(VerticalGradient::new(
            0.0,
            height as f64,
            vec![
                ColorStop::new(0.0, self.color.with_alpha(0.1)),
                ColorStop::new(0.5, self.color.with_alpha(0.05)),
                ColorStop::new(1.0, self.color.with_alpha(0.0)),
            ],
        ))
    }

    pub fn outline_color(&self) -> Rgba {
        self.color.with_alpha(0.3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Point,
    pub opacity: f64,
}

/// Twinkling opacity of star `index` at `time`, within `0.08..=0.32`.
pub fn twinkle_opacity(time: u64, index: usize) -> f64 {
    let twinkle = (time as f64 * TWINKLE_RATE + index as f64).sin() * 0.5 + 0.5;
    (twinkle * 0.6 + 0.2) * 0.4
}

/// Star positions depend on the index and surface size only; the tick only
/// drives opacity.
pub fn star_field(count: usize, width: u32, height: u32, time: u64) -> Vec<Star> {
    let width = width.max(1) as usize;
    let band = height as f64 * 0.3;
    (0..count)
        .map(|i| {
            let x = ((i * 73) % width) as f64;
            let y = if band > 0.0 { (i * 97) as f64 % band } else { 0.0 };
            Star {
                position: Point::new(x, y),
                opacity: twinkle_opacity(time, i),
            }
        })
        .collect()
}

pub fn backdrop_paint(height: u32) -> Paint {
    Paint::Vertical(VerticalGradient::new(
        0.0,
        height as f64,
        vec![
            ColorStop::new(0.0, BACKDROP_EDGE.with_alpha(1.0)),
            ColorStop::new(0.5, BACKDROP_CENTER.with_alpha(1.0)),
            ColorStop::new(1.0, BACKDROP_EDGE.with_alpha(1.0)),
        ],
    ))
}

pub fn paint_backdrop<S: Surface + ?Sized>(surface: &mut S) {
    let (width, height) = surface.size();
    surface.fill_rect(
        Rect::new(0.0, 0.0, width as f64, height as f64),
        &backdrop_paint(height),
    );
}

pub fn paint_stars<S: Surface + ?Sized>(surface: &mut S, count: usize, time: u64) {
    let (width, height) = surface.size();
    for star in star_field(count, width, height, time) {
        let opacity = star.opacity as f32;
        surface.fill_circle(
            Circle::new(star.position, STAR_RADIUS),
            STAR_CORE.with_alpha(opacity),
        );
        surface.stroke_circle(
            Circle::new(star.position, STAR_GLOW_RADIUS),
            STAR_GLOW.with_alpha(opacity * 0.5),
            STAR_GLOW_WIDTH,
        );
    }
}

pub fn paint_waves<S: Surface + ?Sized>(surface: &mut S, waves: &[WaveParams], time: u64, pointer: Point) {
    let (width, height) = surface.size();
    for (index, wave) in waves.iter().enumerate() {
        let path = wave.band_path(index, width, height, time, pointer);
        surface.fill_path(&path, &wave.fill_paint(height));
        surface.stroke_path(&path, wave.outline_color(), WAVE_OUTLINE_WIDTH);
    }
}
