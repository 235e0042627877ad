//! CPU rasterizer backing the headless and real-time hosts.
//!
//! Draw calls are recorded into a `vello_cpu::RenderContext` and rasterized
//! into a premultiplied [`Pixmap`] when the frame is presented. Readback
//! converts to straight-alpha RGBA8 for PNG export.

use std::fmt;
use std::path::Path as FsPath;

use image::{ImageFormat, RgbaImage};
use vello_cpu::kurbo::{Cap, Join, Shape, Stroke};
use vello_cpu::peniko::{Color, Gradient};
use vello_cpu::{Pixmap, RenderContext};

use crate::surface::{Surface, SurfaceError};
use crate::types::{BezPath, Circle, Paint, Rect, Rgba};

const MAX_DIMENSION: u32 = u16::MAX as u32;
/// Flattening tolerance for circles, in pixels.
const CURVE_TOLERANCE: f64 = 0.05;
/// Canvas default.
const MITER_LIMIT: f64 = 10.0;

/// RGBA8 pixel surface, initially fully transparent.
///
/// Nothing reaches the pixels until [`Surface::present`]; until then reads
/// return the previous frame.
pub struct PixelSurface {
    width: u16,
    height: u16,
    ctx: RenderContext,
    pixmap: Pixmap,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Empty { width, height });
        }
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(SurfaceError::TooLarge {
                width,
                height,
                max: MAX_DIMENSION,
            });
        };
        Ok(Self::with_size(w, h))
    }

    fn with_size(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ctx: RenderContext::new(width, height),
            pixmap: Pixmap::new(width, height),
        }
    }

    /// Straight-alpha pixel at `(x, y)` as of the last present.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let index = (y as usize * usize::from(self.width) + x as usize) * 4;
        let data = self.pixmap.data_as_u8_slice();
        unpremultiply([data[index], data[index + 1], data[index + 2], data[index + 3]])
    }

    /// Straight-alpha copy of the presented pixels.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(u32::from(self.width), u32::from(self.height), |x, y| {
            image::Rgba(self.pixel(x, y))
        })
    }

    pub fn save_png(&self, path: &FsPath) -> Result<(), SurfaceError> {
        self.to_image().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    fn set_paint(&mut self, paint: &Paint) {
        match paint {
            Paint::Solid(rgba) => self.ctx.set_paint(color(*rgba)),
            Paint::Vertical(gradient) => {
                let stops: Vec<(f32, Color)> = gradient
                    .stops
                    .iter()
                    .map(|stop| (stop.offset, color(stop.color)))
                    .collect();
                self.ctx.set_paint(
                    Gradient::new_linear((0.0, gradient.start_y), (0.0, gradient.end_y))
                        .with_stops(stops.as_slice()),
                );
            }
        }
    }

    fn stroke(&mut self, path: &BezPath, rgba: Rgba, line_width: f64) {
        self.ctx.set_stroke(canvas_stroke(line_width));
        self.ctx.set_paint(color(rgba));
        self.ctx.stroke_path(path);
    }
}

impl fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface for PixelSurface {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn resize(&mut self, width: u32, height: u32) {
        let width = width.clamp(1, MAX_DIMENSION) as u16;
        let height = height.clamp(1, MAX_DIMENSION) as u16;
        *self = Self::with_size(width, height);
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.set_paint(paint);
        self.ctx.fill_rect(&rect);
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        self.set_paint(paint);
        self.ctx.fill_path(path);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba, line_width: f64) {
        if line_width <= 0.0 {
            return;
        }
        self.stroke(path, color, line_width);
    }

    fn fill_circle(&mut self, circle: Circle, rgba: Rgba) {
        if circle.radius <= 0.0 {
            return;
        }
        self.ctx.set_paint(color(rgba));
        self.ctx.fill_path(&circle.to_path(CURVE_TOLERANCE));
    }

    fn stroke_circle(&mut self, circle: Circle, color: Rgba, line_width: f64) {
        if line_width <= 0.0 || circle.radius <= 0.0 {
            return;
        }
        self.stroke(&circle.to_path(CURVE_TOLERANCE), color, line_width);
    }

    fn present(&mut self) {
        let mut ctx = std::mem::replace(&mut self.ctx, RenderContext::new(self.width, self.height));
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
    }
}

fn color(rgba: Rgba) -> Color {
    Color::from_rgb8(rgba.r, rgba.g, rgba.b).with_alpha(rgba.a.clamp(0.0, 1.0))
}

fn canvas_stroke(line_width: f64) -> Stroke {
    Stroke::new(line_width)
        .with_join(Join::Miter)
        .with_miter_limit(MITER_LIMIT)
        .with_caps(Cap::Butt)
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0; 4];
    }
    let scale = |c: u8| ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8;
    [scale(r), scale(g), scale(b), a]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorStop, Point, VerticalGradient};

    const RED: Rgba = Rgba::new(255, 0, 0, 1.0);

    fn close_to(actual: [u8; 4], expected: [u8; 4]) -> bool {
        actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (i16::from(*a) - i16::from(e)).abs() <= 2)
    }

    #[test]
    fn rejects_zero_sized_surface() {
        assert!(matches!(
            PixelSurface::new(0, 10),
            Err(SurfaceError::Empty { width: 0, height: 10 })
        ));
    }

    #[test]
    fn rejects_surface_beyond_rasterizer_limit() {
        assert!(matches!(
            PixelSurface::new(70_000, 10),
            Err(SurfaceError::TooLarge { width: 70_000, .. })
        ));
    }

    #[test]
    fn draws_land_on_present() {
        let mut surface = PixelSurface::new(8, 6).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 8.0, 6.0), &Paint::Solid(RED));
        assert_eq!(surface.pixel(3, 3), [0, 0, 0, 0]);
        surface.present();
        assert!(surface.to_image().pixels().all(|px| px.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn gradient_rect_follows_stops() {
        let mut surface = PixelSurface::new(4, 100).unwrap();
        let gradient = VerticalGradient::new(
            0.0,
            100.0,
            vec![
                ColorStop::new(0.0, Rgba::new(0, 0, 0, 1.0)),
                ColorStop::new(1.0, Rgba::new(200, 200, 200, 1.0)),
            ],
        );
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 100.0), &Paint::Vertical(gradient));
        surface.present();
        let top = surface.pixel(0, 0);
        let middle = surface.pixel(0, 50);
        let bottom = surface.pixel(0, 99);
        assert!(top[0] < 5, "top row should be near black: {top:?}");
        assert!((95..=106).contains(&middle[0]), "middle row: {middle:?}");
        assert!(bottom[0] > 195, "bottom row should be near the last stop: {bottom:?}");
        assert_eq!(top[3], 255);
    }

    #[test]
    fn translucent_fill_blends_over_opaque() {
        let mut surface = PixelSurface::new(2, 2).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), &Paint::Solid(RED));
        surface.fill_rect(
            Rect::new(0.0, 0.0, 2.0, 2.0),
            &Paint::Solid(Rgba::new(0, 0, 255, 0.5)),
        );
        surface.present();
        let px = surface.pixel(1, 1);
        assert!(close_to(px, [128, 0, 128, 255]), "blended pixel {px:?}");
    }

    #[test]
    fn triangle_fill_leaves_outside_transparent() {
        let mut surface = PixelSurface::new(20, 20).unwrap();
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((20.0, 0.0));
        path.line_to((0.0, 20.0));
        path.close_path();
        surface.fill_path(&path, &Paint::Solid(RED));
        surface.present();
        assert_eq!(surface.pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(surface.pixel(18, 18)[3], 0);
    }

    #[test]
    fn stroke_marks_only_the_line() {
        let mut surface = PixelSurface::new(20, 10).unwrap();
        let mut path = BezPath::new();
        path.move_to((0.0, 5.0));
        path.line_to((20.0, 5.0));
        surface.stroke_path(&path, RED, 2.0);
        surface.present();
        assert!(surface.pixel(10, 4)[3] > 200);
        assert!(surface.pixel(10, 5)[3] > 200);
        assert_eq!(surface.pixel(10, 0)[3], 0);
        assert_eq!(surface.pixel(10, 9)[3], 0);
    }

    #[test]
    fn stroke_joins_do_not_double_blend() {
        let mut surface = PixelSurface::new(20, 20).unwrap();
        let mut path = BezPath::new();
        path.move_to((2.0, 10.5));
        path.line_to((10.0, 10.5));
        path.line_to((18.0, 10.5));
        surface.stroke_path(&path, Rgba::new(255, 255, 255, 0.5), 3.0);
        surface.present();
        let at_join = i16::from(surface.pixel(10, 10)[3]);
        let mid_segment = i16::from(surface.pixel(6, 10)[3]);
        assert!((at_join - mid_segment).abs() <= 1, "{at_join} vs {mid_segment}");
    }

    #[test]
    fn ring_stroke_leaves_centre_empty() {
        let mut surface = PixelSurface::new(21, 21).unwrap();
        surface.stroke_circle(Circle::new(Point::new(10.5, 10.5), 5.0), RED, 2.0);
        surface.present();
        assert_eq!(surface.pixel(10, 10)[3], 0);
        assert!(surface.pixel(15, 10)[3] > 0);
    }

    #[test]
    fn resize_discards_contents_and_clamps() {
        let mut surface = PixelSurface::new(4, 4).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), &Paint::Solid(RED));
        surface.present();
        surface.resize(0, 3);
        assert_eq!(surface.size(), (1, 3));
        assert_eq!(surface.pixel(0, 0)[3], 0);
    }

    #[test]
    fn unpremultiply_restores_straight_alpha() {
        assert_eq!(unpremultiply([64, 0, 32, 128]), [128, 0, 64, 128]);
        assert_eq!(unpremultiply([9, 9, 9, 0]), [0, 0, 0, 0]);
        assert_eq!(unpremultiply([255, 255, 255, 255]), [255, 255, 255, 255]);
    }

    #[test]
    fn save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut surface = PixelSurface::new(3, 3).unwrap();
        surface.fill_circle(Circle::new(Point::new(1.5, 1.5), 1.0), RED);
        surface.present();
        surface.save_png(&path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.dimensions(), (3, 3));
    }
}
