use crate::types::{BezPath, Circle, Paint, Rect, Rgba};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface dimensions must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("surface dimensions {width}x{height} exceed the {max}px rasterizer limit")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("failed to encode surface: {0}")]
    Encode(#[from] image::ImageError),
}

/// 2D drawing target the background paints into.
///
/// The operation set mirrors what a browser canvas context offers the
/// background: gradient rectangles, filled and stroked paths, and small
/// circles. Every call composites with source-over blending. Draw calls may
/// be deferred until [`Surface::present`] closes the frame.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Changes the pixel dimensions. Like a canvas, resizing discards the
    /// current contents.
    fn resize(&mut self, width: u32, height: u32);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint);

    fn fill_path(&mut self, path: &BezPath, paint: &Paint);

    /// Strokes with butt caps and miter joins, as a canvas does by default.
    fn stroke_path(&mut self, path: &BezPath, color: Rgba, line_width: f64);

    fn fill_circle(&mut self, circle: Circle, color: Rgba);

    fn stroke_circle(&mut self, circle: Circle, color: Rgba, line_width: f64);

    /// Ends a frame; pending draw calls become visible in the pixels.
    fn present(&mut self) {}
}

impl<T: Surface + ?Sized> Surface for Box<T> {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        (**self).resize(width, height)
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        (**self).fill_rect(rect, paint)
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        (**self).fill_path(path, paint)
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba, line_width: f64) {
        (**self).stroke_path(path, color, line_width)
    }

    fn fill_circle(&mut self, circle: Circle, color: Rgba) {
        (**self).fill_circle(circle, color)
    }

    fn stroke_circle(&mut self, circle: Circle, color: Rgba, line_width: f64) {
        (**self).stroke_circle(circle, color, line_width)
    }

    fn present(&mut self) {
        (**self).present()
    }
}
