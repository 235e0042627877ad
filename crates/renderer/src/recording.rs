use crate::surface::Surface;
use crate::types::{BezPath, Circle, Paint, Rect, Rgba};

/// One drawing call captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize { width: u32, height: u32 },
    FillRect { rect: Rect, paint: Paint },
    FillPath { path: BezPath, paint: Paint },
    StrokePath { path: BezPath, color: Rgba, line_width: f64 },
    FillCircle { circle: Circle, color: Rgba },
    StrokeCircle { circle: Circle, color: Rgba, line_width: f64 },
    Present,
}

/// Surface that keeps a log of draw calls instead of pixels.
///
/// Useful wherever the sequence of paints matters more than the rendered
/// image, e.g. asserting that a static frame draws no waves.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Every call so far, oldest first.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn fill_rect_count(&self) -> usize {
        self.count(|cmd| matches!(cmd, DrawCommand::FillRect { .. }))
    }

    /// Filled wave bands.
    pub fn fill_path_count(&self) -> usize {
        self.count(|cmd| matches!(cmd, DrawCommand::FillPath { .. }))
    }

    /// Star cores.
    pub fn fill_circle_count(&self) -> usize {
        self.count(|cmd| matches!(cmd, DrawCommand::FillCircle { .. }))
    }

    pub fn stroke_count(&self) -> usize {
        self.count(|cmd| {
            matches!(
                cmd,
                DrawCommand::StrokePath { .. } | DrawCommand::StrokeCircle { .. }
            )
        })
    }

    /// Completed frames.
    pub fn present_count(&self) -> usize {
        self.count(|cmd| matches!(cmd, DrawCommand::Present))
    }

    fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|cmd| predicate(cmd)).count()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.push(DrawCommand::Resize { width, height });
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            paint: paint.clone(),
        });
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba, line_width: f64) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            color,
            line_width,
        });
    }

    fn fill_circle(&mut self, circle: Circle, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { circle, color });
    }

    fn stroke_circle(&mut self, circle: Circle, color: Rgba, line_width: f64) {
        self.commands.push(DrawCommand::StrokeCircle {
            circle,
            color,
            line_width,
        });
    }

    fn present(&mut self) {
        self.commands.push(DrawCommand::Present);
    }
}
