use super::{Color, FieldSurface, FieldUniforms, Surface2d};
use crate::error::RenderError;
use glam::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Color },
    FillRectGradient { x: f32, y: f32, w: f32, h: f32, top: Color, bottom: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    FillCircleGradient { center: Vec2, radius: f32, stops: Vec<(f32, Color)> },
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: Color },
    StrokeLine { from: Vec2, to: Vec2, width: f32, color: Color },
    StrokePolyline { points: Vec<Vec2>, width: f32, color: Color },
    Glow { blur: f32, color: Color },
    PushRotation { center: Vec2, radians: f32 },
    PopTransform,
    Field(FieldUniforms),
}

/// Headless surface that records every draw call.
#[derive(Clone, Debug)]
pub struct Recorder {
    size: Vec2,
    ops: Vec<DrawOp>,
    fail_next: Option<RenderError>,
}

impl Recorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ops: Vec::new(),
            fail_next: None,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    /// Makes the next field draw fail with `error`.
    pub fn fail_next_field(&mut self, error: RenderError) {
        self.fail_next = Some(error);
    }
}

impl Surface2d for Recorder {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.ops.push(DrawOp::FillRect { x, y, w, h, color });
    }

    fn fill_rect_gradient(&mut self, x: f32, y: f32, w: f32, h: f32, top: Color, bottom: Color) {
        self.ops.push(DrawOp::FillRectGradient { x, y, w, h, top, bottom });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ops.push(DrawOp::FillCircle { center, radius, color });
    }

    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, stops: &[(f32, Color)]) {
        self.ops.push(DrawOp::FillCircleGradient {
            center,
            radius,
            stops: stops.to_vec(),
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        self.ops.push(DrawOp::StrokeCircle {
            center,
            radius,
            width,
            color,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.ops.push(DrawOp::StrokeLine { from, to, width, color });
    }

    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: Color) {
        self.ops.push(DrawOp::StrokePolyline {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn set_glow(&mut self, blur: f32, color: Color) {
        self.ops.push(DrawOp::Glow { blur, color });
    }

    fn push_rotation(&mut self, center: Vec2, radians: f32) {
        self.ops.push(DrawOp::PushRotation { center, radians });
    }

    fn pop_transform(&mut self) {
        self.ops.push(DrawOp::PopTransform);
    }
}

impl FieldSurface for Recorder {
    fn resolution(&self) -> [f32; 2] {
        self.size.to_array()
    }

    fn draw_field(&mut self, uniforms: &FieldUniforms) -> Result<(), RenderError> {
        if let Some(e) = self.fail_next.take() {
            return Err(e);
        }
        self.ops.push(DrawOp::Field(*uniforms));
        Ok(())
    }
}
