use glam::Vec2;
use studio_core::{Color, Surface2d};
use wasm_bindgen::JsCast;
use web_sys as web;

/// [`Surface2d`] over a canvas 2D context. Drawing errors from the context
/// are dropped; a bad frame is simply redrawn next tick.
pub struct CanvasSurface {
    ctx: web::CanvasRenderingContext2d,
    canvas: web::HtmlCanvasElement,
}

impl CanvasSurface {
    /// Sizes the canvas backing store to `width`×`height` and grabs its 2D context.
    pub fn new(canvas: web::HtmlCanvasElement, width: u32, height: u32) -> anyhow::Result<Self> {
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .ok_or_else(|| anyhow::anyhow!("canvas has no 2d context"))?
            .dyn_into::<web::CanvasRenderingContext2d>()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self { ctx, canvas })
    }

    pub fn canvas(&self) -> &web::HtmlCanvasElement {
        &self.canvas
    }

    fn circle_path(&self, center: Vec2, radius: f32) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            0.0,
            std::f64::consts::TAU,
        );
    }
}

impl Surface2d for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn fill_rect_gradient(&mut self, x: f32, y: f32, w: f32, h: f32, top: Color, bottom: Color) {
        let grad = self
            .ctx
            .create_linear_gradient(x as f64, y as f64, x as f64, (y + h) as f64);
        let _ = grad.add_color_stop(0.0, &top.to_css());
        let _ = grad.add_color_stop(1.0, &bottom.to_css());
        self.ctx.set_fill_style_canvas_gradient(&grad);
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.circle_path(center, radius);
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, stops: &[(f32, Color)]) {
        let (cx, cy) = (center.x as f64, center.y as f64);
        let Ok(grad) = self.ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, radius.max(0.0) as f64) else {
            return;
        };
        for (offset, color) in stops {
            let _ = grad.add_color_stop(offset.clamp(0.0, 1.0), &color.to_css());
        }
        self.circle_path(center, radius);
        self.ctx.set_fill_style_canvas_gradient(&grad);
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        self.circle_path(center, radius);
        self.ctx.set_line_width(width as f64);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.stroke();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.set_line_width(width as f64);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.stroke();
    }

    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: Color) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.set_line_width(width as f64);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.stroke();
    }

    fn set_glow(&mut self, blur: f32, color: Color) {
        self.ctx.set_shadow_blur(blur as f64);
        if blur > 0.0 {
            self.ctx.set_shadow_color(&color.to_css());
        } else {
            self.ctx.set_shadow_color("transparent");
        }
    }

    fn push_rotation(&mut self, center: Vec2, radians: f32) {
        self.ctx.save();
        let (cx, cy) = (center.x as f64, center.y as f64);
        let _ = self.ctx.translate(cx, cy);
        let _ = self.ctx.rotate(radians as f64);
        let _ = self.ctx.translate(-cx, -cy);
    }

    fn pop_transform(&mut self) {
        self.ctx.restore();
    }
}
