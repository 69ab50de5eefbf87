//! Audio-reactive renderers and the drawing surfaces they target.

mod deck;
mod field;
mod particles;
mod recorder;
mod spectrogram;
mod spectrum;
mod waveform;

pub use deck::{DeckView, DeckVisual};
pub use field::{FieldSurface, FieldUniforms, ShaderField};
pub use particles::{for_each_link, step_particles, ParticleField, ParticleState};
pub use recorder::{DrawOp, Recorder};
pub use spectrogram::Spectrogram;
pub use spectrum::{Bar, SpectrumBars};
pub use waveform::WaveformTrace;

use crate::error::RenderError;
use crate::scheduler::{FrameInput, FrameSink};
use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Color {
    Rgba { r: u8, g: u8, b: u8, a: f32 },
    /// Hue in degrees, saturation and lightness in percent.
    Hsla { h: f32, s: f32, l: f32, a: f32 },
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Color::Rgba { r, g, b, a }
    }

    pub const fn hsl(h: f32, s: f32, l: f32) -> Self {
        Color::Hsla { h, s, l, a: 1.0 }
    }

    pub const fn hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        Color::Hsla { h, s, l, a }
    }

    pub fn alpha(&self) -> f32 {
        match *self {
            Color::Rgba { a, .. } | Color::Hsla { a, .. } => a,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        match self {
            Color::Rgba { r, g, b, .. } => Color::Rgba { r, g, b, a: alpha },
            Color::Hsla { h, s, l, .. } => Color::Hsla { h, s, l, a: alpha },
        }
    }

    /// CSS color string for canvas APIs.
    pub fn to_css(&self) -> String {
        match *self {
            Color::Rgba { r, g, b, a } => format!("rgba({}, {}, {}, {:.3})", r, g, b, a),
            Color::Hsla { h, s, l, a } => format!("hsla({:.1}, {:.1}%, {:.1}%, {:.3})", h, s, l, a),
        }
    }
}

/// Immediate-mode 2D drawing target, shaped after the canvas 2D context.
pub trait Surface2d {
    fn size(&self) -> Vec2;
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    /// Rectangle filled with a vertical gradient from `top` to `bottom`.
    fn fill_rect_gradient(&mut self, x: f32, y: f32, w: f32, h: f32, top: Color, bottom: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    /// Disc filled with a radial gradient; stop offsets run 0..=1 from the center.
    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, stops: &[(f32, Color)]);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);
    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: Color);
    /// Shadow blur applied to following draws; zero turns it off.
    fn set_glow(&mut self, blur: f32, color: Color);
    fn push_rotation(&mut self, center: Vec2, radians: f32);
    fn pop_transform(&mut self);
}

/// A visualization drawing into a surface of type `S`.
pub trait Renderer<S: ?Sized> {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError>;
}

/// A renderer paired with the surface it owns; the unit the scheduler drives.
pub struct Layer<R, S> {
    name: &'static str,
    renderer: R,
    surface: S,
}

impl<R, S> Layer<R, S> {
    pub fn new(name: &'static str, renderer: R, surface: S) -> Self {
        Self {
            name,
            renderer,
            surface,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<R: Renderer<S>, S> FrameSink for Layer<R, S> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError> {
        self.renderer.render(frame, &mut self.surface)
    }
}
