use super::{Color, Renderer, Surface2d};
use crate::constants::{NEEDLE_ON_RECORD_ABOVE, RECORD_MARGIN_PX, RECORD_SPIN_DEG_PER_SEC};
use crate::error::RenderError;
use crate::scheduler::FrameInput;
use glam::Vec2;

const GROOVES: usize = 50;
const BACKGROUND: Color = Color::rgba(17, 24, 39, 1.0);
const TEAL: Color = Color::hsl(174.0, 72.0, 40.0);
const GLOW: Color = Color::hsla(174.0, 80.0, 55.0, 0.6);

/// What the deck shows: where the needle is, how far the record has been
/// turned by hand, and whether the patch is playing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeckVisual {
    pub needle_angle: f32,
    pub rotation_deg: f32,
    pub playing: bool,
}

impl Default for DeckVisual {
    fn default() -> Self {
        Self {
            needle_angle: crate::constants::NEEDLE_ANGLE_MIN,
            rotation_deg: 0.0,
            playing: false,
        }
    }
}

/// Turntable drawing: record body, grooves, label, play glow and tonearm.
#[derive(Clone, Debug, Default)]
pub struct DeckView {
    visual: DeckVisual,
    spin_deg: f32,
}

impl DeckView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visual(&mut self, visual: DeckVisual) {
        self.visual = visual;
    }

    pub fn visual(&self) -> DeckVisual {
        self.visual
    }

    /// Hand rotation plus the steady spin accumulated while playing.
    pub fn angle_deg(&self) -> f32 {
        self.visual.rotation_deg + self.spin_deg
    }

    pub fn draw<S: Surface2d + ?Sized>(&mut self, dt_sec: f32, surface: &mut S) {
        if self.visual.playing {
            self.spin_deg = (self.spin_deg + RECORD_SPIN_DEG_PER_SEC * dt_sec) % 360.0;
        }
        let size = surface.size();
        let center = size / 2.0;
        let r = (center.x.min(center.y) - RECORD_MARGIN_PX).max(0.0);

        surface.fill_rect(0.0, 0.0, size.x, size.y, BACKGROUND);

        if self.visual.playing {
            surface.set_glow(24.0, GLOW);
            surface.stroke_circle(center, r, 3.0, GLOW);
            surface.set_glow(0.0, GLOW);
        }

        surface.push_rotation(center, self.angle_deg().to_radians());
        surface.fill_circle_gradient(
            center,
            r,
            &[
                (0.0, Color::hsl(0.0, 0.0, 16.0)),
                (0.7, Color::hsl(0.0, 0.0, 9.0)),
                (1.0, Color::hsl(0.0, 0.0, 4.0)),
            ],
        );
        let (inner, outer) = (r * 0.3, r);
        for g in 0..GROOVES {
            let radius = inner + (outer - inner) * g as f32 / GROOVES as f32;
            let alpha = if g % 2 == 0 { 0.06 } else { 0.03 };
            surface.stroke_circle(center, radius, 0.5, Color::rgba(255, 255, 255, alpha));
        }
        surface.fill_circle(center, r * 0.3, TEAL);
        // Label marker makes the rotation visible.
        surface.stroke_line(
            center + Vec2::new(0.0, -r * 0.12),
            center + Vec2::new(0.0, -r * 0.27),
            2.0,
            Color::hsla(0.0, 0.0, 100.0, 0.6),
        );
        surface.fill_circle(center, r * 0.1, BACKGROUND);
        surface.pop_transform();

        self.draw_tonearm(size, surface);
    }

    fn draw_tonearm<S: Surface2d + ?Sized>(&self, size: Vec2, surface: &mut S) {
        let pivot = Vec2::new(size.x * 0.85, size.y * 0.15);
        let length = size.y * 0.45;
        // Rest position swings slightly outward; larger angles move over the record.
        let theta = (self.visual.needle_angle + 15.0).to_radians();
        let tip = pivot + Vec2::new(-theta.sin(), theta.cos()) * length;
        let on_record = self.visual.needle_angle > NEEDLE_ON_RECORD_ABOVE;

        surface.stroke_line(pivot, tip, 6.0, Color::hsl(220.0, 10.0, 70.0));
        surface.fill_circle(pivot, 14.0, Color::hsl(220.0, 10.0, 40.0));
        let head = if on_record {
            Color::hsl(174.0, 80.0, 55.0)
        } else {
            Color::hsl(0.0, 0.0, 60.0)
        };
        surface.fill_circle(tip, 6.0, head);
    }
}

impl<S: Surface2d + ?Sized> Renderer<S> for DeckView {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError> {
        self.draw(frame.dt_sec, surface);
        Ok(())
    }
}
