use super::{Color, Renderer, Surface2d};
use crate::error::RenderError;
use crate::scheduler::FrameInput;
use glam::Vec2;

const BACKGROUND: Color = Color::hsl(220.0, 25.0, 8.0);
const LINE: Color = Color::hsl(180.0, 100.0, 50.0);
const LINE_WIDTH: f32 = 2.0;

/// Oscilloscope line across the full width.
#[derive(Clone, Debug, Default)]
pub struct WaveformTrace {
    points: Vec<Vec2>,
    /// Extra stroke width per unit of RMS.
    pub rms_weight: f32,
}

impl WaveformTrace {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            rms_weight: 2.0,
        }
    }

    /// Polyline for `samples`, closed at the vertical center of the right edge.
    pub fn trace(&mut self, samples: &[u8], width: f32, height: f32) -> &[Vec2] {
        self.points.clear();
        let slice = if samples.is_empty() {
            0.0
        } else {
            width / samples.len() as f32
        };
        for (i, &v) in samples.iter().enumerate() {
            let y = v as f32 / 128.0 * height / 2.0;
            self.points.push(Vec2::new(i as f32 * slice, y));
        }
        self.points.push(Vec2::new(width, height / 2.0));
        &self.points
    }
}

impl<S: Surface2d + ?Sized> Renderer<S> for WaveformTrace {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError> {
        let size = surface.size();
        surface.fill_rect(0.0, 0.0, size.x, size.y, BACKGROUND);
        let width = LINE_WIDTH + frame.features.rms.clamp(0.0, 1.0) * self.rms_weight;
        let points = self.trace(&frame.snapshot.time_samples, size.x, size.y);
        surface.stroke_polyline(points, width, LINE);
        Ok(())
    }
}
