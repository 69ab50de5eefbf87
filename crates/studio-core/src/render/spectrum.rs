use super::{Color, Renderer, Surface2d};
use crate::constants::{SPECTRUM_BARS, SPECTRUM_GLOW_THRESHOLD};
use crate::error::RenderError;
use crate::scheduler::FrameInput;

const BAR_GAP: f32 = 3.0;
const HEIGHT_SCALE: f32 = 0.9;
const HUE_START: f32 = 168.0; // teal
const HUE_SWEEP: f32 = 162.0; // ...to pink
const TRAIL: Color = Color::rgba(0, 0, 0, 0.15);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub value: u8,
    pub hue: f32,
    pub lightness: f32,
    pub glow: bool,
}

/// Frequency bars over a fading trail.
#[derive(Clone, Debug)]
pub struct SpectrumBars {
    bar_count: usize,
    bars: Vec<Bar>,
}

impl SpectrumBars {
    pub fn new(bar_count: usize) -> Self {
        Self {
            bar_count: bar_count.max(1),
            bars: Vec::with_capacity(bar_count),
        }
    }

    /// Bars sampled at a stride of `bins / bar_count`.
    pub fn layout(&mut self, bins: &[u8], width: f32, height: f32) -> &[Bar] {
        self.bars.clear();
        if bins.is_empty() {
            return &self.bars;
        }
        let count = self.bar_count;
        let bar_width = ((width - BAR_GAP * (count - 1) as f32) / count as f32).max(1.0);
        let step = (bins.len() / count).max(1);
        for i in 0..count {
            let value = bins.get(i * step).copied().unwrap_or(0);
            let level = value as f32 / 255.0;
            self.bars.push(Bar {
                x: i as f32 * (bar_width + BAR_GAP),
                width: bar_width,
                height: level * height * HEIGHT_SCALE,
                value,
                hue: HUE_START + i as f32 / count as f32 * HUE_SWEEP,
                lightness: 50.0 + level * 15.0,
                glow: value > SPECTRUM_GLOW_THRESHOLD,
            });
        }
        &self.bars
    }
}

impl Default for SpectrumBars {
    fn default() -> Self {
        Self::new(SPECTRUM_BARS)
    }
}

impl<S: Surface2d + ?Sized> Renderer<S> for SpectrumBars {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError> {
        let size = surface.size();
        surface.fill_rect(0.0, 0.0, size.x, size.y, TRAIL);
        let bars = self.layout(&frame.snapshot.frequency_bins, size.x, size.y);
        for bar in bars {
            if bar.height <= 0.0 {
                continue;
            }
            let y = size.y - bar.height;
            let top = Color::hsl(bar.hue, 85.0, bar.lightness);
            let bottom = Color::hsla(bar.hue, 85.0, bar.lightness - 20.0, 0.6);
            surface.fill_rect_gradient(bar.x, y, bar.width, bar.height, top, bottom);
            if bar.glow {
                surface.set_glow(12.0, top);
                surface.fill_rect(bar.x, y, bar.width, 2.0, Color::hsl(bar.hue, 90.0, 75.0));
                surface.set_glow(0.0, top);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_uses_stride_and_sweeps_hue() {
        let mut bins = vec![0u8; 1024];
        bins[16] = 255;
        let mut s = SpectrumBars::default();
        let bars = s.layout(&bins, 800.0, 140.0);
        assert_eq!(bars.len(), 64);
        assert_eq!(bars[1].value, 255);
        assert!(bars[1].glow);
        assert!((bars[1].height - 126.0).abs() < 1e-3);
        assert_eq!(bars[0].hue, 168.0);
        assert!(bars[63].hue < 330.0 && bars[63].hue > 320.0);
        let right = bars[63].x + bars[63].width;
        assert!((right - 800.0).abs() < 1e-2);
    }
}
