use super::{Color, Renderer, Surface2d};
use crate::constants::SPECTROGRAM_CAPACITY;
use crate::error::RenderError;
use crate::scheduler::FrameInput;
use std::collections::VecDeque;

const BACKGROUND: Color = Color::hsl(220.0, 25.0, 8.0);
const SKIP_BELOW: u8 = 2;

/// Scrolling time/frequency heat map over a bounded history.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    history: VecDeque<Vec<u8>>,
    capacity: usize,
    /// Older columns are drawn more transparent.
    pub recency_fade: bool,
}

impl Spectrogram {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            recency_fade: true,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &[u8]> {
        self.history.iter().map(|v| v.as_slice())
    }

    /// Appends a copy of `bins`, evicting the oldest column when full.
    pub fn push(&mut self, bins: &[u8]) {
        let mut column = if self.history.len() >= self.capacity {
            self.history.pop_front().unwrap_or_default()
        } else {
            Vec::with_capacity(bins.len())
        };
        column.clear();
        column.extend_from_slice(bins);
        self.history.push_back(column);
    }
}

impl Default for Spectrogram {
    fn default() -> Self {
        Self::new(SPECTROGRAM_CAPACITY)
    }
}

impl<S: Surface2d + ?Sized> Renderer<S> for Spectrogram {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError> {
        self.push(&frame.snapshot.frequency_bins);
        let size = surface.size();
        surface.fill_rect(0.0, 0.0, size.x, size.y, BACKGROUND);

        let col_w = size.x / self.capacity as f32;
        let len = self.history.len();
        for (i, column) in self.history.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let row_h = size.y / column.len() as f32;
            let fade = if self.recency_fade {
                0.35 + 0.65 * (i + 1) as f32 / len as f32
            } else {
                1.0
            };
            let x = i as f32 * col_w;
            for (j, &v) in column.iter().enumerate() {
                if v < SKIP_BELOW {
                    continue;
                }
                let level = v as f32 / 255.0;
                let color = Color::hsla(180.0 + 40.0 * level, 100.0, 20.0 + 60.0 * level, fade);
                surface.fill_rect(x, size.y - (j + 1) as f32 * row_h, col_w, row_h, color);
            }
        }
        Ok(())
    }
}
