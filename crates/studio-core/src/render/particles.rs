use super::{Color, Renderer, Surface2d};
use crate::constants::{PARTICLE_COUNT, PARTICLE_LINK_DISTANCE, PARTICLE_RING_COUNT, PARTICLE_RING_THRESHOLD};
use crate::error::RenderError;
use crate::scheduler::FrameInput;
use glam::Vec2;
use rand::prelude::*;

const TRAIL: Color = Color::rgba(17, 24, 39, 0.1);

/// Particle attributes as parallel arrays.
#[derive(Clone, Debug, Default)]
pub struct ParticleState {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub sizes: Vec<f32>,
    pub hues: Vec<f32>,
    pub alphas: Vec<f32>,
}

impl ParticleState {
    /// Scatters `count` particles over the area with reproducible randomness.
    pub fn seeded(count: usize, width: f32, height: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut s = Self::default();
        for _ in 0..count {
            s.positions
                .push(Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height));
            s.velocities
                .push(Vec2::new(rng.gen::<f32>() * 0.5 - 0.25, rng.gen::<f32>() * 0.5 - 0.25));
            s.sizes.push(rng.gen::<f32>() * 2.0 + 1.0);
            s.hues.push(180.0);
            s.alphas.push(rng.gen::<f32>() * 0.5 + 0.2);
        }
        s
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Moves every particle by its velocity scaled with `1 + energy`, wraps at
/// the edges and recolors from the energy.
pub fn step_particles(state: &mut ParticleState, energy: f32, width: f32, height: f32) {
    let speed = 1.0 + energy;
    let hue = 180.0 + 40.0 * energy;
    let alpha = 0.2 + 0.5 * energy;
    for (p, v) in state.positions.iter_mut().zip(&state.velocities) {
        *p += *v * speed;
        if p.x < 0.0 {
            p.x = width;
        } else if p.x > width {
            p.x = 0.0;
        }
        if p.y < 0.0 {
            p.y = height;
        } else if p.y > height {
            p.y = 0.0;
        }
    }
    state.hues.fill(hue);
    state.alphas.fill(alpha);
}

/// Calls `f(i, j, distance)` once for every unordered pair closer than
/// `threshold`.
pub fn for_each_link(positions: &[Vec2], threshold: f32, mut f: impl FnMut(usize, usize, f32)) {
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let d = positions[i].distance(positions[j]);
            if d < threshold {
                f(i, j, d);
            }
        }
    }
}

pub struct ParticleField {
    state: Option<ParticleState>,
    count: usize,
    seed: u64,
}

impl ParticleField {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            state: None,
            count,
            seed,
        }
    }

    /// Particles are seeded lazily against the first surface size seen.
    pub fn state(&self) -> Option<&ParticleState> {
        self.state.as_ref()
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new(PARTICLE_COUNT, 0x5EED)
    }
}

impl<S: Surface2d + ?Sized> Renderer<S> for ParticleField {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError> {
        let size = surface.size();
        let energy = frame.bands.overall.clamp(0.0, 1.0);
        let (count, seed) = (self.count, self.seed);
        let state = self
            .state
            .get_or_insert_with(|| ParticleState::seeded(count, size.x, size.y, seed));

        surface.fill_rect(0.0, 0.0, size.x, size.y, TRAIL);

        let center = size / 2.0;
        if energy > PARTICLE_RING_THRESHOLD {
            let t = frame.time_sec as f32;
            for k in 0..PARTICLE_RING_COUNT {
                let kf = k as f32;
                let radius = 50.0 + 60.0 * kf + (t + kf).sin() * 20.0 * energy;
                let color = Color::hsla(180.0 + 20.0 * kf, 100.0, 60.0, 0.3 * energy);
                surface.stroke_circle(center, radius, 2.0, color);
            }
        }

        step_particles(state, energy, size.x, size.y);
        surface.set_glow(10.0, Color::hsl(180.0 + 40.0 * energy, 100.0, 60.0));
        for i in 0..state.len() {
            let color = Color::hsla(state.hues[i], 100.0, 60.0, state.alphas[i]);
            surface.fill_circle(state.positions[i], state.sizes[i], color);
        }
        surface.set_glow(0.0, TRAIL);

        if energy > 0.0 {
            for_each_link(&state.positions, PARTICLE_LINK_DISTANCE, |i, j, d| {
                let alpha = (1.0 - d / PARTICLE_LINK_DISTANCE) * 0.2 * energy;
                let color = Color::hsla(180.0, 100.0, 70.0, alpha);
                surface.stroke_line(state.positions[i], state.positions[j], 0.5, color);
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_edges() {
        let mut s = ParticleState::seeded(1, 100.0, 100.0, 1);
        s.positions[0] = Vec2::new(99.9, 0.1);
        s.velocities[0] = Vec2::new(0.25, -0.25);
        step_particles(&mut s, 0.0, 100.0, 100.0);
        assert_eq!(s.positions[0], Vec2::new(0.0, 100.0));
    }

    #[test]
    fn links_each_pair_once() {
        let pts = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(500.0, 0.0)];
        let mut pairs = Vec::new();
        for_each_link(&pts, 100.0, |i, j, _| pairs.push((i, j)));
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }
}
