use super::Renderer;
use crate::analysis::BandEnergies;
use crate::constants::{BAND_SMOOTHING, FIELD_TIME_STEP, OVERALL_SMOOTHING};
use crate::error::RenderError;
use crate::scheduler::FrameInput;
use bytemuck::{Pod, Zeroable};

/// Uniform block of `field.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FieldUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub energy: f32,
    pub _pad: f32,
}

/// GPU target able to draw the ring-interference field.
pub trait FieldSurface {
    fn resolution(&self) -> [f32; 2];
    fn draw_field(&mut self, uniforms: &FieldUniforms) -> Result<(), RenderError>;
}

/// Second smoothing stage on top of the extractor's bands, plus the shader
/// clock.
#[derive(Clone, Debug)]
pub struct ShaderField {
    uniforms: FieldUniforms,
    band_factor: f32,
    overall_factor: f32,
}

impl ShaderField {
    pub fn new() -> Self {
        Self {
            uniforms: FieldUniforms::default(),
            band_factor: BAND_SMOOTHING,
            overall_factor: OVERALL_SMOOTHING,
        }
    }

    pub fn uniforms(&self) -> &FieldUniforms {
        &self.uniforms
    }

    pub fn advance(&mut self, bands: &BandEnergies, resolution: [f32; 2]) {
        let u = &mut self.uniforms;
        u.resolution = resolution;
        u.time += FIELD_TIME_STEP;
        u.bass += (bands.bass - u.bass) * self.band_factor;
        u.mid += (bands.mid - u.mid) * self.band_factor;
        u.treble += (bands.treble - u.treble) * self.band_factor;
        u.energy += (bands.overall - u.energy) * self.overall_factor;
    }
}

impl Default for ShaderField {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FieldSurface + ?Sized> Renderer<S> for ShaderField {
    fn render(&mut self, frame: &FrameInput<'_>, surface: &mut S) -> Result<(), RenderError> {
        self.advance(&frame.bands, surface.resolution());
        surface.draw_field(&self.uniforms)
    }
}
