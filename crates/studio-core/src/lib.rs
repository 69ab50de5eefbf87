//! Core of Vinyl Studio: a fixed synthesis patch driven by a turntable gesture
//! controller, a feature extractor sampling the patch output, and the
//! audio-reactive renderers fed by a single per-frame scheduler.
//!
//! Nothing here touches a platform API. The web front-end implements
//! [`AudioBackend`], [`AnalysisTap`], [`Surface2d`] and [`FieldSurface`] on top
//! of WebAudio, canvas and WebGPU; [`OfflineContext`] and [`Recorder`] are the
//! headless counterparts.

pub mod analysis;
pub mod audio;
pub mod constants;
pub mod editor;
pub mod error;
pub mod interaction;
pub mod render;
pub mod scheduler;
pub mod studio;

pub use analysis::*;
pub use audio::*;
pub use editor::*;
pub use error::*;
pub use interaction::*;
pub use render::*;
pub use scheduler::*;
pub use studio::*;

// Shaders bundled as string constants
pub static FIELD_WGSL: &str = include_str!("../shaders/field.wgsl");
