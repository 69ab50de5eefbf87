mod analyser;
mod backend;
mod graph;
mod music;
mod offline;
mod param;

pub use analyser::Analyser;
pub use backend::{AudioBackend, Cue, NodeId, ParamKind, ParamRef, TimerId};
pub use graph::{PatchConfig, SynthesisGraph, VoiceSet};
pub use music::*;
pub use offline::{OfflineContext, OfflineTap, RENDER_QUANTUM};
pub use param::ParamTimeline;
