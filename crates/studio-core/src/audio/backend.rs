use crate::audio::{Arpeggiator, Waveform};
use crate::error::AudioError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Frequency,
    Gain,
    DelayTime,
}

/// An automatable parameter of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamRef {
    pub node: NodeId,
    pub kind: ParamKind,
}

impl ParamRef {
    pub fn frequency(node: NodeId) -> Self {
        Self {
            node,
            kind: ParamKind::Frequency,
        }
    }

    pub fn gain(node: NodeId) -> Self {
        Self {
            node,
            kind: ParamKind::Gain,
        }
    }

    pub fn delay_time(node: NodeId) -> Self {
        Self {
            node,
            kind: ParamKind::DelayTime,
        }
    }
}

/// One-shot sounds played outside the synthesis graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    EasterEgg,
}

/// A WebAudio-shaped node graph: sources, gains and delays connected to each
/// other, to parameters, or to the backend's output (which feeds the analysis
/// tap and the speakers).
///
/// Node creation and wiring fail with [`AudioError`]; parameter automation is
/// best-effort and never fails.
pub trait AudioBackend {
    fn current_time(&self) -> f64;

    /// Make sure the context is running. Fails with `Unavailable` when the
    /// audio subsystem cannot be used.
    fn resume(&mut self) -> Result<(), AudioError>;

    fn create_oscillator(&mut self, waveform: Waveform, frequency_hz: f32) -> Result<NodeId, AudioError>;
    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError>;
    fn create_delay(&mut self, delay_sec: f32, max_delay_sec: f32) -> Result<NodeId, AudioError>;

    /// Node feeding the analysis tap and the destination.
    fn output(&self) -> NodeId;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError>;
    fn connect_param(&mut self, from: NodeId, to: ParamRef) -> Result<(), AudioError>;

    fn start_at(&mut self, source: NodeId, when: f64) -> Result<(), AudioError>;
    /// Fails with `InvalidState` when the source already stopped.
    fn stop_at(&mut self, source: NodeId, when: f64) -> Result<(), AudioError>;

    /// Disconnect and forget the given nodes.
    fn release(&mut self, nodes: &[NodeId]);

    fn param_value(&self, param: ParamRef) -> f32;
    fn set_param_at(&mut self, param: ParamRef, value: f32, when: f64);
    fn ramp_param_to(&mut self, param: ParamRef, value: f32, end_time: f64);
    fn cancel_scheduled(&mut self, param: ParamRef, from: f64);

    /// Rewrite `param` with the arpeggiator's next note every interval.
    fn start_sequence(&mut self, param: ParamRef, arp: Arpeggiator) -> Result<TimerId, AudioError>;
    fn cancel_sequence(&mut self, timer: TimerId);

    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError>;
}
