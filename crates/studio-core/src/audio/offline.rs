//! Headless [`AudioBackend`] that renders the node graph sample by sample.
//!
//! Used by tests and tooling. Time only moves when [`OfflineContext::advance`]
//! or [`OfflineContext::render`] is called, so every scheduling decision of
//! the synthesis graph can be observed deterministically.

use crate::analysis::AnalysisTap;
use crate::audio::{
    Analyser, Arpeggiator, AudioBackend, Cue, NodeId, ParamKind, ParamRef, ParamTimeline, TimerId, Waveform,
};
use crate::constants::FFT_SIZE;
use crate::error::AudioError;
use fnv::FnvHashMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

pub const RENDER_QUANTUM: usize = 128;

enum NodeKind {
    Oscillator {
        waveform: Waveform,
        frequency: ParamTimeline,
        phase: f64,
        start: Option<f64>,
        stop: Option<f64>,
    },
    Gain {
        gain: ParamTimeline,
    },
    Delay {
        time: ParamTimeline,
        buffer: Vec<f32>,
        write: usize,
    },
    Output,
}

impl NodeKind {
    fn param(&self, kind: ParamKind) -> Option<&ParamTimeline> {
        match (self, kind) {
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Gain { gain }, ParamKind::Gain) => Some(gain),
            (NodeKind::Delay { time, .. }, ParamKind::DelayTime) => Some(time),
            _ => None,
        }
    }

    fn param_mut(&mut self, kind: ParamKind) -> Option<&mut ParamTimeline> {
        match (self, kind) {
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Gain { gain }, ParamKind::Gain) => Some(gain),
            (NodeKind::Delay { time, .. }, ParamKind::DelayTime) => Some(time),
            _ => None,
        }
    }

    fn own_param(&self) -> Option<ParamKind> {
        match self {
            NodeKind::Oscillator { .. } => Some(ParamKind::Frequency),
            NodeKind::Gain { .. } => Some(ParamKind::Gain),
            NodeKind::Delay { .. } => Some(ParamKind::DelayTime),
            NodeKind::Output => None,
        }
    }
}

struct Node {
    kind: NodeKind,
    inputs: SmallVec<[NodeId; 4]>,
    value: f32,
}

struct Sequence {
    id: TimerId,
    param: ParamRef,
    arp: Arpeggiator,
}

pub struct OfflineContext {
    sample_rate: f32,
    frames: u64,
    nodes: Vec<Option<Node>>,
    param_inputs: FnvHashMap<ParamRef, SmallVec<[NodeId; 2]>>,
    order: Vec<usize>,
    order_dirty: bool,
    output: NodeId,
    analyser: Rc<RefCell<Analyser>>,
    sequences: Vec<Sequence>,
    next_timer: u32,
    cues: Vec<Cue>,
    suspended: bool,
    available: bool,
}

impl OfflineContext {
    pub fn new(sample_rate: f32) -> Self {
        let output = Node {
            kind: NodeKind::Output,
            inputs: SmallVec::new(),
            value: 0.0,
        };
        Self {
            sample_rate,
            frames: 0,
            nodes: vec![Some(output)],
            param_inputs: FnvHashMap::default(),
            order: Vec::new(),
            order_dirty: true,
            output: NodeId(0),
            analyser: Rc::new(RefCell::new(Analyser::new(FFT_SIZE))),
            sequences: Vec::new(),
            next_timer: 1,
            cues: Vec::new(),
            suspended: false,
            available: true,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Analysis view sharing this context's analyser.
    pub fn tap(&self) -> OfflineTap {
        OfflineTap {
            analyser: self.analyser.clone(),
        }
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Simulates a missing or blocked audio device.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn played_cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn active_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// Oscillators that are started and not yet stopped at the current time.
    pub fn live_sources(&self) -> usize {
        let now = self.current_time();
        self.nodes
            .iter()
            .flatten()
            .filter(|n| match n.kind {
                NodeKind::Oscillator { start, stop, .. } => start.is_some() && stop.map_or(true, |s| s > now),
                _ => false,
            })
            .count()
    }

    /// Renders `seconds` of audio into the analyser and discards it.
    pub fn advance(&mut self, seconds: f64) {
        let frames = (seconds * self.sample_rate as f64).round().max(0.0) as usize;
        let mut block = [0.0f32; RENDER_QUANTUM];
        let mut left = frames;
        while left > 0 {
            let n = left.min(RENDER_QUANTUM);
            self.render(&mut block[..n]);
            left -= n;
        }
    }

    /// Renders `out.len()` mono samples. A suspended context renders silence
    /// without advancing its clock.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.suspended {
            out.fill(0.0);
            return;
        }
        for chunk in out.chunks_mut(RENDER_QUANTUM) {
            self.run_sequences(chunk.len());
            for o in chunk.iter_mut() {
                *o = self.render_sample();
            }
            self.compact_params();
            self.analyser.borrow_mut().push_slice(chunk);
        }
    }

    fn run_sequences(&mut self, frames: usize) {
        let dt = frames as f64 / self.sample_rate as f64;
        let now = self.current_time();
        let mut due: SmallVec<[(ParamRef, f32); 2]> = SmallVec::new();
        for seq in &mut self.sequences {
            if let Some(note) = seq.arp.tick(dt) {
                due.push((seq.param, note));
            }
        }
        for (param, note) in due {
            self.set_param_at(param, note, now);
        }
    }

    fn compact_params(&mut self) {
        let now = self.current_time();
        for node in self.nodes.iter_mut().flatten() {
            if let Some(kind) = node.kind.own_param() {
                if let Some(p) = node.kind.param_mut(kind) {
                    p.compact(now);
                }
            }
        }
    }

    fn render_sample(&mut self) -> f32 {
        if self.order_dirty {
            self.rebuild_order();
        }
        let t = self.current_time();
        let sr = self.sample_rate as f64;
        let order = std::mem::take(&mut self.order);
        for &idx in &order {
            let input = self.input_sum(idx);
            let modulation = self.modulation(idx);
            let Some(node) = self.nodes[idx].as_mut() else {
                continue;
            };
            node.value = match &mut node.kind {
                NodeKind::Oscillator {
                    waveform,
                    frequency,
                    phase,
                    start,
                    stop,
                } => {
                    let sounding = start.map_or(false, |s| t >= s) && stop.map_or(true, |s| t < s);
                    if sounding {
                        let hz = frequency.value_at(t) + modulation;
                        let v = waveform.sample(*phase);
                        *phase = (*phase + hz as f64 / sr).rem_euclid(1.0);
                        v
                    } else {
                        0.0
                    }
                }
                NodeKind::Gain { gain } => input * (gain.value_at(t) + modulation),
                NodeKind::Delay { time, buffer, write } => {
                    let len = buffer.len();
                    let d = (((time.value_at(t) + modulation) as f64 * sr).round() as usize).clamp(1, len - 1);
                    buffer[(*write + len - d) % len]
                }
                NodeKind::Output => input,
            };
        }
        // Delay lines take this sample's input only after every node is
        // evaluated, which is what lets feedback loops run through them.
        for &idx in &order {
            if !matches!(self.nodes[idx].as_ref().map(|n| &n.kind), Some(NodeKind::Delay { .. })) {
                continue;
            }
            let input = self.input_sum(idx);
            if let Some(Node {
                kind: NodeKind::Delay { buffer, write, .. },
                ..
            }) = self.nodes[idx].as_mut()
            {
                buffer[*write] = input;
                *write = (*write + 1) % buffer.len();
            }
        }
        self.order = order;
        self.frames += 1;
        self.node_value(self.output)
    }

    fn node_value(&self, id: NodeId) -> f32 {
        self.nodes
            .get(id.0 as usize)
            .and_then(|n| n.as_ref())
            .map_or(0.0, |n| n.value)
    }

    fn input_sum(&self, idx: usize) -> f32 {
        self.nodes[idx]
            .as_ref()
            .map_or(0.0, |n| n.inputs.iter().map(|&i| self.node_value(i)).sum())
    }

    fn modulation(&self, idx: usize) -> f32 {
        let Some(kind) = self.nodes[idx].as_ref().and_then(|n| n.kind.own_param()) else {
            return 0.0;
        };
        let param = ParamRef {
            node: NodeId(idx as u32),
            kind,
        };
        self.param_inputs
            .get(&param)
            .map_or(0.0, |srcs| srcs.iter().map(|&s| self.node_value(s)).sum())
    }

    fn rebuild_order(&mut self) {
        let mut state = vec![Visit::New; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for i in 0..self.nodes.len() {
            self.visit(i, &mut state, &mut order);
        }
        self.order = order;
        self.order_dirty = false;
    }

    fn visit(&self, i: usize, state: &mut [Visit], order: &mut Vec<usize>) {
        if state[i] != Visit::New {
            return;
        }
        let Some(node) = self.nodes[i].as_ref() else {
            state[i] = Visit::Done;
            return;
        };
        state[i] = Visit::Active;
        // Delay output comes from its buffer, so its inputs are not
        // dependencies of this sample.
        if !matches!(node.kind, NodeKind::Delay { .. }) {
            let params = node.kind.own_param().and_then(|kind| {
                self.param_inputs.get(&ParamRef {
                    node: NodeId(i as u32),
                    kind,
                })
            });
            for dep in node.inputs.iter().chain(params.into_iter().flatten()) {
                let d = dep.0 as usize;
                if d < state.len() {
                    self.visit(d, state, order);
                }
            }
        }
        state[i] = Visit::Done;
        order.push(i);
    }

    fn add_node(&mut self, kind: NodeKind) -> Result<NodeId, AudioError> {
        if !self.available {
            return Err(AudioError::Unavailable("offline device disabled".into()));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            kind,
            inputs: SmallVec::new(),
            value: 0.0,
        }));
        self.order_dirty = true;
        Ok(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, AudioError> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(|n| n.as_mut())
            .ok_or(AudioError::UnknownNode(id))
    }

    fn param_mut(&mut self, param: ParamRef) -> Option<&mut ParamTimeline> {
        let p = self
            .nodes
            .get_mut(param.node.0 as usize)
            .and_then(|n| n.as_mut())
            .and_then(|n| n.kind.param_mut(param.kind));
        if p.is_none() {
            log::debug!("[audio] no parameter {:?}", param);
        }
        p
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

impl AudioBackend for OfflineContext {
    fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if !self.available {
            return Err(AudioError::Unavailable("offline device disabled".into()));
        }
        self.suspended = false;
        Ok(())
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency_hz: f32) -> Result<NodeId, AudioError> {
        self.add_node(NodeKind::Oscillator {
            waveform,
            frequency: ParamTimeline::new(frequency_hz),
            phase: 0.0,
            start: None,
            stop: None,
        })
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        self.add_node(NodeKind::Gain {
            gain: ParamTimeline::new(gain),
        })
    }

    fn create_delay(&mut self, delay_sec: f32, max_delay_sec: f32) -> Result<NodeId, AudioError> {
        let len = ((max_delay_sec.max(delay_sec) * self.sample_rate).ceil() as usize).max(2) + 1;
        self.add_node(NodeKind::Delay {
            time: ParamTimeline::new(delay_sec),
            buffer: vec![0.0; len],
            write: 0,
        })
    }

    fn output(&self) -> NodeId {
        self.output
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        self.node_mut(from)?;
        self.node_mut(to)?.inputs.push(from);
        self.order_dirty = true;
        Ok(())
    }

    fn connect_param(&mut self, from: NodeId, to: ParamRef) -> Result<(), AudioError> {
        self.node_mut(from)?;
        if self.node_mut(to.node)?.kind.param(to.kind).is_none() {
            return Err(AudioError::InvalidState(to.node, "node has no such parameter"));
        }
        self.param_inputs.entry(to).or_default().push(from);
        self.order_dirty = true;
        Ok(())
    }

    fn start_at(&mut self, source: NodeId, when: f64) -> Result<(), AudioError> {
        match &mut self.node_mut(source)?.kind {
            NodeKind::Oscillator { start: start @ None, .. } => {
                *start = Some(when);
                Ok(())
            }
            NodeKind::Oscillator { .. } => Err(AudioError::InvalidState(source, "already started")),
            _ => Err(AudioError::InvalidState(source, "not a source")),
        }
    }

    fn stop_at(&mut self, source: NodeId, when: f64) -> Result<(), AudioError> {
        let now = self.current_time();
        match &mut self.node_mut(source)?.kind {
            NodeKind::Oscillator { start: None, .. } => Err(AudioError::InvalidState(source, "not started")),
            NodeKind::Oscillator { stop: Some(s), .. } if *s <= now => {
                Err(AudioError::InvalidState(source, "already stopped"))
            }
            NodeKind::Oscillator { stop, .. } => {
                *stop = Some(when.max(now));
                Ok(())
            }
            _ => Err(AudioError::InvalidState(source, "not a source")),
        }
    }

    fn release(&mut self, nodes: &[NodeId]) {
        for id in nodes {
            if *id == self.output {
                continue;
            }
            if let Some(slot) = self.nodes.get_mut(id.0 as usize) {
                *slot = None;
            }
        }
        for node in self.nodes.iter_mut().flatten() {
            node.inputs.retain(|i| !nodes.contains(i));
        }
        self.param_inputs.retain(|param, srcs| {
            srcs.retain(|s| !nodes.contains(s));
            !nodes.contains(&param.node) && !srcs.is_empty()
        });
        self.order_dirty = true;
    }

    fn param_value(&self, param: ParamRef) -> f32 {
        self.nodes
            .get(param.node.0 as usize)
            .and_then(|n| n.as_ref())
            .and_then(|n| n.kind.param(param.kind))
            .map_or(0.0, |p| p.value_at(self.current_time()))
    }

    fn set_param_at(&mut self, param: ParamRef, value: f32, when: f64) {
        if let Some(p) = self.param_mut(param) {
            p.set_value_at(value, when);
        }
    }

    fn ramp_param_to(&mut self, param: ParamRef, value: f32, end_time: f64) {
        let now = self.current_time();
        if let Some(p) = self.param_mut(param) {
            p.linear_ramp_to(value, end_time, now);
        }
    }

    fn cancel_scheduled(&mut self, param: ParamRef, from: f64) {
        if let Some(p) = self.param_mut(param) {
            p.cancel_scheduled(from);
        }
    }

    fn start_sequence(&mut self, param: ParamRef, arp: Arpeggiator) -> Result<TimerId, AudioError> {
        if self.param_mut(param).is_none() {
            return Err(AudioError::InvalidState(param.node, "node has no such parameter"));
        }
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.sequences.push(Sequence { id, param, arp });
        Ok(id)
    }

    fn cancel_sequence(&mut self, timer: TimerId) {
        self.sequences.retain(|s| s.id != timer);
    }

    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError> {
        if !self.available {
            return Err(AudioError::Unavailable("offline device disabled".into()));
        }
        self.cues.push(cue);
        Ok(())
    }
}

/// [`AnalysisTap`] over an [`OfflineContext`]'s analyser.
#[derive(Clone)]
pub struct OfflineTap {
    analyser: Rc<RefCell<Analyser>>,
}

impl AnalysisTap for OfflineTap {
    fn bin_count(&self) -> usize {
        self.analyser.borrow().bin_count()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyser.borrow_mut().byte_frequency_data(out);
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        self.analyser.borrow().byte_time_domain_data(out);
    }
}
