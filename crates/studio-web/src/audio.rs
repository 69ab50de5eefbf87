use fnv::FnvHashMap;
use studio_core::constants::{
    ANALYSER_MAX_DB, ANALYSER_MIN_DB, ANALYSER_TIME_SMOOTHING, EASTER_EGG_URL, EASTER_EGG_VOLUME, FFT_SIZE,
};
use studio_core::{AnalysisTap, Arpeggiator, AudioBackend, AudioError, Cue, NodeId, ParamKind, ParamRef, TimerId, Waveform};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

const OUTPUT: NodeId = NodeId(0);

enum WebNode {
    Oscillator { node: web::OscillatorNode, stopped: bool },
    Gain(web::GainNode),
    Delay(web::DelayNode),
}

impl WebNode {
    fn audio_node(&self) -> &web::AudioNode {
        match self {
            WebNode::Oscillator { node, .. } => node.as_ref(),
            WebNode::Gain(g) => g.as_ref(),
            WebNode::Delay(d) => d.as_ref(),
        }
    }

    fn param(&self, kind: ParamKind) -> Option<web::AudioParam> {
        match (self, kind) {
            (WebNode::Oscillator { node, .. }, ParamKind::Frequency) => Some(node.frequency()),
            (WebNode::Gain(g), ParamKind::Gain) => Some(g.gain()),
            (WebNode::Delay(d), ParamKind::DelayTime) => Some(d.delay_time()),
            _ => None,
        }
    }
}

struct Context {
    audio: web::AudioContext,
    analyser: web::AnalyserNode,
}

/// Interval-driven parameter rewrite; the closure lives as long as the timer.
struct Sequence {
    handle: i32,
    _tick: Closure<dyn FnMut()>,
}

fn js_err(e: JsValue) -> String {
    format!("{:?}", e)
}

fn web_type(waveform: Waveform) -> web::OscillatorType {
    match waveform {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Square => web::OscillatorType::Square,
        Waveform::Saw => web::OscillatorType::Sawtooth,
        Waveform::Triangle => web::OscillatorType::Triangle,
    }
}

/// [`AudioBackend`] on a browser `AudioContext`.
///
/// The context is created lazily by the first `resume`, which must happen
/// inside a user gesture. Slot 0 is the output gain feeding the analyser,
/// which feeds the destination; it lives as long as the context.
#[derive(Default)]
pub struct WebAudioBackend {
    ctx: Option<Context>,
    nodes: Vec<Option<WebNode>>,
    sequences: FnvHashMap<u32, Sequence>,
    next_timer: u32,
    easter_egg: Option<web::HtmlAudioElement>,
}

impl WebAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyser on the output bus, once the context exists.
    pub fn analyser(&self) -> Option<web::AnalyserNode> {
        self.ctx.as_ref().map(|c| c.analyser.clone())
    }

    fn context(&self) -> Result<&Context, AudioError> {
        self.ctx
            .as_ref()
            .ok_or_else(|| AudioError::Unavailable("audio context not created".into()))
    }

    fn node(&self, id: NodeId) -> Result<&WebNode, AudioError> {
        self.nodes
            .get(id.0 as usize)
            .and_then(|n| n.as_ref())
            .ok_or(AudioError::UnknownNode(id))
    }

    fn insert(&mut self, node: WebNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    fn web_param(&self, param: ParamRef) -> Option<web::AudioParam> {
        self.node(param.node).ok().and_then(|n| n.param(param.kind))
    }

    fn create_context() -> Result<Context, AudioError> {
        let audio = web::AudioContext::new().map_err(|e| AudioError::Unavailable(js_err(e)))?;
        let analyser = audio.create_analyser().map_err(|e| AudioError::Backend(js_err(e)))?;
        analyser.set_fft_size(FFT_SIZE as u32);
        analyser.set_smoothing_time_constant(ANALYSER_TIME_SMOOTHING as f64);
        analyser.set_min_decibels(ANALYSER_MIN_DB as f64);
        analyser.set_max_decibels(ANALYSER_MAX_DB as f64);
        analyser
            .connect_with_audio_node(&audio.destination())
            .map_err(|e| AudioError::Backend(js_err(e)))?;
        log::info!(
            "[audio] context created: sample_rate={} bins={}",
            audio.sample_rate(),
            analyser.frequency_bin_count()
        );
        Ok(Context { audio, analyser })
    }
}

impl AudioBackend for WebAudioBackend {
    fn current_time(&self) -> f64 {
        self.ctx.as_ref().map_or(0.0, |c| c.audio.current_time())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.ctx.is_none() {
            let ctx = Self::create_context()?;
            let output = ctx.audio.create_gain().map_err(|e| AudioError::Backend(js_err(e)))?;
            output
                .connect_with_audio_node(&ctx.analyser)
                .map_err(|e| AudioError::Backend(js_err(e)))?;
            self.nodes.clear();
            self.nodes.push(Some(WebNode::Gain(output)));
            self.ctx = Some(ctx);
        }
        let ctx = self.context()?;
        match ctx.audio.state() {
            web::AudioContextState::Running => Ok(()),
            web::AudioContextState::Closed => Err(AudioError::Unavailable("audio context closed".into())),
            _ => {
                // The promise settles later; scheduling against currentTime still works.
                ctx.audio.resume().map_err(|e| AudioError::Unavailable(js_err(e)))?;
                log::info!("[audio] resuming suspended context");
                Ok(())
            }
        }
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency_hz: f32) -> Result<NodeId, AudioError> {
        let osc = self
            .context()?
            .audio
            .create_oscillator()
            .map_err(|e| AudioError::Backend(js_err(e)))?;
        osc.set_type(web_type(waveform));
        osc.frequency().set_value(frequency_hz);
        Ok(self.insert(WebNode::Oscillator {
            node: osc,
            stopped: false,
        }))
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        let g = self
            .context()?
            .audio
            .create_gain()
            .map_err(|e| AudioError::Backend(js_err(e)))?;
        g.gain().set_value(gain);
        Ok(self.insert(WebNode::Gain(g)))
    }

    fn create_delay(&mut self, delay_sec: f32, max_delay_sec: f32) -> Result<NodeId, AudioError> {
        let d = self
            .context()?
            .audio
            .create_delay_with_max_delay_time(max_delay_sec as f64)
            .map_err(|e| AudioError::Backend(js_err(e)))?;
        d.delay_time().set_value(delay_sec);
        Ok(self.insert(WebNode::Delay(d)))
    }

    fn output(&self) -> NodeId {
        OUTPUT
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        let src = self.node(from)?.audio_node();
        let dst = self.node(to)?.audio_node();
        src.connect_with_audio_node(dst)
            .map(|_| ())
            .map_err(|e| AudioError::Backend(js_err(e)))
    }

    fn connect_param(&mut self, from: NodeId, to: ParamRef) -> Result<(), AudioError> {
        let src = self.node(from)?.audio_node();
        let param = self
            .node(to.node)?
            .param(to.kind)
            .ok_or(AudioError::InvalidState(to.node, "no such parameter"))?;
        src.connect_with_audio_param(&param)
            .map(|_| ())
            .map_err(|e| AudioError::Backend(js_err(e)))
    }

    fn start_at(&mut self, source: NodeId, when: f64) -> Result<(), AudioError> {
        match self.node(source)? {
            WebNode::Oscillator { node, .. } => node
                .start_with_when(when)
                .map_err(|e| AudioError::Backend(js_err(e))),
            _ => Err(AudioError::InvalidState(source, "not a source")),
        }
    }

    fn stop_at(&mut self, source: NodeId, when: f64) -> Result<(), AudioError> {
        let slot = self
            .nodes
            .get_mut(source.0 as usize)
            .and_then(|n| n.as_mut())
            .ok_or(AudioError::UnknownNode(source))?;
        match slot {
            WebNode::Oscillator { stopped: true, .. } => Err(AudioError::InvalidState(source, "already stopped")),
            WebNode::Oscillator { node, stopped } => {
                *stopped = true;
                node.stop_with_when(when).map_err(|e| AudioError::Backend(js_err(e)))
            }
            _ => Err(AudioError::InvalidState(source, "not a source")),
        }
    }

    fn release(&mut self, nodes: &[NodeId]) {
        for id in nodes {
            if *id == OUTPUT {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(id.0 as usize).and_then(Option::take) {
                let _ = node.audio_node().disconnect();
            }
        }
        // Reclaim trailing empty slots so sessions don't grow the table.
        while self.nodes.len() > 1 && matches!(self.nodes.last(), Some(None)) {
            self.nodes.pop();
        }
    }

    fn param_value(&self, param: ParamRef) -> f32 {
        self.web_param(param).map_or(0.0, |p| p.value())
    }

    fn set_param_at(&mut self, param: ParamRef, value: f32, when: f64) {
        if let Some(p) = self.web_param(param) {
            let _ = p.set_value_at_time(value, when);
        }
    }

    fn ramp_param_to(&mut self, param: ParamRef, value: f32, end_time: f64) {
        if let Some(p) = self.web_param(param) {
            let _ = p.linear_ramp_to_value_at_time(value, end_time);
        }
    }

    fn cancel_scheduled(&mut self, param: ParamRef, from: f64) {
        if let Some(p) = self.web_param(param) {
            let _ = p.cancel_scheduled_values(from);
        }
    }

    fn start_sequence(&mut self, param: ParamRef, mut arp: Arpeggiator) -> Result<TimerId, AudioError> {
        let audio = self.context()?.audio.clone();
        let target = self
            .web_param(param)
            .ok_or(AudioError::InvalidState(param.node, "no such parameter"))?;
        let window = web::window().ok_or_else(|| AudioError::Backend("no window".into()))?;
        let interval_ms = (arp.interval_sec() * 1000.0).round() as i32;

        let tick = Closure::wrap(Box::new(move || {
            if let Some(hz) = arp.next_note() {
                let _ = target.set_value_at_time(hz, audio.current_time());
            }
        }) as Box<dyn FnMut()>);
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), interval_ms)
            .map_err(|e| AudioError::Backend(js_err(e)))?;

        let id = self.next_timer;
        self.next_timer += 1;
        self.sequences.insert(id, Sequence { handle, _tick: tick });
        Ok(TimerId(id))
    }

    fn cancel_sequence(&mut self, timer: TimerId) {
        if let Some(seq) = self.sequences.remove(&timer.0) {
            if let Some(w) = web::window() {
                w.clear_interval_with_handle(seq.handle);
            }
        }
    }

    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError> {
        match cue {
            Cue::EasterEgg => {
                if self.easter_egg.is_none() {
                    let el = web::HtmlAudioElement::new_with_src(EASTER_EGG_URL)
                        .map_err(|e| AudioError::Backend(js_err(e)))?;
                    el.set_volume(EASTER_EGG_VOLUME as f64);
                    self.easter_egg = Some(el);
                }
                if let Some(el) = &self.easter_egg {
                    // Autoplay rejection shows up as a rejected promise, not here.
                    el.play().map_err(|e| AudioError::Backend(js_err(e)))?;
                }
                Ok(())
            }
        }
    }
}

/// Analysis tap reading the browser analyser's byte data.
pub struct WebTap {
    analyser: web::AnalyserNode,
}

impl WebTap {
    pub fn new(analyser: web::AnalyserNode) -> Self {
        Self { analyser }
    }
}

impl AnalysisTap for WebTap {
    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyser.get_byte_frequency_data(out);
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        self.analyser.get_byte_time_domain_data(out);
    }
}
