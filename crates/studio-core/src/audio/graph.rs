use crate::audio::{
    midi_to_hz, scale_frequencies, Arpeggiator, AudioBackend, NodeId, ParamRef, TimerId, Waveform, BASS_NOTE,
    C_MAJOR_PENTATONIC, MELODY_ROOT, PAD_NOTES, SHIMMER_NOTE,
};
use crate::constants::*;
use crate::error::AudioError;
use smallvec::SmallVec;

/// Tunables of the fixed patch. Defaults reproduce the stock sound.
#[derive(Clone, Debug)]
pub struct PatchConfig {
    pub start_offset_sec: f64,
    pub master_gain: f32,
    pub gain_min: f32,
    pub gain_max: f32,
    pub scratch_scale: f32,
    pub ramp_sec: f64,
    pub arp_notes: SmallVec<[f32; 8]>,
    pub arp_interval_sec: f64,
    pub delay_sec: f32,
    pub feedback: f32,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            start_offset_sec: START_OFFSET_SEC,
            master_gain: MASTER_BASELINE_GAIN,
            gain_min: SCRATCH_GAIN_MIN,
            gain_max: SCRATCH_GAIN_MAX,
            scratch_scale: SCRATCH_INTENSITY_SCALE,
            ramp_sec: SCRATCH_RAMP_SEC,
            arp_notes: scale_frequencies(MELODY_ROOT, C_MAJOR_PENTATONIC),
            arp_interval_sec: ARP_INTERVAL_SEC,
            delay_sec: FEEDBACK_DELAY_SEC,
            feedback: FEEDBACK_GAIN,
        }
    }
}

/// Everything one playback session created. Owned by whoever started the
/// session; [`SynthesisGraph::stop`] tears it down.
#[derive(Debug)]
pub struct VoiceSet {
    master: NodeId,
    sources: SmallVec<[NodeId; 8]>,
    nodes: SmallVec<[NodeId; 16]>,
    arp: Option<TimerId>,
    start_time: f64,
    stopped: bool,
}

impl VoiceSet {
    pub fn master_gain(&self) -> ParamRef {
        ParamRef::gain(self.master)
    }

    pub fn sources(&self) -> &[NodeId] {
        &self.sources
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Builds and drives the fixed patch:
///
/// - bass: sawtooth with a slow LFO on its frequency
/// - melody: triangle whose pitch is stepped by an arpeggiator
/// - pads: two sines through a feedback delay, also sent dry
/// - shimmer: high sine frequency-modulated by a 5 Hz sine
///
/// All voices sum into one master gain, which is the scratch target.
pub struct SynthesisGraph {
    config: PatchConfig,
}

impl SynthesisGraph {
    pub fn new(config: PatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Builds a fresh patch and schedules every source to begin shortly after
    /// the current time.
    pub fn start<B: AudioBackend + ?Sized>(&self, backend: &mut B) -> Result<VoiceSet, AudioError> {
        backend.resume()?;
        let mut voices = VoiceSet {
            master: NodeId(0),
            sources: SmallVec::new(),
            nodes: SmallVec::new(),
            arp: None,
            start_time: backend.current_time() + self.config.start_offset_sec,
            stopped: false,
        };
        if let Err(e) = self.build(backend, &mut voices) {
            if let Some(timer) = voices.arp.take() {
                backend.cancel_sequence(timer);
            }
            backend.release(&voices.nodes);
            return Err(e);
        }
        log::info!(
            "[audio] started {} sources at t={:.3}",
            voices.sources.len(),
            voices.start_time
        );
        Ok(voices)
    }

    fn build<B: AudioBackend + ?Sized>(&self, backend: &mut B, v: &mut VoiceSet) -> Result<(), AudioError> {
        let cfg = &self.config;

        let master = backend.create_gain(cfg.master_gain)?;
        v.nodes.push(master);
        v.master = master;
        let out = backend.output();
        backend.connect(master, out)?;

        // Bass with a slow wobble on its pitch.
        let bass = self.source(backend, v, Waveform::Saw, midi_to_hz(BASS_NOTE))?;
        let bass_gain = self.gain(backend, v, BASS_GAIN)?;
        let lfo = self.source(backend, v, Waveform::Sine, BASS_LFO_HZ)?;
        let lfo_depth = self.gain(backend, v, BASS_LFO_DEPTH_HZ)?;
        backend.connect(lfo, lfo_depth)?;
        backend.connect_param(lfo_depth, ParamRef::frequency(bass))?;
        backend.connect(bass, bass_gain)?;
        backend.connect(bass_gain, master)?;

        // Arpeggiated melody.
        let arp = Arpeggiator::new(&cfg.arp_notes, cfg.arp_interval_sec);
        let first = arp.current().unwrap_or(midi_to_hz(MELODY_ROOT as f32));
        let melody = self.source(backend, v, Waveform::Triangle, first)?;
        let melody_gain = self.gain(backend, v, MELODY_GAIN)?;
        backend.connect(melody, melody_gain)?;
        backend.connect(melody_gain, master)?;
        v.arp = Some(backend.start_sequence(ParamRef::frequency(melody), arp)?);

        // Pads, dry and through the feedback delay.
        let pad_gain = self.gain(backend, v, PAD_GAIN)?;
        for note in PAD_NOTES {
            let pad = self.source(backend, v, Waveform::Sine, midi_to_hz(note))?;
            backend.connect(pad, pad_gain)?;
        }
        let delay = backend.create_delay(cfg.delay_sec, FEEDBACK_DELAY_MAX_SEC)?;
        v.nodes.push(delay);
        let feedback = self.gain(backend, v, cfg.feedback)?;
        backend.connect(pad_gain, delay)?;
        backend.connect(delay, feedback)?;
        backend.connect(feedback, delay)?;
        backend.connect(delay, master)?;
        backend.connect(pad_gain, master)?;

        // FM shimmer.
        let carrier = self.source(backend, v, Waveform::Sine, midi_to_hz(SHIMMER_NOTE))?;
        let modulator = self.source(backend, v, Waveform::Sine, SHIMMER_MOD_HZ)?;
        let mod_depth = self.gain(backend, v, SHIMMER_MOD_DEPTH_HZ)?;
        let carrier_gain = self.gain(backend, v, SHIMMER_GAIN)?;
        backend.connect(modulator, mod_depth)?;
        backend.connect_param(mod_depth, ParamRef::frequency(carrier))?;
        backend.connect(carrier, carrier_gain)?;
        backend.connect(carrier_gain, master)?;

        for &src in &v.sources {
            backend.start_at(src, v.start_time)?;
        }
        Ok(())
    }

    fn source<B: AudioBackend + ?Sized>(
        &self,
        backend: &mut B,
        v: &mut VoiceSet,
        waveform: Waveform,
        hz: f32,
    ) -> Result<NodeId, AudioError> {
        let id = backend.create_oscillator(waveform, hz)?;
        v.nodes.push(id);
        v.sources.push(id);
        Ok(id)
    }

    fn gain<B: AudioBackend + ?Sized>(&self, backend: &mut B, v: &mut VoiceSet, value: f32) -> Result<NodeId, AudioError> {
        let id = backend.create_gain(value)?;
        v.nodes.push(id);
        Ok(id)
    }

    /// Stops every source, cancels the arpeggiator and releases the nodes.
    /// Safe to call on an already stopped set.
    pub fn stop<B: AudioBackend + ?Sized>(&self, backend: &mut B, voices: &mut VoiceSet) {
        if voices.stopped {
            return;
        }
        voices.stopped = true;
        let now = backend.current_time();
        for &src in &voices.sources {
            if let Err(e) = backend.stop_at(src, now) {
                log::debug!("[audio] stop {:?}: {}", src, e);
            }
        }
        if let Some(timer) = voices.arp.take() {
            backend.cancel_sequence(timer);
        }
        backend.release(&voices.nodes);
        log::info!("[audio] stopped at t={:.3}", now);
    }

    /// Scratch response: pushes the master gain up by `|intensity|` times the
    /// scratch scale (clamped to the configured range) and ramps it back to
    /// the baseline over `ramp_sec`. Returns the target that was applied.
    pub fn set_gain<B: AudioBackend + ?Sized>(
        &self,
        backend: &mut B,
        voices: &VoiceSet,
        intensity: f32,
        ramp_sec: f64,
    ) -> f32 {
        let param = voices.master_gain();
        let now = backend.current_time();
        let current = backend.param_value(param);
        let boost = intensity.abs() * self.config.scratch_scale;
        let target = (current + boost).clamp(self.config.gain_min, self.config.gain_max);
        backend.cancel_scheduled(param, now);
        backend.set_param_at(param, target, now);
        backend.ramp_param_to(param, self.config.master_gain, now + ramp_sec.max(0.0));
        log::trace!("[audio] gain {:.3} -> {:.3}", current, target);
        target
    }
}

impl Default for SynthesisGraph {
    fn default() -> Self {
        Self::new(PatchConfig::default())
    }
}
