use crate::audio::{AudioBackend, Cue, PatchConfig, SynthesisGraph, VoiceSet};
use crate::editor::EditorBuffer;
use crate::interaction::{DeckEvent, DeckGeometry, DragMode, EasterEggCounter, EggOutcome, InteractionStateMachine};
use crate::render::DeckVisual;
use glam::Vec2;

/// User-facing outcomes. Front-ends turn these into notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    AudioUnavailable,
    PlaybackStarted,
    PlaybackStopped,
    /// Record clicks counted so far toward the easter egg.
    EasterEggProgress(u32),
    EasterEggTriggered,
    CodeReset,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::AudioUnavailable => "audio-unavailable",
            Condition::PlaybackStarted => "playback-started",
            Condition::PlaybackStopped => "playback-stopped",
            Condition::EasterEggProgress(_) => "easter-egg-progress",
            Condition::EasterEggTriggered => "easter-egg-triggered",
            Condition::CodeReset => "code-reset",
        }
    }

    pub fn payload(&self) -> Option<u32> {
        match *self {
            Condition::EasterEggProgress(n) => Some(n),
            _ => None,
        }
    }
}

/// One user session: the audio backend, the live patch (at most one), the
/// deck gestures, the easter-egg counter and the code panel.
///
/// Operations report what happened by pushing [`Condition`]s into `out`.
pub struct Studio<B> {
    backend: B,
    graph: SynthesisGraph,
    voices: Option<VoiceSet>,
    deck: InteractionStateMachine,
    easter_egg: EasterEggCounter,
    editor: EditorBuffer,
    sessions_started: u64,
}

impl<B: AudioBackend> Studio<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PatchConfig::default(), DeckGeometry::default())
    }

    pub fn with_config(backend: B, patch: PatchConfig, geometry: DeckGeometry) -> Self {
        Self {
            backend,
            graph: SynthesisGraph::new(patch),
            voices: None,
            deck: InteractionStateMachine::new(geometry),
            easter_egg: EasterEggCounter::default(),
            editor: EditorBuffer::new(),
            sessions_started: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.voices.is_some()
    }

    /// Starts the patch unless it is already playing. Returns whether the
    /// patch is playing afterwards.
    pub fn play(&mut self, out: &mut Vec<Condition>) -> bool {
        if self.is_playing() {
            return true;
        }
        match self.graph.start(&mut self.backend) {
            Ok(voices) => {
                self.voices = Some(voices);
                self.sessions_started += 1;
                out.push(Condition::PlaybackStarted);
                true
            }
            Err(e) => {
                log::error!("[audio] start failed: {}", e);
                out.push(Condition::AudioUnavailable);
                false
            }
        }
    }

    /// Stops and discards the live patch, if any.
    pub fn pause(&mut self, out: &mut Vec<Condition>) {
        if let Some(mut voices) = self.voices.take() {
            self.graph.stop(&mut self.backend, &mut voices);
            out.push(Condition::PlaybackStopped);
        }
    }

    /// Transport button: independent of where the needle is.
    pub fn toggle_playback(&mut self, out: &mut Vec<Condition>) {
        if self.is_playing() {
            self.pause(out);
        } else {
            self.play(out);
        }
    }

    /// Applies a scratch of signed `speed` to the live patch. Returns the gain
    /// target, or `None` when idle.
    pub fn scratch(&mut self, speed: f32) -> Option<f32> {
        let voices = self.voices.as_ref()?;
        let ramp = self.graph.config().ramp_sec;
        Some(self.graph.set_gain(&mut self.backend, voices, speed, ramp))
    }

    pub fn pointer_down(&mut self, pos: Vec2) -> DragMode {
        self.deck.pointer_down(pos)
    }

    pub fn pointer_move(&mut self, pos: Vec2, out: &mut Vec<Condition>) {
        let playing = self.is_playing();
        match self.deck.pointer_move(pos, playing) {
            Some(DeckEvent::NeedleChanged { on_record: true }) if !playing => {
                log::info!("[deck] needle down");
                self.play(out);
            }
            Some(DeckEvent::NeedleChanged { on_record: false }) if playing => {
                log::info!("[deck] needle lifted");
                self.pause(out);
            }
            Some(DeckEvent::Scratch { speed }) => {
                self.scratch(speed);
            }
            _ => {}
        }
    }

    pub fn pointer_up(&mut self) {
        self.deck.pointer_up();
    }

    /// Whether `pos` lands on the record (for click routing).
    pub fn hits_record(&self, pos: Vec2) -> bool {
        let g = self.deck.geometry();
        g.on_record(pos) && !g.in_needle_region(pos)
    }

    pub fn record_clicked(&mut self, out: &mut Vec<Condition>) {
        match self.easter_egg.click() {
            EggOutcome::Progress(n) => out.push(Condition::EasterEggProgress(n)),
            EggOutcome::Triggered => {
                self.pause(out);
                if let Err(e) = self.backend.play_cue(Cue::EasterEgg) {
                    log::warn!("[audio] easter egg cue: {}", e);
                }
                out.push(Condition::EasterEggTriggered);
            }
        }
    }

    pub fn reset_code(&mut self, out: &mut Vec<Condition>) {
        self.editor.reset();
        out.push(Condition::CodeReset);
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorBuffer {
        &mut self.editor
    }

    pub fn deck(&self) -> &InteractionStateMachine {
        &self.deck
    }

    pub fn deck_visual(&self) -> DeckVisual {
        self.deck.visual(self.is_playing())
    }

    pub fn easter_egg(&self) -> &EasterEggCounter {
        &self.easter_egg
    }

    pub fn voices(&self) -> Option<&VoiceSet> {
        self.voices.as_ref()
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
