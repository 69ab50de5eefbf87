use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// One period of the waveform sampled at `phase` in `[0, 1)`.
    pub fn sample(self, phase: f64) -> f32 {
        let p = phase - phase.floor();
        let v = match self {
            Waveform::Sine => (p * std::f64::consts::TAU).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };
        v as f32
    }
}

pub const C_MAJOR_PENTATONIC: &[i32] = &[0, 2, 4, 7, 12];

// MIDI notes of the fixed patch
pub const BASS_NOTE: f32 = 36.0; // C2
pub const MELODY_ROOT: i32 = 60; // C4
pub const PAD_NOTES: [f32; 2] = [72.0, 76.0]; // C5, E5
pub const SHIMMER_NOTE: f32 = 84.0; // C6

pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}

/// Frequencies of `scale` degrees above `root`, in order.
pub fn scale_frequencies(root: i32, scale: &[i32]) -> SmallVec<[f32; 8]> {
    scale
        .iter()
        .map(|degree| midi_to_hz((root + degree) as f32))
        .collect()
}

/// Cycles through a fixed note list on a regular interval.
///
/// The sounding note is `notes[0]` when the sequence starts; every elapsed
/// interval moves to the next entry and wraps around at the end.
#[derive(Clone, Debug)]
pub struct Arpeggiator {
    notes: SmallVec<[f32; 8]>,
    interval_sec: f64,
    index: usize,
    accum: f64,
}

impl Arpeggiator {
    pub fn new(notes: &[f32], interval_sec: f64) -> Self {
        Self {
            notes: SmallVec::from_slice(notes),
            interval_sec: interval_sec.max(1e-3),
            index: 0,
            accum: 0.0,
        }
    }

    pub fn interval_sec(&self) -> f64 {
        self.interval_sec
    }

    pub fn current(&self) -> Option<f32> {
        self.notes.get(self.index).copied()
    }

    /// Steps to the next note and returns it.
    pub fn next_note(&mut self) -> Option<f32> {
        if self.notes.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.notes.len();
        self.current()
    }

    /// Accumulates `dt_sec` and returns the note to switch to if at least one
    /// interval elapsed. Several elapsed intervals collapse into the last one.
    pub fn tick(&mut self, dt_sec: f64) -> Option<f32> {
        self.accum += dt_sec;
        let mut note = None;
        while self.accum >= self.interval_sec {
            self.accum -= self.interval_sec;
            note = self.next_note();
        }
        note
    }
}
