// Shared audio/visual tuning constants used by the core and the web front-end.

// Synthesis patch
pub const START_OFFSET_SEC: f64 = 0.1; // sources start this long after the graph is built
pub const MASTER_BASELINE_GAIN: f32 = 0.15;
pub const SCRATCH_GAIN_MIN: f32 = 0.05;
pub const SCRATCH_GAIN_MAX: f32 = 0.3;
pub const SCRATCH_INTENSITY_SCALE: f32 = 0.05; // gain added per unit of scratch speed
pub const SCRATCH_RAMP_SEC: f64 = 0.1;
pub const ARP_INTERVAL_SEC: f64 = 0.25;
pub const FEEDBACK_DELAY_SEC: f32 = 0.3;
pub const FEEDBACK_DELAY_MAX_SEC: f32 = 1.0;
pub const FEEDBACK_GAIN: f32 = 0.4;

// Per-voice levels
pub const BASS_GAIN: f32 = 0.3;
pub const MELODY_GAIN: f32 = 0.2;
pub const PAD_GAIN: f32 = 0.1;
pub const SHIMMER_GAIN: f32 = 0.08;

// Modulators
pub const BASS_LFO_HZ: f32 = 0.25;
pub const BASS_LFO_DEPTH_HZ: f32 = 10.0;
pub const SHIMMER_MOD_HZ: f32 = 5.0;
pub const SHIMMER_MOD_DEPTH_HZ: f32 = 200.0;

// Secondary cue
pub const EASTER_EGG_CLICKS: u32 = 3;
pub const EASTER_EGG_VOLUME: f32 = 0.7;
pub const EASTER_EGG_URL: &str = "/easter-egg.mp3";

// Analysis
pub const FFT_SIZE: usize = 2048; // 1024 frequency bins
pub const BAND_SMOOTHING: f32 = 0.15;
pub const OVERALL_SMOOTHING: f32 = 0.12;
pub const BASS_BAND_END: f32 = 0.15; // fraction of bins
pub const MID_BAND_END: f32 = 0.5;

// Browser-compatible analyser defaults
pub const ANALYSER_MIN_DB: f32 = -100.0;
pub const ANALYSER_MAX_DB: f32 = -30.0;
pub const ANALYSER_TIME_SMOOTHING: f32 = 0.8;

// Deck interaction
pub const NEEDLE_ANGLE_MIN: f32 = -30.0;
pub const NEEDLE_ANGLE_MAX: f32 = 5.0;
pub const NEEDLE_ON_RECORD_ABOVE: f32 = -10.0;
pub const NEEDLE_REGION_X: f32 = 0.7; // needle grab area starts at this fraction of width
pub const NEEDLE_REGION_Y: f32 = 0.5; // ...and ends at this fraction of height
pub const RECORD_RADIUS_FRAC: f32 = 0.4; // grab area, relative to width
pub const RECORD_MARGIN_PX: f32 = 20.0; // drawn record stops this far inside the deck
pub const SCRATCH_SPEED_DIVISOR: f32 = 10.0;
pub const ROTATION_DEG_PER_PX: f32 = 0.5;
pub const RECORD_SPIN_DEG_PER_SEC: f32 = 180.0;

// Surface sizes (pixels)
pub const SPECTRUM_SIZE: (u32, u32) = (800, 140);
pub const WAVEFORM_SIZE: (u32, u32) = (800, 120);
pub const SPECTROGRAM_SIZE: (u32, u32) = (800, 200);
pub const PARTICLE_FIELD_SIZE: (u32, u32) = (800, 800);
pub const DECK_SIZE: (u32, u32) = (600, 600);

// Renderers
pub const SPECTRUM_BARS: usize = 64;
pub const SPECTRUM_GLOW_THRESHOLD: u8 = 180;
pub const SPECTROGRAM_CAPACITY: usize = 100;
pub const PARTICLE_COUNT: usize = 100;
pub const PARTICLE_LINK_DISTANCE: f32 = 100.0;
pub const PARTICLE_RING_THRESHOLD: f32 = 0.1;
pub const PARTICLE_RING_COUNT: usize = 3;
pub const FIELD_TIME_STEP: f32 = 0.05;
