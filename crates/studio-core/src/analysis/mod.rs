//! Per-frame audio features: the raw byte views from the analysis tap, band
//! energies smoothed over time, and a few scalar spectral features.

mod features;

pub use features::{BasicFeatureAnalyzer, FeatureAnalyzer, SpectralFeatures};

use crate::constants::*;
use crate::error::AnalysisError;

/// Source of the byte views a browser `AnalyserNode` exposes.
pub trait AnalysisTap {
    fn bin_count(&self) -> usize;
    /// Magnitudes in 0..=255, one per bin.
    fn byte_frequency_data(&mut self, out: &mut [u8]);
    /// Waveform bytes centered on 128.
    fn byte_time_domain_data(&mut self, out: &mut [u8]);
}

/// Latest frequency and time-domain views, both `bin_count` long.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSnapshot {
    pub frequency_bins: Vec<u8>,
    pub time_samples: Vec<u8>,
}

impl AudioSnapshot {
    /// Silence: zero magnitudes and a flat waveform.
    pub fn neutral(bin_count: usize) -> Self {
        Self {
            frequency_bins: vec![0; bin_count],
            time_samples: vec![128; bin_count],
        }
    }

    pub fn len(&self) -> usize {
        self.frequency_bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency_bins.is_empty()
    }

    fn resize(&mut self, bin_count: usize) {
        self.frequency_bins.resize(bin_count, 0);
        self.time_samples.resize(bin_count, 128);
    }

    fn neutralize(&mut self) {
        self.frequency_bins.fill(0);
        self.time_samples.fill(128);
    }
}

/// Normalized (0..=1) energies of the low, middle and high bins plus the
/// whole spectrum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandEnergies {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub overall: f32,
}

impl BandEnergies {
    /// Exponential smoothing toward `raw`.
    pub fn smooth_toward(&mut self, raw: &BandEnergies, band_factor: f32, overall_factor: f32) {
        self.bass += (raw.bass - self.bass) * band_factor;
        self.mid += (raw.mid - self.mid) * band_factor;
        self.treble += (raw.treble - self.treble) * band_factor;
        self.overall += (raw.overall - self.overall) * overall_factor;
    }
}

/// Unsmoothed band averages: bass is the first 15% of bins, mid up to 50%,
/// treble the rest. An empty range contributes zero. `overall` weighs the
/// three bands equally, whatever their widths.
pub fn band_averages(bins: &[u8]) -> BandEnergies {
    let len = bins.len();
    let bass_end = (len as f32 * BASS_BAND_END).floor() as usize;
    let mid_end = ((len as f32 * MID_BAND_END).floor() as usize).max(bass_end);
    let bass = mean(&bins[..bass_end]);
    let mid = mean(&bins[bass_end..mid_end]);
    let treble = mean(&bins[mid_end..]);
    BandEnergies {
        bass,
        mid,
        treble,
        overall: (bass + mid + treble) / 3.0,
    }
}

fn mean(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / bins.len() as f32 / 255.0
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub bin_count: usize,
    pub band_smoothing: f32,
    pub overall_smoothing: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bin_count: FFT_SIZE / 2,
            band_smoothing: BAND_SMOOTHING,
            overall_smoothing: OVERALL_SMOOTHING,
        }
    }
}

/// Samples the analysis tap once per frame. Until a tap is attached every
/// sample is the neutral snapshot and the bands hold their last value.
pub struct FeatureExtractor<T> {
    tap: Option<T>,
    config: AnalysisConfig,
    snapshot: AudioSnapshot,
    bands: BandEnergies,
    analyzer: Option<Box<dyn FeatureAnalyzer>>,
    features: SpectralFeatures,
}

impl<T: AnalysisTap> FeatureExtractor<T> {
    pub fn new(config: AnalysisConfig) -> Self {
        let snapshot = AudioSnapshot::neutral(config.bin_count);
        Self {
            tap: None,
            config,
            snapshot,
            bands: BandEnergies::default(),
            analyzer: None,
            features: SpectralFeatures::default(),
        }
    }

    pub fn with_tap(tap: T, config: AnalysisConfig) -> Self {
        let mut extractor = Self::new(config);
        extractor.attach(tap);
        extractor
    }

    pub fn attach(&mut self, tap: T) {
        let bins = tap.bin_count();
        if bins != self.snapshot.len() {
            log::info!("[analysis] tap reports {} bins", bins);
            self.snapshot.resize(bins);
        }
        self.tap = Some(tap);
    }

    pub fn detach(&mut self) -> Option<T> {
        self.tap.take()
    }

    pub fn is_ready(&self) -> bool {
        self.tap.is_some()
    }

    /// Installs the optional scalar feature analyzer.
    pub fn set_analyzer(&mut self, analyzer: Box<dyn FeatureAnalyzer>) {
        self.analyzer = Some(analyzer);
    }

    /// Refreshes the snapshot from the tap and advances the smoothed bands.
    pub fn try_sample(&mut self) -> Result<(), AnalysisError> {
        let tap = self.tap.as_mut().ok_or(AnalysisError::NotReady)?;
        tap.byte_frequency_data(&mut self.snapshot.frequency_bins);
        tap.byte_time_domain_data(&mut self.snapshot.time_samples);
        self.update_derived();
        Ok(())
    }

    /// Like [`try_sample`](Self::try_sample) but never fails: without a tap
    /// the snapshot is neutral and the bands are left as they were.
    pub fn sample(&mut self) -> (&AudioSnapshot, BandEnergies) {
        if let Err(e) = self.try_sample() {
            log::trace!("[analysis] {}", e);
            self.snapshot.neutralize();
        }
        (&self.snapshot, self.bands)
    }

    fn update_derived(&mut self) {
        let raw = band_averages(&self.snapshot.frequency_bins);
        self.bands
            .smooth_toward(&raw, self.config.band_smoothing, self.config.overall_smoothing);
        self.features = self
            .analyzer
            .as_mut()
            .and_then(|a| a.extract(&self.snapshot))
            .unwrap_or_else(|| SpectralFeatures::from_bands(&self.bands));
    }

    pub fn snapshot(&self) -> &AudioSnapshot {
        &self.snapshot
    }

    pub fn bands(&self) -> BandEnergies {
        self.bands
    }

    pub fn features(&self) -> SpectralFeatures {
        self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_split_for_1024_bins() {
        let mut bins = vec![0u8; 1024];
        bins[..153].fill(255);
        let e = band_averages(&bins);
        assert!((e.bass - 1.0).abs() < 1e-6);
        assert_eq!(e.mid, 0.0);
        assert_eq!(e.treble, 0.0);
        assert!((e.overall - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn tiny_spectrum_has_no_nan() {
        let e = band_averages(&[200]);
        assert_eq!(e.bass, 0.0);
        assert_eq!(e.mid, 0.0);
        assert!(e.treble > 0.78);
        assert!(!e.overall.is_nan());
        let empty = band_averages(&[]);
        assert_eq!(empty, BandEnergies::default());
    }
}
