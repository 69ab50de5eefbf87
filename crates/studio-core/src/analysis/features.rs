use super::{AudioSnapshot, BandEnergies};

/// Scalar features of one snapshot.
///
/// `spectral_centroid` is expressed as a fraction of the bin range, `rms` is
/// computed over the waveform in -1..1 and `energy` is its sum of squares
/// divided by the sample count.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectralFeatures {
    pub spectral_centroid: f32,
    pub rms: f32,
    pub energy: f32,
}

impl SpectralFeatures {
    /// Estimate used when no analyzer is installed or it declines a frame.
    pub fn from_bands(bands: &BandEnergies) -> Self {
        let weight = bands.bass + bands.mid + bands.treble;
        let spectral_centroid = if weight > 0.0 {
            // Band midpoints of the 15% / 50% split.
            (bands.bass * 0.075 + bands.mid * 0.325 + bands.treble * 0.75) / weight
        } else {
            0.0
        };
        Self {
            spectral_centroid,
            rms: bands.overall,
            energy: bands.overall * bands.overall,
        }
    }
}

/// Optional feature extraction capability. Returning `None` makes the
/// extractor fall back to [`SpectralFeatures::from_bands`].
pub trait FeatureAnalyzer {
    fn extract(&mut self, snapshot: &AudioSnapshot) -> Option<SpectralFeatures>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFeatureAnalyzer;

impl FeatureAnalyzer for BasicFeatureAnalyzer {
    fn extract(&mut self, snapshot: &AudioSnapshot) -> Option<SpectralFeatures> {
        if snapshot.time_samples.is_empty() {
            return None;
        }
        let n = snapshot.time_samples.len() as f32;
        let sum_sq: f32 = snapshot
            .time_samples
            .iter()
            .map(|&b| {
                let x = (b as f32 - 128.0) / 128.0;
                x * x
            })
            .sum();
        let energy = sum_sq / n;

        let (weighted, total) = snapshot
            .frequency_bins
            .iter()
            .enumerate()
            .fold((0.0f32, 0.0f32), |(w, t), (k, &m)| (w + k as f32 * m as f32, t + m as f32));
        let spectral_centroid = if total > 0.0 {
            weighted / total / snapshot.frequency_bins.len() as f32
        } else {
            0.0
        };

        Some(SpectralFeatures {
            spectral_centroid,
            rms: energy.sqrt(),
            energy,
        })
    }
}
