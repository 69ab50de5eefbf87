// Feature extraction: band split, smoothing bounds, readiness handling and
// an end-to-end pass over the rendered patch.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use studio_core::*;

/// Tap replaying scripted frames, cycling when it runs out.
struct ScriptedTap {
    frames: Vec<Vec<u8>>,
    next: usize,
    bins: usize,
}

impl ScriptedTap {
    fn new(bins: usize, frames: Vec<Vec<u8>>) -> Self {
        Self { frames, next: 0, bins }
    }
}

impl AnalysisTap for ScriptedTap {
    fn bin_count(&self) -> usize {
        self.bins
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let frame = &self.frames[self.next % self.frames.len()];
        self.next += 1;
        for (o, v) in out.iter_mut().zip(frame.iter().chain(std::iter::repeat(&0))) {
            *o = *v;
        }
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        out.fill(200);
    }
}

fn in_unit(e: &BandEnergies) -> bool {
    [e.bass, e.mid, e.treble, e.overall]
        .iter()
        .all(|v| (0.0..=1.0).contains(v) && !v.is_nan())
}

#[test]
fn band_split_matches_hand_computed_averages() {
    // 20 bins: bass is bins 0..3, mid 3..10, treble 10..20
    let bins: Vec<u8> = (0..20).map(|i| (i * 10) as u8).collect();
    let e = band_averages(&bins);
    let avg = |r: std::ops::Range<usize>| r.clone().map(|i| (i * 10) as f32).sum::<f32>() / r.len() as f32 / 255.0;
    assert!((e.bass - avg(0..3)).abs() < 1e-6);
    assert!((e.mid - avg(3..10)).abs() < 1e-6);
    assert!((e.treble - avg(10..20)).abs() < 1e-6);
    assert!((e.overall - (avg(0..3) + avg(3..10) + avg(10..20)) / 3.0).abs() < 1e-6);
}

#[test]
fn overall_weighs_bands_equally() {
    // Loud bass only: a plain mean over bins would give 0.15.
    let mut bins = vec![0u8; 100];
    bins[..15].fill(255);
    let e = band_averages(&bins);
    assert_eq!(e.bass, 1.0);
    assert_eq!(e.mid, 0.0);
    assert_eq!(e.treble, 0.0);
    assert!((e.overall - 1.0 / 3.0).abs() < 1e-6, "{e:?}");
}

#[test]
fn bands_stay_in_unit_range_over_adversarial_ticks() {
    let mut rng = StdRng::seed_from_u64(7);
    let frames: Vec<Vec<u8>> = (0..64)
        .map(|k| match k % 4 {
            0 => vec![255; 1024],
            1 => vec![0; 1024],
            _ => (0..1024).map(|_| rng.gen()).collect(),
        })
        .collect();
    let mut extractor = FeatureExtractor::with_tap(ScriptedTap::new(1024, frames), AnalysisConfig::default());
    for _ in 0..10_000 {
        let (_, bands) = extractor.sample();
        assert!(in_unit(&bands), "{bands:?}");
    }
}

#[test]
fn not_ready_yields_neutral_snapshot_and_keeps_bands() {
    let mut extractor = FeatureExtractor::with_tap(ScriptedTap::new(64, vec![vec![255; 64]]), AnalysisConfig::default());
    extractor.sample();
    extractor.sample();
    let before = extractor.bands();
    assert!(before.bass > 0.0);

    extractor.detach();
    assert!(matches!(extractor.try_sample(), Err(AnalysisError::NotReady)));
    let (snapshot, bands) = extractor.sample();
    assert!(snapshot.frequency_bins.iter().all(|&b| b == 0));
    assert!(snapshot.time_samples.iter().all(|&b| b == 128));
    assert_eq!(bands, before);
}

#[test]
fn extractor_without_tap_uses_configured_bins() {
    let mut extractor: FeatureExtractor<ScriptedTap> = FeatureExtractor::new(AnalysisConfig::default());
    let (snapshot, bands) = extractor.sample();
    assert_eq!(snapshot.len(), 1024);
    assert_eq!(bands, BandEnergies::default());
}

#[test]
fn smoothing_moves_fifteen_percent_per_tick() {
    let mut extractor = FeatureExtractor::with_tap(ScriptedTap::new(100, vec![vec![255; 100]]), AnalysisConfig::default());
    let (_, bands) = extractor.sample();
    assert!((bands.bass - 0.15).abs() < 1e-6);
    assert!((bands.overall - 0.12).abs() < 1e-6);
}

#[test]
fn analyzer_replaces_band_fallback() {
    let mut extractor = FeatureExtractor::with_tap(ScriptedTap::new(32, vec![vec![0; 32]]), AnalysisConfig::default());
    extractor.sample();
    // Fallback: silent spectrum, so no energy
    assert_eq!(extractor.features().rms, 0.0);

    extractor.set_analyzer(Box::new(BasicFeatureAnalyzer));
    extractor.sample();
    // Time samples sit at 200: (200 - 128) / 128
    assert!((extractor.features().rms - 0.5625).abs() < 1e-4);
}

#[test]
fn rendered_patch_shows_up_in_the_bass_band() {
    let ctx = OfflineContext::new(8000.0);
    let tap = ctx.tap();
    let mut studio = Studio::new(ctx);
    let mut out = Vec::new();
    assert!(studio.play(&mut out));

    let mut extractor = FeatureExtractor::with_tap(tap, AnalysisConfig::default());
    for _ in 0..30 {
        studio.backend_mut().advance(1.0 / 60.0);
        extractor.sample();
    }
    let bands = extractor.bands();
    assert!(bands.bass > 0.05, "{bands:?}");
    assert!(bands.bass > bands.treble);
    assert!(extractor.snapshot().time_samples.iter().any(|&b| b != 128));
}

proptest! {
    #[test]
    fn band_averages_are_normalized(bins in proptest::collection::vec(any::<u8>(), 0..512)) {
        let e = band_averages(&bins);
        prop_assert!(in_unit(&e));
    }

    #[test]
    fn smoothed_bands_never_leave_unit_range(
        frames in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 16), 1..8),
        ticks in 1usize..200,
    ) {
        let mut extractor = FeatureExtractor::with_tap(ScriptedTap::new(16, frames), AnalysisConfig::default());
        for _ in 0..ticks {
            let (_, bands) = extractor.sample();
            prop_assert!(in_unit(&bands));
        }
    }
}
