//! Software analyser producing the same byte views as a browser
//! `AnalyserNode`: Blackman window, magnitude smoothing over time, decibel
//! range mapped onto 0-255, and time-domain samples centered on 128.

use crate::constants::{ANALYSER_MAX_DB, ANALYSER_MIN_DB, ANALYSER_TIME_SMOOTHING};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub struct Analyser {
    ring: Vec<f32>,
    write: usize,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    fft: Arc<dyn Fft<f32>>,
    min_db: f32,
    max_db: f32,
    smoothing: f32,
}

impl Analyser {
    pub fn new(fft_size: usize) -> Self {
        let n = fft_size.max(32).next_power_of_two();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        Self {
            ring: vec![0.0; n],
            write: 0,
            window: blackman(n),
            smoothed: vec![0.0; n / 2],
            scratch: vec![Complex::new(0.0, 0.0); n],
            fft,
            min_db: ANALYSER_MIN_DB,
            max_db: ANALYSER_MAX_DB,
            smoothing: ANALYSER_TIME_SMOOTHING,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.ring.len()
    }

    pub fn bin_count(&self) -> usize {
        self.ring.len() / 2
    }

    pub fn push(&mut self, sample: f32) {
        self.ring[self.write] = sample;
        self.write = (self.write + 1) % self.ring.len();
    }

    pub fn push_slice(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push(s);
        }
    }

    /// Oldest-first view of the analysis window.
    fn windowed(&self, i: usize) -> f32 {
        self.ring[(self.write + i) % self.ring.len()]
    }

    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        for (i, o) in out.iter_mut().take(self.ring.len()).enumerate() {
            let v = 128.0 * (1.0 + self.windowed(i));
            *o = v.clamp(0.0, 255.0) as u8;
        }
    }

    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let n = self.ring.len();
        for i in 0..n {
            self.scratch[i] = Complex::new(self.windowed(i) * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / n as f32;
        let tau = self.smoothing;
        for (k, s) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            let next = tau * *s + (1.0 - tau) * magnitude;
            *s = if next.is_finite() { next } else { 0.0 };
        }

        let range = self.max_db - self.min_db;
        for (o, &mag) in out.iter_mut().zip(self.smoothed.iter()) {
            if mag <= 0.0 {
                *o = 0;
                continue;
            }
            let db = 20.0 * mag.log10();
            let scaled = 255.0 / range * (db - self.min_db);
            *o = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

fn blackman(n: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42_f32, 0.5_f32, 0.08_f32);
    (0..n)
        .map(|i| {
            let x = std::f32::consts::TAU * i as f32 / n as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_maps_to_zero_bins_and_centered_samples() {
        let mut a = Analyser::new(2048);
        let mut freq = vec![7u8; a.bin_count()];
        let mut time = vec![0u8; a.bin_count()];
        a.byte_frequency_data(&mut freq);
        a.byte_time_domain_data(&mut time);
        assert!(freq.iter().all(|&b| b == 0));
        assert!(time.iter().all(|&b| b == 128));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let sr = 48_000.0_f32;
        let mut a = Analyser::new(2048);
        let bin = 64usize;
        let hz = bin as f32 * sr / 2048.0;
        for i in 0..2048 {
            a.push(0.5 * (std::f32::consts::TAU * hz * i as f32 / sr).sin());
        }
        let mut freq = vec![0u8; a.bin_count()];
        // Let the smoothing settle.
        for _ in 0..20 {
            a.byte_frequency_data(&mut freq);
        }
        let peak = freq
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i64 - bin as i64).abs() <= 1, "peak at {peak}");
        assert!(freq[bin] > 200);
        assert!(freq[bin * 4] < freq[bin]);
    }
}
