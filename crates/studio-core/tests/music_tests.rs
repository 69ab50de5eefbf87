// Pitch helpers, oscillator shapes and the arpeggiator.

use studio_core::*;

#[test]
fn midi_to_hz_matches_a4_and_octave() {
    let a4 = midi_to_hz(69.0);
    assert!((a4 - 440.0).abs() < 1e-4);
    let a5 = midi_to_hz(81.0);
    assert!((a5 - 880.0).abs() < 1e-3);
    assert!((a5 / a4 - 2.0).abs() < 1e-4);
}

#[test]
fn midi_to_hz_is_monotonic_over_range() {
    let mut prev = midi_to_hz(20.0);
    for m in 21..=100 {
        let f = midi_to_hz(m as f32);
        assert!(f > prev, "frequency not increasing at midi {m}");
        prev = f;
    }
}

#[test]
fn patch_notes_land_on_expected_pitches() {
    assert!((midi_to_hz(BASS_NOTE) - 65.41).abs() < 0.01);
    assert!((midi_to_hz(PAD_NOTES[0]) - 523.25).abs() < 0.01);
    assert!((midi_to_hz(PAD_NOTES[1]) - 659.25).abs() < 0.01);
    assert!((midi_to_hz(SHIMMER_NOTE) - 1046.5).abs() < 0.01);
}

#[test]
fn scale_frequencies_follow_degrees() {
    let f = scale_frequencies(MELODY_ROOT, C_MAJOR_PENTATONIC);
    assert_eq!(f.len(), 5);
    // Last degree is the octave
    assert!((f[4] / f[0] - 2.0).abs() < 1e-4);
    assert!(f.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn waveforms_stay_in_unit_range() {
    for wf in [Waveform::Sine, Waveform::Square, Waveform::Saw, Waveform::Triangle] {
        for i in 0..100 {
            let v = wf.sample(i as f64 / 37.0);
            assert!((-1.0..=1.0).contains(&v), "{wf:?} out of range: {v}");
        }
    }
    assert_eq!(Waveform::Square.sample(0.25), 1.0);
    assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
    assert_eq!(Waveform::Saw.sample(0.0), -1.0);
}

#[test]
fn arpeggiator_wraps_around() {
    let mut arp = Arpeggiator::new(&[1.0, 2.0, 3.0], 0.25);
    assert_eq!(arp.current(), Some(1.0));
    let seq: Vec<f32> = (0..4).filter_map(|_| arp.next_note()).collect();
    assert_eq!(seq, vec![2.0, 3.0, 1.0, 2.0]);
}

#[test]
fn arpeggiator_tick_accumulates_time() {
    let mut arp = Arpeggiator::new(&[1.0, 2.0, 3.0], 0.25);
    assert_eq!(arp.tick(0.1), None);
    assert_eq!(arp.tick(0.1), None);
    assert_eq!(arp.tick(0.1), Some(2.0));
    // Two intervals at once collapse into the later note
    assert_eq!(arp.tick(0.5), Some(1.0));
}

#[test]
fn empty_arpeggiator_is_silent() {
    let mut arp = Arpeggiator::new(&[], 0.25);
    assert_eq!(arp.current(), None);
    assert_eq!(arp.next_note(), None);
    assert_eq!(arp.tick(1.0), None);
}
