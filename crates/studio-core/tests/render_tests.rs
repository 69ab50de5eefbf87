// Scheduler contract and renderer output against the recording surface.

use glam::Vec2;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use studio_core::*;

type CallLog = Rc<RefCell<Vec<&'static str>>>;

struct Probe {
    name: &'static str,
    log: CallLog,
    fail: bool,
}

impl FrameSink for Probe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn draw(&mut self, _frame: &FrameInput<'_>) -> Result<(), RenderError> {
        self.log.borrow_mut().push(self.name);
        if self.fail {
            return Err(RenderError::Surface("probe failure".into()));
        }
        Ok(())
    }
}

fn scheduler() -> RenderScheduler<OfflineTap> {
    RenderScheduler::new(FeatureExtractor::new(AnalysisConfig::default()))
}

fn probe(name: &'static str, log: &CallLog, fail: bool) -> Box<dyn FrameSink> {
    Box::new(Probe {
        name,
        log: log.clone(),
        fail,
    })
}

fn frame(snapshot: &AudioSnapshot, bands: BandEnergies, time_sec: f64) -> FrameInput<'_> {
    FrameInput {
        snapshot,
        bands,
        features: SpectralFeatures::from_bands(&bands),
        time_sec,
        dt_sec: 1.0 / 60.0,
        frame_index: 0,
    }
}

#[test]
fn sinks_run_in_registration_order() {
    let log = CallLog::default();
    let mut sched = scheduler();
    for name in ["spectrum", "waveform", "spectrogram"] {
        sched.register(probe(name, &log, false));
    }
    let token = sched.start();
    assert_eq!(sched.tick(&token, 0.0), TickOutcome::Rendered { failures: 0 });
    assert_eq!(*log.borrow(), vec!["spectrum", "waveform", "spectrogram"]);
}

#[test]
fn stopped_loop_makes_no_renderer_calls() {
    let log = CallLog::default();
    let mut sched = scheduler();
    sched.register(probe("a", &log, false));
    let token = sched.start();
    sched.tick(&token, 0.0);
    sched.stop();
    assert!(token.is_cancelled());
    assert_eq!(sched.tick(&token, 0.016), TickOutcome::Cancelled);
    assert_eq!(log.borrow().len(), 1);
    // Stopping twice is harmless
    sched.stop();
    assert!(!sched.is_running());
}

#[test]
fn failing_sink_is_isolated() {
    let log = CallLog::default();
    let mut sched = scheduler();
    sched.register(probe("first", &log, false));
    sched.register(probe("broken", &log, true));
    sched.register(probe("last", &log, false));
    let token = sched.start();
    for i in 0..3 {
        assert_eq!(sched.tick(&token, i as f64 / 60.0), TickOutcome::Rendered { failures: 1 });
    }
    assert_eq!(log.borrow().iter().filter(|n| **n == "last").count(), 3);
    assert_eq!(sched.frames_rendered(), 3);
}

#[test]
fn restart_cancels_the_previous_run() {
    let log = CallLog::default();
    let mut sched = scheduler();
    sched.register(probe("a", &log, false));
    let first = sched.start();
    let second = sched.start();
    assert!(first.is_cancelled());
    assert_eq!(sched.tick(&first, 0.0), TickOutcome::Cancelled);
    assert_eq!(sched.tick(&second, 0.0), TickOutcome::Rendered { failures: 0 });
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn gpu_layer_failure_recovers_next_frame() {
    let mut sched = scheduler();
    let mut surface = Recorder::new(640.0, 480.0);
    surface.fail_next_field(RenderError::Gpu("lost device".into()));
    let field = Rc::new(RefCell::new(Layer::new("field", ShaderField::new(), surface)));
    sched.register(Box::new(field.clone()));
    let token = sched.start();
    assert_eq!(sched.tick(&token, 0.0), TickOutcome::Rendered { failures: 1 });
    assert_eq!(sched.tick(&token, 0.016), TickOutcome::Rendered { failures: 0 });
    let layer = field.borrow();
    assert_eq!(layer.surface().ops().len(), 1);
    // Time advanced on both frames even though the first draw failed
    assert!((layer.renderer().uniforms().time - 0.1).abs() < 1e-6);
}

#[test]
fn shader_field_smooths_on_top_of_bands() {
    let snapshot = AudioSnapshot::neutral(8);
    let bands = BandEnergies {
        bass: 1.0,
        mid: 0.5,
        treble: 0.0,
        overall: 1.0,
    };
    let mut field = ShaderField::new();
    let mut surface = Recorder::new(300.0, 200.0);
    field.render(&frame(&snapshot, bands, 0.0), &mut surface).unwrap();
    let u = *field.uniforms();
    assert!((u.bass - 0.15).abs() < 1e-6);
    assert!((u.mid - 0.075).abs() < 1e-6);
    assert!((u.energy - 0.12).abs() < 1e-6);
    assert_eq!(u.resolution, [300.0, 200.0]);
    assert_eq!(bytemuck::bytes_of(&u).len(), 32);
}

#[test]
fn waveform_spans_width_and_closes_at_center() {
    let mut trace = WaveformTrace::new();
    let samples = vec![128u8; 1024];
    let points = trace.trace(&samples, 800.0, 120.0);
    assert_eq!(points.len(), 1025);
    assert_eq!(points[0], Vec2::new(0.0, 60.0));
    assert_eq!(*points.last().unwrap(), Vec2::new(800.0, 60.0));
    assert!(points.iter().all(|p| p.y == 60.0));
}

#[test]
fn waveform_draws_background_then_line() {
    let snapshot = AudioSnapshot::neutral(16);
    let mut trace = WaveformTrace::new();
    let mut surface = Recorder::new(800.0, 120.0);
    trace
        .render(&frame(&snapshot, BandEnergies::default(), 0.0), &mut surface)
        .unwrap();
    let ops = surface.ops();
    assert!(matches!(ops[0], DrawOp::FillRect { w, h, .. } if w == 800.0 && h == 120.0));
    assert!(matches!(&ops[1], DrawOp::StrokePolyline { width, .. } if *width == 2.0));
}

#[test]
fn spectrum_glows_only_loud_bars() {
    let mut snapshot = AudioSnapshot::neutral(1024);
    snapshot.frequency_bins[0] = 255;
    snapshot.frequency_bins[16] = 100;
    let mut bars = SpectrumBars::default();
    let mut surface = Recorder::new(800.0, 140.0);
    bars.render(&frame(&snapshot, BandEnergies::default(), 0.0), &mut surface)
        .unwrap();
    assert_eq!(surface.count(|op| matches!(op, DrawOp::FillRectGradient { .. })), 2);
    // One glow on, one glow off
    assert_eq!(surface.count(|op| matches!(op, DrawOp::Glow { .. })), 2);
}

#[test]
fn spectrogram_evicts_oldest_first() {
    let mut s = Spectrogram::new(3);
    for tag in 0..5u8 {
        s.push(&[tag; 4]);
    }
    let tags: Vec<u8> = s.history().map(|c| c[0]).collect();
    assert_eq!(tags, vec![2, 3, 4]);
}

#[test]
fn quiet_particles_skip_rings_and_links() {
    let snapshot = AudioSnapshot::neutral(8);
    let mut field = ParticleField::default();
    let mut surface = Recorder::new(800.0, 800.0);
    field
        .render(&frame(&snapshot, BandEnergies::default(), 0.0), &mut surface)
        .unwrap();
    assert_eq!(surface.count(|op| matches!(op, DrawOp::StrokeCircle { .. })), 0);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::StrokeLine { .. })), 0);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::FillCircle { .. })), 100);
}

#[test]
fn loud_particles_draw_rings_and_every_close_pair() {
    let snapshot = AudioSnapshot::neutral(8);
    let bands = BandEnergies {
        overall: 0.5,
        ..BandEnergies::default()
    };
    let mut field = ParticleField::default();
    let mut surface = Recorder::new(800.0, 800.0);
    field.render(&frame(&snapshot, bands, 1.0), &mut surface).unwrap();

    assert_eq!(surface.count(|op| matches!(op, DrawOp::StrokeCircle { .. })), 3);
    let state = field.state().unwrap();
    let mut pairs = 0;
    for_each_link(&state.positions, 100.0, |_, _, _| pairs += 1);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::StrokeLine { .. })), pairs);
    assert!(state.hues.iter().all(|&h| (h - 200.0).abs() < 1e-4));
}

#[test]
fn particle_seeding_is_reproducible() {
    let a = ParticleState::seeded(50, 800.0, 800.0, 42);
    let b = ParticleState::seeded(50, 800.0, 800.0, 42);
    assert_eq!(a.positions, b.positions);
    assert!(a.sizes.iter().all(|&s| (1.0..3.0).contains(&s)));
    assert!(a.velocities.iter().all(|v| v.x.abs() <= 0.25 && v.y.abs() <= 0.25));
}

#[test]
fn deck_glows_and_spins_only_while_playing() {
    let mut deck = DeckView::new();
    let mut surface = Recorder::new(600.0, 600.0);
    deck.draw(0.5, &mut surface);
    assert_eq!(deck.angle_deg(), 0.0);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::Glow { .. })), 0);

    surface.clear();
    deck.set_visual(DeckVisual {
        playing: true,
        ..DeckVisual::default()
    });
    deck.draw(0.5, &mut surface);
    assert!((deck.angle_deg() - 90.0).abs() < 1e-4);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::Glow { .. })), 2);
    // Grooves plus the glow ring
    assert_eq!(surface.count(|op| matches!(op, DrawOp::StrokeCircle { .. })), 51);
}

#[test]
fn deck_record_leaves_a_fixed_margin() {
    let mut deck = DeckView::new();
    let mut surface = Recorder::new(600.0, 600.0);
    deck.draw(0.0, &mut surface);
    let body = surface.ops().iter().find_map(|op| match op {
        DrawOp::FillCircleGradient { center, radius, .. } => Some((*center, *radius)),
        _ => None,
    });
    let (center, radius) = body.expect("record body drawn");
    assert_eq!(center, Vec2::new(300.0, 300.0));
    assert!((radius - 280.0).abs() < 1e-4);
}

proptest! {
    #[test]
    fn spectrogram_never_exceeds_capacity(cap in 1usize..40, pushes in 0usize..200) {
        let mut s = Spectrogram::new(cap);
        for i in 0..pushes {
            s.push(&[(i % 256) as u8; 2]);
            prop_assert!(s.len() <= cap);
        }
        prop_assert_eq!(s.len(), pushes.min(cap));
        let oldest = s.history().next().map(|first| first[0] as usize);
        if let Some(oldest) = oldest {
            prop_assert_eq!(oldest, (pushes - s.len()) % 256);
        }
    }
}
