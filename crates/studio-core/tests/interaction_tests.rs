// Deck gestures and the session around them: needle start/stop, scratching,
// the transport toggle, the easter egg and the code panel reset.

use glam::Vec2;
use proptest::prelude::*;
use studio_core::constants::*;
use studio_core::*;

fn studio() -> Studio<OfflineContext> {
    Studio::new(OfflineContext::new(8000.0))
}

// Needle grab point in the default 600x600 deck
const NEEDLE: Vec2 = Vec2::new(500.0, 20.0);

fn needle_to(s: &mut Studio<OfflineContext>, y: f32, out: &mut Vec<Condition>) {
    s.pointer_move(Vec2::new(500.0, y), out);
}

#[test]
fn needle_on_while_idle_starts_exactly_once() {
    let mut s = studio();
    let mut out = Vec::new();
    assert_eq!(s.pointer_down(NEEDLE), DragMode::Needle);

    needle_to(&mut s, 100.0, &mut out); // still off the record
    assert!(out.is_empty());
    needle_to(&mut s, 250.0, &mut out);
    assert_eq!(out, vec![Condition::PlaybackStarted]);
    needle_to(&mut s, 290.0, &mut out);
    needle_to(&mut s, 260.0, &mut out);
    assert_eq!(out, vec![Condition::PlaybackStarted]);
    assert_eq!(s.sessions_started(), 1);
    assert_eq!(s.backend().live_sources(), 7);
}

#[test]
fn needle_off_while_playing_stops() {
    let mut s = studio();
    let mut out = Vec::new();
    s.pointer_down(NEEDLE);
    needle_to(&mut s, 280.0, &mut out);
    needle_to(&mut s, 10.0, &mut out);
    assert_eq!(out, vec![Condition::PlaybackStarted, Condition::PlaybackStopped]);
    assert!(!s.is_playing());
    assert_eq!(s.backend().live_sources(), 0);
    assert_eq!(s.backend().active_sequences(), 0);
}

#[test]
fn pointer_up_keeps_play_state() {
    let mut s = studio();
    let mut out = Vec::new();
    s.pointer_down(NEEDLE);
    needle_to(&mut s, 280.0, &mut out);
    s.pointer_up();
    assert!(s.is_playing());
    assert_eq!(s.deck().drag(), DragMode::None);
    // Moves after release do nothing
    needle_to(&mut s, 0.0, &mut out);
    assert!(s.is_playing());
}

#[test]
fn needle_on_while_transport_playing_does_not_restart() {
    let mut s = studio();
    let mut out = Vec::new();
    s.toggle_playback(&mut out);
    s.pointer_down(NEEDLE);
    needle_to(&mut s, 280.0, &mut out);
    assert_eq!(out, vec![Condition::PlaybackStarted]);
    assert_eq!(s.sessions_started(), 1);
}

#[test]
fn failed_start_reports_unavailable_and_stays_idle() {
    let mut s = studio();
    s.backend_mut().set_available(false);
    let mut out = Vec::new();
    s.pointer_down(NEEDLE);
    needle_to(&mut s, 280.0, &mut out);
    assert_eq!(out, vec![Condition::AudioUnavailable]);
    assert!(!s.is_playing());
    assert!(s.deck().needle_on_record());

    // Retry once the device is back: lift and drop the needle again
    s.backend_mut().set_available(true);
    out.clear();
    needle_to(&mut s, 0.0, &mut out);
    needle_to(&mut s, 280.0, &mut out);
    assert_eq!(out, vec![Condition::PlaybackStarted]);
}

#[test]
fn record_drag_scratches_master_gain() {
    let mut s = studio();
    let mut out = Vec::new();
    s.toggle_playback(&mut out);
    assert_eq!(s.pointer_down(Vec2::new(300.0, 300.0)), DragMode::Record);
    s.pointer_move(Vec2::new(330.0, 300.0), &mut out);

    let master = s.voices().unwrap().master_gain();
    // speed 3 -> +0.15 on the 0.15 baseline
    assert!((s.backend().param_value(master) - 0.3).abs() < 1e-6);
    assert!((s.deck().rotation_deg() - 15.0).abs() < 1e-6);

    s.backend_mut().advance(0.2);
    assert!((s.backend().param_value(master) - MASTER_BASELINE_GAIN).abs() < 1e-3);
}

#[test]
fn record_drag_while_idle_is_silent() {
    let mut s = studio();
    let mut out = Vec::new();
    s.pointer_down(Vec2::new(300.0, 300.0));
    s.pointer_move(Vec2::new(360.0, 300.0), &mut out);
    assert!(out.is_empty());
    assert_eq!(s.scratch(5.0), None);
    assert_eq!(s.deck().rotation_deg(), 0.0);
}

#[test]
fn easter_egg_cycles_every_three_clicks() {
    let mut s = studio();
    let mut out = Vec::new();
    for _ in 0..5 {
        s.record_clicked(&mut out);
    }
    assert_eq!(
        out,
        vec![
            Condition::EasterEggProgress(1),
            Condition::EasterEggProgress(2),
            Condition::EasterEggTriggered,
            Condition::EasterEggProgress(1),
            Condition::EasterEggProgress(2),
        ]
    );
    assert_eq!(s.backend().played_cues(), &[Cue::EasterEgg]);
    assert_eq!(s.easter_egg().count(), 2);
}

#[test]
fn easter_egg_stops_playback_first() {
    let mut s = studio();
    let mut out = Vec::new();
    s.toggle_playback(&mut out);
    out.clear();
    for _ in 0..EASTER_EGG_CLICKS {
        s.record_clicked(&mut out);
    }
    assert_eq!(
        &out[out.len() - 2..],
        &[Condition::PlaybackStopped, Condition::EasterEggTriggered]
    );
    assert!(!s.is_playing());
}

#[test]
fn record_clicks_route_by_region() {
    let s = studio();
    assert!(s.hits_record(Vec2::new(300.0, 300.0)));
    assert!(!s.hits_record(Vec2::new(500.0, 20.0)));
    assert!(!s.hits_record(Vec2::new(5.0, 595.0)));
}

#[test]
fn transport_toggles_without_the_needle() {
    let mut s = studio();
    let mut out = Vec::new();
    s.toggle_playback(&mut out);
    s.toggle_playback(&mut out);
    assert_eq!(out, vec![Condition::PlaybackStarted, Condition::PlaybackStopped]);
    assert!(!s.deck().needle_on_record());
}

#[test]
fn code_reset_restores_default_text() {
    let mut s = studio();
    assert!(s.editor_mut().set_text("note(\"c3\")"));
    assert!(!s.editor().is_default());
    let mut out = Vec::new();
    s.reset_code(&mut out);
    assert_eq!(out, vec![Condition::CodeReset]);
    assert_eq!(s.editor().text(), DEFAULT_CODE);
    // Editing never touches the sound
    assert!(!s.is_playing());
}

#[test]
fn condition_payloads() {
    assert_eq!(Condition::EasterEggProgress(2).payload(), Some(2));
    assert_eq!(Condition::CodeReset.payload(), None);
    assert_eq!(Condition::AudioUnavailable.name(), "audio-unavailable");
}

proptest! {
    #[test]
    fn needle_angle_stays_within_travel(ys in proptest::collection::vec(-2000.0f32..2000.0, 1..50)) {
        let mut m = InteractionStateMachine::default();
        m.pointer_down(NEEDLE);
        for y in ys {
            m.pointer_move(Vec2::new(500.0, y), false);
            let a = m.needle_angle();
            prop_assert!((NEEDLE_ANGLE_MIN..=NEEDLE_ANGLE_MAX).contains(&a));
        }
    }

    #[test]
    fn needle_events_alternate(ys in proptest::collection::vec(0.0f32..600.0, 1..80)) {
        let mut m = InteractionStateMachine::default();
        m.pointer_down(NEEDLE);
        let mut on = false;
        for y in ys {
            if let Some(DeckEvent::NeedleChanged { on_record }) = m.pointer_move(Vec2::new(500.0, y), false) {
                prop_assert_ne!(on_record, on);
                on = on_record;
            }
        }
    }
}
