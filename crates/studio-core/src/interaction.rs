//! Turntable gestures: needle drags switch playback, record drags scratch.
//!
//! The state machine is pure. It reports [`DeckEvent`]s and leaves acting on
//! them (starting, stopping, modulating the patch) to the session.

use crate::constants::*;
use crate::render::DeckVisual;
use glam::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    None,
    Needle,
    Record,
}

/// Hit regions of the deck, in the same pixel space as pointer positions.
#[derive(Clone, Debug, PartialEq)]
pub struct DeckGeometry {
    pub width: f32,
    pub height: f32,
    pub needle_region_x: f32,
    pub needle_region_y: f32,
    pub record_radius_frac: f32,
}

impl DeckGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width, self.height) / 2.0
    }

    pub fn in_needle_region(&self, p: Vec2) -> bool {
        p.x > self.width * self.needle_region_x && p.y < self.height * self.needle_region_y
    }

    pub fn on_record(&self, p: Vec2) -> bool {
        p.distance(self.center()) < self.width * self.record_radius_frac
    }

    /// Needle angle for a pointer at height `y`, clamped to the arm's travel.
    pub fn needle_angle_at(&self, y: f32) -> f32 {
        let span = (self.height * self.needle_region_y).max(f32::EPSILON);
        let sweep = NEEDLE_ANGLE_MAX - NEEDLE_ANGLE_MIN;
        let angle = y / span * sweep + NEEDLE_ANGLE_MIN;
        if angle.is_nan() {
            return NEEDLE_ANGLE_MIN;
        }
        angle.clamp(NEEDLE_ANGLE_MIN, NEEDLE_ANGLE_MAX)
    }
}

impl Default for DeckGeometry {
    fn default() -> Self {
        Self {
            width: DECK_SIZE.0 as f32,
            height: DECK_SIZE.1 as f32,
            needle_region_x: NEEDLE_REGION_X,
            needle_region_y: NEEDLE_REGION_Y,
            record_radius_frac: RECORD_RADIUS_FRAC,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeckEvent {
    /// The needle crossed the on-record threshold.
    NeedleChanged { on_record: bool },
    /// Signed scratch speed; the sign follows the horizontal direction.
    Scratch { speed: f32 },
}

#[derive(Clone, Debug)]
pub struct InteractionStateMachine {
    geometry: DeckGeometry,
    needle_angle: f32,
    drag: DragMode,
    last_pointer: Vec2,
    rotation_deg: f32,
}

impl InteractionStateMachine {
    pub fn new(geometry: DeckGeometry) -> Self {
        Self {
            geometry,
            needle_angle: NEEDLE_ANGLE_MIN,
            drag: DragMode::None,
            last_pointer: Vec2::ZERO,
            rotation_deg: 0.0,
        }
    }

    pub fn geometry(&self) -> &DeckGeometry {
        &self.geometry
    }

    pub fn needle_angle(&self) -> f32 {
        self.needle_angle
    }

    pub fn needle_on_record(&self) -> bool {
        self.needle_angle > NEEDLE_ON_RECORD_ABOVE
    }

    pub fn drag(&self) -> DragMode {
        self.drag
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    pub fn visual(&self, playing: bool) -> DeckVisual {
        DeckVisual {
            needle_angle: self.needle_angle,
            rotation_deg: self.rotation_deg,
            playing,
        }
    }

    /// Starts a needle or record drag. A press while already dragging, or
    /// outside both regions, changes nothing.
    pub fn pointer_down(&mut self, pos: Vec2) -> DragMode {
        if self.drag != DragMode::None {
            return self.drag;
        }
        if self.geometry.in_needle_region(pos) {
            self.drag = DragMode::Needle;
        } else if self.geometry.on_record(pos) {
            self.drag = DragMode::Record;
            self.last_pointer = pos;
        }
        if self.drag != DragMode::None {
            log::debug!("[gesture] {:?} drag at ({:.0}, {:.0})", self.drag, pos.x, pos.y);
        }
        self.drag
    }

    pub fn pointer_move(&mut self, pos: Vec2, playing: bool) -> Option<DeckEvent> {
        match self.drag {
            DragMode::None => None,
            DragMode::Needle => {
                let was_on = self.needle_on_record();
                self.needle_angle = self.geometry.needle_angle_at(pos.y);
                let on = self.needle_on_record();
                (on != was_on).then_some(DeckEvent::NeedleChanged { on_record: on })
            }
            DragMode::Record if playing => {
                let delta = pos - self.last_pointer;
                self.last_pointer = pos;
                self.rotation_deg += delta.x * ROTATION_DEG_PER_PX;
                let direction = if delta.x > 0.0 {
                    1.0
                } else if delta.x < 0.0 {
                    -1.0
                } else {
                    0.0
                };
                let speed = delta.length() / SCRATCH_SPEED_DIVISOR;
                Some(DeckEvent::Scratch { speed: speed * direction })
            }
            DragMode::Record => None,
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragMode::None;
    }
}

impl Default for InteractionStateMachine {
    fn default() -> Self {
        Self::new(DeckGeometry::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EggOutcome {
    /// Clicks counted so far.
    Progress(u32),
    Triggered,
}

/// Counts record clicks; every `threshold`-th click triggers and resets.
#[derive(Clone, Debug)]
pub struct EasterEggCounter {
    count: u32,
    threshold: u32,
}

impl EasterEggCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn click(&mut self) -> EggOutcome {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            EggOutcome::Triggered
        } else {
            EggOutcome::Progress(self.count)
        }
    }
}

impl Default for EasterEggCounter {
    fn default() -> Self {
        Self::new(EASTER_EGG_CLICKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needle_region_wins_over_record() {
        let mut m = InteractionStateMachine::default();
        // Inside both the needle corner and the record radius.
        assert_eq!(m.pointer_down(Vec2::new(430.0, 290.0)), DragMode::Needle);
    }

    #[test]
    fn press_while_dragging_is_ignored() {
        let mut m = InteractionStateMachine::default();
        assert_eq!(m.pointer_down(Vec2::new(300.0, 300.0)), DragMode::Record);
        assert_eq!(m.pointer_down(Vec2::new(550.0, 50.0)), DragMode::Record);
        m.pointer_up();
        assert_eq!(m.drag(), DragMode::None);
    }

    #[test]
    fn scratch_is_signed_by_horizontal_direction() {
        let mut m = InteractionStateMachine::default();
        m.pointer_down(Vec2::new(300.0, 300.0));
        let Some(DeckEvent::Scratch { speed }) = m.pointer_move(Vec2::new(270.0, 340.0), true) else {
            panic!("expected a scratch");
        };
        assert!((speed + 5.0).abs() < 1e-5);
        assert!((m.rotation_deg() + 15.0).abs() < 1e-5);
    }

    #[test]
    fn idle_record_drag_has_no_effect() {
        let mut m = InteractionStateMachine::default();
        m.pointer_down(Vec2::new(300.0, 300.0));
        assert_eq!(m.pointer_move(Vec2::new(350.0, 300.0), false), None);
        assert_eq!(m.rotation_deg(), 0.0);
    }
}
