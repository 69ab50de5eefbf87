//! Automation timeline for a single audio parameter.
//!
//! Mirrors the subset of WebAudio `AudioParam` automation the synthesis graph
//! uses: immediate value, set-at-time, linear ramp and cancellation.

#[derive(Clone, Copy, Debug, PartialEq)]
enum Automation {
    Set {
        time: f64,
        value: f32,
    },
    Ramp {
        start_time: f64,
        start_value: f32,
        end_time: f64,
        end_value: f32,
    },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. } => time,
            Automation::Ramp { end_time, .. } => end_time,
        }
    }

    fn end_value(&self) -> f32 {
        match *self {
            Automation::Set { value, .. } => value,
            Automation::Ramp { end_value, .. } => end_value,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParamTimeline {
    intrinsic: f32,
    events: Vec<Automation>,
}

impl ParamTimeline {
    pub fn new(value: f32) -> Self {
        Self {
            intrinsic: value,
            events: Vec::new(),
        }
    }

    /// Value used when no automation event applies.
    pub fn set_value(&mut self, value: f32) {
        self.intrinsic = value;
    }

    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.insert(Automation::Set { time, value });
    }

    /// Ramps linearly from the preceding event (or from the value at `now`
    /// when there is none) to `value` at `end_time`.
    pub fn linear_ramp_to(&mut self, value: f32, end_time: f64, now: f64) {
        let (start_time, start_value) = match self.events.iter().rev().find(|e| e.time() <= end_time) {
            Some(prev) => (prev.time(), prev.end_value()),
            None => (now, self.value_at(now)),
        };
        self.insert(Automation::Ramp {
            start_time,
            start_value,
            end_time,
            end_value: value,
        });
    }

    /// Drops every event scheduled at or after `from`.
    pub fn cancel_scheduled(&mut self, from: f64) {
        self.events.retain(|e| e.time() < from);
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let mut value = self.intrinsic;
        for event in &self.events {
            match *event {
                Automation::Set { time, value: v } => {
                    if time > t {
                        break;
                    }
                    value = v;
                }
                Automation::Ramp {
                    start_time,
                    start_value,
                    end_time,
                    end_value,
                } => {
                    if t >= end_time {
                        value = end_value;
                        continue;
                    }
                    if t >= start_time {
                        let span = (end_time - start_time).max(f64::EPSILON);
                        let frac = ((t - start_time) / span) as f32;
                        value = start_value + (end_value - start_value) * frac;
                    }
                    break;
                }
            }
        }
        value
    }

    /// Collapses events that can no longer influence values at or after `now`.
    pub fn compact(&mut self, now: f64) {
        let passed = self.events.iter().take_while(|e| e.time() <= now).count();
        if passed == 0 {
            return;
        }
        // Later ramps carry their own start point, so the settled value is all
        // that needs to survive.
        let settled = self.value_at(now);
        self.events.drain(..passed);
        self.intrinsic = settled;
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn insert(&mut self, event: Automation) {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_starts_from_preceding_set() {
        let mut p = ParamTimeline::new(0.15);
        p.cancel_scheduled(1.0);
        p.set_value_at(0.3, 1.0);
        p.linear_ramp_to(0.15, 1.1, 1.0);
        assert!((p.value_at(1.0) - 0.3).abs() < 1e-6);
        assert!((p.value_at(1.05) - 0.225).abs() < 1e-4);
        assert!((p.value_at(1.1) - 0.15).abs() < 1e-6);
        assert!((p.value_at(5.0) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn value_before_first_event_is_intrinsic() {
        let mut p = ParamTimeline::new(440.0);
        p.set_value_at(220.0, 2.0);
        assert_eq!(p.value_at(1.0), 440.0);
        assert_eq!(p.value_at(2.0), 220.0);
    }

    #[test]
    fn cancel_drops_future_events_only() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at(1.0, 1.0);
        p.set_value_at(2.0, 3.0);
        p.cancel_scheduled(2.0);
        assert_eq!(p.pending_events(), 1);
        assert_eq!(p.value_at(10.0), 1.0);
    }

    #[test]
    fn compact_keeps_in_flight_ramp() {
        let mut p = ParamTimeline::new(0.15);
        p.set_value_at(0.3, 1.0);
        p.linear_ramp_to(0.15, 1.1, 1.0);
        p.compact(1.05);
        assert_eq!(p.pending_events(), 1);
        assert!((p.value_at(1.05) - 0.225).abs() < 1e-4);
        p.compact(2.0);
        assert_eq!(p.pending_events(), 0);
        assert!((p.value_at(2.0) - 0.15).abs() < 1e-6);
    }
}
