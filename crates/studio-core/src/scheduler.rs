use crate::analysis::{AnalysisTap, AudioSnapshot, BandEnergies, FeatureExtractor, SpectralFeatures};
use crate::error::{RenderError, SchedulerError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared cancellation flag of one render loop run.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    fn same_run(&self, other: &CancelToken) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// What every renderer receives for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub snapshot: &'a AudioSnapshot,
    pub bands: BandEnergies,
    pub features: SpectralFeatures,
    pub time_sec: f64,
    pub dt_sec: f32,
    pub frame_index: u64,
}

/// Anything the scheduler can draw each frame.
pub trait FrameSink {
    fn name(&self) -> &'static str;
    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError>;
}

impl<T: FrameSink + ?Sized> FrameSink for Rc<RefCell<T>> {
    fn name(&self) -> &'static str {
        self.borrow().name()
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError> {
        self.borrow_mut().draw(frame)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered { failures: usize },
    Cancelled,
}

/// Drives every registered sink from one extractor sample per frame.
pub struct RenderScheduler<T> {
    extractor: FeatureExtractor<T>,
    sinks: Vec<Box<dyn FrameSink>>,
    token: Option<CancelToken>,
    last_time: Option<f64>,
    frame_index: u64,
}

impl<T: AnalysisTap> RenderScheduler<T> {
    pub fn new(extractor: FeatureExtractor<T>) -> Self {
        Self {
            extractor,
            sinks: Vec::new(),
            token: None,
            last_time: None,
            frame_index: 0,
        }
    }

    /// Sinks run in registration order.
    pub fn register(&mut self, sink: Box<dyn FrameSink>) {
        log::info!("[frame] registered {}", sink.name());
        self.sinks.push(sink);
    }

    pub fn extractor(&self) -> &FeatureExtractor<T> {
        &self.extractor
    }

    pub fn extractor_mut(&mut self) -> &mut FeatureExtractor<T> {
        &mut self.extractor
    }

    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Begins a run. Starting while running cancels the previous run first,
    /// so there is never more than one live loop.
    pub fn start(&mut self) -> CancelToken {
        if self.is_running() {
            log::warn!("[frame] {}; restarting", SchedulerError::AlreadyRunning);
            self.stop();
        }
        let token = CancelToken::new();
        self.token = Some(token.clone());
        self.last_time = None;
        token
    }

    /// Cancels the current run. No-op when idle.
    pub fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// One frame: sample the extractor once, then draw every sink with the
    /// same input. A failing sink is logged and skipped for this frame only.
    pub fn tick(&mut self, token: &CancelToken, now_sec: f64) -> TickOutcome {
        let live = matches!(&self.token, Some(t) if t.same_run(token) && !token.is_cancelled());
        if !live {
            return TickOutcome::Cancelled;
        }

        let dt = self.last_time.map_or(0.0, |last| (now_sec - last).max(0.0)) as f32;
        self.last_time = Some(now_sec);

        self.extractor.sample();
        let frame = FrameInput {
            snapshot: self.extractor.snapshot(),
            bands: self.extractor.bands(),
            features: self.extractor.features(),
            time_sec: now_sec,
            dt_sec: dt,
            frame_index: self.frame_index,
        };
        let mut failures = 0;
        for sink in &mut self.sinks {
            if let Err(e) = sink.draw(&frame) {
                failures += 1;
                log::warn!("[frame] {} failed: {}", sink.name(), e);
            }
        }
        self.frame_index += 1;
        TickOutcome::Rendered { failures }
    }
}
