use crate::audio::{WebAudioBackend, WebTap};
use crate::canvas::CanvasSurface;
use crate::render::GpuField;
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use studio_core::{
    DeckView, FrameInput, FrameSink, Layer, RenderError, RenderScheduler, Renderer, ShaderField, Studio, TickOutcome,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub type SharedStudio = Rc<RefCell<Studio<WebAudioBackend>>>;
pub type SharedScheduler = Rc<RefCell<RenderScheduler<WebTap>>>;

/// Deck layer that picks up the session's needle, rotation and play state
/// right before drawing.
pub struct DeckSink {
    studio: SharedStudio,
    layer: Layer<DeckView, CanvasSurface>,
}

impl DeckSink {
    pub fn new(studio: SharedStudio, surface: CanvasSurface) -> Self {
        Self {
            studio,
            layer: Layer::new("deck", DeckView::new(), surface),
        }
    }
}

impl FrameSink for DeckSink {
    fn name(&self) -> &'static str {
        "deck"
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError> {
        let visual = self.studio.borrow().deck_visual();
        self.layer.renderer_mut().set_visual(visual);
        self.layer.draw(frame)
    }
}

/// Shader field whose GPU target arrives asynchronously; frames before that
/// are skipped.
pub struct FieldSink {
    field: ShaderField,
    gpu: Rc<RefCell<Option<GpuField>>>,
}

impl FieldSink {
    pub fn new(gpu: Rc<RefCell<Option<GpuField>>>) -> Self {
        Self {
            field: ShaderField::new(),
            gpu,
        }
    }
}

impl FrameSink for FieldSink {
    fn name(&self) -> &'static str {
        "field"
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), RenderError> {
        match self.gpu.borrow_mut().as_mut() {
            Some(gpu) => self.field.render(frame, gpu),
            None => Ok(()),
        }
    }
}

/// Attaches the browser analyser to the extractor once a context exists.
pub fn attach_tap(studio: &SharedStudio, scheduler: &SharedScheduler) {
    let mut sched = scheduler.borrow_mut();
    if sched.extractor().is_ready() {
        return;
    }
    if let Some(analyser) = studio.borrow().backend().analyser() {
        sched.extractor_mut().attach(WebTap::new(analyser));
        log::info!("[analysis] analyser tap attached");
    }
}

/// `requestAnimationFrame` driver for one scheduler run. Dropping the handle
/// does not stop the loop; call [`FrameLoop::stop`].
pub struct FrameLoop {
    scheduler: SharedScheduler,
    pending: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    pub fn start(scheduler: SharedScheduler) -> Self {
        let token = scheduler.borrow_mut().start();
        let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let origin = Instant::now();

        let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let tick_clone = tick.clone();
        let sched_tick = scheduler.clone();
        let pending_tick = pending.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            pending_tick.set(None);
            let now = origin.elapsed().as_secs_f64();
            match sched_tick.borrow_mut().tick(&token, now) {
                TickOutcome::Cancelled => {
                    log::info!("[frame] loop cancelled");
                    return;
                }
                TickOutcome::Rendered { failures } if failures > 0 => {
                    log::debug!("[frame] {} sink(s) failed this frame", failures);
                }
                TickOutcome::Rendered { .. } => {}
            }
            if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
                if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    pending_tick.set(Some(id));
                }
            }
        }) as Box<dyn FnMut()>));

        if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
            if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                pending.set(Some(id));
            }
        }
        log::info!("[frame] loop started");
        Self { scheduler, pending }
    }

    /// Cancels the run and any queued frame. The queued callback, if the
    /// browser still fires it, sees the cancelled token and draws nothing.
    pub fn stop(&self) {
        self.scheduler.borrow_mut().stop();
        if let (Some(w), Some(id)) = (web::window(), self.pending.take()) {
            let _ = w.cancel_animation_frame(id);
        }
    }
}
