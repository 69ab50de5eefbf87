#![cfg(target_arch = "wasm32")]
//! Browser front-end: WebAudio synthesis, analyser-driven canvases and the
//! WebGPU shader field, wired to the deck and the transport controls.

mod audio;
mod canvas;
mod dom;
mod events;
mod frame;
mod input;
mod render;

use crate::audio::WebAudioBackend;
use crate::canvas::CanvasSurface;
use crate::events::DeckWiring;
use crate::frame::{DeckSink, FieldSink, FrameLoop, SharedScheduler, SharedStudio};
use crate::render::GpuField;
use std::cell::RefCell;
use std::rc::Rc;
use studio_core::constants::{DECK_SIZE, PARTICLE_FIELD_SIZE, SPECTROGRAM_SIZE, SPECTRUM_SIZE, WAVEFORM_SIZE};
use studio_core::{
    AnalysisConfig, DeckGeometry, FeatureExtractor, Layer, ParticleField, RenderScheduler, Spectrogram, SpectrumBars,
    Studio, WaveformTrace,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("studio-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

fn canvas_surface(document: &web::Document, id: &str, size: (u32, u32)) -> anyhow::Result<CanvasSurface> {
    let canvas = dom::element::<web::HtmlCanvasElement>(document, id)?;
    CanvasSurface::new(canvas, size.0, size.1)
}

async fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;

    // The audio context itself is created by the first play gesture.
    let studio: SharedStudio = Rc::new(RefCell::new(Studio::with_config(
        WebAudioBackend::new(),
        Default::default(),
        DeckGeometry::new(DECK_SIZE.0 as f32, DECK_SIZE.1 as f32),
    )));
    let scheduler: SharedScheduler = Rc::new(RefCell::new(RenderScheduler::new(FeatureExtractor::new(
        AnalysisConfig::default(),
    ))));

    {
        let mut sched = scheduler.borrow_mut();
        sched.register(Box::new(Layer::new(
            "spectrum",
            SpectrumBars::default(),
            canvas_surface(&document, "spectrum-canvas", SPECTRUM_SIZE)?,
        )));
        sched.register(Box::new(Layer::new(
            "waveform",
            WaveformTrace::new(),
            canvas_surface(&document, "waveform-canvas", WAVEFORM_SIZE)?,
        )));
        sched.register(Box::new(Layer::new(
            "spectrogram",
            Spectrogram::default(),
            canvas_surface(&document, "spectrogram-canvas", SPECTROGRAM_SIZE)?,
        )));
        sched.register(Box::new(Layer::new(
            "particles",
            ParticleField::default(),
            canvas_surface(&document, "particles-canvas", PARTICLE_FIELD_SIZE)?,
        )));
    }

    let deck = canvas_surface(&document, "deck-canvas", DECK_SIZE)?;
    let deck_canvas = deck.canvas().clone();
    scheduler
        .borrow_mut()
        .register(Box::new(DeckSink::new(studio.clone(), deck)));

    let gpu: Rc<RefCell<Option<GpuField>>> = Rc::new(RefCell::new(None));
    scheduler.borrow_mut().register(Box::new(FieldSink::new(gpu.clone())));

    let wiring = DeckWiring {
        document: document.clone(),
        canvas: deck_canvas,
        studio: studio.clone(),
        scheduler: scheduler.clone(),
    };
    events::wire_deck_handlers(&wiring);
    events::wire_controls(&wiring);

    let frame_loop = Rc::new(RefCell::new(Some(FrameLoop::start(scheduler.clone()))));
    wire_visibility(&document, scheduler.clone(), frame_loop);

    // WebGPU is optional; the 2D surfaces run without it.
    match dom::element::<web::HtmlCanvasElement>(&document, "field-canvas") {
        Ok(field_canvas) => {
            input::sync_canvas_backing_size(&field_canvas);
            wire_resize(field_canvas.clone());
            match GpuField::new(field_canvas).await {
                Ok(g) => *gpu.borrow_mut() = Some(g),
                Err(e) => log::error!("WebGPU init error: {:?}", e),
            }
        }
        Err(e) => log::warn!("[frame] shader field disabled: {}", e),
    }
    Ok(())
}

fn wire_resize(canvas: web::HtmlCanvasElement) {
    let Some(window) = web::window() else {
        return;
    };
    let closure = Closure::wrap(Box::new(move || {
        input::sync_canvas_backing_size(&canvas);
    }) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        .ok();
    closure.forget();
}

/// Pauses drawing while the tab is hidden; audio keeps playing.
fn wire_visibility(document: &web::Document, scheduler: SharedScheduler, frame_loop: Rc<RefCell<Option<FrameLoop>>>) {
    let doc = document.clone();
    let closure = Closure::wrap(Box::new(move || {
        let mut slot = frame_loop.borrow_mut();
        if doc.hidden() {
            if let Some(running) = slot.take() {
                running.stop();
            }
        } else if slot.is_none() {
            *slot = Some(FrameLoop::start(scheduler.clone()));
        }
    }) as Box<dyn FnMut()>);
    document
        .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())
        .ok();
    closure.forget();
}
