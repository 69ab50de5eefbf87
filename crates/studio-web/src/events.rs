use crate::dom;
use crate::frame::{attach_tap, SharedScheduler, SharedStudio};
use crate::input;
use studio_core::{Condition, DragMode};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Handles shared by every deck and transport listener.
#[derive(Clone)]
pub struct DeckWiring {
    pub document: web::Document,
    pub canvas: web::HtmlCanvasElement,
    pub studio: SharedStudio,
    pub scheduler: SharedScheduler,
}

impl DeckWiring {
    /// Runs `op` against the session, then reacts to whatever it reported.
    pub fn with_studio<R>(&self, op: impl FnOnce(&mut studio_core::Studio<crate::audio::WebAudioBackend>, &mut Vec<Condition>) -> R) -> R {
        let mut out = Vec::new();
        let result = op(&mut self.studio.borrow_mut(), &mut out);
        if !out.is_empty() {
            self.after(&out);
        }
        result
    }

    fn after(&self, conditions: &[Condition]) {
        if conditions.contains(&Condition::PlaybackStarted) {
            attach_tap(&self.studio, &self.scheduler);
        }
        dom::present(&self.document, conditions);
        dom::sync_play_button(&self.document, self.studio.borrow().is_playing());
    }
}

pub fn wire_deck_handlers(w: &DeckWiring) {
    wire_pointerdown(w);
    wire_pointermove(w);
    wire_pointerup(w);
    wire_record_click(w);
}

fn wire_pointerdown(w: &DeckWiring) {
    let w = w.clone();
    let canvas_for_listener = w.canvas.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        let pos = input::pointer_canvas_px(&ev, &w.canvas);
        let mode = w.studio.borrow_mut().pointer_down(pos);
        if mode != DragMode::None {
            log::info!("[deck] begin {:?} drag at ({:.0},{:.0})", mode, pos.x, pos.y);
            _ = w.canvas.set_pointer_capture(ev.pointer_id());
            ev.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);
    _ = canvas_for_listener.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
    closure.forget();
}

// Moves and releases are tracked on the window so a drag that leaves the
// canvas keeps going.
fn wire_pointermove(w: &DeckWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        if w.studio.borrow().deck().drag() == DragMode::None {
            return;
        }
        let pos = input::pointer_canvas_px(&ev, &w.canvas);
        w.with_studio(|s, out| s.pointer_move(pos, out));
    }) as Box<dyn FnMut(_)>);
    if let Some(wnd) = web::window() {
        _ = wnd.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

fn wire_pointerup(w: &DeckWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        if w.studio.borrow().deck().drag() != DragMode::None {
            w.studio.borrow_mut().pointer_up();
            _ = w.canvas.release_pointer_capture(ev.pointer_id());
        }
    }) as Box<dyn FnMut(_)>);
    if let Some(wnd) = web::window() {
        _ = wnd.add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

fn wire_record_click(w: &DeckWiring) {
    let w = w.clone();
    let canvas_for_listener = w.canvas.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::MouseEvent| {
        let pos = input::pointer_canvas_px(&ev, &w.canvas);
        if !w.studio.borrow().hits_record(pos) {
            return;
        }
        log::info!("[gesture] record click");
        w.with_studio(|s, out| s.record_clicked(out));
    }) as Box<dyn FnMut(_)>);
    _ = canvas_for_listener.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Transport button and code panel.
pub fn wire_controls(w: &DeckWiring) {
    {
        let w = w.clone();
        dom::add_click_listener(&w.document.clone(), dom::PLAY_TOGGLE_ID, move || {
            log::info!("[gesture] transport toggle");
            w.with_studio(|s, out| s.toggle_playback(out));
        });
    }
    {
        let w = w.clone();
        dom::add_click_listener(&w.document.clone(), dom::RESET_CODE_ID, move || {
            w.with_studio(|s, out| s.reset_code(out));
            let text = w.studio.borrow().editor().text().to_string();
            dom::set_editor_text(&w.document, &text);
        });
    }
    {
        let studio = w.studio.clone();
        let initial = studio.borrow().editor().text().to_string();
        dom::wire_editor(&w.document, &initial, move |text| {
            studio.borrow_mut().editor_mut().set_text(&text);
        });
    }
    dom::sync_play_button(&w.document, w.studio.borrow().is_playing());
}
