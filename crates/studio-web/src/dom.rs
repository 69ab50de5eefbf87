use studio_core::constants::EASTER_EGG_CLICKS;
use studio_core::Condition;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub const TOAST_ID: &str = "toast";
pub const PLAY_TOGGLE_ID: &str = "play-toggle";
pub const RESET_CODE_ID: &str = "reset-code";
pub const CODE_EDITOR_ID: &str = "code-editor";

const TOAST_MS: i32 = 2500;
const TOAST_LONG_MS: i32 = 5000;
const TOAST_SHORT_MS: i32 = 1000;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Looks up `#id` and casts it to `T`.
pub fn element<T: JsCast>(document: &web::Document, id: &str) -> anyhow::Result<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", id))?
        .dyn_into::<T>()
        .map_err(|_| anyhow::anyhow!("#{} has an unexpected element type", id))
}

#[inline]
pub fn add_click_listener(document: &web::Document, element_id: &str, mut handler: impl FnMut() + 'static) {
    if let Some(el) = document.get_element_by_id(element_id) {
        let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    } else {
        log::warn!("[gesture] no #{} to wire", element_id);
    }
}

/// Notification text and display time for a condition.
pub fn toast_for(condition: Condition) -> (String, i32) {
    match condition {
        Condition::AudioUnavailable => ("Failed to start audio".to_string(), TOAST_MS),
        Condition::PlaybackStarted => ("Quantum resonance field activated!".to_string(), TOAST_MS),
        Condition::PlaybackStopped => ("Playback stopped".to_string(), TOAST_SHORT_MS),
        Condition::EasterEggProgress(n) => (
            format!("Click {} more times...", EASTER_EGG_CLICKS.saturating_sub(n)),
            TOAST_SHORT_MS,
        ),
        Condition::EasterEggTriggered => (
            "Easter egg unlocked! Wrong Number Song - Slowed & Reverb".to_string(),
            TOAST_LONG_MS,
        ),
        Condition::CodeReset => ("Code reset to default".to_string(), TOAST_MS),
    }
}

/// Shows `message` in `#toast` for `duration_ms`. Falls back to the console
/// when the page has no toast element.
pub fn show_toast(document: &web::Document, kind: &str, message: &str, duration_ms: i32) {
    let Some(el) = document.get_element_by_id(TOAST_ID) else {
        log::info!("[toast] {}", message);
        return;
    };
    el.set_text_content(Some(message));
    let _ = el.set_attribute("data-kind", kind);
    let _ = el.set_attribute("data-visible", "true");

    let shown = message.to_string();
    let hide = Closure::once_into_js(move || {
        // A newer toast may have replaced this one.
        if el.text_content().as_deref() == Some(shown.as_str()) {
            let _ = el.set_attribute("data-visible", "false");
        }
    });
    if let Some(w) = web::window() {
        let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(hide.unchecked_ref(), duration_ms);
    }
}

pub fn present(document: &web::Document, conditions: &[Condition]) {
    for c in conditions {
        let (message, ms) = toast_for(*c);
        show_toast(document, c.name(), &message, ms);
    }
}

pub fn sync_play_button(document: &web::Document, playing: bool) {
    if let Some(el) = document.get_element_by_id(PLAY_TOGGLE_ID) {
        el.set_text_content(Some(if playing { "Pause" } else { "Play" }));
        let _ = el.set_attribute("aria-pressed", if playing { "true" } else { "false" });
    }
}

pub fn set_editor_text(document: &web::Document, text: &str) {
    if let Ok(area) = element::<web::HtmlTextAreaElement>(document, CODE_EDITOR_ID) {
        area.set_value(text);
    }
}

/// Calls `on_change` with the textarea's text on every edit.
pub fn wire_editor(document: &web::Document, initial: &str, mut on_change: impl FnMut(String) + 'static) {
    let Ok(area) = element::<web::HtmlTextAreaElement>(document, CODE_EDITOR_ID) else {
        log::warn!("[gesture] no #{}; code panel disabled", CODE_EDITOR_ID);
        return;
    };
    area.set_value(initial);
    let source = area.clone();
    let closure = Closure::wrap(Box::new(move || on_change(source.value())) as Box<dyn FnMut()>);
    let _ = area.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
    closure.forget();
}
