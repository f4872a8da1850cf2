use crate::constants::{LAYOUT_EVENTS, VISIBILITY_EVENT};
use crate::frame::Driver;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Add or remove the passive scroll/resize listeners on the window.
pub fn set_layout_listeners(handler: &Closure<dyn FnMut()>, on: bool) {
    let Some(window) = web::window() else {
        return;
    };
    let callback = handler.as_ref().unchecked_ref();
    for kind in LAYOUT_EVENTS {
        if on {
            let opts = web::AddEventListenerOptions::new();
            opts.set_passive(true);
            _ = window.add_event_listener_with_callback_and_add_event_listener_options(
                kind, callback, &opts,
            );
        } else {
            _ = window.remove_event_listener_with_callback(kind, callback);
        }
    }
}

/// Pause while the tab is hidden; resume with a fresh clock when shown.
pub fn wire_visibility(document: &web::Document, driver: &Rc<Driver>) {
    let doc = document.clone();
    let driver = driver.clone();
    let closure = Closure::wrap(Box::new(move || {
        let hidden = doc.hidden();
        driver.session().borrow_mut().set_hidden(hidden);
        driver.sync();
        log::debug!("[events] page {}", if hidden { "hidden" } else { "visible" });
    }) as Box<dyn FnMut()>);
    _ = document.add_event_listener_with_callback(VISIBILITY_EVENT, closure.as_ref().unchecked_ref());
    closure.forget();
}
