#![cfg(target_arch = "wasm32")]
use flicker_core::{Config, ConfigPatch, EffectSession, Message};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod constants;
mod dom;
mod events;
mod frame;
mod storage;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("flicker starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let (window, document) =
        dom::window_document().ok_or_else(|| anyhow::anyhow!("no window or document"))?;
    let hostname = window.location().hostname().unwrap_or_else(|e| {
        log::warn!("[init] hostname unavailable: {:?}", e);
        String::new()
    });

    let surface = dom::DomSurface::new(window, document.clone());
    let session = Rc::new(RefCell::new(EffectSession::new(surface, hostname)));
    session.borrow_mut().set_hidden(document.hidden());
    let driver = frame::Driver::new(session.clone());

    events::wire_visibility(&document, &driver);

    // Without the extension APIs the page still gets the default table.
    let on_change = driver.clone();
    if let Err(e) = storage::on_changed(move |changes| {
        let patch = ConfigPatch::from_storage_changes(&changes);
        on_change.session().borrow_mut().apply_patch(&patch);
        on_change.sync();
    }) {
        log::warn!("[init] settings changes not observed: {:?}", e);
    }

    let on_message = driver.clone();
    if let Err(e) = storage::on_message(move |raw| {
        let message = match Message::decode(&raw) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("[init] ignoring message: {}", e);
                return None;
            }
        };
        let outcome = on_message.session().borrow_mut().handle_message(message);
        on_message.sync();
        if let Some(patch) = &outcome.persist {
            storage::persist(patch);
        }
        outcome
            .reply
            .and_then(|reply| serde_json::to_value(reply).ok())
    }) {
        log::warn!("[init] runtime messages not handled: {:?}", e);
    }

    let stored = storage::load_settings().await.unwrap_or_else(|e| {
        log::warn!("[init] settings unavailable, using defaults: {:?}", e);
        serde_json::Value::Null
    });
    session.borrow_mut().apply_config(Config::from_value(&stored));
    driver.sync();

    let s = session.borrow();
    log::info!(
        "[init] {} on {}",
        if s.is_active() { "active" } else { "inactive" },
        flicker_core::site_label(Some(s.hostname()))
    );
    Ok(())
}
