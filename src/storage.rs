// Bridge to the extension's storage and runtime messaging APIs.
//
// The namespaces are looked up dynamically (`browser` on Firefox, `chrome`
// elsewhere) so the module has no binding to a particular vendor.
#![allow(deprecated)]

use crate::constants::{EXTENSION_GLOBALS, STORAGE_AREA};
use flicker_core::{Config, ConfigPatch};
use js_sys::{Function, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};

fn js_err(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}

fn extension_api() -> Result<JsValue, JsValue> {
    let global = js_sys::global();
    for name in EXTENSION_GLOBALS {
        let api = Reflect::get(&global, &JsValue::from_str(name))?;
        if api.is_object() {
            return Ok(api);
        }
    }
    Err(JsValue::from_str("no extension API on this page"))
}

fn lookup(path: &[&str]) -> Result<JsValue, JsValue> {
    path.iter().try_fold(extension_api()?, |obj, key| {
        Reflect::get(&obj, &JsValue::from_str(key))
    })
}

fn call(target: &JsValue, method: &str, arg: &JsValue) -> Result<JsValue, JsValue> {
    let f: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;
    f.call1(target, arg)
}

/// Stored settings, with defaults filled in by the store.
pub async fn load_settings() -> anyhow::Result<Value> {
    let local = lookup(&["storage", STORAGE_AREA]).map_err(js_err)?;
    let defaults = JsValue::from_serde(&Config::default())?;
    let promise: Promise = call(&local, "get", &defaults)
        .and_then(|p| p.dyn_into())
        .map_err(js_err)?;
    let stored = JsFuture::from(promise).await.map_err(js_err)?;
    Ok(stored.into_serde()?)
}

/// Fire-and-forget write; failures are logged.
pub fn persist(patch: &ConfigPatch) {
    let write = || -> anyhow::Result<Promise> {
        let local = lookup(&["storage", STORAGE_AREA]).map_err(js_err)?;
        let value = JsValue::from_serde(patch)?;
        call(&local, "set", &value)
            .and_then(|p| p.dyn_into())
            .map_err(js_err)
    };
    match write() {
        Ok(promise) => spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("[storage] write rejected: {:?}", e);
            }
        }),
        Err(e) => log::warn!("[storage] write failed: {:?}", e),
    }
}

/// Subscribe to changes of the local area. The handler gets the raw
/// `{key: {oldValue, newValue}}` record.
pub fn on_changed(mut handler: impl FnMut(Value) + 'static) -> anyhow::Result<()> {
    let event = lookup(&["storage", "onChanged"]).map_err(js_err)?;
    let closure = Closure::wrap(Box::new(move |changes: JsValue, area: JsValue| {
        if area.as_string().as_deref() != Some(STORAGE_AREA) {
            return;
        }
        match changes.into_serde::<Value>() {
            Ok(changes) => handler(changes),
            Err(e) => log::warn!("[storage] unreadable change record: {}", e),
        }
    }) as Box<dyn FnMut(JsValue, JsValue)>);
    call(&event, "addListener", closure.as_ref()).map_err(js_err)?;
    closure.forget();
    Ok(())
}

/// Answer runtime messages. A `Some` reply resolves the sender's promise.
pub fn on_message(mut handler: impl FnMut(Value) -> Option<Value> + 'static) -> anyhow::Result<()> {
    let event = lookup(&["runtime", "onMessage"]).map_err(js_err)?;
    let closure = Closure::wrap(Box::new(move |msg: JsValue| -> JsValue {
        let msg = match msg.into_serde::<Value>() {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("[storage] unreadable message: {}", e);
                return JsValue::UNDEFINED;
            }
        };
        match handler(msg).map(|reply| JsValue::from_serde(&reply)) {
            Some(Ok(reply)) => Promise::resolve(&reply).into(),
            Some(Err(e)) => {
                log::warn!("[storage] reply not serializable: {}", e);
                JsValue::UNDEFINED
            }
            None => JsValue::UNDEFINED,
        }
    }) as Box<dyn FnMut(JsValue) -> JsValue>);
    call(&event, "addListener", closure.as_ref()).map_err(js_err)?;
    closure.forget();
    Ok(())
}
