use crate::dom::DomSurface;
use crate::events;
use flicker_core::EffectSession;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub type SharedSession = Rc<RefCell<EffectSession<DomSurface>>>;

type TickSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Binds a session to `requestAnimationFrame` and the layout listeners.
///
/// The session decides whether it wants frames and listeners; `sync` makes
/// the browser side match after every state change.
pub struct Driver {
    session: SharedSession,
    tick: TickSlot,
    raf: Rc<Cell<Option<i32>>>,
    on_layout: Closure<dyn FnMut()>,
    listening: Cell<bool>,
}

impl Driver {
    pub fn new(session: SharedSession) -> Rc<Self> {
        let raf: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let tick: TickSlot = Rc::new(RefCell::new(None));

        let tick_session = session.clone();
        let tick_raf = raf.clone();
        let tick_slot = tick.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            tick_raf.set(None);
            if !tick_session.borrow().is_running() {
                return;
            }
            request_frame(&tick_slot, &tick_raf);
            tick_session.borrow_mut().tick(now);
        }) as Box<dyn FnMut(f64)>));

        let layout_session = session.clone();
        let on_layout = Closure::wrap(Box::new(move || {
            layout_session.borrow_mut().request_reclassification();
        }) as Box<dyn FnMut()>);

        Rc::new(Self {
            session,
            tick,
            raf,
            on_layout,
            listening: Cell::new(false),
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn sync(&self) {
        let (running, mounted) = {
            let s = self.session.borrow();
            (s.is_running(), s.is_mounted())
        };

        match (running, self.raf.get()) {
            (true, None) => request_frame(&self.tick, &self.raf),
            (false, Some(id)) => {
                if let Some(w) = web::window() {
                    _ = w.cancel_animation_frame(id);
                }
                self.raf.set(None);
            }
            _ => {}
        }

        if mounted != self.listening.get() {
            events::set_layout_listeners(&self.on_layout, mounted);
            self.listening.set(mounted);
            log::debug!("[frame] layout listeners {}", if mounted { "on" } else { "off" });
        }
    }
}

fn request_frame(slot: &TickSlot, raf: &Cell<Option<i32>>) {
    let Some(w) = web::window() else {
        return;
    };
    if let Some(cb) = slot.borrow().as_ref() {
        match w.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => raf.set(Some(id)),
            Err(e) => log::warn!("[frame] requestAnimationFrame failed: {:?}", e),
        }
    }
}
