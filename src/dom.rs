//! Thin DOM helpers shared by every panel.
//!
//! Listener, interval and timeout handles are RAII: dropping one detaches or
//! clears it exactly once, so teardown paths can drop freely without tracking
//! what already ran.

use std::cell::Cell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, Window, window};

use crate::error::{SiteError, SiteResult};

// --- Lookups -----------------------------------------------------------------

pub fn win() -> SiteResult<Window> {
    window().ok_or(SiteError::NoWindow)
}

pub fn document() -> SiteResult<Document> {
    win()?.document().ok_or(SiteError::NoDocument)
}

pub fn body(doc: &Document) -> SiteResult<HtmlElement> {
    doc.body().ok_or(SiteError::NoBody)
}

/// `querySelector` that treats both "not found" and an invalid selector as absent.
pub fn query(doc: &Document, selector: &str) -> Option<Element> {
    doc.query_selector(selector).ok().flatten()
}

pub fn query_html(doc: &Document, selector: &str) -> Option<HtmlElement> {
    query(doc, selector).and_then(|el| el.dyn_into().ok())
}

/// `querySelector` scoped to `parent`; works before `parent` is in the document.
pub fn find_in<T: JsCast>(parent: &Element, selector: &str) -> Option<T> {
    parent
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into().ok())
}

/// `dyn_into` with a type mismatch reported as a [`SiteError`].
pub fn cast<T: JsCast>(value: impl JsCast) -> SiteResult<T> {
    value
        .dyn_into::<T>()
        .map_err(|_| SiteError::Js(format!("not a {}", std::any::type_name::<T>())))
}

/// `createElement(tag)` already cast to the concrete element type.
pub fn create<T: JsCast>(doc: &Document, tag: &str) -> SiteResult<T> {
    cast(doc.create_element(tag)?)
}

/// True when the event target sits inside an element matching `selector`.
pub fn target_within(event: &Event, selector: &str) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
        .is_some()
}

pub fn set_style(el: &HtmlElement, property: &str, value: &str) {
    let _ = el.style().set_property(property, value);
}

/// Current `(innerWidth, innerHeight)`, or zero when unavailable.
pub fn viewport() -> (f64, f64) {
    let Some(w) = window() else {
        return (0.0, 0.0);
    };
    let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}

// --- Event listeners -----------------------------------------------------------

/// A DOM listener that stays registered until detached or dropped.
pub struct EventListener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
    attached: Cell<bool>,
}

impl EventListener {
    /// Build a listener without registering it.
    pub fn new<F>(target: &EventTarget, kind: &'static str, callback: F) -> Self
    where
        F: FnMut(Event) + 'static,
    {
        Self {
            target: target.clone(),
            kind,
            capture: false,
            callback: Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>),
            attached: Cell::new(false),
        }
    }

    /// Build and register in the bubbling phase.
    pub fn listen<F>(target: &EventTarget, kind: &'static str, callback: F) -> SiteResult<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let listener = Self::new(target, kind, callback);
        listener.attach()?;
        Ok(listener)
    }

    /// Build and register in the capture phase.
    pub fn listen_capture<F>(
        target: &EventTarget,
        kind: &'static str,
        callback: F,
    ) -> SiteResult<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let mut listener = Self::new(target, kind, callback);
        listener.capture = true;
        listener.attach()?;
        Ok(listener)
    }

    pub fn attach(&self) -> SiteResult<()> {
        if self.attached.get() {
            return Ok(());
        }
        self.target.add_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        )?;
        self.attached.set(true);
        Ok(())
    }

    /// Unregister; safe to call any number of times, including from inside
    /// the callback itself.
    pub fn detach(&self) {
        if self.attached.replace(false) {
            let _ = self.target.remove_event_listener_with_callback_and_bool(
                self.kind,
                self.callback.as_ref().unchecked_ref(),
                self.capture,
            );
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.detach();
    }
}

// --- Timers ------------------------------------------------------------------

/// A running `setInterval`; cleared on drop.
pub struct Interval {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn start<F>(period_ms: i32, callback: F) -> SiteResult<Self>
    where
        F: FnMut() + 'static,
    {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        let handle = win()?.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period_ms,
        )?;
        Ok(Self {
            handle,
            _callback: callback,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(w) = window() {
            w.clear_interval_with_handle(self.handle);
        }
    }
}

/// A pending `setTimeout`; cancelled on drop if it has not fired yet.
pub struct Timeout {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Timeout {
    pub fn start<F>(delay_ms: i32, callback: F) -> SiteResult<Self>
    where
        F: FnOnce() + 'static,
    {
        let mut once = Some(callback);
        let callback = Closure::wrap(Box::new(move || {
            if let Some(f) = once.take() {
                f();
            }
        }) as Box<dyn FnMut()>);
        let handle = win()?.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay_ms,
        )?;
        Ok(Self {
            handle,
            _callback: callback,
        })
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if let Some(w) = window() {
            w.clear_timeout_with_handle(self.handle);
        }
    }
}
