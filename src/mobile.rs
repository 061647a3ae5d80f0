//! Touch-device support.
//!
//! Phones never deliver the document-level `keydown` stream the terminal is
//! driven by, so an off-screen `<input>` catches the soft keyboard and its
//! value is mirrored into the interpreter buffer. Also adds a "tap to type"
//! hint, a page scroll indicator and press feedback on social links.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{Document, Event, EventTarget, HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::config::SiteConfig;
use crate::dom::{self, EventListener, Timeout};
use crate::error::SiteResult;

const MOBILE_AGENTS: [&str; 7] = [
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

const HINT_MARKUP: &str =
    r#"<span style="color: #7c3aed; font-size: 11px; opacity: 0.8;">💡 Tap here to type</span>"#;
const MIN_THUMB_PCT: f64 = 8.0;
const IDLE_OPACITY: &str = "0.3";

/// Case-insensitive match against the known handset user agents.
pub fn is_mobile_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_AGENTS.iter().any(|needle| ua.contains(needle))
}

/// Whether this browser is a handset.
pub fn detect() -> bool {
    dom::win()
        .ok()
        .and_then(|w| w.navigator().user_agent().ok())
        .is_some_and(|ua| is_mobile_agent(&ua))
}

/// Scroll thumb `(top, height)` as percentages of the track, or `None` when
/// the page does not scroll.
pub fn thumb_geometry(scroll_top: f64, scroll_height: f64, viewport_h: f64) -> Option<(f64, f64)> {
    let scrollable = scroll_height - viewport_h;
    if scrollable <= 0.0 {
        return None;
    }
    let progress = (scroll_top / scrollable).clamp(0.0, 1.0);
    let height = (viewport_h / scroll_height * 100.0).max(MIN_THUMB_PCT);
    Some((progress * (100.0 - height), height))
}

struct ScrollIndicator {
    track: HtmlElement,
    thumb: HtmlElement,
    fade: RefCell<Option<Timeout>>,
    fade_ms: i32,
}

impl ScrollIndicator {
    fn create(doc: &Document, fade_ms: i32) -> SiteResult<Self> {
        let track: HtmlElement = dom::create(doc, "div")?;
        track.set_class_name("mobile-scroll-indicator");
        track.set_attribute("style", "position:fixed; right:2px; top:8%; width:8px; height:84%; background:rgba(88, 166, 255, 0.25); border-radius:4px; z-index:1000; pointer-events:none; opacity:0; transition:opacity 0.3s ease;")?;
        let thumb: HtmlElement = dom::create(doc, "div")?;
        thumb.set_class_name("mobile-scroll-thumb");
        thumb.set_attribute("style", "width:100%; background:linear-gradient(180deg, rgba(88, 166, 255, 0.95) 0%, rgba(124, 58, 237, 0.95) 100%); border-radius:4px; position:absolute; top:0; transition:all 0.3s cubic-bezier(0.4, 0, 0.2, 1); box-shadow:0 2px 6px rgba(0, 0, 0, 0.5);")?;
        track.append_child(&thumb)?;
        dom::body(doc)?.append_child(&track)?;
        Ok(Self {
            track,
            thumb,
            fade: RefCell::new(None),
            fade_ms,
        })
    }

    fn update(&self) {
        let Ok(w) = dom::win() else { return };
        let scroll_top = w.page_y_offset().unwrap_or(0.0);
        let scroll_height = w
            .document()
            .and_then(|d| d.document_element())
            .map(|el| el.scroll_height() as f64)
            .unwrap_or(0.0);
        let (_, viewport_h) = dom::viewport();

        let Some((top, height)) = thumb_geometry(scroll_top, scroll_height, viewport_h) else {
            dom::set_style(&self.track, "opacity", "0");
            return;
        };
        dom::set_style(&self.thumb, "height", &format!("{height}%"));
        dom::set_style(&self.thumb, "top", &format!("{top}%"));
        dom::set_style(&self.track, "opacity", "1");

        let track = self.track.clone();
        // Replacing the pending timeout cancels it.
        match Timeout::start(self.fade_ms, move || {
            dom::set_style(&track, "opacity", IDLE_OPACITY);
        }) {
            Ok(t) => *self.fade.borrow_mut() = Some(t),
            Err(err) => log::error!("scroll fade: {err}"),
        }
    }
}

pub struct MobileAdapter {
    input: HtmlInputElement,
    hint: Option<HtmlElement>,
    indicator: Rc<ScrollIndicator>,
    listeners: Vec<EventListener>,
    active: bool,
}

impl MobileAdapter {
    pub fn attach(doc: &Document, config: &SiteConfig) -> SiteResult<Self> {
        let body = dom::body(doc)?;
        let input: HtmlInputElement = dom::create(doc, "input")?;
        input.set_type("text");
        input.set_attribute("style", "position:fixed; left:-9999px; top:50%; width:1px; height:1px; opacity:0; z-index:-1; border:none; outline:none;")?;
        input.set_attribute("autocomplete", "off")?;
        input.set_attribute("autocorrect", "off")?;
        input.set_attribute("autocapitalize", "none")?;
        input.set_attribute("spellcheck", "false")?;
        body.append_child(&input)?;

        let mut listeners = Vec::new();

        if let Some(terminal) = dom::query(doc, ".terminal") {
            let field = input.clone();
            listeners.push(EventListener::listen(&terminal, "touchstart", move |evt| {
                if dom::target_within(&evt, ".terminal-content")
                    || dom::target_within(&evt, ".interactive-line")
                {
                    evt.prevent_default();
                    let _ = field.focus();
                }
            })?);
        }

        {
            let field = input.clone();
            listeners.push(EventListener::listen(&input, "input", move |_| {
                crate::site::mobile_input(&field.value());
            })?);
        }
        {
            let field = input.clone();
            listeners.push(EventListener::listen(&input, "keydown", move |evt: Event| {
                // The document handler would otherwise replay this key.
                evt.stop_propagation();
                let is_enter = evt
                    .dyn_ref::<KeyboardEvent>()
                    .is_some_and(|k| k.key() == "Enter");
                if is_enter {
                    evt.prevent_default();
                    crate::site::mobile_submit();
                    field.set_value("");
                }
            })?);
        }

        let hint = match dom::query_html(doc, ".terminal-content") {
            Some(content) => {
                let hint = Self::add_hint(doc, &content)?;
                let hidden = Rc::new(Cell::new(false));
                let triggers: [(EventTarget, &'static str); 2] = [
                    (content.clone().into(), "touchstart"),
                    (doc.clone().into(), "keydown"),
                ];
                for (target, kind) in triggers {
                    let hint = hint.clone();
                    let hidden = hidden.clone();
                    listeners.push(EventListener::listen(&target, kind, move |_| {
                        if !hidden.replace(true) {
                            dom::set_style(&hint, "display", "none");
                        }
                    })?);
                }
                Some(hint)
            }
            None => None,
        };

        let indicator = Rc::new(ScrollIndicator::create(doc, config.scroll_hide_ms)?);
        let window = dom::win()?;
        for kind in ["scroll", "resize"] {
            let indicator = indicator.clone();
            listeners.push(EventListener::listen(&window, kind, move |_| indicator.update())?);
        }
        indicator.update();

        if let Ok(links) = doc.query_selector_all(".social-link") {
            for i in 0..links.length() {
                let Some(link) = links.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok())
                else {
                    continue;
                };
                let pressed = link.clone();
                listeners.push(EventListener::listen(&link, "touchstart", move |_| {
                    dom::set_style(&pressed, "transform", "scale(1.05)");
                    dom::set_style(&pressed, "background-color", "rgba(88, 166, 255, 0.2)");
                })?);
                let released = link.clone();
                listeners.push(EventListener::listen(&link, "touchend", move |_| {
                    dom::set_style(&released, "transform", "scale(1)");
                    dom::set_style(&released, "background-color", "rgba(88, 166, 255, 0.1)");
                })?);
            }
        }

        log::info!("mobile adapter attached");
        Ok(Self {
            input,
            hint,
            indicator,
            listeners,
            active: true,
        })
    }

    fn add_hint(doc: &Document, content: &HtmlElement) -> SiteResult<HtmlElement> {
        let hint: HtmlElement = dom::create(doc, "div")?;
        hint.set_class_name("mobile-hint");
        hint.set_inner_html(HINT_MARKUP);
        hint.set_attribute(
            "style",
            "position:absolute; right:10px; bottom:10px; z-index:5; pointer-events:none;",
        )?;
        dom::set_style(content, "position", "relative");
        content.append_child(&hint)?;
        Ok(hint)
    }

    pub fn input(&self) -> &HtmlInputElement {
        &self.input
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Detach everything and remove the added elements. Idempotent.
    pub fn destroy(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        self.listeners.clear();
        self.indicator.fade.borrow_mut().take();
        self.indicator.track.remove();
        self.input.remove();
        if let Some(hint) = self.hint.take() {
            hint.remove();
        }
        log::debug!("mobile adapter destroyed");
    }
}

impl Drop for MobileAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}
