//! Pointer-drag for floating panels (terminal window, game window).

use std::cell::Cell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlElement, MouseEvent};

use crate::dom::{self, EventListener};
use crate::error::SiteResult;

/// Clicks landing on these never start a drag.
pub const EXCLUDED: &str = "#closeGame, .close";

/// Clamp a prospective top-left so the panel stays inside the viewport.
/// Panels larger than the viewport pin to 0.
pub fn clamp_to_viewport(
    x: f64,
    y: f64,
    panel_w: f64,
    panel_h: f64,
    viewport_w: f64,
    viewport_h: f64,
) -> (f64, f64) {
    let max_x = viewport_w - panel_w;
    let max_y = viewport_h - panel_h;
    (x.min(max_x).max(0.0), y.min(max_y).max(0.0))
}

#[derive(Clone, Copy, Debug, Default)]
struct Grab {
    dragging: bool,
    offset_x: f64,
    offset_y: f64,
}

struct Shared {
    panel: HtmlElement,
    grab: Cell<Grab>,
    on_move: EventListener, // document mousemove, attached only mid-drag
    on_up: EventListener,   // document mouseup, attached only mid-drag
}

impl Shared {
    fn begin(&self, evt: &Event) {
        let Some(mouse) = evt.dyn_ref::<MouseEvent>() else {
            return;
        };
        if dom::target_within(evt, EXCLUDED) {
            return;
        }
        evt.prevent_default();

        // Pin to the current on-screen rect so switching positioning doesn't jump.
        let rect = self.panel.get_bounding_client_rect();
        dom::set_style(&self.panel, "position", "absolute");
        dom::set_style(&self.panel, "left", &format!("{}px", rect.left()));
        dom::set_style(&self.panel, "top", &format!("{}px", rect.top()));
        dom::set_style(&self.panel, "transform", "none");

        self.grab.set(Grab {
            dragging: true,
            offset_x: mouse.client_x() as f64 - rect.left(),
            offset_y: mouse.client_y() as f64 - rect.top(),
        });
        if let Err(err) = self.on_move.attach().and_then(|_| self.on_up.attach()) {
            log::error!("drag listeners: {err}");
            self.end();
        }
    }

    fn drag_to(&self, evt: &Event) {
        let grab = self.grab.get();
        if !grab.dragging {
            return;
        }
        let Some(mouse) = evt.dyn_ref::<MouseEvent>() else {
            return;
        };
        evt.prevent_default();
        let (vw, vh) = dom::viewport();
        let (x, y) = clamp_to_viewport(
            mouse.client_x() as f64 - grab.offset_x,
            mouse.client_y() as f64 - grab.offset_y,
            self.panel.offset_width() as f64,
            self.panel.offset_height() as f64,
            vw,
            vh,
        );
        dom::set_style(&self.panel, "left", &format!("{x}px"));
        dom::set_style(&self.panel, "top", &format!("{y}px"));
    }

    fn end(&self) {
        self.grab.set(Grab::default());
        self.on_move.detach();
        self.on_up.detach();
    }
}

/// Makes `panel` draggable by its `handle`.
pub struct DragController {
    shared: Rc<Shared>,
    on_down: Option<EventListener>,
}

impl DragController {
    pub fn attach(panel: &HtmlElement, handle: &HtmlElement) -> SiteResult<Self> {
        let doc = dom::document()?;
        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let on_move_ref = weak.clone();
            let on_up_ref = weak.clone();
            Shared {
                panel: panel.clone(),
                grab: Cell::new(Grab::default()),
                on_move: EventListener::new(&doc, "mousemove", move |evt| {
                    if let Some(s) = on_move_ref.upgrade() {
                        s.drag_to(&evt);
                    }
                }),
                on_up: EventListener::new(&doc, "mouseup", move |_| {
                    if let Some(s) = on_up_ref.upgrade() {
                        s.end();
                    }
                }),
            }
        });

        let down_ref = Rc::downgrade(&shared);
        let on_down = EventListener::listen(handle, "mousedown", move |evt| {
            if let Some(s) = down_ref.upgrade() {
                s.begin(&evt);
            }
        })?;

        Ok(Self {
            shared,
            on_down: Some(on_down),
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.shared.grab.get().dragging
    }

    /// Detach every listener, including any left over from an unfinished drag.
    pub fn destroy(&mut self) {
        self.on_down.take();
        self.shared.end();
    }
}

impl Drop for DragController {
    fn drop(&mut self) {
        self.destroy();
    }
}
