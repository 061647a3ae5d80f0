// Browser tests: run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use terminal_site::dom::{self, EventListener};
use terminal_site::drag::{DragController, clamp_to_viewport};
use terminal_site::focus::Focus;
use terminal_site::{
    close_game, open_game, qr, site, start_site, start_site_with_config, stop_site,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, EventTarget, HtmlCanvasElement, HtmlElement,
    KeyboardEvent, KeyboardEventInit, MouseEvent, MouseEventInit,
};

wasm_bindgen_test_configure!(run_in_browser);

const PAGE: &str = r#"<div class="terminal">
  <div class="terminal-header"></div>
  <div class="terminal-content">
    <div class="command-line"><span class="prompt"></span> <span class="command">whoami</span></div>
    <div class="interactive-line"><span class="prompt"></span> <span id="userInput"></span></div>
  </div>
</div>"#;

fn doc() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount() -> Document {
    stop_site();
    let doc = doc();
    doc.body().unwrap().set_inner_html(PAGE);
    doc
}

fn press(doc: &Document, key: &str, code: &str) {
    let init = KeyboardEventInit::new();
    init.set_key(key);
    init.set_code(code);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let evt = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    doc.dispatch_event(&evt).unwrap();
}

fn mouse(target: &EventTarget, kind: &str, x: i32, y: i32) {
    let init = MouseEventInit::new();
    init.set_client_x(x);
    init.set_client_y(y);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let evt = MouseEvent::new_with_mouse_event_init_dict(kind, &init).unwrap();
    target.dispatch_event(&evt).unwrap();
}

fn html(doc: &Document, selector: &str) -> HtmlElement {
    doc.query_selector(selector)
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap()
}

fn left_top(el: &HtmlElement) -> (String, String) {
    let style = el.style();
    (
        style.get_property_value("left").unwrap(),
        style.get_property_value("top").unwrap(),
    )
}

/// A 100x50 fixed panel at the top-left with a header and a close dot.
fn floating_panel(doc: &Document) -> (HtmlElement, HtmlElement) {
    let panel: HtmlElement = doc.create_element("div").unwrap().dyn_into().unwrap();
    panel
        .set_attribute(
            "style",
            "position:fixed; left:0; top:0; width:100px; height:50px; margin:0; padding:0;",
        )
        .unwrap();
    panel.set_inner_html(
        r#"<div class="handle" style="height:20px;"><div id="closeGame" style="width:10px; height:10px;"></div></div>"#,
    );
    doc.body().unwrap().append_child(&panel).unwrap();
    let handle = panel
        .query_selector(".handle")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    (panel, handle)
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

fn type_line(doc: &Document, text: &str) {
    for c in text.chars() {
        press(doc, &c.to_string(), "");
    }
    press(doc, "Enter", "Enter");
}

fn outputs(doc: &Document) -> Vec<String> {
    let nodes = doc.query_selector_all(".terminal-content .output").unwrap();
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.text_content())
        .collect()
}

#[wasm_bindgen_test]
fn start_writes_session_prompt_everywhere() {
    let doc = mount();
    start_site().unwrap();
    let prompts = doc.query_selector_all(".prompt").unwrap();
    assert_eq!(prompts.length(), 2);
    for i in 0..prompts.length() {
        let text = prompts.item(i).unwrap().text_content().unwrap();
        assert!(text.starts_with("user-"), "{text}");
        assert!(text.ends_with("@badori.io:~$"), "{text}");
    }
    assert!(doc.get_element_by_id("matrix-bg").is_some());
    stop_site();
}

#[wasm_bindgen_test]
fn typed_command_is_echoed_and_answered() {
    let doc = mount();
    start_site().unwrap();
    type_line(&doc, "about");
    assert!(outputs(&doc).iter().any(|o| o.contains("BADORIIO")));

    type_line(&doc, "nope");
    assert!(
        outputs(&doc)
            .iter()
            .any(|o| o == "bash: nope: command not found")
    );

    type_line(&doc, "clear");
    assert!(outputs(&doc).is_empty());
    assert!(doc.query_selector(".interactive-line").unwrap().is_some());
    stop_site();
}

#[wasm_bindgen_test]
fn game_takes_focus_and_escape_closes_it() {
    let doc = mount();
    start_site().unwrap();
    open_game().unwrap();
    assert!(doc.get_element_by_id("gameContainer").is_some());
    assert_eq!(site::focus_state(), Some(Focus::Game));

    let panel: HtmlElement = doc
        .get_element_by_id("gameContainer")
        .unwrap()
        .dyn_into()
        .unwrap();
    let glow = panel.style().get_property_value("box-shadow").unwrap();
    assert!(!glow.is_empty() && glow != "none", "{glow}");

    // Game keys do not reach the terminal.
    press(&doc, "w", "KeyW");
    let input = doc.get_element_by_id("userInput").unwrap();
    assert!(!input.text_content().unwrap().contains('w'));

    press(&doc, "Escape", "Escape");
    assert!(doc.get_element_by_id("gameContainer").is_none());
    assert_eq!(site::focus_state(), Some(Focus::Terminal));
    stop_site();
}

#[wasm_bindgen_test]
fn game_command_and_host_event_open_one_panel() {
    let doc = mount();
    start_site().unwrap();
    type_line(&doc, "game");
    let window = web_sys::window().unwrap();
    window
        .dispatch_event(&Event::new("createGame").unwrap())
        .unwrap();
    let panels = doc.query_selector_all("#gameContainer").unwrap();
    assert_eq!(panels.length(), 1);
    close_game();
    close_game();
    assert!(!site::game_is_open());
    stop_site();
}

#[wasm_bindgen_test]
fn stop_is_idempotent_and_removes_background() {
    let doc = mount();
    start_site().unwrap();
    assert!(site::is_running());
    stop_site();
    stop_site();
    assert!(!site::is_running());
    assert!(doc.get_element_by_id("matrix-bg").is_none());

    // Keys after teardown go nowhere.
    press(&doc, "x", "KeyX");
    let input = doc.get_element_by_id("userInput").unwrap();
    assert!(!input.text_content().unwrap_or_default().contains('x'));
}

#[wasm_bindgen_test]
fn drag_moves_clamped_and_stops_on_mouseup() {
    let doc = mount();
    let (panel, handle) = floating_panel(&doc);
    let drag = DragController::attach(&panel, &handle).unwrap();

    mouse(&handle, "mousedown", 5, 5);
    assert!(drag.is_dragging());
    assert_eq!(panel.style().get_property_value("position").unwrap(), "absolute");

    mouse(&doc, "mousemove", 40, 30);
    assert_eq!(left_top(&panel), ("35px".to_string(), "25px".to_string()));

    // Far past the bottom-right corner: pinned so the panel stays on screen.
    mouse(&doc, "mousemove", 100_000, 100_000);
    let (vw, vh) = dom::viewport();
    let (x, y) = clamp_to_viewport(
        100_000.0 - 5.0,
        100_000.0 - 5.0,
        panel.offset_width() as f64,
        panel.offset_height() as f64,
        vw,
        vh,
    );
    assert_eq!(left_top(&panel), (format!("{x}px"), format!("{y}px")));

    mouse(&doc, "mousemove", -500, -500);
    assert_eq!(left_top(&panel), ("0px".to_string(), "0px".to_string()));

    mouse(&doc, "mouseup", 0, 0);
    assert!(!drag.is_dragging());
    mouse(&doc, "mousemove", 60, 60);
    assert_eq!(left_top(&panel), ("0px".to_string(), "0px".to_string()));
    panel.remove();
}

#[wasm_bindgen_test]
fn mousedown_on_close_button_does_not_drag() {
    let doc = mount();
    let (panel, handle) = floating_panel(&doc);
    let drag = DragController::attach(&panel, &handle).unwrap();
    let close = html(&doc, "#closeGame");

    mouse(&close, "mousedown", 3, 3);
    assert!(!drag.is_dragging());
    mouse(&doc, "mousemove", 50, 50);
    assert_eq!(left_top(&panel), ("0px".to_string(), "0px".to_string()));
    panel.remove();
}

#[wasm_bindgen_test]
fn destroyed_drag_ignores_later_events() {
    let doc = mount();
    let (panel, handle) = floating_panel(&doc);
    let mut drag = DragController::attach(&panel, &handle).unwrap();

    // Destroy mid-drag, twice.
    mouse(&handle, "mousedown", 5, 5);
    assert!(drag.is_dragging());
    drag.destroy();
    drag.destroy();
    assert!(!drag.is_dragging());

    let before = left_top(&panel);
    mouse(&doc, "mousemove", 70, 40);
    assert_eq!(left_top(&panel), before);

    mouse(&handle, "mousedown", 5, 5);
    assert!(!drag.is_dragging());
    mouse(&doc, "mousemove", 70, 40);
    assert_eq!(left_top(&panel), before);
    drop(drag);
    panel.remove();
}

#[wasm_bindgen_test]
fn terminal_header_drags_until_site_stops() {
    let doc = mount();
    start_site().unwrap();
    let terminal = html(&doc, ".terminal");
    let header = html(&doc, ".terminal-header");

    mouse(&header, "mousedown", 1, 1);
    mouse(&doc, "mousemove", -300, -300);
    assert_eq!(left_top(&terminal), ("0px".to_string(), "0px".to_string()));
    mouse(&doc, "mouseup", -300, -300);

    stop_site();
    mouse(&header, "mousedown", 1, 1);
    mouse(&doc, "mousemove", 200, 200);
    assert_eq!(left_top(&terminal), ("0px".to_string(), "0px".to_string()));
}

#[wasm_bindgen_test]
fn listener_detach_twice_stops_callbacks() {
    let doc = mount();
    let target: EventTarget = doc.body().unwrap().into();
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();
    let listener = EventListener::listen(&target, "ping", move |_| {
        counter.set(counter.get() + 1);
    })
    .unwrap();
    assert!(listener.is_attached());

    target.dispatch_event(&Event::new("ping").unwrap()).unwrap();
    assert_eq!(hits.get(), 1);

    listener.detach();
    listener.detach();
    assert!(!listener.is_attached());
    target.dispatch_event(&Event::new("ping").unwrap()).unwrap();
    assert_eq!(hits.get(), 1);

    // Re-attaching registers exactly once.
    listener.attach().unwrap();
    listener.attach().unwrap();
    target.dispatch_event(&Event::new("ping").unwrap()).unwrap();
    assert_eq!(hits.get(), 2);

    drop(listener);
    target.dispatch_event(&Event::new("ping").unwrap()).unwrap();
    assert_eq!(hits.get(), 2);
}

#[wasm_bindgen_test]
async fn closed_game_canvas_stops_changing() {
    let doc = mount();
    start_site_with_config(r#"{ "game_tick_ms": 20 }"#).unwrap();
    open_game().unwrap();
    let canvas: HtmlCanvasElement = html(&doc, "#gameContainer canvas").dyn_into().unwrap();

    press(&doc, "ArrowRight", "ArrowRight");
    let moving = canvas.to_data_url().unwrap();
    sleep(120).await;
    assert_ne!(canvas.to_data_url().unwrap(), moving);

    close_game();
    assert!(!site::game_is_open());
    assert!(doc.get_element_by_id("gameContainer").is_none());
    let closed = canvas.to_data_url().unwrap();
    sleep(120).await;
    assert_eq!(canvas.to_data_url().unwrap(), closed);
    stop_site();
}

#[wasm_bindgen_test]
fn game_draws_on_its_own_canvas() {
    let doc = mount();
    // A stale canvas with the panel's id sits earlier in the page.
    let stray: HtmlCanvasElement = doc.create_element("canvas").unwrap().dyn_into().unwrap();
    stray.set_id("gameCanvas");
    stray.set_width(40);
    stray.set_height(40);
    doc.body().unwrap().prepend_with_node_1(&stray).unwrap();

    start_site().unwrap();
    open_game().unwrap();
    let alpha = |canvas: &HtmlCanvasElement| -> u8 {
        let ctx: CanvasRenderingContext2d =
            canvas.get_context("2d").unwrap().unwrap().dyn_into().unwrap();
        ctx.get_image_data(0.0, 0.0, 1.0, 1.0).unwrap().data()[3]
    };
    let own: HtmlCanvasElement = html(&doc, "#gameContainer canvas").dyn_into().unwrap();
    assert_eq!(alpha(&own), 255);
    assert_eq!(alpha(&stray), 0);
    assert_eq!(doc.query_selector_all("#gameContainer").unwrap().length(), 1);
    stop_site();
}

#[wasm_bindgen_test]
fn unplayable_board_is_refused_before_anything_mounts() {
    let doc = mount();
    for raw in [r#"{ "tile_count": 1 }"#, r#"{ "origin": [25, 3] }"#] {
        let err = start_site_with_config(raw).unwrap_err();
        assert!(err.as_string().unwrap().contains("invalid config"), "{raw}");
    }
    assert!(!site::is_running());
    assert!(doc.get_element_by_id("matrix-bg").is_none());
}

#[wasm_bindgen_test]
async fn qr_accepts_plain_and_promised_urls() {
    let window = web_sys::window().unwrap();
    let key = JsValue::from_str("generateQRCode");
    let host = |body: &str| js_sys::Function::new_with_args("text", body);

    js_sys::Reflect::set(&window, &key, &host("return 'data:image/png;base64,' + text;")).unwrap();
    let img = qr::markup("QQ").await;
    assert!(img.contains(r#"src="data:image/png;base64,QQ""#), "{img}");

    js_sys::Reflect::set(
        &window,
        &key,
        &host("return Promise.resolve('data:image/png;base64,' + text);"),
    )
    .unwrap();
    assert!(qr::markup("Rw").await.contains("base64,Rw"));

    js_sys::Reflect::set(&window, &key, &host("return Promise.reject(new Error('boom'));")).unwrap();
    assert_eq!(qr::markup("x").await, qr::ERROR_MARKUP);

    js_sys::Reflect::delete_property(&window, &key).unwrap();
    assert_eq!(qr::markup("x").await, qr::ERROR_MARKUP);
}
