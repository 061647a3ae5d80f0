//! Terminal panel: pure interpreter plus the DOM view it renders into.
//!
//! The page markup provides `.terminal`, `.terminal-content`,
//! `.interactive-line` and `#userInput`. Any of them may be missing (tests,
//! stripped-down pages); the view then skips the affected writes.

pub mod commands;
pub mod input_line;
pub mod interpreter;

pub use commands::{Command, CommandOutput, CommandTable, DeferredOutput};
pub use input_line::InputLine;
pub use interpreter::{Effect, Interpreter, Key};

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, ScrollBehavior, ScrollIntoViewOptions};

use crate::dom;
use crate::error::SiteResult;
use commands::{escape_html, to_markup};

const ERROR_COLOR: &str = "#f85149";
const LIST_COLOR: &str = "#7c3aed";

pub struct TerminalView {
    doc: Document,
    panel: Option<HtmlElement>,
    content: Option<Element>,
    interactive_line: Option<Element>,
    user_input: Option<Element>,
}

impl TerminalView {
    pub fn attach(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            panel: dom::query_html(doc, ".terminal"),
            content: dom::query(doc, ".terminal-content"),
            interactive_line: dom::query(doc, ".interactive-line"),
            user_input: doc.get_element_by_id("userInput"),
        }
    }

    pub fn panel(&self) -> Option<&HtmlElement> {
        self.panel.as_ref()
    }

    /// Render one log effect. Window and game effects are handled by the site.
    pub fn render(&self, effect: Effect) -> SiteResult<()> {
        match effect {
            Effect::Echo { prompt, command } => self.append_command_line(&prompt, &command),
            Effect::Interrupted { prompt, partial } => {
                self.append_command_line(&prompt, &format!("{partial}^C"))
            }
            Effect::Output(html) => {
                let div = self.output_div("output success")?;
                div.set_inner_html(&html);
                self.insert(&div)
            }
            Effect::Pending(pending) => self.append_pending(pending),
            Effect::NotFound(command) => self.append_text(
                &interpreter::not_found_message(&command),
                ERROR_COLOR,
            ),
            Effect::Completions(names) => self.append_text(&names.join("  "), LIST_COLOR),
            Effect::ClearLog => {
                self.clear();
                Ok(())
            }
            Effect::CloseWindow | Effect::LaunchGame => Ok(()),
        }
    }

    fn append_command_line(&self, prompt: &str, command: &str) -> SiteResult<()> {
        let div = self.output_div("command-line")?;
        div.set_inner_html(&format!(
            "<span class=\"prompt\">{}</span> <span class=\"command\">{}</span>",
            escape_html(prompt),
            escape_html(command)
        ));
        self.insert(&div)
    }

    fn append_text(&self, text: &str, color: &str) -> SiteResult<()> {
        let div = self.output_div("output")?;
        div.set_text_content(Some(text));
        if let Some(html) = div.dyn_ref::<HtmlElement>() {
            dom::set_style(html, "color", color);
        }
        self.insert(&div)
    }

    /// Reserve the output slot now and fill it once the producer resolves,
    /// so output stays in command order.
    fn append_pending(&self, pending: DeferredOutput) -> SiteResult<()> {
        let div = self.output_div("output success")?;
        self.insert(&div)?;
        let line = self.interactive_line.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let text = pending.into_future().await;
            div.set_inner_html(&to_markup(&text));
            if let Some(line) = line {
                scroll_into_view(&line);
            }
        });
        Ok(())
    }

    fn output_div(&self, class: &str) -> SiteResult<Element> {
        let div = self.doc.create_element("div")?;
        div.set_class_name(class);
        Ok(div)
    }

    fn insert(&self, node: &Element) -> SiteResult<()> {
        if let (Some(content), Some(line)) = (&self.content, &self.interactive_line) {
            content.insert_before(node, Some(line))?;
        }
        Ok(())
    }

    /// Empty the log, keeping only the live input line.
    pub fn clear(&self) {
        if let (Some(content), Some(line)) = (&self.content, &self.interactive_line) {
            content.set_inner_html("");
            let _ = content.append_child(line);
        }
    }

    /// Redraw the live input with a cursor marker at the caret.
    pub fn render_input(&self, line: &InputLine) {
        if let Some(el) = &self.user_input {
            let (before, after) = line.split_at_cursor();
            el.set_inner_html(&format!(
                "{}<span class=\"cursor\"></span>{}",
                escape_html(before),
                escape_html(after)
            ));
        }
    }

    pub fn scroll_to_bottom(&self) {
        if let Some(line) = &self.interactive_line {
            scroll_into_view(line);
        }
    }
}

fn scroll_into_view(el: &Element) {
    let opts = ScrollIntoViewOptions::new();
    opts.set_behavior(ScrollBehavior::Smooth);
    el.scroll_into_view_with_scroll_into_view_options(&opts);
}

/// Write the session prompt into every `.prompt` element already on the page.
pub fn update_prompts(doc: &Document, prompt: &str) {
    let Ok(nodes) = doc.query_selector_all(".prompt") else {
        return;
    };
    for i in 0..nodes.length() {
        if let Some(node) = nodes.item(i) {
            node.set_text_content(Some(prompt));
        }
    }
}
