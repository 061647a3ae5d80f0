//! Command table and output markup helpers.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::config::SiteConfig;

const HELP: &str = "help\nabout\ncontact\nclear\ndate\npwd\nqr\nexit\ngame";
const ABOUT: &str = "BADORIIO - Digital forge where ideas become reality";
const CONTACT: &str = "Email: <a href=\"mailto:amir@badori.io\" style=\"color: #58a6ff; text-decoration: underline;\">amir@badori.io</a>\n\
X: <a href=\"https://x.com/Badoriie\" target=\"_blank\" style=\"color: #58a6ff; text-decoration: underline;\">https://x.com/Badoriie</a>\n\
GitHub: <a href=\"https://github.com/badoriio\" target=\"_blank\" style=\"color: #58a6ff; text-decoration: underline;\">https://github.com/badoriio</a>";

// --- Output ------------------------------------------------------------------

/// Output still being produced (e.g. waiting on the host QR encoder).
pub struct DeferredOutput(Pin<Box<dyn Future<Output = String>>>);

impl DeferredOutput {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = String> + 'static,
    {
        Self(Box::pin(fut))
    }

    pub fn into_future(self) -> Pin<Box<dyn Future<Output = String>>> {
        self.0
    }
}

impl fmt::Debug for DeferredOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredOutput(..)")
    }
}

/// What a producer command hands back.
#[derive(Debug)]
pub enum CommandOutput {
    Immediate(String),
    Deferred(DeferredOutput),
}

pub type Producer = Rc<dyn Fn() -> CommandOutput>;

/// One command table entry.
#[derive(Clone)]
pub enum Command {
    /// Fixed author text; `\n` marks line breaks, links pass through verbatim.
    Text(Cow<'static, str>),
    Produce(Producer),
    Clear,
    Exit,
    Game,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Produce(_) => f.write_str("Produce(..)"),
            Self::Clear => f.write_str("Clear"),
            Self::Exit => f.write_str("Exit"),
            Self::Game => f.write_str("Game"),
        }
    }
}

// --- Table -------------------------------------------------------------------

/// Name → behaviour, kept in insertion order so completion lists read the
/// same way as `help`.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Vec<(String, Command)>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The site's built-in commands. `pwd` stays empty until
    /// [`CommandTable::set_home`] is called with the session's user id.
    pub fn builtin(config: &SiteConfig) -> Self {
        let payload = config.qr_payload.clone();
        let mut table = Self::new();
        table.insert("help", Command::Text(HELP.into()));
        table.insert("about", Command::Text(ABOUT.into()));
        table.insert("contact", Command::Text(CONTACT.into()));
        table.insert("date", Command::Produce(Rc::new(local_date)));
        table.insert("clear", Command::Clear);
        table.insert("pwd", Command::Text(Cow::Borrowed("")));
        table.insert(
            "qr",
            Command::Produce(Rc::new(move || {
                let payload = payload.clone();
                CommandOutput::Deferred(DeferredOutput::new(async move {
                    crate::qr::markup(&payload).await
                }))
            })),
        );
        table.insert("exit", Command::Exit);
        table.insert("game", Command::Game);
        table
    }

    /// Add or replace an entry; replacing keeps the original position.
    pub fn insert(&mut self, name: &str, command: Command) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = command,
            None => self.entries.push((name.to_string(), command)),
        }
    }

    /// Patch `pwd` with the session's home directory.
    pub fn set_home(&mut self, user_id: &str) {
        self.insert("pwd", Command::Text(format!("/home/{user_id}").into()));
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Names starting with `prefix`, in table order.
    pub fn completions(&self, prefix: &str) -> Vec<String> {
        self.names()
            .filter(|n| n.starts_with(prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn local_date() -> CommandOutput {
    CommandOutput::Immediate(String::from(js_sys::Date::new_0().to_string()))
}

// --- Markup ------------------------------------------------------------------

/// Render author text for the log: newline markers become `<br>`.
pub fn to_markup(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// Escape user-typed text before it is placed into markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
