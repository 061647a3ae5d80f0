//! Key handling and command dispatch for the terminal panel.
//!
//! Nothing here touches the DOM: every key press returns a list of
//! [`Effect`]s that the rendering adapter in `terminal/mod.rs` applies.

use super::commands::{Command, CommandOutput, CommandTable, DeferredOutput, to_markup};
use super::input_line::InputLine;

/// Keys the interpreter understands, decoded from a browser `KeyboardEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    Tab,
    Cancel,      // Ctrl+C
    ClearScreen, // Ctrl+L
}

impl Key {
    /// Decode `KeyboardEvent.key` plus modifier state. Returns `None` for keys
    /// the terminal ignores (Shift on its own, F-keys, Alt/Meta chords, ...).
    pub fn from_event(key: &str, ctrl: bool, alt: bool, meta: bool) -> Option<Key> {
        let named = match key {
            "Enter" => Some(Key::Enter),
            "Backspace" => Some(Key::Backspace),
            "Delete" => Some(Key::Delete),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "Home" => Some(Key::Home),
            "End" => Some(Key::End),
            "Tab" => Some(Key::Tab),
            _ => None,
        };
        if named.is_some() {
            return named;
        }

        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ctrl {
            return match c.to_ascii_lowercase() {
                'c' => Some(Key::Cancel),
                'l' => Some(Key::ClearScreen),
                _ => None,
            };
        }
        if alt || meta {
            return None;
        }
        Some(Key::Char(c))
    }

    /// Whether the browser's default action for this key must be suppressed.
    pub fn prevents_default(self) -> bool {
        !matches!(
            self,
            Key::Char(_) | Key::Enter | Key::Backspace | Key::Delete
        )
    }
}

/// One thing the view must do in response to input.
#[derive(Debug)]
pub enum Effect {
    /// Finalised command line: prompt plus the typed text.
    Echo { prompt: String, command: String },
    /// Partial input abandoned with Ctrl+C.
    Interrupted { prompt: String, partial: String },
    /// Command output markup, already newline-converted.
    Output(String),
    /// Output that arrives later; the view reserves its slot now.
    Pending(DeferredOutput),
    /// Unknown command, carrying the typed text verbatim.
    NotFound(String),
    /// Ambiguous Tab completion.
    Completions(Vec<String>),
    ClearLog,
    CloseWindow,
    LaunchGame,
}

/// The text shown for an unknown command.
pub fn not_found_message(command: &str) -> String {
    format!("bash: {command}: command not found")
}

pub struct Interpreter {
    prompt: String,
    line: InputLine,
    commands: CommandTable,
}

impl Interpreter {
    pub fn new(prompt: impl Into<String>, commands: CommandTable) -> Self {
        Self {
            prompt: prompt.into(),
            line: InputLine::new(),
            commands,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn line(&self) -> &InputLine {
        &self.line
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn handle_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Char(c) => self.line.insert(c),
            Key::Backspace => {
                self.line.backspace();
            }
            Key::Delete => {
                self.line.delete();
            }
            Key::Left => self.line.move_left(),
            Key::Right => self.line.move_right(),
            Key::Home => self.line.home(),
            Key::End => self.line.end(),
            Key::Up => self.line.history_up(),
            Key::Down => self.line.history_down(),
            Key::Tab => return self.complete(),
            Key::Enter => return self.submit(),
            Key::Cancel => return self.cancel(),
            Key::ClearScreen => return vec![Effect::ClearLog],
        }
        Vec::new()
    }

    /// Overwrite the buffer wholesale (mobile input proxy).
    pub fn replace_input(&mut self, text: &str) {
        self.line.replace(text);
    }

    /// Finalise the current buffer as a command.
    pub fn submit(&mut self) -> Vec<Effect> {
        let command = self.line.buffer().trim().to_string();
        self.line.push_history(&command);
        let mut effects = vec![Effect::Echo {
            prompt: self.prompt.clone(),
            command: command.clone(),
        }];
        effects.extend(self.dispatch(&command));
        self.line.reset();
        effects
    }

    fn cancel(&mut self) -> Vec<Effect> {
        let partial = self.line.buffer().to_string();
        self.line.reset();
        vec![Effect::Interrupted {
            prompt: self.prompt.clone(),
            partial,
        }]
    }

    /// Prefix completion against the command table.
    pub fn complete(&mut self) -> Vec<Effect> {
        let mut matches = self.commands.completions(self.line.buffer());
        match matches.len() {
            0 => Vec::new(),
            1 => {
                let only = matches.remove(0);
                self.line.replace(&only);
                Vec::new()
            }
            _ => vec![Effect::Completions(matches)],
        }
    }

    /// Resolve a finalised command into effects. Empty input produces nothing.
    pub fn dispatch(&self, command: &str) -> Vec<Effect> {
        if command.is_empty() {
            return Vec::new();
        }
        let Some(entry) = self.commands.get(command) else {
            return vec![Effect::NotFound(command.to_string())];
        };
        let effect = match entry {
            Command::Text(text) => Effect::Output(to_markup(text)),
            Command::Produce(producer) => match producer() {
                CommandOutput::Immediate(text) => Effect::Output(to_markup(&text)),
                CommandOutput::Deferred(pending) => Effect::Pending(pending),
            },
            Command::Clear => Effect::ClearLog,
            Command::Exit => Effect::CloseWindow,
            Command::Game => Effect::LaunchGame,
        };
        vec![effect]
    }
}
