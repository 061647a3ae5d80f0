//! Keyboard ownership between the terminal and the game panel.

use web_sys::HtmlElement;

use crate::config::FOCUS_GLOW;
use crate::dom;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Terminal,
    Game,
}

/// Where a key press should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Terminal,
    Game,
    CloseGame,
}

#[derive(Debug, Default)]
pub struct FocusCoordinator {
    state: Focus,
}

impl FocusCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Focus {
        self.state
    }

    /// Move focus; returns whether the owner changed.
    pub fn focus(&mut self, target: Focus) -> bool {
        let changed = self.state != target;
        if changed {
            log::debug!("focus {:?} -> {:?}", self.state, target);
        }
        self.state = target;
        changed
    }

    /// The game went away; hand focus back if it held it.
    pub fn game_closed(&mut self) -> bool {
        self.focus(Focus::Terminal)
    }

    /// Escape always closes an open game. Everything else follows focus.
    pub fn route(&self, key: &str, game_open: bool) -> Route {
        if !game_open {
            return Route::Terminal;
        }
        if key == "Escape" {
            return Route::CloseGame;
        }
        match self.state {
            Focus::Terminal => Route::Terminal,
            Focus::Game => Route::Game,
        }
    }

    /// Glow the owner and clear the other panel.
    pub fn apply_glow(&self, terminal: Option<&HtmlElement>, game: Option<&HtmlElement>) {
        let (on, off) = match self.state {
            Focus::Terminal => (terminal, game),
            Focus::Game => (game, terminal),
        };
        if let Some(el) = on {
            dom::set_style(el, "box-shadow", FOCUS_GLOW);
        }
        if let Some(el) = off {
            dom::set_style(el, "box-shadow", "none");
        }
    }
}
