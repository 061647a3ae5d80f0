//! Page-wide coordinator.
//!
//! One [`Site`] per page lives in a thread-local slot. Every DOM callback
//! enters through [`with_site`], which uses `try_borrow_mut`: an event fired
//! synchronously while the site is already borrowed (for example the game
//! panel's `focus` event raised by `element.focus()` during a focus change)
//! is dropped instead of panicking.

use std::cell::RefCell;

use rand::Rng;
use rand::rngs::OsRng;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, KeyboardEvent};

use crate::config::SiteConfig;
use crate::dom::{self, EventListener};
use crate::drag::DragController;
use crate::error::{SiteError, SiteResult};
use crate::focus::{Focus, FocusCoordinator, Route};
use crate::mobile::{self, MobileAdapter};
use crate::rain::RainAnimator;
use crate::snake::{self, GameKey, SnakePanel};
use crate::terminal::{self, CommandTable, Effect, Interpreter, Key, TerminalView};

thread_local! {
    static SITE: RefCell<Option<Site>> = const { RefCell::new(None) };
}

/// Session handle shown in the prompt, e.g. `user-4821`.
pub fn user_id_from(n: u32) -> String {
    format!("user-{n}")
}

pub fn prompt_for(user_id: &str, host: &str) -> String {
    format!("{user_id}@{host}:~$")
}

fn random_user_id() -> String {
    user_id_from(OsRng.gen_range(0..10_000))
}

/// Run `f` against the live site. Returns `None` when nothing is running or
/// the site is already borrowed further up the stack.
fn with_site<R>(f: impl FnOnce(&mut Site) -> R) -> Option<R> {
    SITE.with(|slot| match slot.try_borrow_mut() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            log::debug!("site busy; re-entrant event skipped");
            None
        }
    })
}

pub struct Site {
    doc: Document,
    config: SiteConfig,
    interpreter: Interpreter,
    view: TerminalView,
    focus: FocusCoordinator,
    game: Option<SnakePanel>,
    terminal_drag: Option<DragController>,
    rain: Option<RainAnimator>,
    mobile: Option<MobileAdapter>,
    listeners: Vec<EventListener>,
}

impl Site {
    fn build(config: SiteConfig) -> SiteResult<Self> {
        let doc = dom::document()?;
        let user_id = random_user_id();
        let prompt = prompt_for(&user_id, &config.host);
        terminal::update_prompts(&doc, &prompt);

        let mut commands = CommandTable::builtin(&config);
        commands.set_home(&user_id);
        let interpreter = Interpreter::new(prompt, commands);

        let view = TerminalView::attach(&doc);
        view.render_input(interpreter.line());

        let terminal_drag = match (view.panel(), dom::query_html(&doc, ".terminal-header")) {
            (Some(panel), Some(header)) => {
                dom::set_style(panel, "transition", "none");
                Some(DragController::attach(panel, &header)?)
            }
            _ => None,
        };

        // The background is decoration; the page works without it.
        let rain = match RainAnimator::start(&doc, &config) {
            Ok(rain) => Some(rain),
            Err(err) => {
                log::warn!("matrix rain disabled: {err}");
                None
            }
        };

        let mobile = if mobile::detect() {
            Some(MobileAdapter::attach(&doc, &config)?)
        } else {
            None
        };

        let listeners = Self::global_listeners(&doc)?;
        if let Ok(body) = dom::body(&doc) {
            let _ = body.set_attribute("tabindex", "0");
            let _ = body.focus();
        }

        log::info!("site started as {user_id} ({} commands)", interpreter.commands().len());
        Ok(Self {
            doc,
            config,
            interpreter,
            view,
            focus: FocusCoordinator::new(),
            game: None,
            terminal_drag,
            rain,
            mobile,
            listeners,
        })
    }

    fn global_listeners(doc: &Document) -> SiteResult<Vec<EventListener>> {
        let window = dom::win()?;
        Ok(vec![
            EventListener::listen(doc, "keydown", |evt| {
                if let Some(key) = evt.dyn_ref::<KeyboardEvent>() {
                    with_site(|site| site.on_keydown(key));
                }
            })?,
            // Capture phase, so focus moves before the panels see the click.
            EventListener::listen_capture(doc, "click", |evt| {
                with_site(|site| site.on_click(&evt));
            })?,
            EventListener::listen(&window, "createGame", |_| {
                with_site(|site| site.open_game_logged());
            })?,
            EventListener::listen(&window, "beforeunload", |_| stop())?,
        ])
    }

    pub fn focus_state(&self) -> Focus {
        self.focus.state()
    }

    pub fn game_open(&self) -> bool {
        self.game.as_ref().is_some_and(SnakePanel::is_open)
    }

    // --- Input -----------------------------------------------------------------

    fn on_keydown(&mut self, evt: &KeyboardEvent) {
        let key = evt.key();
        if key == "Tab" {
            evt.prevent_default();
        }
        match self.focus.route(&key, self.game_open()) {
            Route::CloseGame => {
                evt.prevent_default();
                self.close_game();
            }
            Route::Game => {
                let code = evt.code();
                if GameKey::from_code(&code).is_some() {
                    evt.prevent_default();
                }
                if let Some(game) = &self.game {
                    game.handle_code(&code);
                }
            }
            Route::Terminal => {
                let Some(key) = Key::from_event(&key, evt.ctrl_key(), evt.alt_key(), evt.meta_key())
                else {
                    return;
                };
                if key.prevents_default() {
                    evt.prevent_default();
                }
                let effects = self.interpreter.handle_key(key);
                self.apply(effects);
            }
        }
    }

    fn on_click(&mut self, evt: &Event) {
        if dom::target_within(evt, ".terminal") {
            self.focus_terminal();
        } else if self.game_open()
            && dom::target_within(evt, &format!("#{}", snake::PANEL_ID))
            && !dom::target_within(evt, &format!("#{}", snake::CLOSE_ID))
        {
            self.focus_game();
        }
    }

    fn focus_terminal(&mut self) {
        self.focus.focus(Focus::Terminal);
        if let Some(game) = &self.game {
            let _ = game.container().blur();
        }
        if let Ok(body) = dom::body(&self.doc) {
            let _ = body.focus();
        }
        self.refresh_glow();
    }

    fn focus_game(&mut self) {
        self.focus.focus(Focus::Game);
        self.refresh_glow();
        // Raises the panel's focus event, which finds the site borrowed and is skipped.
        if let Some(game) = &self.game {
            game.focus();
        }
    }

    fn refresh_glow(&self) {
        let game = self.game.as_ref().map(SnakePanel::container);
        self.focus.apply_glow(self.view.panel(), game);
    }

    /// Mirror the mobile field into the buffer.
    fn replace_input(&mut self, text: &str) {
        self.interpreter.replace_input(text);
        if self.focus.state() != Focus::Terminal {
            self.focus_terminal();
        }
        self.view.render_input(self.interpreter.line());
    }

    fn submit(&mut self) {
        let effects = self.interpreter.submit();
        self.apply(effects);
    }

    // --- Effects ---------------------------------------------------------------

    fn apply(&mut self, effects: Vec<Effect>) {
        let produced = !effects.is_empty();
        for effect in effects {
            match effect {
                Effect::CloseWindow => {
                    if let Ok(w) = dom::win() {
                        let _ = w.close();
                    }
                }
                Effect::LaunchGame => self.open_game_logged(),
                other => {
                    if let Err(err) = self.view.render(other) {
                        log::error!("terminal render: {err}");
                    }
                }
            }
        }
        self.view.render_input(self.interpreter.line());
        if produced {
            self.view.scroll_to_bottom();
        }
    }

    // --- Game ------------------------------------------------------------------

    /// Replace any open game with a fresh one and hand it the keyboard.
    pub fn open_game(&mut self) -> SiteResult<()> {
        self.close_game();
        let panel = SnakePanel::open(&self.doc, &self.config)?;
        self.game = Some(panel);
        self.focus_game();
        Ok(())
    }

    fn open_game_logged(&mut self) {
        if let Err(err) = self.open_game() {
            log::error!("could not open game: {err}");
        }
    }

    pub fn close_game(&mut self) {
        if let Some(mut game) = self.game.take() {
            game.close();
        }
        self.focus.game_closed();
        self.refresh_glow();
    }

    /// Drop every listener, timer and added element. Safe to repeat.
    pub fn teardown(&mut self) {
        self.listeners.clear();
        if let Some(mut game) = self.game.take() {
            game.close();
        }
        if let Some(mut drag) = self.terminal_drag.take() {
            drag.destroy();
        }
        if let Some(mut rain) = self.rain.take() {
            rain.stop();
        }
        if let Some(mut mobile) = self.mobile.take() {
            mobile.destroy();
        }
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        self.teardown();
    }
}

// --- Entry points ---------------------------------------------------------------

/// Start (or restart) the site with `config`.
pub fn start(config: SiteConfig) -> SiteResult<()> {
    config.validate()?;
    stop();
    let site = Site::build(config)?;
    site.refresh_glow();
    SITE.with(|slot| match slot.try_borrow_mut() {
        Ok(mut guard) => {
            *guard = Some(site);
            Ok(())
        }
        Err(_) => Err(SiteError::Js("site is busy".into())),
    })
}

/// Tear the site down. The site is moved out of the slot before it drops, so
/// listeners removed during teardown never observe a borrowed slot.
pub fn stop() {
    let taken = SITE.with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()));
    if let Some(mut site) = taken {
        site.teardown();
        log::info!("site stopped");
    }
}

pub fn is_running() -> bool {
    SITE.with(|slot| slot.try_borrow().map(|s| s.is_some()).unwrap_or(true))
}

pub fn open_game() -> SiteResult<()> {
    with_site(Site::open_game).unwrap_or_else(|| {
        log::warn!("open_game: site not running");
        Ok(())
    })
}

pub fn close_game() {
    with_site(Site::close_game);
}

pub fn focus_state() -> Option<Focus> {
    with_site(|site| site.focus_state())
}

pub fn game_is_open() -> bool {
    with_site(|site| site.game_open()).unwrap_or(false)
}

pub(crate) fn close_game_from_event() {
    with_site(Site::close_game);
}

pub(crate) fn game_gained_focus() {
    with_site(|site| {
        if site.game_open() {
            site.focus.focus(Focus::Game);
            site.refresh_glow();
        }
    });
}

pub(crate) fn mobile_input(text: &str) {
    with_site(|site| site.replace_input(text));
}

pub(crate) fn mobile_submit() {
    with_site(Site::submit);
}
