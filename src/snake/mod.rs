//! Snake minigame panel.
//!
//! The panel is created on demand (the `game` command or a host `createGame`
//! event) and owns everything it starts: the tick interval, the drag
//! controller and its DOM listeners. Closing or dropping the panel stops the
//! interval before the element leaves the page, so no tick ever paints into a
//! removed canvas.

pub mod engine;

pub use engine::{Cell, Direction, FoodSource, GameKey, RandomFood, ResetCause, SnakeGame, Step};

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement};

use crate::config::SiteConfig;
use crate::dom::{self, EventListener, Interval};
use crate::drag::DragController;
use crate::error::{SiteError, SiteResult};

pub const PANEL_ID: &str = "gameContainer";
pub const CLOSE_ID: &str = "closeGame";
const HEADER_ID: &str = "gameHeader";
const SCORE_ID: &str = "gameScore";
const CANVAS_ID: &str = "gameCanvas";

const BOARD_COLOR: &str = "#161b22";
const SNAKE_COLOR: &str = "#58a6ff";
const FOOD_COLOR: &str = "#f85149";

pub type LiveGame = SnakeGame<RandomFood<SmallRng>>;

// --- Board (state + canvas) --------------------------------------------------

struct Board {
    game: LiveGame,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    score_el: Option<Element>,
    grid: f64, // px per cell
}

impl Board {
    fn tick(&mut self) {
        let step = self.game.advance();
        if matches!(step, Step::Ate | Step::Reset(_)) {
            self.update_score();
        }
        self.render();
    }

    fn press(&mut self, key: GameKey) -> bool {
        let accepted = self.game.press(key);
        if key == GameKey::Restart {
            self.update_score();
            self.render();
        }
        accepted
    }

    fn update_score(&self) {
        if let Some(el) = &self.score_el {
            el.set_text_content(Some(&self.game.score().to_string()));
        }
    }

    fn render(&self) {
        let ctx = &self.ctx;
        let size = self.grid - 2.0;
        ctx.set_fill_style_str(BOARD_COLOR);
        ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );

        ctx.set_fill_style_str(SNAKE_COLOR);
        for seg in self.game.segments() {
            ctx.fill_rect(seg.x as f64 * self.grid, seg.y as f64 * self.grid, size, size);
        }

        let food = self.game.food();
        ctx.set_fill_style_str(FOOD_COLOR);
        ctx.fill_rect(food.x as f64 * self.grid, food.y as f64 * self.grid, size, size);
    }
}

// --- Panel -------------------------------------------------------------------

pub struct SnakePanel {
    container: HtmlElement,
    board: Rc<RefCell<Board>>,
    ticker: Option<Interval>,
    drag: Option<DragController>,
    listeners: Vec<EventListener>,
}

impl SnakePanel {
    /// Build the panel, draw the first frame and start ticking.
    pub fn open(doc: &Document, config: &SiteConfig) -> SiteResult<Self> {
        let body = dom::body(doc)?;
        let container: HtmlElement = dom::create(doc, "div")?;
        container.set_id(PANEL_ID);
        container.set_attribute("style", "background:#0d1117; border:2px solid #30363d; border-radius:8px; padding:20px; text-align:center; color:#c9d1d9; font-family:'Courier New', monospace; position:fixed; top:50%; left:50%; transform:translate(-50%,-50%); z-index:1000; pointer-events:auto; outline:none;")?;
        container.set_attribute("tabindex", "0")?;
        container.set_inner_html(&panel_markup(config.game_canvas_px()));

        // Wired while detached; the container is appended last.
        let canvas: HtmlCanvasElement = dom::find_in(&container, &format!("#{CANVAS_ID}"))
            .ok_or(SiteError::MissingElement("#gameCanvas"))?;
        let ctx: CanvasRenderingContext2d = dom::cast(
            canvas
                .get_context("2d")?
                .ok_or(SiteError::NoContext(CANVAS_ID))?,
        )?;

        let origin = Cell::new(config.origin.0, config.origin.1);
        let board = Board {
            game: SnakeGame::new(
                config.tile_count,
                origin,
                RandomFood(SmallRng::from_entropy()),
            ),
            canvas,
            ctx,
            score_el: dom::find_in(&container, &format!("#{SCORE_ID}")),
            grid: config.grid_size as f64,
        };
        board.update_score();
        board.render();
        let board = Rc::new(RefCell::new(board));

        let mut listeners = Vec::new();
        if let Some(close) = dom::find_in::<Element>(&container, &format!("#{CLOSE_ID}")) {
            listeners.push(EventListener::listen(&close, "click", |_| {
                crate::site::close_game_from_event();
            })?);
        }
        listeners.push(EventListener::listen(&container, "focus", |_| {
            crate::site::game_gained_focus();
        })?);

        let drag = match dom::find_in::<HtmlElement>(&container, &format!("#{HEADER_ID}")) {
            Some(header) => Some(DragController::attach(&container, &header)?),
            None => None,
        };

        let tick_board = board.clone();
        let ticker = Interval::start(config.game_tick_ms, move || {
            if let Ok(mut b) = tick_board.try_borrow_mut() {
                b.tick();
            }
        })?;

        body.append_child(&container)?;
        log::info!("snake panel opened");
        Ok(Self {
            container,
            board,
            ticker: Some(ticker),
            drag,
            listeners,
        })
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    pub fn is_open(&self) -> bool {
        self.ticker.is_some()
    }

    /// Feed a `KeyboardEvent.code`. Returns true when the key was consumed.
    pub fn handle_code(&self, code: &str) -> bool {
        let Some(key) = GameKey::from_code(code) else {
            return false;
        };
        match self.board.try_borrow_mut() {
            Ok(mut board) => board.press(key),
            Err(_) => false,
        }
    }

    pub fn score(&self) -> u32 {
        self.board.try_borrow().map(|b| b.game.score()).unwrap_or(0)
    }

    pub fn focus(&self) {
        let _ = self.container.focus();
    }

    /// Stop ticking, detach listeners and remove the panel. Idempotent.
    pub fn close(&mut self) {
        if self.ticker.take().is_none() {
            return;
        }
        if let Some(mut drag) = self.drag.take() {
            drag.destroy();
        }
        self.listeners.clear();
        self.container.remove();
        log::info!("snake panel closed");
    }
}

impl Drop for SnakePanel {
    fn drop(&mut self) {
        self.close();
    }
}

fn panel_markup(canvas_px: u32) -> String {
    format!(
        r#"<div id="{HEADER_ID}" style="background:#21262d; padding:10px 15px; border-bottom:1px solid #30363d; display:flex; align-items:center; cursor:move; user-select:none; margin:-20px -20px 15px -20px;">
  <div style="display:flex; gap:8px; margin-right:15px;">
    <div id="{CLOSE_ID}" style="width:12px; height:12px; border-radius:50%; background:#ff5f57; cursor:pointer;"></div>
    <div style="width:12px; height:12px; border-radius:50%; background:#ffbd2e;"></div>
    <div style="width:12px; height:12px; border-radius:50%; background:#28ca42;"></div>
  </div>
  <div style="color:#c9d1d9; font-size:14px;">🐍 Snake Game</div>
</div>
<div style="font-size:18px; margin:10px 0; color:#58a6ff;">Score: <span id="{SCORE_ID}">0</span></div>
<canvas id="{CANVAS_ID}" width="{canvas_px}" height="{canvas_px}" style="border:2px solid #30363d; background:{BOARD_COLOR}; display:block; margin:0 auto;"></canvas>
<div style="margin-top:10px; font-size:14px; color:#7c3aed;">Click game area to focus, then use WASD or Arrow Keys to move<br>Press SPACE to restart • ESC to close</div>"#
    )
}
