//! Falling-glyph background.
//!
//! `RainField` holds the per-column drop rows and decides what to paint;
//! `RainAnimator` owns the canvas, the frame interval and the resize hooks.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::config::SiteConfig;
use crate::dom::{self, EventListener, Interval, Timeout};
use crate::error::{SiteError, SiteResult};

const CANVAS_ID: &str = "matrix-bg";
const FADE: &str = "rgba(13, 17, 23, 0.05)";
const GLYPH_COLOR: &str = "#58a6ff";

/// One glyph to paint this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct RainField {
    drops: Vec<u32>, // current row per column
    height: f64,
    pitch: f64,
    glyphs: Vec<char>,
    reset_threshold: f64,
}

impl RainField {
    pub fn new(width: f64, height: f64, config: &SiteConfig) -> Self {
        let mut glyphs: Vec<char> = config.rain_glyphs.chars().collect();
        if glyphs.is_empty() {
            glyphs.push('0');
        }
        let mut field = Self {
            drops: Vec::new(),
            height,
            pitch: config.rain_pitch.max(1.0),
            glyphs,
            reset_threshold: config.rain_reset_threshold,
        };
        field.resize(width, height);
        field
    }

    /// Re-read surface size; every column restarts at row 1.
    pub fn resize(&mut self, width: f64, height: f64) {
        let columns = (width.max(0.0) / self.pitch).ceil() as usize;
        self.height = height;
        self.drops = vec![1; columns];
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    pub fn drops(&self) -> &[u32] {
        &self.drops
    }

    /// Produce this frame's glyphs and advance every drop by one row. Drops
    /// that fell past the bottom restart at the top only occasionally, which
    /// keeps columns out of step with each other.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Vec<Glyph> {
        let mut out = Vec::with_capacity(self.drops.len());
        for (i, drop) in self.drops.iter_mut().enumerate() {
            let ch = self.glyphs[rng.gen_range(0..self.glyphs.len())];
            let y = *drop as f64 * self.pitch;
            out.push(Glyph {
                ch,
                x: i as f64 * self.pitch,
                y,
            });
            if y > self.height && rng.r#gen::<f64>() > self.reset_threshold {
                *drop = 0;
            }
            *drop += 1;
        }
        out
    }
}

// --- Canvas adapter ------------------------------------------------------------

struct Surface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    field: RefCell<RainField>,
    rng: RefCell<SmallRng>,
    font: String,
}

impl Surface {
    fn fit_to_viewport(&self) {
        let (w, h) = dom::viewport();
        self.canvas.set_width(w as u32);
        self.canvas.set_height(h as u32);
        self.field.borrow_mut().resize(w, h);
    }

    fn draw(&self) {
        let (Ok(mut field), Ok(mut rng)) = (self.field.try_borrow_mut(), self.rng.try_borrow_mut())
        else {
            return;
        };
        let ctx = &self.ctx;
        ctx.set_fill_style_str(FADE);
        ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        ctx.set_fill_style_str(GLYPH_COLOR);
        ctx.set_font(&self.font);
        let mut buf = [0u8; 4];
        for g in field.step(&mut *rng) {
            ctx.fill_text(g.ch.encode_utf8(&mut buf), g.x, g.y).ok();
        }
    }
}

fn start_frames(surface: &Rc<Surface>, period_ms: i32) -> SiteResult<Interval> {
    let s = surface.clone();
    Interval::start(period_ms, move || s.draw())
}

pub struct RainAnimator {
    surface: Rc<Surface>,
    frames: Rc<RefCell<Option<Interval>>>,
    pending_reorient: Rc<RefCell<Option<Timeout>>>,
    listeners: Vec<EventListener>,
}

impl RainAnimator {
    pub fn start(doc: &Document, config: &SiteConfig) -> SiteResult<Self> {
        let canvas: HtmlCanvasElement = dom::create(doc, "canvas")?;
        canvas.set_id(CANVAS_ID);
        canvas.set_attribute(
            "style",
            "position:fixed; top:0; left:0; width:100%; height:100%; z-index:-1; opacity:0.05;",
        )?;
        dom::body(doc)?.append_child(&canvas)?;
        let ctx: CanvasRenderingContext2d = dom::cast(
            canvas
                .get_context("2d")?
                .ok_or(SiteError::NoContext(CANVAS_ID))?,
        )?;

        let (w, h) = dom::viewport();
        let surface = Rc::new(Surface {
            canvas,
            ctx,
            field: RefCell::new(RainField::new(w, h, config)),
            rng: RefCell::new(SmallRng::from_entropy()),
            font: format!("{}px monospace", config.rain_pitch),
        });
        surface.fit_to_viewport();

        let period = config.rain_frame_ms(w);
        let frames = Rc::new(RefCell::new(Some(start_frames(&surface, period)?)));
        let pending_reorient = Rc::new(RefCell::new(None));
        let window = dom::win()?;

        let mut listeners = Vec::new();
        {
            let surface = surface.clone();
            let frames = frames.clone();
            let cfg = config.clone();
            let mut current = period;
            listeners.push(EventListener::listen(&window, "resize", move |_| {
                surface.fit_to_viewport();
                let (w, _) = dom::viewport();
                let wanted = cfg.rain_frame_ms(w);
                if wanted != current {
                    log::debug!("rain frame period {current}ms -> {wanted}ms");
                    current = wanted;
                    let mut slot = frames.borrow_mut();
                    slot.take();
                    match start_frames(&surface, wanted) {
                        Ok(iv) => *slot = Some(iv),
                        Err(err) => log::error!("rain restart: {err}"),
                    }
                }
            })?);
        }
        {
            let surface = surface.clone();
            let pending = pending_reorient.clone();
            let delay = config.orientation_delay_ms;
            listeners.push(EventListener::listen(&window, "orientationchange", move |_| {
                let s = surface.clone();
                // Replacing the slot cancels a reorientation still waiting.
                match Timeout::start(delay, move || s.fit_to_viewport()) {
                    Ok(t) => *pending.borrow_mut() = Some(t),
                    Err(err) => log::error!("orientation timer: {err}"),
                }
            })?);
        }

        Ok(Self {
            surface,
            frames,
            pending_reorient,
            listeners,
        })
    }

    pub fn columns(&self) -> usize {
        self.surface.field.borrow().columns()
    }

    /// Stop animating and remove the canvas. Idempotent.
    pub fn stop(&mut self) {
        self.listeners.clear();
        self.pending_reorient.borrow_mut().take();
        self.frames.borrow_mut().take();
        self.surface.canvas.remove();
    }
}

impl Drop for RainAnimator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn field(width: f64, height: f64) -> RainField {
        RainField::new(width, height, &SiteConfig::default())
    }

    #[test]
    fn test_columns_cover_width() {
        assert_eq!(field(140.0, 100.0).columns(), 10);
        assert_eq!(field(141.0, 100.0).columns(), 11);
        assert_eq!(field(0.0, 100.0).columns(), 0);
        assert!(field(141.0, 100.0).drops().iter().all(|&d| d == 1));
    }

    #[test]
    fn test_step_paints_one_glyph_per_column_and_advances() {
        let mut f = field(70.0, 1000.0);
        let mut rng = StdRng::seed_from_u64(1);
        let glyphs = f.step(&mut rng);
        assert_eq!(glyphs.len(), 5);
        for (i, g) in glyphs.iter().enumerate() {
            assert!(g.ch == '0' || g.ch == '1');
            assert_eq!(g.x, i as f64 * 14.0);
            assert_eq!(g.y, 14.0);
        }
        assert!(f.drops().iter().all(|&d| d == 2));
    }

    #[test]
    fn test_drops_reset_only_past_bottom() {
        let mut f = field(140.0, 28.0);
        let mut rng = StdRng::seed_from_u64(3);
        // Rows 1 and 2 are on screen; no drop may reset.
        f.step(&mut rng);
        f.step(&mut rng);
        assert!(f.drops().iter().all(|&d| d == 3));
        // Keep stepping; every column eventually wraps back to a low row.
        let mut wrapped = vec![false; f.columns()];
        for _ in 0..2000 {
            f.step(&mut rng);
            for (i, &d) in f.drops().iter().enumerate() {
                if d == 1 {
                    wrapped[i] = true;
                }
            }
        }
        assert!(wrapped.iter().all(|&w| w));
    }

    #[test]
    fn test_never_resets_when_threshold_is_one() {
        let cfg = SiteConfig {
            rain_reset_threshold: 1.0,
            ..SiteConfig::default()
        };
        let mut f = RainField::new(28.0, 14.0, &cfg);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            f.step(&mut rng);
        }
        assert!(f.drops().iter().all(|&d| d == 51));
    }

    #[test]
    fn test_resize_reinitialises() {
        let mut f = field(140.0, 100.0);
        let mut rng = StdRng::seed_from_u64(5);
        f.step(&mut rng);
        f.resize(280.0, 50.0);
        assert_eq!(f.columns(), 20);
        assert!(f.drops().iter().all(|&d| d == 1));
    }
}
