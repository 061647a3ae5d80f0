//! Site configuration.
//!
//! Every knob has a built-in default matching the shipped site. With the
//! `serde_json` feature the host page can override any subset of fields by
//! passing a JSON object to `start_site_with_config`.

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Width (px) at or below which the viewport counts as mobile.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// Glow applied to whichever panel owns keyboard focus.
pub const FOCUS_GLOW: &str = "0 0 10px #58a6ff";

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(default))]
pub struct SiteConfig {
    /// Domain shown in the prompt (`user-42@<host>:~$`).
    pub host: String,
    /// Text encoded by the `qr` command.
    pub qr_payload: String,
    /// `log` level filter name (error, warn, info, debug, trace).
    pub log_level: String,

    // --- Minigame ---
    pub game_tick_ms: i32,
    pub grid_size: u32, // pixel size of one cell
    pub tile_count: i32, // cells per axis
    pub origin: (i32, i32),

    // --- Background rain ---
    pub rain_frame_ms_desktop: i32,
    pub rain_frame_ms_mobile: i32,
    pub mobile_breakpoint: f64,
    pub rain_glyphs: String,
    pub rain_pitch: f64,
    /// A drop below the bottom edge resets when a uniform sample exceeds this.
    pub rain_reset_threshold: f64,
    pub orientation_delay_ms: i32,

    // --- Mobile ---
    pub scroll_hide_ms: i32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: "badori.io".into(),
            qr_payload: "https://github.com/badoriio".into(),
            log_level: "info".into(),
            game_tick_ms: 150,
            grid_size: 20,
            tile_count: 20,
            origin: (10, 10),
            rain_frame_ms_desktop: 100,
            rain_frame_ms_mobile: 150,
            mobile_breakpoint: MOBILE_BREAKPOINT,
            rain_glyphs: "01".into(),
            rain_pitch: 14.0,
            rain_reset_threshold: 0.975,
            orientation_delay_ms: 100,
            scroll_hide_ms: 1500,
        }
    }
}

impl SiteConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    #[cfg(feature = "serde_json")]
    pub fn from_json(raw: &str) -> crate::error::SiteResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| crate::error::SiteError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject boards the snake cannot be played on.
    pub fn validate(&self) -> crate::error::SiteResult<()> {
        use crate::error::SiteError;
        use crate::snake::engine::MIN_TILE_COUNT;

        if self.tile_count < MIN_TILE_COUNT {
            return Err(SiteError::Config(format!(
                "tile_count must be at least {MIN_TILE_COUNT}, got {}",
                self.tile_count
            )));
        }
        let (x, y) = self.origin;
        let grid = 0..self.tile_count;
        if !grid.contains(&x) || !grid.contains(&y) {
            return Err(SiteError::Config(format!(
                "origin ({x}, {y}) lies outside the {n}x{n} grid",
                n = self.tile_count
            )));
        }
        Ok(())
    }

    /// Frame period for the rain animation at the given viewport width.
    pub fn rain_frame_ms(&self, viewport_width: f64) -> i32 {
        if viewport_width <= self.mobile_breakpoint {
            self.rain_frame_ms_mobile
        } else {
            self.rain_frame_ms_desktop
        }
    }

    /// Side length of the square game canvas in pixels.
    pub fn game_canvas_px(&self) -> u32 {
        self.grid_size * self.tile_count.max(1) as u32
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
