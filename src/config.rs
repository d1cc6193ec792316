//! Board configuration.
//!
//! Every tunable (scroll speed, schedule periods, placeholder texts, fonts,
//! colors and the list of monitored lines) lives in one `BoardConfig` that
//! round-trips through TOML. Each section is `#[serde(default)]`, so a config
//! file only needs the values it wants to change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::canvas::{FontSpec, Rgb};
use crate::error::{BoardError, Result};

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct BoardConfig {
    pub scroll: ScrollConfig,
    pub refresh: RefreshConfig,
    pub news: NewsConfig,
    pub clock: ClockConfig,
    pub status: StatusTexts,
    pub fonts: FontConfig,
    pub colors: ColorConfig,
    pub lines: Vec<LineConfig>,
}

// --- Sections ---

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Pixels moved per tick.
    pub speed_px: f64,
    pub interval_ms: u64,
    /// Padding glyphs placed before and after a scrolling message.
    pub separator: String,
    /// Width assumed while a surface has not been laid out.
    pub fallback_width: f64,
    /// Added to ascent + descent for the fallback height.
    pub fallback_height_padding: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub period_ms: u64,
    pub initial_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct NewsConfig {
    pub enabled: bool,
    pub period_ms: u64,
    pub initial_delay_ms: u64,
    pub speed_px: f64,
    pub interval_ms: u64,
    pub prefix: String,
    pub joiner: String,
    pub empty_text: String,
    pub error_text: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ClockConfig {
    pub interval_ms: u64,
    /// `chrono` strftime format.
    pub format: String,
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StatusTexts {
    pub normal_text: String,
    /// Shown for an alert whose source gave no description.
    pub missing_text: String,
    /// Shown for a lane that has never been fetched successfully.
    pub unavailable_text: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FontConfig {
    pub status_size: f32,
    pub news_size: f32,
    pub label_size: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ColorConfig {
    pub normal_text: Rgb,
    pub alert_text: Rgb,
    pub news_text: Rgb,
    pub normal_background: Rgb,
    pub alert_background: Rgb,
    pub news_background: Rgb,
    pub board_background: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LineConfig {
    pub name: String,
    #[serde(default)]
    pub section: String,
}

impl LineConfig {
    pub fn new(name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollConfig::default(),
            refresh: RefreshConfig::default(),
            news: NewsConfig::default(),
            clock: ClockConfig::default(),
            status: StatusTexts::default(),
            fonts: FontConfig::default(),
            colors: ColorConfig::default(),
            lines: vec![
                LineConfig::new("Tokaido Shinkansen", "Shin-Osaka - Tokyo"),
                LineConfig::new("Osaka Loop Line", "Inner / Outer loop"),
                LineConfig::new("Nankai Main Line", "Namba - Wakayamashi"),
                LineConfig::new("Yamatoji Line", "JR Namba - Kamo"),
                LineConfig::new("Sunrise Izumo / Seto", "Tokyo - Izumoshi / Takamatsu"),
            ],
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            speed_px: 2.0,
            interval_ms: 50,
            separator: "  ◆◆◆  ".to_string(),
            fallback_width: 300.0,
            fallback_height_padding: 4.0,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            period_ms: 5 * 60 * 1000,
            initial_delay_ms: 100,
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: 15 * 60 * 1000,
            initial_delay_ms: 500,
            speed_px: 1.0,
            interval_ms: 40,
            prefix: "[News] ".to_string(),
            joiner: " ／ ".to_string(),
            empty_text: "No headlines available right now.".to_string(),
            error_text: "Headlines could not be loaded.".to_string(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            format: "%Y/%m/%d %H:%M:%S".to_string(),
            suffix: " now".to_string(),
        }
    }
}

impl Default for StatusTexts {
    fn default() -> Self {
        Self {
            normal_text: "Normal service".to_string(),
            missing_text: "Status details unavailable".to_string(),
            unavailable_text: "Status could not be retrieved".to_string(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            status_size: 32.0,
            news_size: 24.0,
            label_size: 26.0,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            normal_text: Rgb::BLACK,
            alert_text: Rgb::new(0.85, 0.0, 0.0),
            news_text: Rgb::BLACK,
            normal_background: Rgb::new(0.93, 0.87, 0.80),
            alert_background: Rgb::new(1.0, 1.0, 0.0),
            news_background: Rgb::new(0.93, 0.93, 0.88),
            board_background: Rgb::new(1.0, 0.894, 0.769),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ScrollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl NewsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl FontConfig {
    pub fn status(&self) -> FontSpec {
        FontSpec::new(self.status_size)
    }

    pub fn news(&self) -> FontSpec {
        FontSpec::new(self.news_size)
    }

    pub fn label(&self) -> FontSpec {
        FontSpec::new(self.label_size)
    }
}

impl BoardConfig {
    /// Reject values that would stall or spin the timer queue.
    pub fn validate(&self) -> Result<()> {
        let positive_ms = [
            ("scroll.interval_ms", self.scroll.interval_ms),
            ("refresh.period_ms", self.refresh.period_ms),
            ("news.period_ms", self.news.period_ms),
            ("news.interval_ms", self.news.interval_ms),
            ("clock.interval_ms", self.clock.interval_ms),
        ];
        for (name, value) in positive_ms {
            if value == 0 {
                return Err(BoardError::Config(format!("{name} must be greater than zero")));
            }
        }
        let speeds = [
            ("scroll.speed_px", self.scroll.speed_px),
            ("news.speed_px", self.news.speed_px),
        ];
        for (name, value) in speeds {
            if !(value > 0.0) {
                return Err(BoardError::Config(format!("{name} must be greater than zero")));
            }
        }
        if !(self.scroll.fallback_width > 1.0) {
            return Err(BoardError::Config(
                "scroll.fallback_width must be greater than 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialize from a TOML string.
    pub fn from_toml(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load from `path`. A missing file yields the defaults; a malformed or
    /// invalid file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(target: "config", path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(BoardError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config = Self::from_toml(&content)
            .map_err(|e| BoardError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        info!(
            target: "config",
            path = %path.display(),
            lines = config.lines.len(),
            "config loaded"
        );
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/laneboard/`, else `$HOME/.config/laneboard/`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("laneboard");
        return p;
    }
    let mut p = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    p.push(".config");
    p.push("laneboard");
    p
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("board.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
