//! Marquee engine.
//!
//! Decides per lane whether a message fits its strip (drawn centered, static)
//! or must scroll (wrapped in separator glyphs, moving left one step per
//! tick and re-entering from the right edge once it has fully left).
//!
//! Every position is the text's *center*: drawing, recentering on resize and
//! the wrap check all use the same anchor. The wrap check therefore compares
//! against half the text width.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::canvas::{Canvas, FontSpec, Geometry, Rgb, SurfaceId};
use crate::config::ScrollConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::Result;
use crate::lane::{LaneKey, single_line};
use crate::registry::{ScrollRegistry, ScrollTask};
use crate::scheduler::{Scheduler, Tick};

/// Lower bound for a tick interval so a lane can never spin the queue.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Engine-wide defaults, normally taken from `[scroll]` in the config.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollDefaults {
    pub speed_px: f64,
    pub interval: Duration,
    pub separator: String,
    pub fallback_width: f64,
    pub fallback_height_padding: f64,
}

impl From<&ScrollConfig> for ScrollDefaults {
    fn from(config: &ScrollConfig) -> Self {
        Self {
            speed_px: config.speed_px,
            interval: config.interval(),
            separator: config.separator.clone(),
            fallback_width: config.fallback_width,
            fallback_height_padding: config.fallback_height_padding,
        }
    }
}

impl Default for ScrollDefaults {
    fn default() -> Self {
        Self::from(&ScrollConfig::default())
    }
}

/// How a lane's text is rendered. `None` overrides fall back to the engine
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneStyle {
    pub font: FontSpec,
    pub color: Rgb,
    pub speed_px: Option<f64>,
    pub interval: Option<Duration>,
}

impl LaneStyle {
    pub fn new(font: FontSpec, color: Rgb) -> Self {
        Self {
            font,
            color,
            speed_px: None,
            interval: None,
        }
    }

    pub fn with_speed(mut self, speed_px: f64, interval: Duration) -> Self {
        self.speed_px = Some(speed_px);
        self.interval = Some(interval);
        self
    }
}

/// Result of [`MarqueeEngine::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The text fits and is drawn centered.
    Static,
    /// The text is scrolling; the first tick is scheduled.
    Scrolling,
}

/// Result of one [`MarqueeEngine::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// No task, or the task is static.
    Skipped,
    Moved,
    /// The text left the strip and was put back at the right edge.
    Wrapped,
    /// Drawing failed; the lane was stopped.
    Stopped,
}

#[derive(Debug, Default)]
pub struct MarqueeEngine {
    registry: ScrollRegistry,
    defaults: ScrollDefaults,
}

impl MarqueeEngine {
    pub fn new(defaults: ScrollDefaults) -> Self {
        Self {
            registry: ScrollRegistry::new(),
            defaults,
        }
    }

    pub fn registry(&self) -> &ScrollRegistry {
        &self.registry
    }

    pub fn defaults(&self) -> &ScrollDefaults {
        &self.defaults
    }

    /// Show `raw_text` on `lane`, replacing whatever the lane showed before.
    ///
    /// The previous task is stopped the same way [`stop`](Self::stop) does
    /// it, so replacing the last scrolling alert lifts a pending deferral.
    #[allow(clippy::too_many_arguments)]
    pub fn start<C, S>(
        &mut self,
        canvas: &mut C,
        timers: &mut S,
        coordinator: &mut RefreshCoordinator,
        lane: LaneKey,
        surface: SurfaceId,
        raw_text: &str,
        is_alert: bool,
        style: &LaneStyle,
    ) -> Result<Placement>
    where
        C: Canvas + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.stop(canvas, timers, coordinator, lane);

        let text = single_line(raw_text);
        let speed_px = style.speed_px.unwrap_or(self.defaults.speed_px);
        let interval = style.interval.unwrap_or(self.defaults.interval).max(MIN_INTERVAL);
        let (width, height) = self.surface_extent(canvas, surface, &style.font);
        let y = height / 2.0;

        let text_width = canvas.measure_text(&text, &style.font);
        if text_width <= width {
            let x = width / 2.0;
            let content =
                canvas.draw_centered_text(surface, x, y, &text, &style.font, style.color)?;
            debug!(target: "marquee", lane = %lane, alert = is_alert, "static text");
            let task = ScrollTask {
                surface,
                content: Some(content),
                display_text: text,
                pending_tick: None,
                text_width,
                x,
                y,
                active: false,
                alert: is_alert,
                font: style.font,
                color: style.color,
                speed_px,
                interval,
            };
            self.registry.upsert(lane, task, canvas, timers);
            return Ok(Placement::Static);
        }

        let separator = &self.defaults.separator;
        let display_text = format!("{separator}{text}{separator}");
        let text_width = canvas.measure_text(&display_text, &style.font);
        // fully off-screen to the right
        let x = width + text_width / 2.0;
        let content =
            canvas.draw_centered_text(surface, x, y, &display_text, &style.font, style.color)?;
        let pending_tick = timers.schedule_after(interval, Tick::Lane(lane));
        info!(
            target: "marquee",
            lane = %lane,
            alert = is_alert,
            text_width,
            surface_width = width,
            "scrolling text"
        );
        let task = ScrollTask {
            surface,
            content: Some(content),
            display_text,
            pending_tick: Some(pending_tick),
            text_width,
            x,
            y,
            active: true,
            alert: is_alert,
            font: style.font,
            color: style.color,
            speed_px,
            interval,
        };
        self.registry.upsert(lane, task, canvas, timers);
        Ok(Placement::Scrolling)
    }

    /// One animation step for `lane`. Never fails: a drawing error stops the
    /// lane instead.
    pub fn advance<C, S>(
        &mut self,
        canvas: &mut C,
        timers: &mut S,
        coordinator: &mut RefreshCoordinator,
        lane: LaneKey,
    ) -> Advance
    where
        C: Canvas + ?Sized,
        S: Scheduler + ?Sized,
    {
        let Some(task) = self.registry.get_mut(lane) else {
            return Advance::Skipped;
        };
        if !task.active {
            return Advance::Skipped;
        }
        // normally already fired; cancelling keeps a direct call from doubling up
        if let Some(handle) = task.pending_tick.take() {
            timers.cancel(handle);
        }

        task.x -= task.speed_px;
        let mut outcome = Advance::Moved;
        if task.has_left_view() {
            // Re-read the width so a resize mid-scroll is honored here.
            let width = live_width(canvas, task.surface, self.defaults.fallback_width);
            task.x = width + task.text_width / 2.0;
            outcome = Advance::Wrapped;
        }

        let moved = match task.content {
            Some(content) => canvas.move_content(task.surface, content, task.x, task.y),
            None => Ok(()),
        };
        if let Err(e) = moved {
            warn!(target: "marquee", lane = %lane, "redraw failed, stopping lane: {e}");
            self.stop(canvas, timers, coordinator, lane);
            return Advance::Stopped;
        }

        let (is_alert, interval) = (task.alert, task.interval);
        if is_alert && coordinator.is_pending() {
            let others_active = self.registry.any_active(|t| t.alert, Some(lane));
            if coordinator.alert_tick_completed(others_active) {
                info!(
                    target: "refresh",
                    lane = %lane,
                    "last alert marquee cycled, running deferred refresh"
                );
                coordinator.queue_refresh(timers);
            }
        }

        let handle = timers.schedule_after(interval, Tick::Lane(lane));
        if let Some(task) = self.registry.get_mut(lane) {
            task.pending_tick = Some(handle);
        }
        outcome
    }

    /// Stop `lane`: cancel its tick, delete its text, drop its task. Safe to
    /// call on a lane that was never started.
    ///
    /// If this was the last scrolling alert lane while a refresh is pending,
    /// the refresh is scheduled right away.
    pub fn stop<C, S>(
        &mut self,
        canvas: &mut C,
        timers: &mut S,
        coordinator: &mut RefreshCoordinator,
        lane: LaneKey,
    ) where
        C: Canvas + ?Sized,
        S: Scheduler + ?Sized,
    {
        let Some(task) = self.registry.remove(lane, canvas, timers) else {
            return;
        };
        debug!(target: "marquee", lane = %lane, "stopped");
        if task.active && task.alert && coordinator.is_pending() {
            let others_active = self.registry.any_active(|t| t.alert, None);
            if coordinator.alert_lane_stopped(others_active) {
                info!(
                    target: "refresh",
                    lane = %lane,
                    "last alert marquee stopped, running deferred refresh"
                );
                coordinator.queue_refresh(timers);
            }
        }
    }

    /// Stop every lane without touching the refresh coordinator.
    pub fn stop_all<C, S>(&mut self, canvas: &mut C, timers: &mut S)
    where
        C: Canvas + ?Sized,
        S: Scheduler + ?Sized,
    {
        for lane in self.registry.keys() {
            self.registry.remove(lane, canvas, timers);
        }
    }

    /// The lane's surface changed size. Static text is recentered; scrolling
    /// text picks the new width up at its next wrap.
    pub fn on_resize<C>(&mut self, canvas: &mut C, lane: LaneKey)
    where
        C: Canvas + ?Sized,
    {
        let Some(task) = self.registry.get_mut(lane) else {
            return;
        };
        if task.active {
            return;
        }
        let Some(content) = task.content else {
            return;
        };
        let Some(size) = canvas.surface_size(task.surface).filter(|s| s.is_laid_out()) else {
            return;
        };

        let (x, y) = (size.width / 2.0, size.height / 2.0);
        match canvas.move_content(task.surface, content, x, y) {
            Ok(()) => {
                task.x = x;
                task.y = y;
            }
            Err(e) => {
                warn!(target: "marquee", lane = %lane, "recenter failed, dropping lane: {e}");
                self.registry.forget(lane);
            }
        }
    }

    /// Surface width and height, substituting the fallback for a surface that
    /// is not laid out yet.
    fn surface_extent<G>(&self, canvas: &G, surface: SurfaceId, font: &FontSpec) -> (f64, f64)
    where
        G: Geometry + ?Sized,
    {
        let size = canvas.surface_size(surface);
        let width = match size {
            Some(s) if s.has_width() => s.width,
            _ => self.defaults.fallback_width,
        };
        let height = match size {
            Some(s) if s.has_height() => s.height,
            _ => canvas.font_metrics(font).line_height() + self.defaults.fallback_height_padding,
        };
        (width, height)
    }
}

fn live_width<G>(canvas: &G, surface: SurfaceId, fallback: f64) -> f64
where
    G: Geometry + ?Sized,
{
    match canvas.surface_size(surface) {
        Some(s) if s.has_width() => s.width,
        _ => fallback,
    }
}
