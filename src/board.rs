//! The board: one explicitly owned context tying the marquee engine, the
//! refresh coordinator, the timer queue, the canvas and the status source
//! together.
//!
//! Nothing here is global. A host creates a [`Board`], feeds it resize
//! notifications and clock offsets, and reads view state back for painting.
//! Dropping or [`close`](Board::close)-ing the board releases every timer and
//! drawn item.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::canvas::{RetainedCanvas, SurfaceId, TextMeasure};
use crate::config::BoardConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::{BoardError, Result};
use crate::lane::{LaneKey, LaneStatus};
use crate::marquee::{LaneStyle, MarqueeEngine, Placement, ScrollDefaults};
use crate::scheduler::{Scheduler, Tick, TimerQueue};
use crate::source::{StatusSource, headline_text};

/// Fallback when the configured clock format cannot be rendered.
const DEFAULT_CLOCK_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// What the host needs to paint one line's row.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneView {
    pub name: String,
    pub section: String,
    pub surface: SurfaceId,
    /// Last successfully fetched status.
    pub status: Option<LaneStatus>,
    /// Reason the most recent fetch failed, cleared on the next success.
    pub last_error: Option<String>,
}

impl LaneView {
    pub fn is_alert(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_alert)
    }
}

/// Outcome of one pass over every line.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub updated: Vec<LaneKey>,
    /// Lanes that could not be updated. The others were still processed.
    pub failed: Vec<(LaneKey, BoardError)>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub enum RefreshAttempt {
    Ran(RefreshReport),
    /// An alert lane is scrolling; the refresh runs once it has cycled.
    Deferred,
}

pub struct Board<M> {
    config: BoardConfig,
    canvas: RetainedCanvas<M>,
    timers: TimerQueue,
    engine: MarqueeEngine,
    coordinator: RefreshCoordinator,
    source: Box<dyn StatusSource>,
    lanes: Vec<LaneView>,
    news_surface: SurfaceId,
    news_text: String,
    clock_text: String,
    running: bool,
    refreshes_run: u64,
}

impl<M: TextMeasure> Board<M> {
    /// Build a board with one surface per configured line plus the news
    /// surface, and schedule the first refresh, news and clock ticks.
    pub fn open<S>(config: BoardConfig, measure: M, source: S) -> Result<Self>
    where
        S: StatusSource + 'static,
    {
        config.validate()?;

        let mut canvas = RetainedCanvas::new(measure);
        let lanes = config
            .lines
            .iter()
            .map(|line| LaneView {
                name: line.name.clone(),
                section: line.section.clone(),
                surface: canvas.add_surface(),
                status: None,
                last_error: None,
            })
            .collect::<Vec<_>>();
        let news_surface = canvas.add_surface();

        let mut timers = TimerQueue::new();
        timers.schedule_after(
            Duration::from_millis(config.refresh.initial_delay_ms),
            Tick::Refresh,
        );
        if config.news.enabled {
            timers.schedule_after(Duration::from_millis(config.news.initial_delay_ms), Tick::News);
        }
        timers.schedule_after(Duration::ZERO, Tick::Clock);

        info!(target: "board", lines = lanes.len(), news = config.news.enabled, "board opened");

        Ok(Self {
            engine: MarqueeEngine::new(ScrollDefaults::from(&config.scroll)),
            config,
            canvas,
            timers,
            coordinator: RefreshCoordinator::new(),
            source: Box::new(source),
            lanes,
            news_surface,
            news_text: String::new(),
            clock_text: String::new(),
            running: true,
            refreshes_run: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Lane control
    // -----------------------------------------------------------------------

    /// Show `text` on `lane` with the board's style for that lane.
    pub fn start_lane(&mut self, lane: LaneKey, text: &str, is_alert: bool) -> Result<Placement> {
        let surface = self
            .surface_for(lane)
            .ok_or(BoardError::UnknownLane { lane })?;
        let style = self.style_for(lane, is_alert);
        self.engine.start(
            &mut self.canvas,
            &mut self.timers,
            &mut self.coordinator,
            lane,
            surface,
            text,
            is_alert,
            &style,
        )
    }

    pub fn stop_lane(&mut self, lane: LaneKey) {
        self.engine
            .stop(&mut self.canvas, &mut self.timers, &mut self.coordinator, lane);
    }

    /// Periodic refresh entry point: refresh now, or defer while an alert
    /// lane is scrolling.
    pub fn attempt_or_defer(&mut self) -> RefreshAttempt {
        let alert_active = self.engine.registry().any_active(|t| t.alert, None);
        if self.coordinator.scheduled(alert_active) {
            RefreshAttempt::Ran(self.refresh_lanes())
        } else {
            info!(target: "refresh", "alert marquee scrolling, refresh deferred");
            RefreshAttempt::Deferred
        }
    }

    /// Fetch and show every line's status. One lane failing never stops the
    /// others from updating.
    pub fn refresh_lanes(&mut self) -> RefreshReport {
        if let Some(queued) = self.coordinator.take_queued() {
            // this pass covers the lifted deferral
            self.timers.cancel(queued);
        }
        let mut report = RefreshReport::default();

        for index in 0..self.lanes.len() {
            let lane = LaneKey::Line(index);
            let name = self.lanes[index].name.clone();

            match self.source.fetch_lane_status(lane, &name) {
                Ok(status) => {
                    let text = self.display_text(&status);
                    if let Err(e) = self.start_lane(lane, &text, status.is_alert) {
                        warn!(target: "board", lane = %lane, "could not draw status: {e}");
                        report.failed.push((lane, e));
                    } else {
                        report.updated.push(lane);
                    }
                    let view = &mut self.lanes[index];
                    view.status = Some(status);
                    view.last_error = None;
                }
                Err(e) => {
                    warn!(target: "feed", lane = %lane, name = %name, "{e}");
                    self.lanes[index].last_error = Some(e.to_string());
                    if self.engine.registry().get(lane).is_none() {
                        let placeholder = self.config.status.unavailable_text.clone();
                        if let Err(draw) = self.start_lane(lane, &placeholder, false) {
                            warn!(
                                target: "board",
                                lane = %lane,
                                "could not draw placeholder: {draw}"
                            );
                        }
                    }
                    report.failed.push((lane, e));
                }
            }
        }

        self.refreshes_run += 1;
        info!(
            target: "refresh",
            updated = report.updated.len(),
            failed = report.failed.len(),
            "lanes refreshed"
        );
        report
    }

    /// Fetch headlines and restart the news lane.
    pub fn update_news(&mut self) -> Result<Placement> {
        let headlines = self.source.fetch_headlines();
        if let Err(e) = &headlines {
            warn!(target: "feed", "headlines unavailable: {e}");
        }
        self.news_text = headline_text(&self.config.news, &headlines);
        let text = self.news_text.clone();
        self.start_lane(LaneKey::News, &text, false)
    }

    /// Render `now` with the configured clock format.
    pub fn update_clock(&mut self, now: DateTime<Local>) {
        let mut text = String::new();
        if write!(text, "{}", now.format(&self.config.clock.format)).is_err() {
            debug!(
                target: "board",
                format = %self.config.clock.format,
                "bad clock format, using default"
            );
            text = now.format(DEFAULT_CLOCK_FORMAT).to_string();
        }
        text.push_str(&self.config.clock.suffix);
        self.clock_text = text;
    }

    /// The host laid `surface` out at a new size.
    pub fn resize_surface(&mut self, surface: SurfaceId, width: f64, height: f64) {
        if !self.canvas.set_surface_size(surface, width, height) {
            debug!(target: "board", surface = %surface, "resize for unknown surface");
            return;
        }
        let Some(lane) = self.lane_for(surface) else {
            return;
        };
        if width <= 1.0 || height <= 1.0 {
            let reason = BoardError::GeometryUnavailable { surface };
            debug!(target: "board", lane = %lane, "{reason}");
            return;
        }
        self.engine.on_resize(&mut self.canvas, lane);
    }

    // -----------------------------------------------------------------------
    // Tick loop
    // -----------------------------------------------------------------------

    /// Act on one fired timer.
    pub fn dispatch(&mut self, tick: Tick) {
        if !self.running {
            return;
        }
        match tick {
            Tick::Lane(lane) => {
                self.engine
                    .advance(&mut self.canvas, &mut self.timers, &mut self.coordinator, lane);
            }
            Tick::Refresh => {
                self.attempt_or_defer();
                let period = Duration::from_millis(self.config.refresh.period_ms);
                self.timers.schedule_after(period, Tick::Refresh);
            }
            Tick::DeferredRefresh => {
                info!(target: "refresh", "running deferred refresh");
                self.refresh_lanes();
            }
            Tick::News => {
                if let Err(e) = self.update_news() {
                    warn!(target: "board", "news lane not drawn: {e}");
                }
                let period = Duration::from_millis(self.config.news.period_ms);
                self.timers.schedule_after(period, Tick::News);
            }
            Tick::Clock => {
                self.update_clock(Local::now());
                let interval = Duration::from_millis(self.config.clock.interval_ms);
                self.timers.schedule_after(interval, Tick::Clock);
            }
        }
    }

    /// Dispatch every timer due by `now` (offset from board start) in
    /// deadline order. The queue clock steps to each deadline before its tick
    /// runs, so ticks rescheduled along the way keep their cadence. Returns
    /// how many fired.
    pub fn run_due(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while self.running {
            match self.timers.next_deadline() {
                Some(deadline) if deadline <= now => self.timers.advance_to(deadline),
                _ => break,
            }
            let Some((_, tick)) = self.timers.pop_due() else {
                break;
            };
            self.dispatch(tick);
            fired += 1;
        }
        self.timers.advance_to(now);
        fired
    }

    /// When the next timer is due, as an offset from board start.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Stop every lane and drop every timer. Later ticks are ignored.
    pub fn close(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.engine.stop_all(&mut self.canvas, &mut self.timers);
        self.timers.clear();
        self.coordinator.reset();
        info!(target: "board", refreshes = self.refreshes_run, "board closed");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn canvas(&self) -> &RetainedCanvas<M> {
        &self.canvas
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn engine(&self) -> &MarqueeEngine {
        &self.engine
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn lane_views(&self) -> &[LaneView] {
        &self.lanes
    }

    pub fn news_surface(&self) -> SurfaceId {
        self.news_surface
    }

    pub fn news_text(&self) -> &str {
        &self.news_text
    }

    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of refresh passes that actually ran.
    pub fn refreshes_run(&self) -> u64 {
        self.refreshes_run
    }

    pub fn surface_for(&self, lane: LaneKey) -> Option<SurfaceId> {
        match lane {
            LaneKey::Line(index) => self.lanes.get(index).map(|view| view.surface),
            LaneKey::News => Some(self.news_surface),
        }
    }

    fn lane_for(&self, surface: SurfaceId) -> Option<LaneKey> {
        if surface == self.news_surface {
            return Some(LaneKey::News);
        }
        self.lanes
            .iter()
            .position(|view| view.surface == surface)
            .map(LaneKey::Line)
    }

    fn style_for(&self, lane: LaneKey, is_alert: bool) -> LaneStyle {
        let colors = &self.config.colors;
        if lane.is_news() {
            return LaneStyle::new(self.config.fonts.news(), colors.news_text)
                .with_speed(self.config.news.speed_px, self.config.news.interval());
        }
        let color = if is_alert { colors.alert_text } else { colors.normal_text };
        LaneStyle::new(self.config.fonts.status(), color)
    }

    fn display_text(&self, status: &LaneStatus) -> String {
        let texts = &self.config.status;
        if !status.is_alert {
            texts.normal_text.clone()
        } else if status.text.trim().is_empty() {
            texts.missing_text.clone()
        } else {
            status.text.clone()
        }
    }
}

impl<M> std::fmt::Debug for Board<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("lanes", &self.lanes.len())
            .field("running", &self.running)
            .field("coordinator", &self.coordinator)
            .field("refreshes_run", &self.refreshes_run)
            .finish_non_exhaustive()
    }
}
