//! End-to-end scenarios for the board core.
//!
//! Every test drives a real [`Board`] over an in-memory [`RetainedCanvas`]
//! with fixed-advance measurement (15px per character at the 15px test
//! font) and a manual clock, so widths, positions and tick counts are exact.
//!
//! Tested in this file:
//! - static vs scrolling placement, and the scroll/wrap arithmetic
//! - teardown on stop, restart and close (no orphaned timers or text)
//! - refresh deferral while alert marquees scroll, and its resumption
//! - per-lane fetch failure isolation and placeholders
//! - news headline updates
//! - resize recentering

use std::time::Duration;

use laneboard::config::LineConfig;
use laneboard::{
    Board, BoardConfig, BoardError, FixedAdvance, LaneKey, LaneStatus, Placement, RefreshAttempt,
    StaticSource, SurfaceId, Tick,
};

const ONE_HOUR_MS: u64 = 3_600_000;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Two lines, news off, periodic refresh far in the future so only the test
/// decides when refreshes happen.
fn test_config() -> BoardConfig {
    let mut config = BoardConfig::default();
    config.lines = vec![LineConfig::new("Alpha", "A - B"), LineConfig::new("Beta", "C - D")];
    config.fonts.status_size = 15.0;
    config.fonts.news_size = 15.0;
    config.refresh.initial_delay_ms = ONE_HOUR_MS;
    config.news.enabled = false;
    config
}

fn open(config: BoardConfig, source: StaticSource) -> Board<FixedAdvance> {
    Board::open(config, FixedAdvance::new(1.0), source).expect("board opens")
}

fn surface(board: &Board<FixedAdvance>, lane: LaneKey) -> SurfaceId {
    board.surface_for(lane).expect("lane exists")
}

/// Lay every line strip out at `width` x 40.
fn lay_out(board: &mut Board<FixedAdvance>, width: f64) {
    for index in 0..board.lane_views().len() {
        let s = surface(board, LaneKey::Line(index));
        board.resize_surface(s, width, 40.0);
    }
}

fn x_of(board: &Board<FixedAdvance>, lane: LaneKey) -> f64 {
    board.engine().registry().get(lane).expect("task").x
}

// ---------------------------------------------------------------------------
// Placement and scrolling
// ---------------------------------------------------------------------------

#[test]
fn fitting_text_is_centered_and_never_ticks() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 300.0);
    let lane = LaneKey::Line(0);

    let placement = board.start_lane(lane, "TESTLINE", false).expect("start");
    assert_eq!(placement, Placement::Static);

    let items = board.canvas().items(surface(&board, lane));
    assert_eq!(items.len(), 1);
    assert!((items[0].x - 150.0).abs() < f64::EPSILON);
    assert!((items[0].y - 20.0).abs() < f64::EPSILON);
    assert_eq!(board.timers().pending_for(Tick::Lane(lane)), 0);
}

#[test]
fn overflowing_text_scrolls_left_and_wraps() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 100.0);
    let lane = LaneKey::Line(0);

    let placement = board.start_lane(lane, "TESTLINE", false).expect("start");
    assert_eq!(placement, Placement::Scrolling);

    let task = board.engine().registry().get(lane).expect("task").clone();
    // separators add 14 characters
    assert!((task.text_width - 330.0).abs() < f64::EPSILON);
    assert!((task.x - 265.0).abs() < f64::EPSILON);

    let mut previous = task.x;
    let mut ticks = 0;
    loop {
        board.dispatch(Tick::Lane(lane));
        ticks += 1;
        let x = x_of(&board, lane);
        if x > previous {
            assert!(x >= 100.0, "wrapped to {x}");
            break;
        }
        assert!((previous - x - 2.0).abs() < 1e-9);
        previous = x;
        assert!(ticks < 1_000, "never wrapped");
    }
    // 265 + 165 = 430px to travel at 2px per tick, wrapping once strictly past
    assert_eq!(ticks, 216);
    assert_eq!(board.timers().pending_for(Tick::Lane(lane)), 1);
}

#[test]
fn lane_ticks_follow_the_clock() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 100.0);
    let lane = LaneKey::Line(0);
    board.start_lane(lane, "TESTLINE", false).expect("start");
    let start = x_of(&board, lane);

    board.run_due(Duration::from_millis(49));
    assert!((x_of(&board, lane) - start).abs() < f64::EPSILON);

    board.run_due(Duration::from_millis(500));
    // ten ticks at 50ms
    assert!((start - x_of(&board, lane) - 20.0).abs() < 1e-9);
    assert_eq!(board.next_deadline(), Some(Duration::from_millis(550)));
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[test]
fn start_then_stop_leaves_nothing() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 100.0);

    for (index, text) in ["TESTLINE", "ok"].into_iter().enumerate() {
        let lane = LaneKey::Line(index);
        board.start_lane(lane, text, true).expect("start");
        board.stop_lane(lane);
        assert_eq!(board.timers().pending_for(Tick::Lane(lane)), 0);
        assert!(board.canvas().items(surface(&board, lane)).is_empty());
        assert!(board.engine().registry().get(lane).is_none());
    }
    // never-started lane
    board.stop_lane(LaneKey::News);
}

#[test]
fn second_start_replaces_first() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 100.0);
    let lane = LaneKey::Line(1);

    board.start_lane(lane, "FIRST LONG MESSAGE", false).expect("start");
    board.start_lane(lane, "SECOND LONG MESSAGE", false).expect("start");

    let items = board.canvas().items(surface(&board, lane));
    assert_eq!(items.len(), 1);
    assert!(items[0].text.contains("SECOND"));
    assert_eq!(board.timers().pending_for(Tick::Lane(lane)), 1);
}

#[test]
fn close_releases_everything() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 100.0);
    board.start_lane(LaneKey::Line(0), "TESTLINE", true).expect("start");
    board.start_lane(LaneKey::Line(1), "ok", false).expect("start");

    board.close();
    assert!(!board.is_running());
    assert_eq!(board.timers().pending(), 0);
    assert_eq!(board.canvas().total_items(), 0);
    assert!(!board.coordinator().is_pending());
    assert_eq!(board.run_due(Duration::from_secs(10)), 0);
}

// ---------------------------------------------------------------------------
// Refresh deferral
// ---------------------------------------------------------------------------

fn alert_source() -> StaticSource {
    StaticSource::new()
        .with_line("Alpha", LaneStatus::alert("SERVICE SUSPENDED BETWEEN A AND B"))
        .with_line("Beta", LaneStatus::alert("DELAYS OF UP TO 30 MINUTES"))
}

#[test]
fn refresh_waits_for_every_alert_lane() {
    let mut board = open(test_config(), alert_source());
    lay_out(&mut board, 100.0);
    let (a, b) = (LaneKey::Line(0), LaneKey::Line(1));
    board.start_lane(a, "TESTLINE", true).expect("start a");
    board.start_lane(b, "TESTLINE", true).expect("start b");

    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Deferred));
    assert!(board.coordinator().is_pending());
    assert_eq!(board.refreshes_run(), 0);

    board.dispatch(Tick::Lane(a));
    assert!(board.coordinator().is_pending());
    assert_eq!(board.timers().pending_for(Tick::DeferredRefresh), 0);

    // A's alert clears while B is still scrolling
    board.start_lane(a, "ok", false).expect("restart a");
    assert!(board.coordinator().is_pending());

    board.dispatch(Tick::Lane(b));
    assert!(!board.coordinator().is_pending());
    assert_eq!(board.timers().pending_for(Tick::DeferredRefresh), 1);
    assert_eq!(board.refreshes_run(), 0);

    // the deferred refresh is due immediately
    board.run_due(Duration::ZERO);
    assert_eq!(board.refreshes_run(), 1);

    // further alert ticks do not refresh again
    board.dispatch(Tick::Lane(a));
    board.dispatch(Tick::Lane(b));
    board.run_due(Duration::ZERO);
    assert_eq!(board.refreshes_run(), 1);
}

#[test]
fn scheduled_refresh_defers_and_resumes_on_the_clock() {
    let mut config = test_config();
    config.refresh.initial_delay_ms = 100;
    let mut board = open(config, alert_source());
    lay_out(&mut board, 100.0);
    board.start_lane(LaneKey::Line(0), "TESTLINE", true).expect("start");
    board.start_lane(LaneKey::Line(1), "TESTLINE", false).expect("start");

    // the refresh at 100ms defers; Alpha's tick at 100ms resumes it
    board.run_due(Duration::from_millis(100));
    assert_eq!(board.refreshes_run(), 1);
    assert!(!board.coordinator().is_pending());
    assert_eq!(board.timers().pending_for(Tick::Refresh), 1);

    let alpha = board.engine().registry().get(LaneKey::Line(0)).expect("alpha");
    assert!(alpha.alert);
    assert!(alpha.display_text.contains("SERVICE SUSPENDED"));
}

#[test]
fn refresh_runs_at_once_without_alerts() {
    let source = StaticSource::new()
        .with_line("Alpha", LaneStatus::normal(""))
        .with_line("Beta", LaneStatus::normal(""));
    let mut board = open(test_config(), source);
    lay_out(&mut board, 1000.0);
    board.start_lane(LaneKey::Line(0), "TESTLINE", false).expect("start");

    match board.attempt_or_defer() {
        RefreshAttempt::Ran(report) => {
            assert!(report.is_clean());
            assert_eq!(report.updated, vec![LaneKey::Line(0), LaneKey::Line(1)]);
        }
        RefreshAttempt::Deferred => panic!("no alert was scrolling"),
    }
    assert!(!board.coordinator().is_pending());
}

#[test]
fn two_scrolling_alerts_keep_refresh_deferred() {
    let mut board = open(test_config(), alert_source());
    lay_out(&mut board, 100.0);
    board.start_lane(LaneKey::Line(0), "TESTLINE", true).expect("start");
    board.start_lane(LaneKey::Line(1), "TESTLINE", true).expect("start");
    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Deferred));

    // each tick still sees the other alert scrolling
    board.run_due(Duration::from_secs(2));
    assert!(board.coordinator().is_pending());
    assert_eq!(board.refreshes_run(), 0);
}

#[test]
fn static_alert_does_not_block_refresh() {
    let mut board = open(test_config(), alert_source());
    lay_out(&mut board, 1000.0);
    board.start_lane(LaneKey::Line(0), "short alert", true).expect("start");
    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Ran(_)));
}

#[test]
fn stopping_last_alert_releases_deferred_refresh() {
    let mut board = open(test_config(), alert_source());
    lay_out(&mut board, 100.0);
    let (a, b) = (LaneKey::Line(0), LaneKey::Line(1));
    board.start_lane(a, "TESTLINE", true).expect("start a");
    board.start_lane(b, "ok", false).expect("start b");

    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Deferred));
    board.stop_lane(a);
    assert!(!board.coordinator().is_pending());

    board.run_due(Duration::ZERO);
    assert_eq!(board.refreshes_run(), 1);
}

#[test]
fn released_refresh_runs_once_when_another_refresh_gets_there_first() {
    let mut board = open(test_config(), alert_source());
    lay_out(&mut board, 100.0);
    let alert = LaneKey::Line(0);
    board.start_lane(alert, "TESTLINE", true).expect("start");

    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Deferred));
    board.stop_lane(alert);
    assert_eq!(board.timers().pending_for(Tick::DeferredRefresh), 1);

    // a refresh before the queued one fires covers the deferral
    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Ran(_)));
    assert_eq!(board.timers().pending_for(Tick::DeferredRefresh), 0);

    board.run_due(Duration::ZERO);
    assert_eq!(board.refreshes_run(), 1);
}

#[test]
fn close_drops_a_pending_refresh() {
    let mut board = open(test_config(), alert_source());
    lay_out(&mut board, 100.0);
    board.start_lane(LaneKey::Line(0), "TESTLINE", true).expect("start");
    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Deferred));

    board.close();
    assert!(!board.coordinator().is_pending());
    assert_eq!(board.refreshes_run(), 0);
}

// ---------------------------------------------------------------------------
// Fetch failures
// ---------------------------------------------------------------------------

#[test]
fn one_failing_lane_does_not_block_others() {
    let source = StaticSource::new().with_line("Alpha", LaneStatus::normal(""));
    let handle = source.clone();
    let mut board = open(test_config(), source);
    lay_out(&mut board, 1000.0);

    let report = board.refresh_lanes();
    assert_eq!(report.updated, vec![LaneKey::Line(0)]);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0],
        (LaneKey::Line(1), BoardError::DataFetchFailure { lane: LaneKey::Line(1), .. })
    ));

    let unavailable = board.config().status.unavailable_text.clone();
    let beta = board.engine().registry().get(LaneKey::Line(1)).expect("placeholder");
    assert_eq!(beta.display_text, unavailable);
    assert!(!beta.alert);
    assert!(board.lane_views()[1].last_error.is_some());
    assert!(board.lane_views()[1].status.is_none());

    // Beta recovers, Alpha starts failing and keeps its last text
    handle.set_line("Beta", LaneStatus::alert("Signal failure"));
    handle.remove_line("Alpha");
    let report = board.refresh_lanes();
    assert_eq!(report.updated, vec![LaneKey::Line(1)]);

    let normal = board.config().status.normal_text.clone();
    let alpha = board.engine().registry().get(LaneKey::Line(0)).expect("alpha kept");
    assert_eq!(alpha.display_text, normal);
    assert!(board.lane_views()[0].last_error.is_some());
    assert_eq!(board.lane_views()[0].status, Some(LaneStatus::normal("")));

    let beta = board.engine().registry().get(LaneKey::Line(1)).expect("beta");
    assert!(beta.alert);
    assert_eq!(beta.display_text, "Signal failure");
    assert!(board.lane_views()[1].last_error.is_none());
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

#[test]
fn news_lane_shows_joined_headlines() {
    let mut config = test_config();
    config.news.enabled = true;
    config.news.initial_delay_ms = 500;
    let source = StaticSource::new().with_headlines(["Fares rise in April", "New timetable"]);
    let handle = source.clone();
    let mut board = open(config, source);
    let news_surface = board.news_surface();
    board.resize_surface(news_surface, 200.0, 40.0);

    board.run_due(Duration::from_millis(500));
    let news = board.config().news.clone();
    assert_eq!(
        board.news_text(),
        format!("{}Fares rise in April{}New timetable", news.prefix, news.joiner)
    );
    let task = board.engine().registry().get(LaneKey::News).expect("news task");
    assert!(task.active);
    assert!(!task.alert);
    assert!((task.speed_px - news.speed_px).abs() < f64::EPSILON);
    assert_eq!(task.interval, news.interval());
    assert_eq!(board.timers().pending_for(Tick::News), 1);

    handle.fail_headlines();
    board.update_news().expect("news drawn");
    assert_eq!(board.news_text(), format!("{}{}", news.prefix, news.error_text));

    handle.set_headlines(Vec::<String>::new());
    board.update_news().expect("news drawn");
    assert_eq!(board.news_text(), format!("{}{}", news.prefix, news.empty_text));
}

#[test]
fn news_never_blocks_refresh() {
    let mut config = test_config();
    config.news.enabled = true;
    let source =
        StaticSource::new().with_headlines(["A very long headline that will certainly scroll"]);
    let mut board = open(config, source);
    let news_surface = board.news_surface();
    board.resize_surface(news_surface, 100.0, 40.0);
    board.update_news().expect("news drawn");

    assert!(matches!(board.attempt_or_defer(), RefreshAttempt::Ran(_)));
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

#[test]
fn resize_recenters_static_text_in_place() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 100.0);
    let lane = LaneKey::Line(0);
    board.start_lane(lane, "short", false).expect("start");
    let s = surface(&board, lane);
    let before = board.canvas().items(s)[0].id;

    board.resize_surface(s, 300.0, 40.0);
    let items = board.canvas().items(s);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, before);
    assert!((items[0].x - 150.0).abs() < f64::EPSILON);
}

#[test]
fn collapsed_surface_keeps_last_position() {
    let mut board = open(test_config(), StaticSource::new());
    lay_out(&mut board, 300.0);
    let lane = LaneKey::Line(0);
    board.start_lane(lane, "short", false).expect("start");
    let s = surface(&board, lane);

    board.resize_surface(s, 0.0, 0.0);
    assert!((board.canvas().items(s)[0].x - 150.0).abs() < f64::EPSILON);
}

#[test]
fn unlaid_surface_uses_fallback_width() {
    let mut board = open(test_config(), StaticSource::new());
    let lane = LaneKey::Line(0);
    // fallback width 300 holds 20 characters
    let placement = board.start_lane(lane, "TESTLINE", false).expect("start");
    assert_eq!(placement, Placement::Static);
    assert!((x_of(&board, lane) - 150.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Independence
// ---------------------------------------------------------------------------

#[test]
fn boards_do_not_share_state() {
    let mut first = open(test_config(), alert_source());
    let mut second = open(test_config(), alert_source());
    lay_out(&mut first, 100.0);
    lay_out(&mut second, 100.0);

    first.start_lane(LaneKey::Line(0), "TESTLINE", true).expect("start");
    assert!(matches!(first.attempt_or_defer(), RefreshAttempt::Deferred));
    assert!(matches!(second.attempt_or_defer(), RefreshAttempt::Ran(_)));
    assert!(first.coordinator().is_pending());
    assert!(!second.coordinator().is_pending());

    first.close();
    assert!(second.is_running());
}
