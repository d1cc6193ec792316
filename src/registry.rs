//! Scroll task registry: the single source of truth for what is animating
//! where.
//!
//! At most one [`ScrollTask`] exists per lane. Replacing or removing a task
//! always tears the old one down first (pending tick cancelled, drawn text
//! deleted), so no timer or primitive is ever orphaned.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::canvas::{ContentId, Drawing, FontSpec, Rgb, SurfaceId};
use crate::lane::LaneKey;
use crate::scheduler::{Scheduler, TimerHandle};

/// Animation state of one lane.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTask {
    pub surface: SurfaceId,
    pub content: Option<ContentId>,
    /// Exactly what is drawn, separators included.
    pub display_text: String,
    pub pending_tick: Option<TimerHandle>,
    /// Measured width of `display_text` under `font`.
    pub text_width: f64,
    /// Horizontal center of the drawn text.
    pub x: f64,
    /// Vertical center of the drawn text.
    pub y: f64,
    pub active: bool,
    pub alert: bool,
    pub font: FontSpec,
    pub color: Rgb,
    pub speed_px: f64,
    pub interval: Duration,
}

impl ScrollTask {
    /// Right edge of the text has passed the surface's left edge.
    pub fn has_left_view(&self) -> bool {
        self.x + self.text_width / 2.0 < 0.0
    }
}

#[derive(Debug, Default)]
pub struct ScrollRegistry {
    tasks: HashMap<LaneKey, ScrollTask>,
}

impl ScrollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `task` for `key`, tearing down any previous task first.
    pub fn upsert<D, S>(&mut self, key: LaneKey, task: ScrollTask, canvas: &mut D, timers: &mut S)
    where
        D: Drawing + ?Sized,
        S: Scheduler + ?Sized,
    {
        if let Some(previous) = self.tasks.insert(key, task) {
            teardown(key, &previous, canvas, timers);
        }
    }

    /// Tear down and drop the task for `key`. No-op if absent.
    pub fn remove<D, S>(
        &mut self,
        key: LaneKey,
        canvas: &mut D,
        timers: &mut S,
    ) -> Option<ScrollTask>
    where
        D: Drawing + ?Sized,
        S: Scheduler + ?Sized,
    {
        let task = self.tasks.remove(&key)?;
        teardown(key, &task, canvas, timers);
        Some(task)
    }

    /// Drop the entry without touching timers or the canvas. For tasks whose
    /// surface is already gone.
    pub fn forget(&mut self, key: LaneKey) -> Option<ScrollTask> {
        self.tasks.remove(&key)
    }

    pub fn get(&self, key: LaneKey) -> Option<&ScrollTask> {
        self.tasks.get(&key)
    }

    pub fn get_mut(&mut self, key: LaneKey) -> Option<&mut ScrollTask> {
        self.tasks.get_mut(&key)
    }

    /// Whether any active task other than `excluding` satisfies `predicate`.
    pub fn any_active<P>(&self, predicate: P, excluding: Option<LaneKey>) -> bool
    where
        P: Fn(&ScrollTask) -> bool,
    {
        self.tasks
            .iter()
            .filter(|(key, _)| Some(**key) != excluding)
            .any(|(_, task)| task.active && predicate(task))
    }

    /// Lane keys in a stable order.
    pub fn keys(&self) -> Vec<LaneKey> {
        let mut keys: Vec<LaneKey> = self.tasks.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Cancel the pending tick and delete the drawn text. A delete that fails
/// means the surface is already gone, which is the state we want anyway.
fn teardown<D, S>(key: LaneKey, task: &ScrollTask, canvas: &mut D, timers: &mut S)
where
    D: Drawing + ?Sized,
    S: Scheduler + ?Sized,
{
    if let Some(handle) = task.pending_tick {
        timers.cancel(handle);
    }
    if let Some(content) = task.content {
        if let Err(e) = canvas.delete_content(task.surface, content) {
            debug!(target: "marquee", lane = %key, "teardown: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{FixedAdvance, RetainedCanvas};
    use crate::scheduler::{Tick, TimerQueue};

    fn drawn_task(
        canvas: &mut RetainedCanvas<FixedAdvance>,
        timers: &mut TimerQueue,
        surface: SurfaceId,
        key: LaneKey,
        active: bool,
        alert: bool,
    ) -> ScrollTask {
        let font = FontSpec::new(10.0);
        let content = canvas
            .draw_centered_text(surface, 0.0, 5.0, "msg", &font, Rgb::BLACK)
            .expect("draw");
        let pending_tick =
            active.then(|| timers.schedule_after(Duration::from_millis(50), Tick::Lane(key)));
        ScrollTask {
            surface,
            content: Some(content),
            display_text: "msg".to_string(),
            pending_tick,
            text_width: 30.0,
            x: 0.0,
            y: 5.0,
            active,
            alert,
            font,
            color: Rgb::BLACK,
            speed_px: 2.0,
            interval: Duration::from_millis(50),
        }
    }

    #[test]
    fn upsert_tears_down_previous() {
        let mut canvas = RetainedCanvas::new(FixedAdvance::new(1.0));
        let mut timers = TimerQueue::new();
        let surface = canvas.add_surface();
        let key = LaneKey::Line(0);
        let mut registry = ScrollRegistry::new();

        let first = drawn_task(&mut canvas, &mut timers, surface, key, true, false);
        registry.upsert(key, first, &mut canvas, &mut timers);
        let second = drawn_task(&mut canvas, &mut timers, surface, key, true, false);
        registry.upsert(key, second, &mut canvas, &mut timers);

        assert_eq!(registry.len(), 1);
        assert_eq!(canvas.items(surface).len(), 1);
        assert_eq!(timers.pending(), 1);
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut canvas = RetainedCanvas::new(FixedAdvance::new(1.0));
        let mut timers = TimerQueue::new();
        let mut registry = ScrollRegistry::new();
        assert!(registry.remove(LaneKey::News, &mut canvas, &mut timers).is_none());
        assert!(registry.get(LaneKey::News).is_none());
    }

    #[test]
    fn remove_cancels_and_deletes() {
        let mut canvas = RetainedCanvas::new(FixedAdvance::new(1.0));
        let mut timers = TimerQueue::new();
        let surface = canvas.add_surface();
        let mut registry = ScrollRegistry::new();
        let task = drawn_task(&mut canvas, &mut timers, surface, LaneKey::News, true, false);
        registry.upsert(LaneKey::News, task, &mut canvas, &mut timers);

        assert!(registry.remove(LaneKey::News, &mut canvas, &mut timers).is_some());
        assert!(registry.is_empty());
        assert_eq!(timers.pending(), 0);
        assert_eq!(canvas.total_items(), 0);
    }

    #[test]
    fn any_active_respects_exclusion_and_activity() {
        let mut canvas = RetainedCanvas::new(FixedAdvance::new(1.0));
        let mut timers = TimerQueue::new();
        let surface = canvas.add_surface();
        let mut registry = ScrollRegistry::new();

        let a = drawn_task(&mut canvas, &mut timers, surface, LaneKey::Line(0), true, true);
        let b = drawn_task(&mut canvas, &mut timers, surface, LaneKey::Line(1), false, true);
        let c = drawn_task(&mut canvas, &mut timers, surface, LaneKey::Line(2), true, false);
        registry.upsert(LaneKey::Line(0), a, &mut canvas, &mut timers);
        registry.upsert(LaneKey::Line(1), b, &mut canvas, &mut timers);
        registry.upsert(LaneKey::Line(2), c, &mut canvas, &mut timers);

        assert!(registry.any_active(|t| t.alert, None));
        assert!(!registry.any_active(|t| t.alert, Some(LaneKey::Line(0))));
        assert!(registry.any_active(|_| true, Some(LaneKey::Line(0))));
        assert_eq!(registry.keys(), vec![LaneKey::Line(0), LaneKey::Line(1), LaneKey::Line(2)]);
    }

    #[test]
    fn left_view_uses_half_width() {
        let mut canvas = RetainedCanvas::new(FixedAdvance::new(1.0));
        let mut timers = TimerQueue::new();
        let surface = canvas.add_surface();
        let mut task = drawn_task(&mut canvas, &mut timers, surface, LaneKey::News, true, false);
        task.x = -15.0;
        assert!(!task.has_left_view());
        task.x = -15.5;
        assert!(task.has_left_view());
    }
}
