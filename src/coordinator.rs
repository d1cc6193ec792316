//! Refresh coordinator: decides whether a scheduled refresh may run now, and
//! notices the moment a deferred one may run.
//!
//! The coordinator answers "run the refresh now?". Running it is the
//! board's job, and querying the registry for active alert lanes is the
//! caller's job. The one timer it tracks is the queued run of a lifted
//! deferral, so that run happens at most once.

use std::time::Duration;

use statig::prelude::*;

use crate::scheduler::{Scheduler, Tick, TimerHandle};
use crate::state_machine::refresh_sm::{RefreshDecision, RefreshEvent, RefreshMachine, State};

pub struct RefreshCoordinator {
    machine: StateMachine<RefreshMachine>,
    /// Zero-delay `DeferredRefresh` timer that has not run yet.
    queued: Option<TimerHandle>,
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", self.machine.state())
            .field("queued", &self.queued)
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            machine: RefreshMachine::default().state_machine(),
            queued: None,
        }
    }

    /// True while a refresh is deferred.
    pub fn is_pending(&self) -> bool {
        matches!(self.machine.state(), State::Deferred {})
    }

    /// The periodic refresh fired. Returns `true` if it should run now;
    /// otherwise the refresh is now pending.
    pub fn scheduled(&mut self, alert_active: bool) -> bool {
        self.dispatch(RefreshEvent::Scheduled { alert_active })
    }

    /// An alert lane completed a tick. Returns `true` if the pending refresh
    /// should run now.
    pub fn alert_tick_completed(&mut self, others_active: bool) -> bool {
        self.dispatch(RefreshEvent::AlertTickCompleted { others_active })
    }

    /// An active alert lane was stopped. Returns `true` if the pending
    /// refresh should run now.
    pub fn alert_lane_stopped(&mut self, others_active: bool) -> bool {
        self.dispatch(RefreshEvent::AlertLaneStopped { others_active })
    }

    /// Drop any pending refresh without running it. A queued run is
    /// forgotten; the caller owns the timers and clears them itself.
    pub fn reset(&mut self) {
        self.queued = None;
        self.dispatch(RefreshEvent::Reset);
    }

    /// Queue the lifted deferral as a zero-delay [`Tick::DeferredRefresh`].
    /// A run that is already queued is replaced, never doubled.
    pub fn queue_refresh<S>(&mut self, timers: &mut S)
    where
        S: Scheduler + ?Sized,
    {
        if let Some(previous) = self.queued.take() {
            timers.cancel(previous);
        }
        self.queued = Some(timers.schedule_after(Duration::ZERO, Tick::DeferredRefresh));
    }

    /// Hand back the queued run, if any. A refresh that runs for any reason
    /// cancels it, since that refresh already covers the deferral.
    pub fn take_queued(&mut self) -> Option<TimerHandle> {
        self.queued.take()
    }

    fn dispatch(&mut self, event: RefreshEvent) -> bool {
        let mut decision = RefreshDecision::default();
        self.machine.handle_with_context(&event, &mut decision);
        decision.run_refresh
    }
}
