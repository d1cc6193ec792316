//! Refresh deferral state machine.
//!
//! ```text
//! Idle ──Scheduled{alert_active}──────────────▶ Deferred
//!  ▲                                                │
//!  └──AlertTickCompleted / AlertLaneStopped ────────┘
//!       {others_active: false}  (runs the refresh)
//! ```
//!
//! Handlers never run the refresh themselves. They set
//! [`RefreshDecision::run_refresh`] in the context and the caller acts on it.

use statig::prelude::*;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    /// The periodic refresh fired. `alert_active` is true if any alert lane
    /// is currently scrolling.
    Scheduled { alert_active: bool },
    /// An alert lane finished an animation tick while a refresh was pending.
    AlertTickCompleted { others_active: bool },
    /// An active alert lane was stopped while a refresh was pending.
    AlertLaneStopped { others_active: bool },
    /// Board teardown.
    Reset,
}

/// Per-event output written by the handlers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDecision {
    pub run_refresh: bool,
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RefreshMachine {
    /// How many times a refresh has been deferred since start.
    pub deferrals: u64,
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(
    initial = "State::idle()",
    state(derive(Debug, Clone, PartialEq))
)]
impl RefreshMachine {
    /// No refresh is waiting.
    #[state]
    fn idle(&mut self, context: &mut RefreshDecision, event: &RefreshEvent) -> Outcome<State> {
        match event {
            RefreshEvent::Scheduled { alert_active: true } => Transition(State::deferred()),
            RefreshEvent::Scheduled { alert_active: false } => {
                context.run_refresh = true;
                Handled
            }
            _ => Handled,
        }
    }

    /// A refresh was skipped because an alert marquee was mid-scroll.
    #[state(entry_action = "enter_deferred")]
    fn deferred(&mut self, context: &mut RefreshDecision, event: &RefreshEvent) -> Outcome<State> {
        match event {
            RefreshEvent::Scheduled { alert_active: true } => {
                debug!(target: "refresh", "still deferred, alert marquee active");
                Handled
            }
            RefreshEvent::Scheduled { alert_active: false }
            | RefreshEvent::AlertTickCompleted { others_active: false }
            | RefreshEvent::AlertLaneStopped { others_active: false } => {
                context.run_refresh = true;
                Transition(State::idle())
            }
            RefreshEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }

    #[action]
    fn enter_deferred(&mut self) {
        self.deferrals += 1;
        info!(
            target: "refresh",
            deferrals = self.deferrals,
            "alert marquee active, refresh deferred"
        );
    }
}
