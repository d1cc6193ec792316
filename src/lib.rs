//! laneboard: a multi-lane status board.
//!
//! Each lane shows one short message in a fixed-width strip. Messages that
//! fit are centered; wider ones scroll as a wrapping marquee. Lane contents
//! are refreshed from a [`StatusSource`] on a fixed period, except that a
//! refresh never interrupts a scrolling alert: it waits until every alert
//! marquee has completed a tick.
//!
//! The core ([`MarqueeEngine`], [`RefreshCoordinator`], [`TimerQueue`]) knows
//! nothing about windows. [`Board`] wires it to a [`RetainedCanvas`] and a
//! status source; the `laneboard` binary hosts a board in a vello window.

pub mod board;
pub mod canvas;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fonts;
pub mod lane;
pub mod layout;
pub mod logging;
pub mod marquee;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod source;
pub mod state_machine;

pub use board::{Board, LaneView, RefreshAttempt, RefreshReport};
pub use canvas::{
    Canvas, ContentId, Drawing, FixedAdvance, FontSpec, Geometry, RetainedCanvas, Rgb, SurfaceId,
    TextMeasure,
};
pub use config::BoardConfig;
pub use coordinator::RefreshCoordinator;
pub use error::{BoardError, Result};
pub use lane::{LaneKey, LaneStatus};
pub use marquee::{Advance, LaneStyle, MarqueeEngine, Placement, ScrollDefaults};
pub use registry::{ScrollRegistry, ScrollTask};
pub use scheduler::{Scheduler, Tick, TimerHandle, TimerQueue};
pub use source::{FeedFile, StaticSource, StatusSource};
