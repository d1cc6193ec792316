//! Error taxonomy for the board core.
//!
//! Geometry and drawing failures are recovered inside the marquee engine and
//! only ever show up in logs. Fetch failures are reported per lane to whoever
//! drove the refresh.

use std::path::PathBuf;

use crate::canvas::SurfaceId;
use crate::lane::LaneKey;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The surface has not been laid out yet (width or height <= 1px).
    #[error("surface {surface} has no usable geometry yet")]
    GeometryUnavailable { surface: SurfaceId },

    /// A drawing primitive failed, usually because the surface is gone.
    #[error("drawing on surface {surface} failed: {reason}")]
    DrawingFailure { surface: SurfaceId, reason: String },

    /// The status source could not produce data for a lane.
    #[error("could not update lane {lane}: {reason}")]
    DataFetchFailure { lane: LaneKey, reason: String },

    #[error("lane {lane} is not on this board")]
    UnknownLane { lane: LaneKey },

    #[error("invalid board config: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BoardError {
    pub fn fetch(lane: LaneKey, reason: impl Into<String>) -> Self {
        Self::DataFetchFailure {
            lane,
            reason: reason.into(),
        }
    }

    pub fn drawing(surface: SurfaceId, reason: impl Into<String>) -> Self {
        Self::DrawingFailure {
            surface,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
