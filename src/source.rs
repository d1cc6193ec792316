//! Where lane status and news headlines come from.
//!
//! The board only talks to [`StatusSource`]. [`FeedFile`] re-reads a JSON
//! file on every fetch, so an external process can keep it current.
//! [`StaticSource`] holds values in memory and backs tests and demo runs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NewsConfig;
use crate::error::{BoardError, Result};
use crate::lane::{LaneKey, LaneStatus};

pub trait StatusSource {
    /// Current status of the line called `name`, shown on `lane`.
    fn fetch_lane_status(&mut self, lane: LaneKey, name: &str) -> Result<LaneStatus>;

    /// Current news headlines, newest first.
    fn fetch_headlines(&mut self) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// JSON feed file
// ---------------------------------------------------------------------------

/// On-disk shape of a feed file.
///
/// ```json
/// {
///   "lines": { "Yamanote": { "alert": true, "text": "Delayed" } },
///   "headlines": ["..."]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub lines: HashMap<String, FeedLine>,
    pub headlines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedLine {
    pub alert: bool,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct FeedFile {
    path: PathBuf,
}

impl FeedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> std::result::Result<Feed, String> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("{}: {e}", self.path.display()))?;
        serde_json::from_str(&content).map_err(|e| format!("{}: {e}", self.path.display()))
    }
}

impl StatusSource for FeedFile {
    fn fetch_lane_status(&mut self, lane: LaneKey, name: &str) -> Result<LaneStatus> {
        let feed = self.read().map_err(|reason| BoardError::fetch(lane, reason))?;
        let line = feed
            .lines
            .get(name)
            .ok_or_else(|| BoardError::fetch(lane, format!("no entry for {name:?} in feed")))?;
        debug!(target: "feed", lane = %lane, name, alert = line.alert, "lane status read");
        Ok(LaneStatus {
            is_alert: line.alert,
            text: line.text.clone(),
        })
    }

    fn fetch_headlines(&mut self) -> Result<Vec<String>> {
        let feed = self.read().map_err(|reason| BoardError::fetch(LaneKey::News, reason))?;
        debug!(target: "feed", count = feed.headlines.len(), "headlines read");
        Ok(feed.headlines)
    }
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StaticState {
    lines: HashMap<String, LaneStatus>,
    headlines: Vec<String>,
    headlines_fail: bool,
}

/// In-memory source. Clones share state, so a caller can keep one handle and
/// change what the board will see on its next fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    state: Rc<RefCell<StaticState>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(self, name: impl Into<String>, status: LaneStatus) -> Self {
        self.set_line(name, status);
        self
    }

    pub fn with_headlines<I, S>(self, headlines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_headlines(headlines);
        self
    }

    pub fn set_line(&self, name: impl Into<String>, status: LaneStatus) {
        self.state.borrow_mut().lines.insert(name.into(), status);
    }

    /// Later fetches for `name` fail.
    pub fn remove_line(&self, name: &str) {
        self.state.borrow_mut().lines.remove(name);
    }

    pub fn set_headlines<I, S>(&self, headlines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.borrow_mut();
        state.headlines = headlines.into_iter().map(Into::into).collect();
        state.headlines_fail = false;
    }

    pub fn fail_headlines(&self) {
        self.state.borrow_mut().headlines_fail = true;
    }
}

impl StatusSource for StaticSource {
    fn fetch_lane_status(&mut self, lane: LaneKey, name: &str) -> Result<LaneStatus> {
        self.state
            .borrow()
            .lines
            .get(name)
            .cloned()
            .ok_or_else(|| BoardError::fetch(lane, format!("no status for {name:?}")))
    }

    fn fetch_headlines(&mut self) -> Result<Vec<String>> {
        let state = self.state.borrow();
        if state.headlines_fail {
            return Err(BoardError::fetch(LaneKey::News, "headline source unavailable"));
        }
        Ok(state.headlines.clone())
    }
}

/// Text for the news lane given the outcome of a headline fetch.
pub fn headline_text(config: &NewsConfig, headlines: &Result<Vec<String>>) -> String {
    let body = match headlines {
        Ok(items) if items.is_empty() => config.empty_text.clone(),
        Ok(items) => items.join(&config.joiner),
        Err(_) => config.error_text.clone(),
    };
    format!("{}{}", config.prefix, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn feed_file_reads_lines_and_headlines() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"lines":{{"Chuo":{{"alert":true,"text":"Delayed"}}}},"headlines":["a","b"]}}"#
        )
        .expect("write");

        let mut feed = FeedFile::new(file.path());
        let status = feed.fetch_lane_status(LaneKey::Line(0), "Chuo").expect("status");
        assert_eq!(status, LaneStatus::alert("Delayed"));
        assert_eq!(feed.fetch_headlines().expect("headlines"), vec!["a", "b"]);
    }

    #[test]
    fn feed_file_missing_line_is_fetch_failure() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"lines":{{}}}}"#).expect("write");
        let mut feed = FeedFile::new(file.path());
        let err = feed.fetch_lane_status(LaneKey::Line(2), "Keiyo").unwrap_err();
        assert!(matches!(err, BoardError::DataFetchFailure { lane: LaneKey::Line(2), .. }));
        // headlines default to empty
        assert!(feed.fetch_headlines().expect("headlines").is_empty());
    }

    #[test]
    fn feed_file_bad_json_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "not json").expect("write");
        let mut feed = FeedFile::new(file.path());
        assert!(feed.fetch_headlines().is_err());

        let dir = tempfile::tempdir().expect("tempdir");
        let mut missing = FeedFile::new(dir.path().join("absent.json"));
        assert!(missing.fetch_lane_status(LaneKey::Line(0), "x").is_err());
    }

    #[test]
    fn static_source_clones_share_state() {
        let handle = StaticSource::new().with_line("Chuo", LaneStatus::normal(""));
        let mut board_side = handle.clone();
        handle.set_line("Chuo", LaneStatus::alert("Suspended"));
        assert_eq!(
            board_side.fetch_lane_status(LaneKey::Line(0), "Chuo").expect("status"),
            LaneStatus::alert("Suspended")
        );
        handle.remove_line("Chuo");
        assert!(board_side.fetch_lane_status(LaneKey::Line(0), "Chuo").is_err());

        handle.fail_headlines();
        assert!(board_side.fetch_headlines().is_err());
        handle.set_headlines(["x"]);
        assert_eq!(board_side.fetch_headlines().expect("headlines"), vec!["x"]);
    }

    #[test]
    fn headline_text_variants() {
        let config = NewsConfig::default();
        let joined = headline_text(&config, &Ok(vec!["one".into(), "two".into()]));
        assert_eq!(joined, format!("{}one{}two", config.prefix, config.joiner));

        let empty = headline_text(&config, &Ok(vec![]));
        assert_eq!(empty, format!("{}{}", config.prefix, config.empty_text));

        let failed = headline_text(&config, &Err(BoardError::fetch(LaneKey::News, "down")));
        assert_eq!(failed, format!("{}{}", config.prefix, config.error_text));
    }
}
