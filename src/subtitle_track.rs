use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::segmentation::CueGroup;

// @module: Caption cues and tracks as reported by the player

// @struct: Single timed caption entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    // @field: Track-local identifier
    pub id: String,

    // @field: Start time in seconds
    pub start_time: f64,

    // @field: End time in seconds
    pub end_time: f64,

    // @field: Caption text
    pub text: String,
}

impl Cue {
    /// Creates a new cue without validation
    pub fn new(id: impl Into<String>, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Cue {
            id: id.into(),
            start_time,
            end_time,
            text: text.into(),
        }
    }

    // @creates: Validated cue
    // @validates: Finite, non-negative time range and non-empty text
    pub fn new_validated(id: impl Into<String>, start_time: f64, end_time: f64, text: &str) -> Result<Self> {
        let id = id.into();

        if !start_time.is_finite() || !end_time.is_finite() || start_time < 0.0 {
            return Err(anyhow!(
                "Invalid timestamps for cue {}: {} -> {}",
                id, start_time, end_time
            ));
        }

        if end_time < start_time {
            return Err(anyhow!(
                "Invalid time range: end time {} < start time {}",
                end_time, start_time
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty caption text for cue {}", id));
        }

        Ok(Cue {
            id,
            start_time,
            end_time,
            text: trimmed_text.to_string(),
        })
    }

    /// Length of the cue in seconds
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Whether `time` falls inside the cue, bounds included
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Format a position in seconds as `HH:MM:SS.mmm`
    pub fn format_timestamp(seconds: f64) -> String {
        let ms = if seconds.is_finite() && seconds > 0.0 {
            (seconds * 1000.0).round() as u64
        } else {
            0
        };

        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let secs = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] {}",
            Self::format_timestamp(self.start_time),
            Self::format_timestamp(self.end_time),
            self.text
        )
    }
}

/// The subtitle track currently selected in the player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    /// ASR-produced track, prone to cumulative duplicate cues
    pub is_auto_generated: bool,

    /// Cues in player order
    pub cues: Vec<Cue>,

    /// Groups the player already collapsed, if any
    #[serde(default)]
    pub groups: Option<Vec<CueGroup>>,
}

impl SubtitleTrack {
    /// Create a track without precomputed groups
    pub fn new(is_auto_generated: bool, cues: Vec<Cue>) -> Self {
        Self {
            is_auto_generated,
            cues,
            groups: None,
        }
    }

    /// Whether the track carries any cue
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Collapse whitespace and trim, used wherever cue texts are compared
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable sort by start time, ties broken by end time
pub fn sort_cues(cues: &mut [Cue]) {
    cues.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.end_time.total_cmp(&b.end_time))
    });
}

/// Sorted copy of `cues` without empty entries or repeated frames.
///
/// A cue is a repeated frame when it starts within a millisecond of the
/// previous kept cue and carries the same normalized text.
pub fn deduplicate_cues(cues: &[Cue]) -> Vec<Cue> {
    let mut sorted: Vec<Cue> = cues
        .iter()
        .filter(|cue| !cue.text.trim().is_empty() && cue.start_time.is_finite() && cue.end_time.is_finite())
        .cloned()
        .collect();
    sort_cues(&mut sorted);

    let mut result: Vec<Cue> = Vec::with_capacity(sorted.len());
    for cue in sorted {
        if let Some(last) = result.last_mut() {
            let same_start = (last.start_time - cue.start_time).abs() < 0.001;
            if same_start && normalize_text(&last.text) == normalize_text(&cue.text) {
                last.end_time = last.end_time.max(cue.end_time);
                continue;
            }
        }
        result.push(cue);
    }

    result
}
