/*!
 * Persisted control state.
 *
 * The snapshot is stored as camelCase JSON under a key derived from the
 * video id.
 */

use serde::{Deserialize, Serialize};

use crate::loop_control::LoopSegment;

/// Snapshot of the learner's controls for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsState {
    /// Playback rate
    pub speed: f64,
    /// Active loop; always `None` once persisted
    #[serde(rename = "loop")]
    pub active_loop: Option<LoopSegment>,
    /// Vocabulary highlighting mode
    pub vocabulary_mode: bool,
    /// Subtitle overlay visibility
    pub subtitles_visible: bool,
    /// Video the snapshot belongs to
    pub last_video_id: String,
    /// Cursor at the last save, in seconds
    pub last_position: f64,
    /// Start of the current accounting window, ms since the Unix epoch
    pub session_start_time: i64,
    /// Accumulated watch time in seconds
    pub total_watch_time: f64,
    /// Loops enabled in this snapshot's lifetime
    pub loop_count: u32,
    /// Playback rate changes in this snapshot's lifetime
    pub speed_changes: u32,
}

impl ControlsState {
    /// Defaults for `video_id`, opening an accounting window at `now_ms`
    pub fn new(video_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            speed: 1.0,
            active_loop: None,
            vocabulary_mode: false,
            subtitles_visible: true,
            last_video_id: video_id.into(),
            last_position: 0.0,
            session_start_time: now_ms,
            total_watch_time: 0.0,
            loop_count: 0,
            speed_changes: 0,
        }
    }

    /// Copy suitable for persistence: never encodes an active loop
    pub fn to_persisted(&self) -> Self {
        Self {
            active_loop: None,
            ..self.clone()
        }
    }
}
