/*!
 * Contract of the external media player.
 *
 * Seeking, looping and rate changes are delegated; this crate only asks the
 * player where it is and tells it where to go.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::PlayerError;
use crate::subtitle_track::SubtitleTrack;

/// Playback primitives consumed by the controls
///
/// Every call may fail; callers log the failure and leave their own state
/// untouched.
#[async_trait]
pub trait PlayerControl: Send + Sync + Debug {
    /// Playback cursor in seconds
    async fn current_time(&self) -> Result<f64, PlayerError>;

    /// Media duration in seconds; non-finite or zero when unknown
    async fn duration(&self) -> Result<f64, PlayerError>;

    /// Move the cursor to `position` seconds
    async fn seek(&self, position: f64) -> Result<(), PlayerError>;

    /// Enforce a loop between `start` and `end` seconds
    async fn create_segment_loop(&self, start: f64, end: f64) -> Result<(), PlayerError>;

    /// Stop any enforced loop
    async fn stop_segment_loop(&self) -> Result<(), PlayerError>;

    /// Current playback rate
    async fn playback_rate(&self) -> Result<f64, PlayerError>;

    /// Change the playback rate
    async fn set_playback_rate(&self, rate: f64) -> Result<(), PlayerError>;

    /// Currently selected subtitle track, `None` when captions are off
    async fn current_subtitle_track(&self) -> Result<Option<SubtitleTrack>, PlayerError>;
}
