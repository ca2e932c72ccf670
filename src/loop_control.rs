/*!
 * IN/OUT marker loops.
 *
 * The controller walks `Idle → MarkedIn → MarkedOut → Looping → Idle`. Marker
 * positions come from the player cursor and are clamped to the media. Applying
 * asks the player to enforce the loop and, if the cursor sits outside it,
 * seeks to the loop start, so the cursor is always inside right after.
 * Wrapping around during playback is left to the player.
 *
 * Every player failure leaves markers and the active segment as they were.
 */

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_config::LoopConfig;
use crate::errors::{LoopError, PlayerError};
use crate::navigation::clamp_to_duration;
use crate::player::PlayerControl;
use crate::subtitle_track::Cue;

/// An applied, enforced loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSegment {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub is_active: bool,
    pub title: String,
}

impl LoopSegment {
    /// New active segment with a fresh id
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            end_time,
            is_active: true,
            title: format!(
                "Loop {} - {}",
                Cue::format_timestamp(start_time),
                Cue::format_timestamp(end_time)
            ),
        }
    }

    /// Loop length in seconds
    pub fn length(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether `time` is inside the loop, bounds included
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// Candidate loop bounds before application
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopMarkers {
    #[serde(rename = "in")]
    pub mark_in: Option<f64>,
    #[serde(rename = "out")]
    pub mark_out: Option<f64>,
}

impl LoopMarkers {
    /// Whether neither marker is set
    pub fn is_empty(&self) -> bool {
        self.mark_in.is_none() && self.mark_out.is_none()
    }
}

/// Marker state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    MarkedIn,
    MarkedOut,
    Looping,
}

/// How an active loop was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOrigin {
    Markers,
    QuickLoop,
}

/// Result of a click on the loop indicator
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorClick {
    MarkedIn(f64),
    MarkedOut(f64),
    Cleared,
}

/// Result of toggling the loop
#[derive(Debug, Clone, PartialEq)]
pub enum LoopToggle {
    Enabled {
        segment: LoopSegment,
        origin: LoopOrigin,
    },
    Disabled,
}

/// Marker and loop state for one player
#[derive(Debug, Clone)]
pub struct LoopController {
    config: LoopConfig,
    markers: LoopMarkers,
    active: Option<LoopSegment>,
    state: LoopState,
}

impl LoopController {
    /// Create an idle controller
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            markers: LoopMarkers::default(),
            active: None,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn markers(&self) -> LoopMarkers {
        self.markers
    }

    pub fn active_segment(&self) -> Option<&LoopSegment> {
        self.active.as_ref()
    }

    /// Capture the cursor as IN. Allowed from any state; an active loop is
    /// stopped and OUT is discarded.
    pub async fn set_mark_in(&mut self, player: &dyn PlayerControl) -> Result<f64, LoopError> {
        let position = self.read_position(player).await?;
        self.stop_active(player).await?;

        self.markers = LoopMarkers {
            mark_in: Some(position),
            mark_out: None,
        };
        self.state = LoopState::MarkedIn;
        info!("Loop IN marker set at {:.3}s", position);
        Ok(position)
    }

    /// Capture the cursor as OUT; IN must already be set
    pub async fn set_mark_out(&mut self, player: &dyn PlayerControl) -> Result<f64, LoopError> {
        if self.markers.mark_in.is_none() {
            info!("Loop OUT marker rejected: IN is not set");
            return Err(LoopError::MarkInRequired);
        }

        let position = self.read_position(player).await?;
        self.stop_active(player).await?;

        self.markers.mark_out = Some(position);
        self.state = LoopState::MarkedOut;
        info!("Loop OUT marker set at {:.3}s", position);
        Ok(position)
    }

    /// Apply the IN/OUT markers as an enforced loop
    pub async fn apply_marker_loop(&mut self, player: &dyn PlayerControl) -> Result<LoopSegment, LoopError> {
        let (mark_in, mark_out) = match (self.markers.mark_in, self.markers.mark_out) {
            (Some(mark_in), Some(mark_out)) => (mark_in, mark_out),
            _ => {
                info!("Loop apply rejected: markers incomplete");
                return Err(LoopError::NoMarkers);
            }
        };

        let start = mark_in.min(mark_out);
        let end = mark_in.max(mark_out);
        self.check_length(start, end)?;

        if let Some(active) = self.active.as_ref().filter(|_| self.state == LoopState::Looping) {
            if active.start_time == start && active.end_time == end {
                debug!("Loop {:.3}s - {:.3}s already enforced", start, end);
                return Ok(active.clone());
            }
        }

        self.enforce(player, start, end).await
    }

    /// Loop `±quick_loop_radius_secs` around the cursor
    pub async fn quick_loop(&mut self, player: &dyn PlayerControl) -> Result<LoopSegment, LoopError> {
        let current = player.current_time().await.map_err(log_player_error)?;
        let duration = player.duration().await.map_err(log_player_error)?;
        let radius = self.config.quick_loop_radius_secs;

        let start = clamp_to_duration(current - radius, duration);
        let end = clamp_to_duration(current + radius, duration);
        self.check_length(start, end)?;

        self.enforce(player, start, end).await
    }

    /// Turn the loop off when looping; otherwise apply the markers, or a
    /// quick loop when no marker is set
    pub async fn toggle_loop(&mut self, player: &dyn PlayerControl) -> Result<LoopToggle, LoopError> {
        if self.state == LoopState::Looping {
            self.clear_loop(player).await?;
            return Ok(LoopToggle::Disabled);
        }

        if self.markers.is_empty() {
            let segment = self.quick_loop(player).await?;
            return Ok(LoopToggle::Enabled {
                segment,
                origin: LoopOrigin::QuickLoop,
            });
        }

        let segment = self.apply_marker_loop(player).await?;
        Ok(LoopToggle::Enabled {
            segment,
            origin: LoopOrigin::Markers,
        })
    }

    /// Single-control cycle: IN, then OUT, then clear everything
    pub async fn click_indicator(&mut self, player: &dyn PlayerControl) -> Result<IndicatorClick, LoopError> {
        match self.state {
            LoopState::Idle => self.set_mark_in(player).await.map(IndicatorClick::MarkedIn),
            LoopState::MarkedIn => self.set_mark_out(player).await.map(IndicatorClick::MarkedOut),
            LoopState::MarkedOut | LoopState::Looping => {
                self.clear_loop(player).await?;
                Ok(IndicatorClick::Cleared)
            }
        }
    }

    /// Stop enforcement, discard the segment and the markers
    pub async fn clear_loop(&mut self, player: &dyn PlayerControl) -> Result<(), LoopError> {
        self.stop_active(player).await?;
        self.markers = LoopMarkers::default();
        self.state = LoopState::Idle;
        Ok(())
    }

    fn check_length(&self, start: f64, end: f64) -> Result<(), LoopError> {
        let length = end - start;
        if length < self.config.min_loop_secs {
            info!("Loop rejected: {:.3}s is shorter than {:.3}s", length, self.config.min_loop_secs);
            return Err(LoopError::LoopTooShort {
                length,
                minimum: self.config.min_loop_secs,
            });
        }
        Ok(())
    }

    async fn read_position(&self, player: &dyn PlayerControl) -> Result<f64, LoopError> {
        let current = player.current_time().await.map_err(log_player_error)?;
        let duration = player.duration().await.map_err(log_player_error)?;
        Ok(clamp_to_duration(current, duration))
    }

    async fn stop_active(&mut self, player: &dyn PlayerControl) -> Result<(), LoopError> {
        if self.active.is_some() {
            player.stop_segment_loop().await.map_err(log_player_error)?;
            self.active = None;
            info!("Loop stopped");
        }
        Ok(())
    }

    async fn enforce(&mut self, player: &dyn PlayerControl, start: f64, end: f64) -> Result<LoopSegment, LoopError> {
        player
            .create_segment_loop(start, end)
            .await
            .map_err(log_player_error)?;

        let inside = matches!(player.current_time().await, Ok(t) if t >= start && t <= end);
        if !inside {
            if let Err(e) = player.seek(start).await {
                error!("Corrective seek to loop start failed: {}", e);
                // The cursor may be outside the loop, so the loop must not stay enforced
                if let Err(stop_error) = player.stop_segment_loop().await {
                    error!("Failed to stop loop after seek failure: {}", stop_error);
                }
                if let Some(previous) = &self.active {
                    if let Err(restore_error) = player
                        .create_segment_loop(previous.start_time, previous.end_time)
                        .await
                    {
                        error!("Failed to restore previous loop: {}", restore_error);
                    }
                }
                return Err(e.into());
            }
        }

        let segment = LoopSegment::new(start, end);
        info!("Loop applied {:.3}s - {:.3}s", start, end);
        self.active = Some(segment.clone());
        self.state = LoopState::Looping;
        Ok(segment)
    }
}

fn log_player_error(e: PlayerError) -> LoopError {
    error!("Player call failed: {}", e);
    LoopError::Player(e)
}
