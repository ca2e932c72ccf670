use log::{debug, error, info};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::{ControlError, PlayerError};
use crate::events::{ControlEvent, ControlEventKind, EventBus};
use crate::loop_control::{IndicatorClick, LoopController, LoopMarkers, LoopOrigin, LoopSegment, LoopState, LoopToggle};
use crate::navigation::{Direction, NavigationContext, NavigationResolver, NavigationTarget};
use crate::player::PlayerControl;
use crate::segmentation::{CueGroup, CueGroupCollapser, SentenceGroup, SentenceSegmenter};
use crate::session::{CacheStore, Clock, ControlsState, SessionStateStore, SystemClock};
use crate::subtitle_track::{deduplicate_cues, Cue, SubtitleTrack};

// @module: Controls facade wiring segmentation, navigation, loops and persistence to one player

/// Learner controls for one player and one video
pub struct ControlsController {
    // @field: Thresholds
    config: Config,
    player: Arc<dyn PlayerControl>,
    store: Arc<SessionStateStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    segmenter: SentenceSegmenter,
    collapser: CueGroupCollapser,
    resolver: NavigationResolver,
    loops: LoopController,
    // @field: Track the cached groups were computed from
    track: SubtitleTrack,
    groups: Vec<CueGroup>,
    raw_cues: Vec<Cue>,
}

impl ControlsController {
    // @method: Create controls using the system clock
    pub fn new(config: Config, player: Arc<dyn PlayerControl>, cache: Arc<dyn CacheStore>, video_id: &str) -> Self {
        Self::with_clock(config, player, cache, Arc::new(SystemClock), video_id)
    }

    // @method: Create controls with an explicit clock
    pub fn with_clock(
        config: Config,
        player: Arc<dyn PlayerControl>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        video_id: &str,
    ) -> Self {
        let store = Arc::new(SessionStateStore::new(
            config.session.clone(),
            cache,
            player.clone(),
            clock.clone(),
            video_id,
        ));

        Self {
            segmenter: SentenceSegmenter::new(config.segmentation.clone()),
            collapser: CueGroupCollapser::new(config.grouping.clone()),
            resolver: NavigationResolver::new(config.navigation.clone()),
            loops: LoopController::new(config.looping.clone()),
            config,
            player,
            store,
            events: EventBus::default(),
            clock,
            track: SubtitleTrack::default(),
            groups: Vec::new(),
            raw_cues: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Event channel for `sentence_nav`, `loop_toggle` and `speed_change`
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Session store shared with the autosave task
    pub fn store(&self) -> &Arc<SessionStateStore> {
        &self.store
    }

    pub fn session_state(&self) -> ControlsState {
        self.store.state()
    }

    pub fn sentences(&self) -> &[SentenceGroup] {
        self.segmenter.available_sentences()
    }

    pub fn sentence_at_time(&self, time: f64) -> Option<&SentenceGroup> {
        self.segmenter.sentence_at_time(time)
    }

    pub fn groups(&self) -> &[CueGroup] {
        &self.groups
    }

    pub fn loop_state(&self) -> LoopState {
        self.loops.state()
    }

    pub fn markers(&self) -> LoopMarkers {
        self.loops.markers()
    }

    pub fn active_loop(&self) -> Option<&LoopSegment> {
        self.loops.active_segment()
    }

    /// Restore saved settings, load the current track and start autosaving
    pub async fn init(&mut self) {
        self.store.load_state().await;
        self.apply_restored_speed().await;
        self.refresh_track().await;
        self.store.start_autosave();
        info!("Controls initialized for video {}", self.store.video_id());
    }

    /// Pull the player's track and regroup when its cues changed.
    ///
    /// Returns whether anything was recomputed.
    pub async fn refresh_track(&mut self) -> bool {
        let track = match self.player.current_subtitle_track().await {
            Ok(track) => track.unwrap_or_default(),
            Err(e) => {
                error!("Failed to read subtitle track: {}", e);
                return false;
            }
        };

        if track == self.track {
            return false;
        }

        self.segmenter.set_cues(track.cues.clone());
        self.raw_cues = deduplicate_cues(&track.cues);
        self.groups = match (&track.groups, track.is_auto_generated) {
            (Some(groups), _) => groups.clone(),
            (None, true) => self.collapser.collapse(&track.cues),
            (None, false) => Vec::new(),
        };

        if track.is_empty() {
            debug!("Subtitle track has no cues, navigation falls back to fixed steps");
        } else {
            info!(
                "Loaded {} track: {} cues, {} sentences, {} groups",
                if track.is_auto_generated { "auto-generated" } else { "manual" },
                track.cues.len(),
                self.segmenter.available_sentences().len(),
                self.groups.len()
            );
        }

        self.track = track;
        true
    }

    /// Resolve `direction`, seek there and announce it
    pub async fn navigate(&self, direction: Direction) -> Result<NavigationTarget, ControlError> {
        let current_time = self.player.current_time().await.map_err(log_player_error)?;
        let duration = match self.player.duration().await {
            Ok(duration) => duration,
            Err(e) => {
                debug!("Duration unavailable, clamping to zero only: {}", e);
                f64::NAN
            }
        };

        let ctx = NavigationContext {
            current_time,
            duration,
            groups: &self.groups,
            sentences: self.segmenter.available_sentences(),
            cues: &self.raw_cues,
        };
        let target = self.resolver.resolve(direction, &ctx);

        self.player
            .seek(target.to_time)
            .await
            .map_err(log_player_error)?;

        self.emit(ControlEventKind::SentenceNav {
            direction,
            from_time: target.from_time,
            to_time: target.to_time,
            matched_text: target.matched_text.clone(),
        });
        Ok(target)
    }

    pub async fn set_mark_in(&mut self) -> Result<f64, ControlError> {
        let was_looping = self.loops.active_segment().is_some();
        let result = self.loops.set_mark_in(self.player.as_ref()).await;
        self.after_marker_edit(was_looping).await;
        Ok(result?)
    }

    pub async fn set_mark_out(&mut self) -> Result<f64, ControlError> {
        let was_looping = self.loops.active_segment().is_some();
        let result = self.loops.set_mark_out(self.player.as_ref()).await;
        self.after_marker_edit(was_looping).await;
        Ok(result?)
    }

    pub async fn apply_marker_loop(&mut self) -> Result<LoopSegment, ControlError> {
        let previous_id = self.loops.active_segment().map(|s| s.id.clone());
        let segment = self.loops.apply_marker_loop(self.player.as_ref()).await?;
        if previous_id.as_deref() == Some(segment.id.as_str()) {
            return Ok(segment);
        }
        self.loop_enabled(&segment, LoopOrigin::Markers).await;
        Ok(segment)
    }

    pub async fn toggle_loop(&mut self) -> Result<LoopToggle, ControlError> {
        let toggle = self.loops.toggle_loop(self.player.as_ref()).await?;
        match &toggle {
            LoopToggle::Enabled { segment, origin } => self.loop_enabled(segment, *origin).await,
            LoopToggle::Disabled => self.loop_disabled().await,
        }
        Ok(toggle)
    }

    pub async fn click_loop_indicator(&mut self) -> Result<IndicatorClick, ControlError> {
        let was_looping = self.loops.active_segment().is_some();
        let click = self.loops.click_indicator(self.player.as_ref()).await;
        self.after_marker_edit(was_looping).await;
        Ok(click?)
    }

    pub async fn clear_loop(&mut self) -> Result<(), ControlError> {
        let was_looping = self.loops.active_segment().is_some();
        self.loops.clear_loop(self.player.as_ref()).await?;
        if was_looping {
            self.loop_disabled().await;
        }
        Ok(())
    }

    /// Change the playback rate through the player and record it
    pub async fn set_speed(&mut self, rate: f64) -> Result<(), ControlError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PlayerError::Rate(format!("invalid playback rate {}", rate)).into());
        }

        let from = self.store.state().speed;
        self.player
            .set_playback_rate(rate)
            .await
            .map_err(log_player_error)?;

        if self.store.set_speed(rate) {
            self.emit(ControlEventKind::SpeedChange { from, to: rate });
            self.store.save_state().await;
        }
        Ok(())
    }

    /// Flip vocabulary mode; returns the new value
    pub async fn toggle_vocabulary_mode(&mut self) -> bool {
        let enabled = !self.store.state().vocabulary_mode;
        self.store.set_vocabulary_mode(enabled);
        self.store.save_state().await;
        enabled
    }

    /// Flip subtitle visibility; returns the new value
    pub async fn toggle_subtitles(&mut self) -> bool {
        let visible = !self.store.state().subtitles_visible;
        self.store.set_subtitles_visible(visible);
        self.store.save_state().await;
        visible
    }

    /// Move to another video: drop the loop, swap the snapshot, reload the track
    pub async fn switch_video(&mut self, video_id: &str) {
        if self.store.video_id() == video_id {
            return;
        }

        if let Err(e) = self.clear_loop().await {
            error!("Failed to clear loop while switching video: {}", e);
        }
        self.store.switch_video(video_id).await;
        self.apply_restored_speed().await;
        self.refresh_track().await;
    }

    /// Stop autosaving and attempt a final save
    pub async fn teardown(&mut self) -> bool {
        self.store.teardown().await
    }

    async fn apply_restored_speed(&self) {
        let speed = self.store.state().speed;
        match self.player.playback_rate().await {
            Ok(current) if (current - speed).abs() < f64::EPSILON => {}
            _ => {
                if let Err(e) = self.player.set_playback_rate(speed).await {
                    error!("Failed to restore playback rate {}: {}", speed, e);
                }
            }
        }
    }

    async fn after_marker_edit(&mut self, was_looping: bool) {
        if was_looping && self.loops.active_segment().is_none() {
            self.loop_disabled().await;
        }
    }

    async fn loop_enabled(&mut self, segment: &LoopSegment, origin: LoopOrigin) {
        self.store.set_loop(Some(segment.clone()));
        self.emit(ControlEventKind::LoopToggle {
            enabled: true,
            start_time: Some(segment.start_time),
            end_time: Some(segment.end_time),
            origin: Some(origin),
        });
        self.store.save_state().await;
    }

    async fn loop_disabled(&mut self) {
        self.store.set_loop(None);
        self.emit(ControlEventKind::LoopToggle {
            enabled: false,
            start_time: None,
            end_time: None,
            origin: None,
        });
        self.store.save_state().await;
    }

    fn emit(&self, kind: ControlEventKind) {
        self.events.publish(ControlEvent::new(kind, self.clock.now_millis()));
    }
}

fn log_player_error(e: PlayerError) -> PlayerError {
    error!("Player call failed: {}", e);
    e
}
