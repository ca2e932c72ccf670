/*!
 * Session snapshot store.
 *
 * This module handles:
 * - Restoring speed and vocabulary mode for a video
 * - Accumulating watch time and counters
 * - Periodic crash-safety saves and a final save at teardown
 *
 * Restore is deliberately asymmetric: subtitles always come back visible and
 * no loop is ever resumed, whatever the snapshot says.
 */

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app_config::SessionConfig;
use crate::loop_control::LoopSegment;
use crate::player::PlayerControl;

use super::cache::{get_typed, set_typed, CacheStore};
use super::clock::Clock;
use super::models::ControlsState;

/// Persists and restores [`ControlsState`] through a [`CacheStore`]
#[derive(Debug)]
pub struct SessionStateStore {
    config: SessionConfig,
    cache: Arc<dyn CacheStore>,
    player: Arc<dyn PlayerControl>,
    clock: Arc<dyn Clock>,
    /// Live state; never locked across an await
    state: Mutex<ControlsState>,
    destroyed: AtomicBool,
    autosave: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStateStore {
    /// Create a store for `video_id` with default state
    pub fn new(
        config: SessionConfig,
        cache: Arc<dyn CacheStore>,
        player: Arc<dyn PlayerControl>,
        clock: Arc<dyn Clock>,
        video_id: &str,
    ) -> Self {
        let state = ControlsState::new(video_id, clock.now_millis());
        Self {
            config,
            cache,
            player,
            clock,
            state: Mutex::new(state),
            destroyed: AtomicBool::new(false),
            autosave: Mutex::new(None),
        }
    }

    /// Copy of the live state
    pub fn state(&self) -> ControlsState {
        self.state.lock().clone()
    }

    /// Video the store currently tracks
    pub fn video_id(&self) -> String {
        self.state.lock().last_video_id.clone()
    }

    /// Cache key of the current video's snapshot
    pub fn storage_key(&self) -> String {
        format!("{}{}", self.config.key_prefix, self.video_id())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Load the saved snapshot for the current video.
    ///
    /// With auto-resume enabled only speed and vocabulary mode are restored.
    /// Subtitle visibility is reset to visible and the loop to `None` in every
    /// case. Returns the raw snapshot when one was found.
    pub async fn load_state(&self) -> Option<ControlsState> {
        if self.is_destroyed() {
            debug!("Ignoring load after teardown");
            return None;
        }

        let key = self.storage_key();
        let saved = match get_typed::<ControlsState>(self.cache.as_ref(), &key).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Failed to load session state '{}': {}", key, e);
                None
            }
        };

        if self.is_destroyed() {
            debug!("Store torn down while loading '{}'", key);
            return None;
        }

        let mut state = self.state.lock();
        match &saved {
            Some(snapshot) if self.config.auto_resume => {
                state.speed = snapshot.speed;
                state.vocabulary_mode = snapshot.vocabulary_mode;
                info!(
                    "Restored session state for {} (speed {}, vocabulary mode {})",
                    state.last_video_id, state.speed, state.vocabulary_mode
                );
            }
            Some(_) => debug!("Saved state found for '{}' but auto-resume is off", key),
            None => debug!("No saved state for '{}'", key),
        }
        state.subtitles_visible = true;
        state.active_loop = None;

        saved
    }

    /// Fold elapsed time into the watch total and persist the snapshot.
    ///
    /// Returns whether the cache accepted the write.
    pub async fn save_state(&self) -> bool {
        if self.is_destroyed() {
            debug!("Ignoring save after teardown");
            return false;
        }

        let position = match self.player.current_time().await {
            Ok(position) => Some(position),
            Err(e) => {
                debug!("Keeping last position, player time unavailable: {}", e);
                None
            }
        };

        let snapshot = {
            let now = self.clock.now_millis();
            let mut state = self.state.lock();
            let elapsed_ms = (now - state.session_start_time).max(0);
            state.total_watch_time += elapsed_ms as f64 / 1000.0;
            state.session_start_time = now;
            if let Some(position) = position.filter(|p| p.is_finite()) {
                state.last_position = position;
            }
            state.to_persisted()
        };

        self.persist(&snapshot).await
    }

    /// Reset to defaults and persist immediately
    pub async fn clear_state(&self) -> bool {
        let snapshot = {
            let mut state = self.state.lock();
            let video_id = state.last_video_id.clone();
            *state = ControlsState::new(video_id, self.clock.now_millis());
            state.to_persisted()
        };
        info!("Session state cleared for {}", snapshot.last_video_id);
        self.persist(&snapshot).await
    }

    /// Save the current video, then reset and load state for `video_id`
    pub async fn switch_video(&self, video_id: &str) -> Option<ControlsState> {
        if self.video_id() == video_id {
            return None;
        }

        self.save_state().await;
        {
            let mut state = self.state.lock();
            *state = ControlsState::new(video_id, self.clock.now_millis());
        }
        info!("Switched session state to video {}", video_id);
        self.load_state().await
    }

    /// Record a playback rate; returns whether it changed
    pub fn set_speed(&self, speed: f64) -> bool {
        let mut state = self.state.lock();
        if (state.speed - speed).abs() < f64::EPSILON {
            return false;
        }
        state.speed = speed;
        state.speed_changes += 1;
        true
    }

    pub fn set_vocabulary_mode(&self, enabled: bool) {
        self.state.lock().vocabulary_mode = enabled;
    }

    pub fn set_subtitles_visible(&self, visible: bool) {
        self.state.lock().subtitles_visible = visible;
    }

    /// Mirror the active loop; enabling one counts towards `loop_count`
    pub fn set_loop(&self, segment: Option<LoopSegment>) {
        let mut state = self.state.lock();
        if segment.is_some() {
            state.loop_count += 1;
        }
        state.active_loop = segment;
    }

    /// Start the periodic save task. Calling it again while running is a no-op.
    ///
    /// The task only holds a weak reference, so dropping the store ends it.
    pub fn start_autosave(self: &Arc<Self>) {
        let mut slot = self.autosave.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let period = Duration::from_secs(self.config.save_interval_secs.max(1));
        let store: Weak<Self> = Arc::downgrade(self);
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(strong) = store.upgrade() else {
                    break;
                };
                if strong.is_destroyed() {
                    break;
                }
                debug!("Periodic session save");
                strong.save_state().await;
            }
        }));
        debug!("Autosave started every {}s", period.as_secs());
    }

    /// Whether the periodic save task is running
    pub fn is_autosaving(&self) -> bool {
        self.autosave
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the timer, attempt one final save and refuse further work
    pub async fn teardown(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }

        let handle = self.autosave.lock().take();
        if let Some(handle) = handle {
            handle.abort();
        }

        let saved = self.save_state().await;
        self.destroyed.store(true, Ordering::SeqCst);
        info!("Session store torn down (final save {})", if saved { "ok" } else { "skipped" });
        saved
    }

    async fn persist(&self, snapshot: &ControlsState) -> bool {
        let key = format!("{}{}", self.config.key_prefix, snapshot.last_video_id);
        match set_typed(self.cache.as_ref(), &key, snapshot, self.config.ttl_secs).await {
            Ok(()) => {
                debug!("Persisted session state '{}'", key);
                true
            }
            Err(e) => {
                warn!("Failed to save session state '{}': {}", key, e);
                false
            }
        }
    }
}

impl Drop for SessionStateStore {
    fn drop(&mut self) {
        if let Some(handle) = self.autosave.get_mut().take() {
            handle.abort();
        }
    }
}
