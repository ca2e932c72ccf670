/*!
 * Tests for the session snapshot store
 */

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use subloop::app_config::SessionConfig;
use subloop::loop_control::LoopSegment;
use subloop::session::{CacheStore, ControlsState, ManualClock, SessionStateStore};

use crate::common::init_test_logging;
use crate::common::mock_cache::RecordingCache;
use crate::common::mock_player::MockPlayer;

const START_MS: i64 = 1_700_000_000_000;

struct Fixture {
    store: Arc<SessionStateStore>,
    cache: RecordingCache,
    player: MockPlayer,
    clock: ManualClock,
}

fn fixture_with(config: SessionConfig, video_id: &str) -> Fixture {
    init_test_logging();
    let cache = RecordingCache::new();
    let player = MockPlayer::new(600.0);
    let clock = ManualClock::new(START_MS);
    let store = Arc::new(SessionStateStore::new(
        config,
        Arc::new(cache.clone()),
        Arc::new(player.clone()),
        Arc::new(clock.clone()),
        video_id,
    ));
    Fixture {
        store,
        cache,
        player,
        clock,
    }
}

fn fixture(video_id: &str) -> Fixture {
    fixture_with(SessionConfig::default(), video_id)
}

/// Seed the cache with a snapshot carrying a loop and hidden subtitles
async fn seed_snapshot(cache: &RecordingCache, video_id: &str) {
    let mut saved = ControlsState::new(video_id, START_MS - 60_000);
    saved.speed = 1.5;
    saved.vocabulary_mode = true;
    saved.subtitles_visible = false;
    saved.active_loop = Some(LoopSegment::new(5.0, 9.0));
    saved.total_watch_time = 321.0;

    let value = serde_json::to_value(&saved).unwrap();
    cache
        .inner
        .set(&format!("enhanced-controls-state-{}", video_id), value, 0)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_load_state_withSavedSnapshot_shouldRestoreSpeedAndVocabularyOnly() {
    let f = fixture("abc");
    seed_snapshot(&f.cache, "abc").await;

    let saved = f.store.load_state().await.unwrap();
    assert_eq!(saved.speed, 1.5);

    let state = f.store.state();
    assert_eq!(state.speed, 1.5);
    assert!(state.vocabulary_mode);
    assert!(state.subtitles_visible);
    assert!(state.active_loop.is_none());
    assert_eq!(state.total_watch_time, 0.0);
    assert_eq!(state.last_video_id, "abc");
}

#[tokio::test]
async fn test_load_state_withAutoResumeOff_shouldKeepDefaults() {
    let config = SessionConfig {
        auto_resume: false,
        ..SessionConfig::default()
    };
    let f = fixture_with(config, "abc");
    seed_snapshot(&f.cache, "abc").await;

    assert!(f.store.load_state().await.is_some());

    let state = f.store.state();
    assert_eq!(state.speed, 1.0);
    assert!(!state.vocabulary_mode);
    assert!(state.subtitles_visible);
}

#[tokio::test]
async fn test_load_state_withUnreadableCache_shouldFallBackToDefaults() {
    let f = fixture("abc");
    seed_snapshot(&f.cache, "abc").await;
    f.cache.fail_reads(true);

    assert!(f.store.load_state().await.is_none());
    assert_eq!(f.store.state().speed, 1.0);
}

#[tokio::test]
async fn test_save_state_shouldNeverPersistLoop() {
    let f = fixture("abc");
    f.store.set_loop(Some(LoopSegment::new(1.0, 4.0)));
    f.player.set_time(42.5);

    assert!(f.store.save_state().await);

    let persisted = f.cache.inner.peek(&f.store.storage_key()).unwrap();
    assert_eq!(persisted["loop"], json!(null));
    assert_eq!(persisted["lastPosition"], json!(42.5));
    assert_eq!(persisted["loopCount"], json!(1));
    assert!(f.store.state().active_loop.is_some(), "live state keeps the loop");
}

#[tokio::test]
async fn test_save_thenLoad_shouldRestoreSettingsAndResetLoopAndSubtitles() {
    let f = fixture("abc");
    f.store.set_speed(1.5);
    f.store.set_vocabulary_mode(true);
    f.store.set_subtitles_visible(false);
    f.store.set_loop(Some(LoopSegment::new(5.0, 9.0)));
    assert!(f.store.save_state().await);

    // A fresh store for the same video, as after a page reload
    let reloaded = SessionStateStore::new(
        SessionConfig::default(),
        Arc::new(f.cache.clone()),
        Arc::new(f.player.clone()),
        Arc::new(f.clock.clone()),
        "abc",
    );
    let saved = reloaded.load_state().await.unwrap();
    assert!(saved.active_loop.is_none());
    assert!(!saved.subtitles_visible);

    let state = reloaded.state();
    assert_eq!(state.speed, 1.5);
    assert!(state.vocabulary_mode);
    assert!(state.active_loop.is_none());
    assert!(state.subtitles_visible);
}

#[tokio::test]
async fn test_save_state_shouldAccumulateWatchTimeOnce() {
    let f = fixture("abc");

    f.clock.advance(30_000);
    assert!(f.store.save_state().await);
    assert_eq!(f.store.state().total_watch_time, 30.0);

    f.clock.advance(10_000);
    assert!(f.store.save_state().await);

    let state = f.store.state();
    assert_eq!(state.total_watch_time, 40.0);
    assert_eq!(state.session_start_time, START_MS + 40_000);
}

#[tokio::test]
async fn test_save_state_withRejectedWrite_shouldReportFailure() {
    let f = fixture("abc");
    f.cache.reject_writes(true);

    assert!(!f.store.save_state().await);
    assert_eq!(f.cache.write_count(), 0);
    assert!(!f.store.is_destroyed());
}

#[tokio::test]
async fn test_save_state_withUnreadableTime_shouldKeepLastPosition() {
    let f = fixture("abc");
    f.player.set_time(12.0);
    f.store.save_state().await;

    f.player.fail_time(true);
    f.store.save_state().await;
    assert_eq!(f.store.state().last_position, 12.0);
}

#[tokio::test]
async fn test_set_speed_shouldCountOnlyRealChanges() {
    let f = fixture("abc");

    assert!(!f.store.set_speed(1.0));
    assert!(f.store.set_speed(1.25));
    assert!(f.store.set_speed(0.75));
    assert_eq!(f.store.state().speed_changes, 2);
}

#[tokio::test]
async fn test_clear_state_shouldResetAndPersistDefaults() {
    let f = fixture("abc");
    f.store.set_speed(2.0);
    f.store.set_vocabulary_mode(true);

    assert!(f.store.clear_state().await);

    let state = f.store.state();
    assert_eq!(state.speed, 1.0);
    assert!(!state.vocabulary_mode);
    let persisted = f.cache.inner.peek("enhanced-controls-state-abc").unwrap();
    assert_eq!(persisted["speed"], json!(1.0));
}

#[tokio::test]
async fn test_switch_video_shouldSaveOldAndRestoreNew() {
    let f = fixture("video-a");
    f.store.set_speed(1.25);

    f.store.switch_video("video-b").await;
    assert_eq!(f.store.video_id(), "video-b");
    assert_eq!(f.store.state().speed, 1.0);
    assert_eq!(f.store.storage_key(), "enhanced-controls-state-video-b");

    let saved_a = f.cache.inner.peek("enhanced-controls-state-video-a").unwrap();
    assert_eq!(saved_a["speed"], json!(1.25));

    f.store.switch_video("video-a").await;
    assert_eq!(f.store.state().speed, 1.25);
}

#[tokio::test(start_paused = true)]
async fn test_autosave_shouldSaveEveryInterval() {
    let f = fixture("abc");
    f.store.start_autosave();
    f.store.start_autosave();
    assert!(f.store.is_autosaving());

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(f.cache.write_count(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(f.cache.write_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_shouldStopTimerAndRefuseFurtherWork() {
    let f = fixture("abc");
    f.store.start_autosave();

    assert!(f.store.teardown().await);
    assert_eq!(f.cache.write_count(), 1);
    assert!(f.store.is_destroyed());
    assert!(!f.store.is_autosaving());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(f.cache.write_count(), 1);

    assert!(!f.store.teardown().await);
    assert!(!f.store.save_state().await);
    assert!(f.store.load_state().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_autosave_afterStoreDropped_shouldStop() {
    let f = fixture("abc");
    f.store.start_autosave();
    let writes = f.cache.clone();
    drop(f);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(writes.write_count(), 0);
}
