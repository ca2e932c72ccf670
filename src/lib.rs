/*!
 * # subloop - Sentence navigation and loop practice over caption tracks
 *
 * A Rust library that turns a noisy, time-indexed caption cue stream into
 * navigable sentences and keeps a learner's navigation, replay and A/B loop
 * practice synchronized with an external media player.
 *
 * ## Features
 *
 * - Sentence segmentation of caption cues
 * - Collapsing of cumulative auto-generated (ASR) caption frames
 * - Previous / next / replay targets through a fallback ladder that never fails
 * - IN/OUT marker loops and quick loops that keep the cursor inside the loop
 * - Session snapshots per video with periodic autosave
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Tunable thresholds and persistence settings
 * - `subtitle_track`: Cues and tracks as reported by the player
 * - `segmentation`: Grouping of cues:
 *   - `segmentation::sentence`: Sentence groups and time queries
 *   - `segmentation::collapse`: Cue groups for auto-generated tracks
 * - `navigation`: Navigation target resolution
 * - `loop_control`: Marker loop state machine
 * - `session`: Session snapshot persistence:
 *   - `session::cache`: Cache contract and in-memory store
 *   - `session::store`: Restore, accumulate and autosave
 * - `player`: Contract of the external player
 * - `events`: Control events and their broadcast channel
 * - `controls`: Facade wiring everything to one player
 * - `logging`: Console logger for host applications
 * - `errors`: Custom error types
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod controls;
pub mod errors;
pub mod events;
pub mod logging;
pub mod loop_control;
pub mod navigation;
pub mod player;
pub mod segmentation;
pub mod session;
pub mod subtitle_track;

// Re-export main types for easier usage
pub use app_config::Config;
pub use controls::ControlsController;
pub use errors::{CacheError, ControlError, LoopError, PlayerError};
pub use events::{ControlEvent, ControlEventKind, EventBus};
pub use loop_control::{LoopController, LoopMarkers, LoopSegment, LoopState};
pub use navigation::{Direction, NavigationResolver, NavigationTarget};
pub use player::PlayerControl;
pub use segmentation::{CueGroup, CueGroupCollapser, SentenceGroup, SentenceSegmenter};
pub use session::{CacheStore, ControlsState, MemoryCacheStore, SessionStateStore};
pub use subtitle_track::{Cue, SubtitleTrack};
