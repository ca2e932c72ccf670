/*!
 * Session persistence for the learner's controls.
 *
 * This module provides:
 * - The persisted `ControlsState` snapshot
 * - The `CacheStore` contract and an in-memory implementation
 * - `SessionStateStore`, which restores, accumulates and periodically saves
 */

pub mod cache;
pub mod clock;
pub mod models;
pub mod store;

// Re-export main types
pub use cache::{CacheStore, MemoryCacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use models::ControlsState;
pub use store::SessionStateStore;
