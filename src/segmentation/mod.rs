/*!
 * Grouping of caption cues into navigable units.
 *
 * - `sentence`: sentence groups over any track, with time and adjacency queries
 * - `collapse`: plateaus of stable text for auto-generated tracks
 */

pub mod collapse;
pub mod sentence;

pub use collapse::{CueGroup, CueGroupCollapser};
pub use sentence::{SentenceGroup, SentenceSegmenter};
