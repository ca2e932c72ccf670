/*!
 * Collapsing of auto-generated caption frames.
 *
 * ASR tracks repeat and grow the same line over several cues ("A", "A B",
 * "A B C"). Walking the sorted cues, a cue continues the active plateau when
 * its text equals, extends or is already part of the plateau's text and it
 * starts within the allowed gap. Plateaus shorter than the minimum duration
 * are then folded into their predecessor so navigation never lands on a
 * flicker.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::app_config::GroupingConfig;
use crate::subtitle_track::{normalize_text, sort_cues, Cue};

/// A plateau of stable auto-caption text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueGroup {
    /// Start in seconds
    pub start: f64,

    /// End in seconds
    pub end: f64,

    /// Most complete text seen in the plateau
    pub text: String,
}

impl CueGroup {
    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` lies inside the group, bounds included
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Computes cue groups for auto-generated tracks
#[derive(Debug, Clone, Default)]
pub struct CueGroupCollapser {
    config: GroupingConfig,
}

impl CueGroupCollapser {
    /// Create a collapser with the given thresholds
    pub fn new(config: GroupingConfig) -> Self {
        Self { config }
    }

    /// Collapse `cues` into plateaus. Empty input yields an empty list.
    pub fn collapse(&self, cues: &[Cue]) -> Vec<CueGroup> {
        let mut sorted: Vec<Cue> = cues
            .iter()
            .filter(|cue| {
                cue.start_time.is_finite() && cue.end_time.is_finite() && !cue.text.trim().is_empty()
            })
            .cloned()
            .collect();
        sort_cues(&mut sorted);

        let plateaus = self.build_plateaus(&sorted);
        let merged = self.merge_short_groups(plateaus);

        debug!("Collapsed {} auto-generated cues into {} groups", cues.len(), merged.len());
        merged
    }

    fn build_plateaus(&self, sorted: &[Cue]) -> Vec<CueGroup> {
        let mut groups: Vec<CueGroup> = Vec::new();

        for cue in sorted {
            let text = normalize_text(&cue.text);

            if let Some(active) = groups.last_mut() {
                let gap = cue.start_time - active.end;
                if gap <= self.config.max_gap_secs {
                    if let Some(merged_text) = continued_text(&active.text, &text) {
                        active.text = merged_text;
                        active.end = active.end.max(cue.end_time);
                        continue;
                    }
                }
            }

            groups.push(CueGroup {
                start: cue.start_time,
                end: cue.end_time.max(cue.start_time),
                text,
            });
        }

        groups
    }

    fn merge_short_groups(&self, groups: Vec<CueGroup>) -> Vec<CueGroup> {
        let mut merged: Vec<CueGroup> = Vec::with_capacity(groups.len());

        for group in groups {
            match merged.last_mut() {
                Some(previous) if group.duration() < self.config.min_group_secs => {
                    previous.end = previous.end.max(group.end);
                    if !group.text.is_empty() && !previous.text.contains(&group.text) {
                        if previous.text.is_empty() {
                            previous.text = group.text;
                        } else {
                            previous.text = format!("{} {}", previous.text, group.text);
                        }
                    }
                }
                _ => merged.push(group),
            }
        }

        merged
    }
}

/// Text of the plateau after absorbing `next`, or `None` when `next` starts
/// a different line
fn continued_text(active: &str, next: &str) -> Option<String> {
    // Compared on whole words so "a" never swallows "an apple"
    let padded_active = format!(" {} ", active);
    if next == active || padded_active.contains(&format!(" {} ", next)) {
        Some(active.to_string())
    } else if active.is_empty() || next.starts_with(&format!("{} ", active)) {
        Some(next.to_string())
    } else {
        None
    }
}
