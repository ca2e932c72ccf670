/*!
 * Navigation target resolution.
 *
 * Given a direction and the playback cursor, the resolver returns exactly one
 * seek target. It walks a ladder from the most precise data to the least:
 *
 * 1. Collapsed cue groups of an auto-generated track
 * 2. Sentence groups, stepping one sentence from the cursor
 * 3. A minimum forward progress rule for `next`
 * 4. Deduplicated raw cues when the sentence jump looks implausible
 * 5. A fixed step when nothing else answers
 *
 * The resolver never seeks; the caller does and reports the result.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::NavigationConfig;
use crate::segmentation::{CueGroup, SentenceGroup};
use crate::subtitle_track::Cue;

/// Navigation request direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
    Replay,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Previous => "previous",
            Direction::Next => "next",
            Direction::Replay => "replay",
        };
        write!(f, "{}", name)
    }
}

/// Which rung of the ladder produced a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSource {
    CueGroup,
    Sentence,
    RawCue,
    MinimumStep,
    FixedStep,
}

/// Everything the resolver looks at for one request
#[derive(Debug, Clone, Copy)]
pub struct NavigationContext<'a> {
    /// Playback cursor in seconds
    pub current_time: f64,

    /// Media duration in seconds; non-finite or non-positive means unknown
    pub duration: f64,

    /// Collapsed groups, empty unless the track is auto-generated
    pub groups: &'a [CueGroup],

    /// Sentence groups of the track
    pub sentences: &'a [SentenceGroup],

    /// Deduplicated raw cues of the track
    pub cues: &'a [Cue],
}

impl<'a> NavigationContext<'a> {
    /// Context with no cue data at all
    pub fn empty(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
            groups: &[],
            sentences: &[],
            cues: &[],
        }
    }
}

/// Resolved seek target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTarget {
    pub direction: Direction,
    pub from_time: f64,
    pub to_time: f64,
    pub matched_text: Option<String>,
    pub source: NavigationSource,
}

/// Intermediate answer before clamping
#[derive(Debug, Clone)]
struct Candidate {
    time: f64,
    text: Option<String>,
    source: NavigationSource,
}

impl Candidate {
    fn new(time: f64, text: Option<&str>, source: NavigationSource) -> Self {
        Self {
            time,
            text: text.map(str::to_string),
            source,
        }
    }
}

/// Pure resolver for previous/next/replay targets
#[derive(Debug, Clone, Default)]
pub struct NavigationResolver {
    config: NavigationConfig,
}

impl NavigationResolver {
    /// Create a resolver with the given thresholds
    pub fn new(config: NavigationConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Resolve one target time for `direction`
    pub fn resolve(&self, direction: Direction, ctx: &NavigationContext<'_>) -> NavigationTarget {
        let current = if ctx.current_time.is_finite() {
            ctx.current_time.max(0.0)
        } else {
            0.0
        };

        let candidate = match direction {
            Direction::Next => self.resolve_next(current, ctx),
            Direction::Previous => self.resolve_previous(current, ctx),
            Direction::Replay => self.resolve_replay(current, ctx),
        };

        let to_time = clamp_to_duration(candidate.time, ctx.duration);
        debug!(
            "Navigation {} from {:.3}s to {:.3}s via {:?}",
            direction, current, to_time, candidate.source
        );

        NavigationTarget {
            direction,
            from_time: current,
            to_time,
            matched_text: candidate.text,
            source: candidate.source,
        }
    }

    fn resolve_next(&self, current: f64, ctx: &NavigationContext<'_>) -> Candidate {
        let epsilon = self.config.time_epsilon_secs;

        if let Some(group) = ctx.groups.iter().find(|g| g.start > current + epsilon) {
            return Candidate::new(group.start, Some(group.text.as_str()), NavigationSource::CueGroup);
        }

        if !ctx.sentences.is_empty() {
            if let Some(candidate) = self.next_sentence(current, ctx) {
                return self.check_plausible(Direction::Next, current, candidate, ctx);
            }
            debug!("No sentence after {:.3}s, trying raw cues", current);
        }

        if let Some(cue) = first_cue_starting_after(ctx.cues, current + epsilon) {
            return Candidate::new(cue.start_time, Some(cue.text.as_str()), NavigationSource::RawCue);
        }

        self.fixed_step(Direction::Next, current)
    }

    /// Sentence rung for `next`, with the minimum forward progress rule applied
    fn next_sentence(&self, current: f64, ctx: &NavigationContext<'_>) -> Option<Candidate> {
        let sentences = ctx.sentences;
        let target = match containing_index(sentences, current) {
            Some(index) => sentences.get(index + 1),
            None => sentences.iter().find(|s| s.start() > current),
        }?;

        let min_progress = self.config.min_forward_progress_secs;
        if target.start() - current >= min_progress {
            return Some(Candidate::new(
                target.start(),
                Some(target.combined_text.as_str()),
                NavigationSource::Sentence,
            ));
        }

        debug!(
            "Sentence target {:.3}s is within {:.2}s of the cursor, looking further",
            target.start(),
            min_progress
        );

        if let Some(further) = sentences.iter().find(|s| s.start() > current + min_progress) {
            return Some(Candidate::new(
                further.start(),
                Some(further.combined_text.as_str()),
                NavigationSource::Sentence,
            ));
        }

        if let Some(cue) = first_cue_starting_after(ctx.cues, current + min_progress) {
            return Some(Candidate::new(cue.start_time, Some(cue.text.as_str()), NavigationSource::RawCue));
        }

        Some(Candidate::new(
            current + self.config.minimum_step_secs,
            None,
            NavigationSource::MinimumStep,
        ))
    }

    fn resolve_previous(&self, current: f64, ctx: &NavigationContext<'_>) -> Candidate {
        let epsilon = self.config.time_epsilon_secs;

        if let Some(group) = ctx.groups.iter().rev().find(|g| g.end < current - epsilon) {
            return Candidate::new(group.start, Some(group.text.as_str()), NavigationSource::CueGroup);
        }

        if !ctx.sentences.is_empty() {
            let sentences = ctx.sentences;
            let target = match containing_index(sentences, current) {
                Some(index) => index.checked_sub(1).map(|i| &sentences[i]),
                None => sentences.iter().rev().find(|s| s.end() < current),
            };

            if let Some(target) = target {
                let candidate = Candidate::new(
                    target.start(),
                    Some(target.combined_text.as_str()),
                    NavigationSource::Sentence,
                );
                return self.check_plausible(Direction::Previous, current, candidate, ctx);
            }
            debug!("No sentence before {:.3}s, trying raw cues", current);
        }

        if let Some(cue) = last_cue_ending_before(ctx.cues, current - epsilon) {
            return Candidate::new(cue.start_time, Some(cue.text.as_str()), NavigationSource::RawCue);
        }

        self.fixed_step(Direction::Previous, current)
    }

    fn resolve_replay(&self, current: f64, ctx: &NavigationContext<'_>) -> Candidate {
        if let Some(group) = ctx
            .groups
            .iter()
            .rev()
            .find(|g| g.start <= current)
        {
            return Candidate::new(group.start, Some(group.text.as_str()), NavigationSource::CueGroup);
        }

        if let Some(sentence) = ctx
            .sentences
            .iter()
            .rev()
            .find(|s| s.start() <= current)
        {
            return Candidate::new(
                sentence.start(),
                Some(sentence.combined_text.as_str()),
                NavigationSource::Sentence,
            );
        }

        if let Some(cue) = ctx.cues.iter().rev().find(|c| c.start_time <= current) {
            return Candidate::new(cue.start_time, Some(cue.text.as_str()), NavigationSource::RawCue);
        }

        Candidate::new(
            current - self.config.replay_window_secs,
            None,
            NavigationSource::FixedStep,
        )
    }

    /// Replace a sentence answer that jumps too far with the raw cue answer
    fn check_plausible(
        &self,
        direction: Direction,
        current: f64,
        candidate: Candidate,
        ctx: &NavigationContext<'_>,
    ) -> Candidate {
        let jump = (candidate.time - current).abs();
        if candidate.source != NavigationSource::Sentence || jump <= self.config.implausible_jump_secs {
            return candidate;
        }

        // The override for `next` obeys the same forward progress rule as the sentence rung
        let raw = match direction {
            Direction::Next => first_cue_starting_after(ctx.cues, current + self.config.min_forward_progress_secs),
            _ => last_cue_ending_before(ctx.cues, current - self.config.time_epsilon_secs),
        };

        match raw {
            Some(cue) => {
                debug!(
                    "Sentence jump of {:.1}s is implausible, using raw cue at {:.3}s",
                    jump, cue.start_time
                );
                Candidate::new(cue.start_time, Some(cue.text.as_str()), NavigationSource::RawCue)
            }
            None => candidate,
        }
    }

    fn fixed_step(&self, direction: Direction, current: f64) -> Candidate {
        debug!("No cue data for {} at {:.3}s, using fixed step", direction, current);
        let step = self.config.fixed_step_secs;
        let time = match direction {
            Direction::Next => current + step,
            Direction::Previous | Direction::Replay => current - step,
        };
        Candidate::new(time, None, NavigationSource::FixedStep)
    }
}

/// Clamp into `[0, duration]`, ignoring an unknown duration
pub fn clamp_to_duration(time: f64, duration: f64) -> f64 {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
    if duration.is_finite() && duration > 0.0 {
        time.min(duration)
    } else {
        time
    }
}

/// Index of the sentence containing `time`; the later one wins on a shared boundary
fn containing_index(sentences: &[SentenceGroup], time: f64) -> Option<usize> {
    let candidates = sentences.partition_point(|s| s.start() <= time);
    let index = candidates.checked_sub(1)?;
    sentences[index].contains(time).then_some(index)
}

fn first_cue_starting_after(cues: &[Cue], time: f64) -> Option<&Cue> {
    cues.iter().find(|c| c.start_time > time)
}

fn last_cue_ending_before(cues: &[Cue], time: f64) -> Option<&Cue> {
    cues.iter().rev().find(|c| c.end_time < time)
}
