/*!
 * Sentence segmentation over caption cues.
 *
 * Cues are merged into sentences that never overlap each other. A sentence
 * closes after terminal punctuation, after a long enough silence, or when it
 * grows past the configured span, but only where the next cue starts at or
 * after everything collected so far has ended.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_config::SegmentationConfig;
use crate::subtitle_track::{normalize_text, sort_cues, Cue};

// @const: Sentence-final punctuation, optionally followed by closing quotes or brackets
static TERMINAL_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?…。！？]["'”’)\]»]*$"#).expect("terminal punctuation regex is valid")
});

/// One navigable sentence made of contiguous cues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceGroup {
    /// Index of the first cue in the sorted cue list
    pub start_index: usize,

    /// Cue texts joined with single spaces
    pub combined_text: String,

    /// Member cues, time ordered
    pub segments: Vec<Cue>,
}

impl SentenceGroup {
    /// Start of the first segment
    pub fn start(&self) -> f64 {
        self.segments.first().map_or(0.0, |cue| cue.start_time)
    }

    /// Latest end among the segments
    pub fn end(&self) -> f64 {
        self.segments
            .iter()
            .map(|cue| cue.end_time)
            .fold(self.start(), f64::max)
    }

    /// Whether `time` lies inside the sentence, bounds included
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start() && time <= self.end()
    }

    fn from_cues(start_index: usize, segments: Vec<Cue>) -> Self {
        let combined_text = segments
            .iter()
            .map(|cue| normalize_text(&cue.text))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            start_index,
            combined_text,
            segments,
        }
    }
}

/// Groups the current track's cues into sentences and answers time queries
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    config: SegmentationConfig,
    cues: Vec<Cue>,
    sentences: Vec<SentenceGroup>,
}

impl SentenceSegmenter {
    /// Create an empty segmenter
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            config,
            cues: Vec::new(),
            sentences: Vec::new(),
        }
    }

    /// Create a segmenter over `cues`
    pub fn with_cues(config: SegmentationConfig, cues: Vec<Cue>) -> Self {
        let mut segmenter = Self::new(config);
        segmenter.set_cues(cues);
        segmenter
    }

    /// Replace the cue list. Returns false when the list is unchanged and
    /// nothing was recomputed.
    pub fn set_cues(&mut self, cues: Vec<Cue>) -> bool {
        if cues == self.cues {
            return false;
        }

        self.sentences = segment(&cues, &self.config);
        debug!(
            "Segmented {} cues into {} sentences",
            cues.len(),
            self.sentences.len()
        );
        self.cues = cues;
        true
    }

    /// All sentences of the current track, in time order
    pub fn available_sentences(&self) -> &[SentenceGroup] {
        &self.sentences
    }

    /// Whether there is anything to navigate
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Index of the sentence containing `time`, or `None` in a gap.
    ///
    /// On a shared boundary the later sentence wins.
    pub fn sentence_index_at_time(&self, time: f64) -> Option<usize> {
        if !time.is_finite() {
            return None;
        }

        let candidates = self.sentences.partition_point(|s| s.start() <= time);
        if candidates == 0 {
            return None;
        }

        let index = candidates - 1;
        self.sentences[index].contains(time).then_some(index)
    }

    /// Sentence containing `time`, or `None` in a gap
    pub fn sentence_at_time(&self, time: f64) -> Option<&SentenceGroup> {
        self.sentence_index_at_time(time).map(|i| &self.sentences[i])
    }

    /// First sentence starting strictly after `time`
    pub fn next_sentence_after(&self, time: f64) -> Option<(usize, &SentenceGroup)> {
        let index = self.sentences.partition_point(|s| s.start() <= time);
        self.sentences.get(index).map(|s| (index, s))
    }

    /// Last sentence ending strictly before `time`
    pub fn previous_sentence_before(&self, time: f64) -> Option<(usize, &SentenceGroup)> {
        self.sentences
            .iter()
            .enumerate()
            .rev()
            .find(|(_, s)| s.end() < time)
    }
}

/// Deterministic segmentation of `cues` into non-overlapping sentences
pub fn segment(cues: &[Cue], config: &SegmentationConfig) -> Vec<SentenceGroup> {
    let mut sorted = cues.to_vec();
    sort_cues(&mut sorted);

    let mut sentences = Vec::new();
    let mut current: Vec<Cue> = Vec::new();
    let mut current_start_index = 0;
    let mut current_start = 0.0;
    let mut current_end = f64::NEG_INFINITY;

    for (index, cue) in sorted.into_iter().enumerate() {
        if let Some(last) = current.last() {
            // Two sentences never share a start, even after zero-length cues
            let can_split = cue.start_time >= current_end && cue.start_time > current_start;
            let gap = cue.start_time - current_end;
            let ends_sentence = TERMINAL_PUNCTUATION.is_match(last.text.trim_end());
            let too_long = current_end - current_start >= config.max_sentence_secs;

            if can_split && (ends_sentence || gap > config.sentence_gap_secs || too_long) {
                sentences.push(SentenceGroup::from_cues(
                    current_start_index,
                    std::mem::take(&mut current),
                ));
            }
        }

        if current.is_empty() {
            current_start_index = index;
            current_start = cue.start_time;
            current_end = cue.end_time;
        } else {
            current_end = current_end.max(cue.end_time);
        }
        current.push(cue);
    }

    if !current.is_empty() {
        sentences.push(SentenceGroup::from_cues(current_start_index, current));
    }

    sentences
}
