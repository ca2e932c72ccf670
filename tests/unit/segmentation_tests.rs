/*!
 * Tests for sentence segmentation and auto-generated cue collapsing
 */

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use subloop::app_config::{GroupingConfig, SegmentationConfig};
use subloop::segmentation::{sentence, CueGroupCollapser, SentenceSegmenter};
use subloop::subtitle_track::Cue;

use crate::common::{cues, dialogue_cues, hello_world_cues};

const WORDS: &[&str] = &["we", "went", "to", "the", "market", "and", "bought", "bread", "then", "left"];
const ENDINGS: &[&str] = &["", "", "", ",", ".", "?", "!"];

/// Random well-formed track: distinct starts, occasional overlaps and gaps
fn random_track(rng: &mut StdRng, count: usize) -> Vec<Cue> {
    let mut start = rng.random_range(0.0..2.0);
    (0..count)
        .map(|i| {
            let length = rng.random_range(0.3..4.0);
            let words = rng.random_range(1..5);
            let mut text = (0..words)
                .map(|_| WORDS[rng.random_range(0..WORDS.len())])
                .collect::<Vec<_>>()
                .join(" ");
            text.push_str(ENDINGS[rng.random_range(0..ENDINGS.len())]);

            let cue = Cue::new(format!("{}", i), start, start + length, text);
            // Next start may overlap the current cue or leave a gap
            start += rng.random_range(0.05..length + 2.5);
            cue
        })
        .collect()
}

#[test]
fn test_segmenter_withDialogue_shouldSplitOnPunctuationAndGaps() {
    let segmenter = SentenceSegmenter::with_cues(SegmentationConfig::default(), dialogue_cues());
    let sentences = segmenter.available_sentences();

    let texts: Vec<&str> = sentences.iter().map(|s| s.combined_text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Good morning, how did you sleep?",
            "Not great.",
            "The neighbours were playing music all night.",
            "Did you complain?",
            "I tried to.",
        ]
    );
    assert_eq!(sentences[2].start(), 6.2);
    assert_eq!(sentences[2].end(), 10.0);
    assert_eq!(sentences[2].start_index, 3);
}

#[test]
fn test_sentence_at_time_withGapAndBoundary_shouldFollowContainment() {
    let segmenter = SentenceSegmenter::with_cues(SegmentationConfig::default(), hello_world_cues());

    assert_eq!(segmenter.sentence_at_time(1.0).unwrap().combined_text, "Hello.");
    assert_eq!(segmenter.sentence_at_time(3.0).unwrap().combined_text, "Hello.");
    assert!(segmenter.sentence_at_time(3.5).is_none());
    assert_eq!(segmenter.sentence_at_time(4.0).unwrap().combined_text, "World.");
    assert!(segmenter.sentence_at_time(7.5).is_none());
    assert!(segmenter.sentence_at_time(f64::NAN).is_none());

    let (index, next) = segmenter.next_sentence_after(3.5).unwrap();
    assert_eq!(index, 1);
    assert_eq!(next.start(), 4.0);
    let (index, _) = segmenter.previous_sentence_before(3.5).unwrap();
    assert_eq!(index, 0);
}

#[test]
fn test_segmenter_withSharedBoundary_shouldPreferLaterSentence() {
    let segmenter = SentenceSegmenter::with_cues(
        SegmentationConfig::default(),
        cues(&[(0.0, 2.0, "One."), (2.0, 4.0, "Two.")]),
    );

    assert_eq!(segmenter.sentence_index_at_time(2.0), Some(1));
}

#[test]
fn test_segmenter_withRunOnSpeech_shouldCapSentenceSpan() {
    let run_on: Vec<(f64, f64, &str)> = (0..10)
        .map(|i| (i as f64 * 2.0, i as f64 * 2.0 + 2.0, "and so on"))
        .collect();
    let segmenter = SentenceSegmenter::with_cues(SegmentationConfig::default(), cues(&run_on));

    let sentences = segmenter.available_sentences();
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0].end(), 12.0);
    assert_eq!(sentences[1].start(), 12.0);
}

#[test]
fn test_set_cues_withSameCues_shouldNotRecompute() {
    let mut segmenter = SentenceSegmenter::new(SegmentationConfig::default());
    assert!(segmenter.is_empty());

    assert!(segmenter.set_cues(hello_world_cues()));
    assert!(!segmenter.set_cues(hello_world_cues()));
    assert!(segmenter.set_cues(Vec::new()));
    assert!(segmenter.is_empty());
}

/// Every cue lands in exactly one sentence and sentences never overlap
#[test]
fn test_segment_withRandomTracks_shouldPartitionCues() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let config = SegmentationConfig::default();

    for _ in 0..200 {
        let count = rng.random_range(0..40);
        let track = random_track(&mut rng, count);
        let sentences = sentence::segment(&track, &config);

        let flattened: Vec<&Cue> = sentences.iter().flat_map(|s| s.segments.iter()).collect();
        assert_eq!(flattened.len(), track.len());
        for (cue, original) in flattened.iter().zip(track.iter()) {
            assert_eq!(&cue.id, &original.id);
        }

        let mut expected_index = 0;
        for pair in sentences.windows(2) {
            assert!(pair[0].end() <= pair[1].start(), "sentences overlap");
        }
        for s in &sentences {
            assert_eq!(s.start_index, expected_index);
            expected_index += s.segments.len();
            assert!(!s.segments.is_empty());
        }
    }
}

/// A time strictly inside a sentence resolves to that sentence
#[test]
fn test_sentence_at_time_withRandomTracks_shouldContainQueriedTime() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..100 {
        let count = rng.random_range(1..30);
        let segmenter = SentenceSegmenter::with_cues(SegmentationConfig::default(), random_track(&mut rng, count));

        for (index, s) in segmenter.available_sentences().iter().enumerate() {
            let midpoint = s.start() + (s.end() - s.start()) * 0.5;
            let found = segmenter.sentence_at_time(midpoint).unwrap();
            assert!(found.contains(midpoint));
            // Only a shared boundary may hand the midpoint to a later sentence
            if midpoint < s.end() {
                assert_eq!(segmenter.sentence_index_at_time(midpoint), Some(index));
            }
        }

        for _ in 0..20 {
            let t = rng.random_range(0.0..120.0);
            if let Some(found) = segmenter.sentence_at_time(t) {
                assert!(found.start() <= t && t <= found.end());
            }
        }
    }
}

#[test]
fn test_collapse_withRollingCaptions_shouldProduceOnePlateau() {
    let collapser = CueGroupCollapser::new(GroupingConfig::default());
    let groups = collapser.collapse(&cues(&[(0.0, 2.0, "A"), (2.0, 4.0, "A B"), (4.0, 6.0, "A B C")]));

    assert_eq!(groups.len(), 1);
    assert_eq!((groups[0].start, groups[0].end), (0.0, 6.0));
    assert_eq!(groups[0].text, "A B C");
}

#[test]
fn test_collapse_withWhitespaceVariants_shouldTreatTextAsEqual() {
    let collapser = CueGroupCollapser::new(GroupingConfig::default());
    let groups = collapser.collapse(&cues(&[
        (0.0, 1.0, "hello   world"),
        (1.0, 2.0, " hello world "),
        (2.1, 3.0, "hello world"),
    ]));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].text, "hello world");
    assert_eq!(groups[0].end, 3.0);
}

#[test]
fn test_collapse_withEmptyAndInvalidCues_shouldSkipThem() {
    let collapser = CueGroupCollapser::new(GroupingConfig::default());
    let mut input = cues(&[(0.0, 2.0, "first line"), (2.0, 3.0, "   "), (3.0, 5.0, "second line")]);
    input.push(Cue::new("bad", f64::NAN, 4.0, "ghost"));

    let groups = collapser.collapse(&input);
    let texts: Vec<&str> = groups.iter().map(|g| g.text.as_str()).collect();
    assert_eq!(texts, vec!["first line", "second line"]);
}

/// Collapsing ignores input order and keeps groups inside the cue span
#[test]
fn test_collapse_withShuffledRandomTracks_shouldBeDeterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let collapser = CueGroupCollapser::new(GroupingConfig::default());

    for _ in 0..100 {
        let count = rng.random_range(1..25);
        let track = random_track(&mut rng, count);
        let groups = collapser.collapse(&track);

        let mut shuffled = track.clone();
        shuffled.shuffle(&mut rng);
        assert_eq!(collapser.collapse(&shuffled), groups);
        assert_eq!(collapser.collapse(&track), groups);

        let first_start = track.first().map(|c| c.start_time).unwrap();
        let last_end = track.iter().map(|c| c.end_time).fold(f64::MIN, f64::max);
        assert!(!groups.is_empty());
        for window in groups.windows(2) {
            assert!(window[0].start <= window[1].start);
        }
        for group in &groups {
            assert!(group.start >= first_start && group.end <= last_end);
            assert!(group.end >= group.start);
        }
    }
}
