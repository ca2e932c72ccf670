use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the tunable thresholds of grouping, navigation, loops and
/// session persistence, including loading, validating and saving them.
/// All thresholds are heuristics measured on real caption tracks, not physical constants.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Auto-generated cue collapsing
    #[serde(default)]
    pub grouping: GroupingConfig,

    /// Sentence boundary detection
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Navigation fallback ladder
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Marker loops and quick loops
    #[serde(default)]
    pub looping: LoopConfig,

    /// Session snapshot persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for collapsing auto-generated cues into plateaus
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroupingConfig {
    /// Gap after which a new group starts even with identical text
    #[serde(default = "default_max_gap_secs")]
    pub max_gap_secs: f64,

    /// Groups shorter than this are merged into their predecessor
    #[serde(default = "default_min_group_secs")]
    pub min_group_secs: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_gap_secs: default_max_gap_secs(),
            min_group_secs: default_min_group_secs(),
        }
    }
}

/// Settings for sentence boundary detection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Silence between cues that always closes a sentence
    #[serde(default = "default_sentence_gap_secs")]
    pub sentence_gap_secs: f64,

    /// Span after which a sentence without punctuation is closed
    #[serde(default = "default_max_sentence_secs")]
    pub max_sentence_secs: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            sentence_gap_secs: default_sentence_gap_secs(),
            max_sentence_secs: default_max_sentence_secs(),
        }
    }
}

/// Settings for the navigation fallback ladder
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NavigationConfig {
    /// Tolerance used when comparing group bounds with the cursor
    #[serde(default = "default_time_epsilon_secs")]
    pub time_epsilon_secs: f64,

    /// A `next` target closer than this is considered a stall
    #[serde(default = "default_min_forward_progress_secs")]
    pub min_forward_progress_secs: f64,

    /// Sentence jumps longer than this are recomputed from raw cues
    #[serde(default = "default_implausible_jump_secs")]
    pub implausible_jump_secs: f64,

    /// Flat step used when no unit satisfies the forward progress rule
    #[serde(default = "default_minimum_step_secs")]
    pub minimum_step_secs: f64,

    /// Step used when no cue data is available
    #[serde(default = "default_fixed_step_secs")]
    pub fixed_step_secs: f64,

    /// Window replayed when no unit precedes the cursor
    #[serde(default = "default_replay_window_secs")]
    pub replay_window_secs: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            time_epsilon_secs: default_time_epsilon_secs(),
            min_forward_progress_secs: default_min_forward_progress_secs(),
            implausible_jump_secs: default_implausible_jump_secs(),
            minimum_step_secs: default_minimum_step_secs(),
            fixed_step_secs: default_fixed_step_secs(),
            replay_window_secs: default_replay_window_secs(),
        }
    }
}

/// Settings for marker loops
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoopConfig {
    /// Shortest loop the player is asked to enforce
    #[serde(default = "default_min_loop_secs")]
    pub min_loop_secs: f64,

    /// Half width of the quick loop window around the cursor
    #[serde(default = "default_quick_loop_radius_secs")]
    pub quick_loop_radius_secs: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            min_loop_secs: default_min_loop_secs(),
            quick_loop_radius_secs: default_quick_loop_radius_secs(),
        }
    }
}

/// Settings for the session snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Whether saved speed and vocabulary mode are restored on load
    #[serde(default = "default_true")]
    pub auto_resume: bool,

    /// Period of the autosave timer
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,

    /// Time to live of a snapshot in the cache
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Cache key prefix, the video id is appended
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_resume: default_true(),
            save_interval_secs: default_save_interval_secs(),
            ttl_secs: default_ttl_secs(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_max_gap_secs() -> f64 {
    0.4
}

fn default_min_group_secs() -> f64 {
    0.8
}

fn default_sentence_gap_secs() -> f64 {
    1.5
}

fn default_max_sentence_secs() -> f64 {
    12.0
}

fn default_time_epsilon_secs() -> f64 {
    0.01
}

fn default_min_forward_progress_secs() -> f64 {
    0.5
}

fn default_implausible_jump_secs() -> f64 {
    20.0
}

fn default_minimum_step_secs() -> f64 {
    1.0
}

fn default_fixed_step_secs() -> f64 {
    5.0
}

fn default_replay_window_secs() -> f64 {
    5.0
}

fn default_min_loop_secs() -> f64 {
    0.1
}

fn default_quick_loop_radius_secs() -> f64 {
    5.0
}

fn default_true() -> bool {
    true
}

fn default_save_interval_secs() -> u64 {
    10
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60 // one week
}

fn default_key_prefix() -> String {
    "enhanced-controls-state-".to_string()
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("grouping.max_gap_secs", self.grouping.max_gap_secs),
            ("grouping.min_group_secs", self.grouping.min_group_secs),
            ("segmentation.sentence_gap_secs", self.segmentation.sentence_gap_secs),
            ("segmentation.max_sentence_secs", self.segmentation.max_sentence_secs),
            ("navigation.time_epsilon_secs", self.navigation.time_epsilon_secs),
            ("navigation.min_forward_progress_secs", self.navigation.min_forward_progress_secs),
            ("navigation.implausible_jump_secs", self.navigation.implausible_jump_secs),
            ("navigation.minimum_step_secs", self.navigation.minimum_step_secs),
            ("navigation.fixed_step_secs", self.navigation.fixed_step_secs),
            ("navigation.replay_window_secs", self.navigation.replay_window_secs),
            ("looping.min_loop_secs", self.looping.min_loop_secs),
            ("looping.quick_loop_radius_secs", self.looping.quick_loop_radius_secs),
        ];

        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 {
                return Err(anyhow!("{} must be a positive number, got {}", name, value));
            }
        }

        if self.session.save_interval_secs == 0 {
            return Err(anyhow!("session.save_interval_secs must be at least 1"));
        }

        if self.session.key_prefix.is_empty() {
            return Err(anyhow!("session.key_prefix must not be empty"));
        }

        Ok(())
    }
}
