/*!
 * Tests for configuration loading and validation
 */

use std::io::Write;
use subloop::app_config::{Config, LogLevel};
use tempfile::NamedTempFile;

/// Test that defaults carry the tuned thresholds
#[test]
fn test_default_config_shouldUseTunedThresholds() {
    let config = Config::default();

    assert_eq!(config.grouping.max_gap_secs, 0.4);
    assert_eq!(config.grouping.min_group_secs, 0.8);
    assert_eq!(config.segmentation.sentence_gap_secs, 1.5);
    assert_eq!(config.segmentation.max_sentence_secs, 12.0);
    assert_eq!(config.navigation.time_epsilon_secs, 0.01);
    assert_eq!(config.navigation.min_forward_progress_secs, 0.5);
    assert_eq!(config.navigation.implausible_jump_secs, 20.0);
    assert_eq!(config.navigation.fixed_step_secs, 5.0);
    assert_eq!(config.looping.min_loop_secs, 0.1);
    assert_eq!(config.looping.quick_loop_radius_secs, 5.0);
    assert!(config.session.auto_resume);
    assert_eq!(config.session.save_interval_secs, 10);
    assert_eq!(config.session.ttl_secs, 604_800);
    assert_eq!(config.session.key_prefix, "enhanced-controls-state-");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test that a partial file keeps defaults for missing sections
#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "looping": {{ "min_loop_secs": 0.25 }}, "session": {{ "auto_resume": false }}, "log_level": "debug" }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.looping.min_loop_secs, 0.25);
    assert_eq!(config.looping.quick_loop_radius_secs, 5.0);
    assert!(!config.session.auto_resume);
    assert_eq!(config.session.save_interval_secs, 10);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.navigation.minimum_step_secs, 1.0);
}

/// Test that a saved config loads back unchanged
#[test]
fn test_save_to_file_thenLoad_shouldPreserveValues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controls.json");

    let mut config = Config::default();
    config.navigation.implausible_jump_secs = 30.0;
    config.session.key_prefix = "controls-".to_string();
    config.log_level = LogLevel::Trace;
    config.save_to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.navigation, config.navigation);
    assert_eq!(loaded.session, config.session);
    assert_eq!(loaded.log_level, LogLevel::Trace);
}

/// Test that invalid thresholds are rejected at load time
#[test]
fn test_from_file_withNegativeThreshold_shouldFail() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "segmentation": {{ "sentence_gap_secs": -1.0 }} }}"#).unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("sentence_gap_secs"));
}

#[test]
fn test_validate_withZeroIntervalOrEmptyPrefix_shouldFail() {
    let mut config = Config::default();
    config.session.save_interval_secs = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.session.key_prefix.clear();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.looping.min_loop_secs = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_from_file_withMalformedJson_shouldFail() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    assert!(Config::from_file(file.path()).is_err());
    assert!(Config::from_file("/nonexistent/controls.json").is_err());
}

#[test]
fn test_log_level_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
