/*!
 * Configuration loading and validation tests.
 */

use lexisub::adapters::AdapterBackend;
use lexisub::app_config::{Config, LevelPolicyConfig};
use lexisub::vocabulary::CefrLevel;

#[test]
fn test_config_missingFile_shouldError() {
    assert!(Config::from_file("/nonexistent/conf.json").is_err());
}

#[test]
fn test_config_fullJson_shouldParseEverySection() {
    let json = r#"{
        "language": "es",
        "target_level": "B1",
        "user_id": "learner-7",
        "filtering": {
            "min_word_len": 2,
            "max_word_len": 30,
            "segment_concurrency": 4,
            "level_policy": "ignore_below_target",
            "translate_missing": true,
            "translation_language": "en"
        },
        "cache": {"word_ttl_secs": 60, "level_ttl_secs": 240},
        "adapters": {"backend": "sqlite"},
        "tasks": {"max_concurrent_jobs": 2},
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.language, "es");
    assert_eq!(config.target_level, CefrLevel::B1);
    assert_eq!(config.user_id, "learner-7");
    assert_eq!(config.filtering.level_policy, LevelPolicyConfig::IgnoreBelowTarget);
    assert!(config.filtering.translate_missing);
    assert_eq!(config.cache.word_ttl_secs, 60);
    assert_eq!(config.adapters.backend, AdapterBackend::Sqlite);
    assert_eq!(config.tasks.max_concurrent_jobs, 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_defaultTtls_shouldKeepFourToOneRatio() {
    let config = Config::default();
    assert_eq!(config.cache.level_ttl_secs, 4 * config.cache.word_ttl_secs);
}

#[test]
fn test_config_unsupportedStopwordLanguage_shouldStillValidate() {
    // Finnish has no bundled stopword table but is a valid language code
    let config = Config {
        language: "fi".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
}
