use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_observe_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("OBSERVE__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_settings_should_initialize_with_hardcoded_values() {
    let settings = Settings::default();

    assert_eq!(settings.watch.event_queue_size, 1024);
    assert_eq!(settings.formats.instant_pattern, "%d%m%Y %H:%M:%S%.3f");
    assert!(!settings.views.lazy_elements);
    assert!(settings.monitoring.metrics_enabled);
    assert!(settings.validate().is_ok());
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_observe_env_vars();
    with_vars(
        vec![
            ("OBSERVE__WATCH__EVENT_QUEUE_SIZE", Some("64")),
            ("OBSERVE__VIEWS__LAZY_ELEMENTS", Some("true")),
        ],
        || {
            let settings = Settings::new().unwrap();

            assert_eq!(settings.watch.event_queue_size, 64);
            assert!(settings.views.lazy_elements);
        },
    );
}

#[test]
#[serial]
fn new_should_load_file_from_config_path() {
    cleanup_all_observe_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("observe.toml");
    std::fs::write(
        &config_path,
        r#"
        [monitoring]
        metrics_enabled = false
        "#,
    )
    .unwrap();

    with_vars(
        vec![("CONFIG_PATH", Some(config_path.to_str().unwrap()))],
        || {
            let settings = Settings::new().unwrap();
            assert!(!settings.monitoring.metrics_enabled);
            assert_eq!(settings.watch.event_queue_size, 1024);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_observe_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("override.toml");
    std::fs::write(
        &config_path,
        r#"
        [watch]
        event_queue_size = 8

        [formats]
        instant_pattern = "%Y-%m-%d %H:%M:%S"
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let settings = Settings::default()
            .with_override_config(config_path.to_str().unwrap())
            .unwrap();

        assert_eq!(settings.watch.event_queue_size, 8);
        assert_eq!(settings.formats.instant_pattern, "%Y-%m-%d %H:%M:%S");
        assert!(!settings.views.lazy_elements);
    });
}

#[test]
#[serial]
fn environment_should_win_over_override_file() {
    cleanup_all_observe_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("override.toml");
    std::fs::write(&config_path, "[watch]\nevent_queue_size = 8\n").unwrap();

    with_vars(
        vec![("OBSERVE__WATCH__EVENT_QUEUE_SIZE", Some("16"))],
        || {
            let settings = Settings::default()
                .with_override_config(config_path.to_str().unwrap())
                .unwrap();
            assert_eq!(settings.watch.event_queue_size, 16);
        },
    );
}

#[test]
#[serial]
fn validate_should_reject_zero_queue_size() {
    let mut settings = Settings::default();
    settings.watch.event_queue_size = 0;

    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("event_queue_size"));
}

#[test]
#[serial]
fn validate_should_reject_blank_instant_pattern() {
    let mut settings = Settings::default();
    settings.formats.instant_pattern = "  ".to_string();

    assert!(settings.validate().is_err());
}
