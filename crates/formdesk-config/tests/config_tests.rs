use formdesk_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn default_config_sorts_newest_first() {
    let cfg = Config::default();

    assert_eq!(cfg.default_sort, "created_at");
    assert_eq!(cfg.default_sort_order, "desc");
    assert!(cfg.ui_color_enabled);
    assert!(cfg.resolve_data_dir().ends_with("formdesk"));
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    assert_eq!(manager.load().expect("defaults"), Config::default());

    let cfg = Config {
        data_dir: Some(dir.path().join("data")),
        default_sort: "name".into(),
        last_template_id: Some(4),
        ..Config::default()
    };

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert_eq!(loaded.resolve_data_dir(), dir.path().join("data"));
    assert!(manager.config_path().ends_with("config/config.json"));
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let cfg: Config = serde_json::from_str(r#"{"ui_color_enabled": false}"#).expect("parse");
    assert!(!cfg.ui_color_enabled);
    assert_eq!(cfg.default_sort, "created_at");
    assert!(cfg.log_filter.is_none());
}

#[test]
fn invalid_sort_is_rejected_on_save() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));
    let cfg = Config {
        default_sort: "salary".into(),
        ..Config::default()
    };
    assert!(matches!(
        manager.save(&cfg),
        Err(ConfigError::Invalid { ref key, .. }) if key == "default_sort"
    ));
    assert!(!manager.config_path().exists());
}
