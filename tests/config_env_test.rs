use std::env;
use tablesync::Settings;
use tablesync::config::StorageBackend;
use tempfile::TempDir;

#[test]
fn test_env_override_with_nested_keys() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Settings::init_config_file(temp_dir.path(), false).unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("TABLESYNC_WATCHER__DEBOUNCE_MS", "1200");
        env::set_var("TABLESYNC_STORAGE__BACKEND", "memory");
        env::set_var("TABLESYNC_SYNC__COERCE_VALUES", "true");
        env::set_var("TABLESYNC_DATA_DIR", "incoming");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("TABLESYNC_WATCHER__DEBOUNCE_MS");
        env::remove_var("TABLESYNC_STORAGE__BACKEND");
        env::remove_var("TABLESYNC_SYNC__COERCE_VALUES");
        env::remove_var("TABLESYNC_DATA_DIR");
    }

    assert_eq!(settings.watcher.debounce_ms, 1200);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    assert!(settings.sync.coerce_values);
    assert_eq!(settings.data_dir(), temp_dir.path().join("incoming"));
    // Untouched values come from the file
    assert_eq!(settings.watcher.tick_ms, 100);
}
