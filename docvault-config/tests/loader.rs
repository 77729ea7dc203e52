use std::io::Write;

use docvault_config::{ConfigLoadError, ConfigLoader, ObjectBackend};

#[test]
fn loads_toml_file_and_records_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [auth]
        jwt_secret = "file-secret"

        [object_store]
        backend = "memory"
        "#
    )
    .unwrap();

    let load = ConfigLoader::new()
        .without_env_file()
        .with_config_path(file.path())
        .load()
        .expect("config loads");

    assert_eq!(
        load.config.metadata.config_file.as_deref(),
        Some(file.path())
    );
    assert!(!load.config.metadata.env_file_loaded);
    if std::env::var_os("OBJECT_STORE_BACKEND").is_none() {
        assert_eq!(load.config.object_store.backend, ObjectBackend::Memory);
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::new()
        .without_env_file()
        .with_config_path(dir.path().join("absent.toml"))
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigLoadError::ConfigFileIo { .. }));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[database\nurl = ").unwrap();

    let err = ConfigLoader::new()
        .without_env_file()
        .with_config_path(file.path())
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigLoadError::ConfigFileParse { .. }));
}
