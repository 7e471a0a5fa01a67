use assert_matches::assert_matches;

use reads_to_fastq::config::{Config, ConfigLoader, default_scratch};
use reads_to_fastq::error::ReadsError;

#[test]
fn load_config_from_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("reads-to-fastq.json");
    std::fs::write(
        &path,
        r#"{"workspace-url": "https://ws.example/services/ws", "scratch": "/tmp/reads"}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.workspace_url, "https://ws.example/services/ws");
    assert_eq!(resolved.blob_store_url, None);
    assert_eq!(resolved.scratch.as_str(), "/tmp/reads");
}

#[test]
fn scratch_defaults_to_cache_dir() {
    let config = Config {
        workspace_url: "https://ws.example/services/ws".to_string(),
        shock_url: Some("  ".to_string()),
        scratch: None,
    };
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.blob_store_url, None);
    assert_eq!(resolved.scratch, default_scratch().unwrap());
    assert!(resolved.scratch.ends_with("reads-to-fastq/scratch"));
}

#[test]
fn workspace_url_is_required() {
    let err = serde_json::from_str::<Config>(r#"{"shock-url": "https://shock.example"}"#);
    assert!(err.is_err());

    let config = Config {
        workspace_url: " ".to_string(),
        shock_url: None,
        scratch: None,
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(ReadsError::ConfigParse(_))
    );
}

#[test]
fn unreadable_and_invalid_files() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("nope.json");
    assert_matches!(
        ConfigLoader::resolve(missing.to_str()),
        Err(ReadsError::ConfigRead(_))
    );

    let broken = temp.path().join("broken.json");
    std::fs::write(&broken, "{workspace-url").unwrap();
    assert_matches!(
        ConfigLoader::resolve(broken.to_str()),
        Err(ReadsError::ConfigParse(_))
    );
}
