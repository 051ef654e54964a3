//! Export pipeline against an in-memory runtime

use dockerenv::export::{
    run_export, ContainerFilter, ExportFormat, ExportOptions, MemoryStore,
};
use dockerenv::inspector::MemoryInspector;
use dockerenv::utils::{ContainerDetails, ContainerSnapshot};
use dockerenv::{Config, DockerenvError};
use std::collections::BTreeMap;
use std::path::Path;

const WEB_ID: &str = "aaaaaaaa11112222333344445555666677778888";
const DB_ID: &str = "bbbbbbbb11112222333344445555666677778888";

fn container(id: &str, name: &str, env: &[&str]) -> ContainerDetails {
    ContainerDetails {
        id: id.to_string(),
        name: name.to_string(),
        image: format!("{}:1.0", name),
        command: vec!["run".to_string(), name.to_string()],
        env: env.iter().map(|s| s.to_string()).collect(),
        labels: BTreeMap::from([("app".to_string(), name.to_string())]),
    }
}

fn runtime() -> MemoryInspector {
    MemoryInspector::new()
        .with_container(container(WEB_ID, "web", &["PORT=8080", "HOST=0.0.0.0"]))
        .with_container(container(DB_ID, "db", &["PGDATA=/var/lib/pg", "BROKEN"]))
}

fn config_for(dir: &Path) -> Config {
    Config::default().with_output_dir(Some(dir.to_path_buf()))
}

fn options(format: ExportFormat) -> ExportOptions {
    ExportOptions {
        format,
        path_prefix: "/".to_string(),
        ..Default::default()
    }
}

#[test]
fn yaml_nests_every_container_under_its_short_id() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_export(&runtime(), &MemoryStore::new(), &config_for(dir.path()), &options(ExportFormat::Yaml))
        .unwrap();

    assert_eq!(summary.containers, 2);
    assert_eq!(summary.written.len(), 1);

    let text = std::fs::read_to_string(dir.path().join("output.yaml")).unwrap();
    let parsed: BTreeMap<String, BTreeMap<String, String>> = serde_yaml::from_str(&text).unwrap();
    assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["aaaaaaaa", "bbbbbbbb"]);
    assert_eq!(parsed["aaaaaaaa"]["PORT"], "8080");
    assert_eq!(parsed["bbbbbbbb"]["PGDATA"], "/var/lib/pg");
    assert!(!parsed["bbbbbbbb"].contains_key("BROKEN"));
}

#[test]
fn env_writes_one_sorted_file_per_container() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(ExportFormat::Env);
    opts.path_prefix = "/prod".to_string();

    let summary = run_export(&runtime(), &MemoryStore::new(), &config_for(dir.path()), &opts).unwrap();
    assert_eq!(summary.written.len(), 2);

    let web = std::fs::read_to_string(dir.path().join("prod/containers/aaaaaaaa/container.env")).unwrap();
    assert_eq!(web, "HOST=\"0.0.0.0\"\nPORT=\"8080\"\n");

    // 每个容器单独渲染，不串到下一个文件里
    let db = std::fs::read_to_string(dir.path().join("prod/containers/bbbbbbbb/container.env")).unwrap();
    assert_eq!(db, "PGDATA=\"/var/lib/pg\"\n");
}

#[test]
fn env_with_snapshot_writes_metadata_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(ExportFormat::Env);
    opts.snapshot = true;
    opts.filter = ContainerFilter::Only("web".to_string());

    let summary = run_export(&runtime(), &MemoryStore::new(), &config_for(dir.path()), &opts).unwrap();
    assert_eq!(summary.containers, 1);

    let meta = std::fs::read_to_string(dir.path().join("containers/aaaaaaaa/container-meta.yaml")).unwrap();
    let snapshot: ContainerSnapshot = serde_yaml::from_str(&meta).unwrap();
    assert_eq!(snapshot.name, "web");
    assert_eq!(snapshot.image, "web:1.0");
    assert_eq!(snapshot.command, vec!["run", "web"]);
    assert_eq!(snapshot.environment, vec!["PORT=8080", "HOST=0.0.0.0"]);
    assert_eq!(snapshot.labels["app"], "web");

    assert!(!dir.path().join("containers/bbbbbbbb").exists());
}

#[test]
fn s3_uploads_env_and_snapshots_without_leading_slash() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let mut opts = options(ExportFormat::S3);
    opts.path_prefix = "/backups/".to_string();
    opts.snapshot = true;

    let summary = run_export(&runtime(), &store, &config_for(dir.path()), &opts).unwrap();
    assert_eq!(summary.written.len(), 4);
    assert_eq!(
        store.keys(),
        vec![
            "backups/containers/aaaaaaaa/container-meta.yaml",
            "backups/containers/aaaaaaaa/container.env",
            "backups/containers/bbbbbbbb/container-meta.yaml",
            "backups/containers/bbbbbbbb/container.env",
        ]
    );
    assert_eq!(
        store.get("backups/containers/aaaaaaaa/container.env").unwrap(),
        b"HOST=\"0.0.0.0\"\nPORT=\"8080\"\n"
    );

    // 不落本地盘
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn json_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_export(&runtime(), &MemoryStore::new(), &config_for(dir.path()), &options(ExportFormat::Json))
        .unwrap_err();
    assert!(matches!(err, DockerenvError::UnsupportedFormat(f) if f == "json"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn relative_prefix_is_rejected_every_time() {
    let dir = tempfile::tempdir().unwrap();
    for format in [ExportFormat::Env, ExportFormat::Yaml, ExportFormat::S3, ExportFormat::Json] {
        let mut opts = options(format);
        opts.path_prefix = "prod".to_string();
        let err = run_export(&runtime(), &MemoryStore::new(), &config_for(dir.path()), &opts).unwrap_err();
        assert!(matches!(err, DockerenvError::InvalidPrefix(_)), "{}: {}", format, err);
    }
}

#[test]
fn failing_container_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let ins = runtime().with_failing(DB_ID);

    let summary = run_export(&ins, &MemoryStore::new(), &config_for(dir.path()), &options(ExportFormat::Env)).unwrap();
    assert_eq!(summary.containers, 1);
    assert!(dir.path().join("containers/aaaaaaaa/container.env").exists());
    assert!(!dir.path().join("containers/bbbbbbbb").exists());
}

#[test]
fn second_run_needs_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path());

    run_export(&runtime(), &MemoryStore::new(), &cfg, &options(ExportFormat::Yaml)).unwrap();

    let err = run_export(&runtime(), &MemoryStore::new(), &cfg, &options(ExportFormat::Yaml)).unwrap_err();
    assert!(matches!(err, DockerenvError::Write { .. }));

    let mut opts = options(ExportFormat::Yaml);
    opts.overwrite = true;
    run_export(&runtime(), &MemoryStore::new(), &cfg, &opts).unwrap();
}

#[test]
fn unknown_container_filter_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(ExportFormat::Env);
    opts.filter = ContainerFilter::from_arg(Some("cccccccc"));
    let err = run_export(&runtime(), &MemoryStore::new(), &config_for(dir.path()), &opts).unwrap_err();
    assert!(matches!(err, DockerenvError::ContainerNotFound(id) if id == "cccccccc"));
}
