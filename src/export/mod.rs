//! 导出：收集每个容器的环境变量，按格式写到本地或对象存储

pub mod format;
pub mod storage;

pub use format::ExportFormat;
pub use storage::{DryRunStore, LocalWriter, MemoryStore, ObjectStore, S3Store};

use crate::inspector::{environment_map, Inspector};
use crate::utils::{
    short_id, Config, ContainerSnapshot, ContainerSummary, DockerenvError, EnvironmentMap, Result,
};
use std::collections::BTreeMap;

const ALL_CONTAINERS: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContainerFilter {
    #[default]
    All,
    /// Full ID, ID prefix or name.
    Only(String),
}

impl ContainerFilter {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg.map(str::trim) {
            None | Some("") | Some(ALL_CONTAINERS) => ContainerFilter::All,
            Some(id) => ContainerFilter::Only(id.to_string()),
        }
    }

    fn matches(&self, c: &ContainerSummary) -> bool {
        match self {
            ContainerFilter::All => true,
            ContainerFilter::Only(id) => c.id == *id || c.name == *id || c.id.starts_with(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub path_prefix: String,
    pub filter: ContainerFilter,
    pub snapshot: bool,
    pub overwrite: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub containers: usize,
    /// Local paths or object URLs, in write order.
    pub written: Vec<String>,
}

/// Empty means `/`; anything else must start with `/`. Trailing slashes are dropped.
pub fn validate_prefix(prefix: &str) -> Result<String> {
    if prefix.is_empty() {
        return Ok(String::new());
    }
    if !prefix.starts_with('/') {
        return Err(DockerenvError::InvalidPrefix(prefix.to_string()));
    }
    Ok(prefix.trim_end_matches('/').to_string())
}

pub fn env_file_path(prefix: &str, short: &str) -> String {
    format!("{}/containers/{}/container.env", prefix, short)
}

pub fn meta_file_path(prefix: &str, short: &str) -> String {
    format!("{}/containers/{}/container-meta.yaml", prefix, short)
}

pub fn yaml_file_path(prefix: &str) -> String {
    format!("{}/output.yaml", prefix)
}

/// Collected state between the inspect pass and the write pass.
struct Collected {
    /// short id → environment
    values: BTreeMap<String, EnvironmentMap>,
    /// path → YAML snapshot
    meta: BTreeMap<String, String>,
}

/// Where a format's handler sends its output.
struct Sink<'a> {
    store: &'a dyn ObjectStore,
    config: &'a Config,
    prefix: &'a str,
    overwrite: bool,
}

type Handler = fn(&Sink, &Collected) -> Result<Vec<String>>;

pub fn run_export(
    inspector: &dyn Inspector,
    store: &dyn ObjectStore,
    config: &Config,
    opts: &ExportOptions,
) -> Result<ExportSummary> {
    let prefix = validate_prefix(&opts.path_prefix)?;

    // 先选 handler，不支持的格式不会去查询容器
    let handler: Handler = match opts.format {
        ExportFormat::Env => write_env,
        ExportFormat::Yaml => write_yaml,
        ExportFormat::S3 => upload_s3,
        ExportFormat::Ssm => log_ssm,
        ExportFormat::Json => return Err(DockerenvError::UnsupportedFormat(opts.format.to_string())),
    };

    let collected = collect(inspector, &prefix, opts)?;
    let sink = Sink {
        store,
        config,
        prefix: &prefix,
        overwrite: opts.overwrite,
    };

    Ok(ExportSummary {
        containers: collected.values.len(),
        written: handler(&sink, &collected)?,
    })
}

fn local_writer(sink: &Sink) -> Result<LocalWriter> {
    let dir = &sink.config.output_dir;
    if dir.exists() && !dir.is_dir() {
        return Err(DockerenvError::Config(format!(
            "output directory {} is not a directory",
            dir.display()
        )));
    }
    log::info!("Using output directory at {}", dir.display());
    Ok(LocalWriter::new(dir, sink.overwrite))
}

fn write_yaml(sink: &Sink, collected: &Collected) -> Result<Vec<String>> {
    let local = local_writer(sink)?;
    let data = serde_yaml::to_string(&collected.values)?;
    let mut written = vec![local.write(&yaml_file_path(sink.prefix), data.as_bytes())?];
    for (path, meta) in &collected.meta {
        written.push(local.write(path, meta.as_bytes())?);
    }
    Ok(written)
}

fn write_env(sink: &Sink, collected: &Collected) -> Result<Vec<String>> {
    let local = local_writer(sink)?;
    let mut written = Vec::new();
    for (short, values) in &collected.values {
        let txt = format::render_env_file(values);
        written.push(local.write(&env_file_path(sink.prefix, short), txt.as_bytes())?);
    }
    for (path, meta) in &collected.meta {
        written.push(local.write(path, meta.as_bytes())?);
    }
    Ok(written)
}

fn upload_s3(sink: &Sink, collected: &Collected) -> Result<Vec<String>> {
    let mut written = Vec::new();
    for (short, values) in &collected.values {
        let txt = format::render_env_file(values);
        let key = env_file_path(sink.prefix, short);
        written.push(sink.store.put_object(key.trim_start_matches('/'), txt.as_bytes())?);
    }
    for (path, meta) in &collected.meta {
        written.push(sink.store.put_object(path.trim_start_matches('/'), meta.as_bytes())?);
    }
    Ok(written)
}

/// 只打印，不写入
fn log_ssm(sink: &Sink, collected: &Collected) -> Result<Vec<String>> {
    for (short, values) in &collected.values {
        for (key, value) in values {
            log::info!("Saving {}/containers/{}/{} as {}", sink.prefix, short, key, value);
        }
    }
    for path in collected.meta.keys() {
        log::info!("Snapshot {} not saved for ssm", path);
    }
    Ok(Vec::new())
}

fn collect(inspector: &dyn Inspector, prefix: &str, opts: &ExportOptions) -> Result<Collected> {
    let containers = inspector.list_containers()?;
    let mut collected = Collected {
        values: BTreeMap::new(),
        meta: BTreeMap::new(),
    };
    let mut matched = 0;

    for c in containers.iter().filter(|c| opts.filter.matches(c)) {
        matched += 1;
        let details = match inspector.inspect(&c.id) {
            Ok(d) => d,
            Err(e) => {
                log::error!("skipping {}: {}", c.id, e);
                continue;
            }
        };
        let short = short_id(&details.id);

        if opts.snapshot {
            let snapshot = ContainerSnapshot::from(&details);
            log::debug!("{:?}", snapshot);
            let yaml = serde_yaml::to_string(&snapshot)?;
            collected.meta.insert(meta_file_path(prefix, &short), yaml);
        }

        collected.values.insert(short, environment_map(&details.env));
    }

    if let ContainerFilter::Only(id) = &opts.filter {
        if matched == 0 {
            return Err(DockerenvError::ContainerNotFound(id.clone()));
        }
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::MemoryInspector;
    use crate::utils::ContainerDetails;

    fn container(id: &str, name: &str, env: &[&str]) -> ContainerDetails {
        ContainerDetails {
            id: id.to_string(),
            name: name.to_string(),
            image: format!("{}:latest", name),
            env: env.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn prefix_policy() {
        assert_eq!(validate_prefix("").unwrap(), "");
        assert_eq!(validate_prefix("/").unwrap(), "");
        assert_eq!(validate_prefix("/prod/").unwrap(), "/prod");
        assert!(matches!(validate_prefix("prod"), Err(DockerenvError::InvalidPrefix(p)) if p == "prod"));
        // 与调用顺序无关
        assert!(validate_prefix("prod").is_err());
    }

    #[test]
    fn paths_join_cleanly() {
        assert_eq!(env_file_path("", "abcd1234"), "/containers/abcd1234/container.env");
        assert_eq!(meta_file_path("/p", "abcd1234"), "/p/containers/abcd1234/container-meta.yaml");
        assert_eq!(yaml_file_path(""), "/output.yaml");
    }

    #[test]
    fn filter_matches_id_prefix_and_name() {
        let c = ContainerSummary { id: "abcdef0123456789".into(), name: "web".into() };
        assert!(ContainerFilter::from_arg(None).matches(&c));
        assert!(ContainerFilter::from_arg(Some("ALL")).matches(&c));
        assert!(ContainerFilter::from_arg(Some("abcdef")).matches(&c));
        assert!(ContainerFilter::from_arg(Some("web")).matches(&c));
        assert!(!ContainerFilter::from_arg(Some("db")).matches(&c));
    }

    #[test]
    fn collect_skips_failing_containers() {
        let ins = MemoryInspector::new()
            .with_container(container("1111111111aa", "a", &["A=1"]))
            .with_container(container("2222222222bb", "b", &["B=2"]))
            .with_failing("2222222222bb");
        let opts = ExportOptions { snapshot: true, ..Default::default() };

        let collected = collect(&ins, "", &opts).unwrap();
        assert_eq!(collected.values.keys().collect::<Vec<_>>(), vec!["11111111"]);
        assert_eq!(collected.meta.len(), 1);
    }

    #[test]
    fn specific_filter_without_match_is_not_found() {
        let ins = MemoryInspector::new().with_container(container("1111111111aa", "a", &[]));
        let opts = ExportOptions {
            filter: ContainerFilter::Only("zzz".to_string()),
            ..Default::default()
        };
        assert!(matches!(collect(&ins, "", &opts), Err(DockerenvError::ContainerNotFound(_))));
    }

    #[test]
    fn ssm_writes_nothing() {
        let ins = MemoryInspector::new().with_container(container("1111111111aa", "a", &["A=1"]));
        let store = MemoryStore::new();
        let opts = ExportOptions { format: ExportFormat::Ssm, snapshot: true, ..Default::default() };
        let summary = run_export(&ins, &store, &Config::default(), &opts).unwrap();
        assert_eq!(summary.containers, 1);
        assert!(summary.written.is_empty());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn json_fails_before_looking_up_containers() {
        // 过滤条件匹配不到容器；如果先收集会得到 ContainerNotFound
        let opts = ExportOptions {
            format: ExportFormat::Json,
            filter: ContainerFilter::Only("missing".to_string()),
            ..Default::default()
        };
        let err = run_export(&MemoryInspector::new(), &MemoryStore::new(), &Config::default(), &opts).unwrap_err();
        assert!(matches!(err, DockerenvError::UnsupportedFormat(f) if f == "json"));
    }

    #[test]
    fn output_dir_must_be_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::default().with_output_dir(Some(file.path().to_path_buf()));
        let ins = MemoryInspector::new().with_container(container("1111111111aa", "a", &["A=1"]));

        for format in [ExportFormat::Env, ExportFormat::Yaml] {
            let opts = ExportOptions { format, ..Default::default() };
            let err = run_export(&ins, &MemoryStore::new(), &config, &opts).unwrap_err();
            assert!(matches!(err, DockerenvError::Config(_)), "{}: {}", format, err);
        }
    }
}
