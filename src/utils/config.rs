//! 进程级配置：启动时从环境变量读取一次，之后只读

use std::path::PathBuf;

const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_DOCKER_BIN: &str = "docker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root for every local export target.
    pub output_dir: PathBuf,
    /// Bucket for `export --format s3`; `None` means dry run.
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub docker_bin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            s3_bucket: None,
            s3_region: None,
            docker_bin: DEFAULT_DOCKER_BIN.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            s3_bucket: get("S3_BUCKET"),
            s3_region: get("S3_REGION").or_else(|| get("AWS_DEFAULT_REGION")),
            docker_bin: get("DOCKER_BIN").unwrap_or_else(|| DEFAULT_DOCKER_BIN.to_string()),
        }
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }

    pub fn with_s3_bucket(mut self, bucket: Option<String>) -> Self {
        if let Some(bucket) = bucket.filter(|b| !b.is_empty()) {
            self.s3_bucket = Some(bucket);
        }
        self
    }

    pub fn with_s3_region(mut self, region: Option<String>) -> Self {
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            self.s3_region = Some(region);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn region_falls_back_to_aws_default() {
        let cfg = Config::from_lookup(lookup(&[("AWS_DEFAULT_REGION", "eu-west-1")]));
        assert_eq!(cfg.s3_region.as_deref(), Some("eu-west-1"));

        let cfg = Config::from_lookup(lookup(&[
            ("S3_REGION", "us-east-2"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
        ]));
        assert_eq!(cfg.s3_region.as_deref(), Some("us-east-2"));
    }

    #[test]
    fn empty_values_are_unset() {
        let cfg = Config::from_lookup(lookup(&[("S3_BUCKET", ""), ("OUTPUT_DIR", "")]));
        assert_eq!(cfg.s3_bucket, None);
        assert_eq!(cfg.output_dir, PathBuf::from("."));
    }

    #[test]
    fn flags_override_environment() {
        let cfg = Config::from_lookup(lookup(&[("S3_BUCKET", "from-env"), ("OUTPUT_DIR", "/env")]))
            .with_s3_bucket(Some("from-flag".to_string()))
            .with_output_dir(None)
            .with_s3_region(Some(String::new()));
        assert_eq!(cfg.s3_bucket.as_deref(), Some("from-flag"));
        assert_eq!(cfg.output_dir, PathBuf::from("/env"));
        assert_eq!(cfg.s3_region, None);
    }
}
