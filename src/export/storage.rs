//! 写出目标：本地目录 / 对象存储

use crate::utils::{DockerenvError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::PathBuf;

// ── 本地文件 ────────────────────────────────────────────────────────────────

pub struct LocalWriter {
    root: PathBuf,
    overwrite: bool,
}

impl LocalWriter {
    pub fn new(root: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self { root: root.into(), overwrite }
    }

    /// Writes `data` at `<root><path>`, creating parent directories. Returns the final path.
    pub fn write(&self, path: &str, data: &[u8]) -> Result<String> {
        let target = self.root.join(path.trim_start_matches('/'));
        let shown = target.display().to_string();

        if target.exists() && !self.overwrite {
            return Err(DockerenvError::Write {
                target: shown,
                message: "file exists (pass --overwrite to replace it)".to_string(),
            });
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DockerenvError::Write {
                target: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }

        log::info!("Writing {} bytes to {}", data.len(), shown);
        std::fs::write(&target, data).map_err(|e| DockerenvError::Write {
            target: shown.clone(),
            message: e.to_string(),
        })?;

        Ok(shown)
    }
}

// ── 对象存储 ────────────────────────────────────────────────────────────────

pub trait ObjectStore {
    /// Stores `data` under `key`, replacing any existing object. Returns the object URL.
    fn put_object(&self, key: &str, data: &[u8]) -> Result<String>;
}

/// S3 uploads through the AWS SDK, driven on a private current-thread runtime.
/// Credentials come from the usual AWS chain (env, profile, instance role).
pub struct S3Store {
    bucket: String,
    client: aws_sdk_s3::Client,
    runtime: tokio::runtime::Runtime,
}

impl S3Store {
    /// `region` overrides whatever the AWS environment resolves.
    pub fn new(bucket: impl Into<String>, region: Option<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DockerenvError::Config(format!("cannot start S3 client runtime: {}", e)))?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = runtime.block_on(loader.load());

        Ok(Self {
            bucket: bucket.into(),
            client: aws_sdk_s3::Client::new(&sdk_config),
            runtime,
        })
    }

    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|r| r.as_ref())
    }
}

impl ObjectStore for S3Store {
    fn put_object(&self, key: &str, data: &[u8]) -> Result<String> {
        let url = s3_url(&self.bucket, key);
        log::info!("Writing {} bytes to {}", data.len(), url);

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.trim_start_matches('/'))
            .body(ByteStream::from(data.to_vec()))
            .send();

        self.runtime.block_on(request).map_err(|e| DockerenvError::Write {
            target: url.clone(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        log::info!("Wrote {} bytes to {}", data.len(), url);
        Ok(url)
    }
}

/// Used when no bucket is configured: logs instead of uploading.
pub struct DryRunStore;

impl ObjectStore for DryRunStore {
    fn put_object(&self, key: &str, data: &[u8]) -> Result<String> {
        let url = s3_url("S3_BUCKET", key);
        log::warn!("S3_BUCKET is not set, not writing {} bytes to {}", data.len(), url);
        log::debug!("{}", String::from_utf8_lossy(data));
        Ok(url)
    }
}

/// Keeps uploads in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.borrow().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.borrow().keys().cloned().collect()
    }
}

impl ObjectStore for MemoryStore {
    fn put_object(&self, key: &str, data: &[u8]) -> Result<String> {
        self.objects.borrow_mut().insert(key.to_string(), data.to_vec());
        Ok(s3_url("memory", key))
    }
}

pub fn s3_url(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key.trim_start_matches('/'))
}
