//! Docker 实现
//! 来源：docker ps / docker inspect

use crate::inspector::Inspector;
use crate::utils::{ContainerDetails, ContainerSummary, DockerenvError, Result};
use std::collections::BTreeMap;
use std::process::Command;

pub struct DockerCli {
    bin: String,
}

impl DockerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Inspector for DockerCli {
    fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let out = Command::new(&self.bin)
            .args(["ps", "--no-trunc", "--format", "{{.ID}}\t{{.Names}}"])
            .output()
            .map_err(|e| DockerenvError::Connection(format!("{} ps failed: {}", self.bin, e)))?;

        if !out.status.success() {
            return Err(DockerenvError::Connection(format!(
                "{} ps failed, is Docker running? {}",
                self.bin,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        Ok(parse_ps(&String::from_utf8_lossy(&out.stdout)))
    }

    fn inspect(&self, id: &str) -> Result<ContainerDetails> {
        let out = Command::new(&self.bin)
            .args(["inspect", "--type", "container", id])
            .output()
            .map_err(|e| DockerenvError::Connection(format!("{} inspect failed: {}", self.bin, e)))?;

        if !out.status.success() {
            return Err(DockerenvError::Inspect {
                id: id.to_string(),
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        let json: serde_json::Value = serde_json::from_slice(&out.stdout)
            .map_err(|e| DockerenvError::Parse(format!("inspect JSON: {}", e)))?;

        let first = json
            .as_array()
            .and_then(|a| a.first())
            .ok_or_else(|| DockerenvError::ContainerNotFound(id.to_string()))?;

        parse_inspect(first)
    }
}

// ── 解析 ────────────────────────────────────────────────────────────────────

fn parse_ps(stdout: &str) -> Vec<ContainerSummary> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            let (id, name) = l.split_once('\t').unwrap_or((l, ""));
            ContainerSummary {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
            }
        })
        .collect()
}

fn parse_inspect(c: &serde_json::Value) -> Result<ContainerDetails> {
    let id = c["Id"]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DockerenvError::Parse("inspect result has no Id".to_string()))?
        .to_string();

    Ok(ContainerDetails {
        id,
        name: c["Name"].as_str().unwrap_or("").trim_start_matches('/').to_string(),
        image: str_val(c, &["Config", "Image"]),
        command: str_list(&c["Config"]["Cmd"]),
        env: str_list(&c["Config"]["Env"]),
        labels: c["Config"]["Labels"]
            .as_object()
            .map(|m| {
                m.iter()
                    .map(|(k, v)| (k.clone(), v.as_str().unwrap_or("").to_string()))
                    .collect()
            })
            .unwrap_or_else(BTreeMap::new),
    })
}

// ── 工具 ────────────────────────────────────────────────────────────────────

fn str_val(c: &serde_json::Value, path: &[&str]) -> String {
    let mut cur = c;
    for key in path {
        cur = &cur[key];
    }
    cur.as_str().unwrap_or("").to_string()
}

// null 和缺失字段都当作空列表
fn str_list(v: &serde_json::Value) -> Vec<String> {
    v.as_array()
        .map(|a| a.iter().filter_map(|s| s.as_str()).map(String::from).collect())
        .unwrap_or_default()
}
