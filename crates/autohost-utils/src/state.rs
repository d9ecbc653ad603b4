//! JSON state kept under the autohost root.

use crate::fs::atomic_write;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Contents of `state/status.json`. Unknown keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostStatus {
    #[serde(default)]
    pub cloudflare_tunnel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudflare_domain: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Contents of `config/tunnel.json`, written by `autohost cloudflare tunnel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelRecord {
    pub tunnel: String,
    pub domain: String,
}

pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing or unparsable file reads as the default status.
    pub fn load(&self) -> HostStatus {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, status: &HostStatus) -> Result<()> {
        write_json(&self.path, status)
    }

    pub fn update(&self, f: impl FnOnce(&mut HostStatus)) -> Result<HostStatus> {
        let mut status = self.load();
        f(&mut status);
        self.save(&status)?;
        Ok(status)
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    content.push('\n');
    atomic_write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_corrupt_files_read_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.json"));
        assert_eq!(store.load(), HostStatus::default());

        std::fs::write(dir.path().join("status.json"), "{not json").unwrap();
        assert_eq!(store.load(), HostStatus::default());
    }

    #[test]
    fn update_keeps_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, r#"{"cloudflare_tunnel": false, "last_app": "bookstack"}"#).unwrap();
        let store = StatusStore::new(&path);

        store
            .update(|s| {
                s.cloudflare_tunnel = true;
                s.cloudflare_domain = Some("blog.example.com".into());
            })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cloudflare_tunnel"], true);
        assert_eq!(raw["cloudflare_domain"], "blog.example.com");
        assert_eq!(raw["last_app"], "bookstack");
    }
}
