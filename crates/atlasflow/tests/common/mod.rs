#![allow(deprecated)] // TODO: migrate cargo_bin to the cargo_bin_cmd! macro

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PROJECT_ID: &str = "5f1c0c1b2a3b4c5d6e7f8091";
pub const ORG_ID: &str = "5f1c0c1b2a3b4c5d6e7f8000";

/// 専用の設定ホームを持つ一時作業ディレクトリ
pub struct TestProject {
    pub root: TempDir,
    config_home: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            config_home: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write_resource_file(&self, content: &str) {
        fs::write(self.root.path().join("atlas.yaml"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_state(&self, content: &serde_json::Value) {
        let dir = self.root.path().join(".atlasflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("state.json"),
            serde_json::to_string_pretty(content).unwrap(),
        )
        .unwrap();
    }

    #[allow(dead_code)]
    pub fn state_path(&self) -> PathBuf {
        self.root.path().join(".atlasflow").join("state.json")
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// 環境の設定を使わず `base_url` に向けた `atlasflow` コマンド
    pub fn cmd(&self, base_url: &str) -> Command {
        let mut cmd = Command::cargo_bin("atlasflow").unwrap();
        cmd.current_dir(self.path())
            .env("MONGODB_ATLAS_ACCESS_TOKEN", "test-token")
            .env("MONGODB_ATLAS_BASE_URL", base_url)
            .env("ATLASFLOW_FAST_POLL", "1")
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1")
            .env_remove("ATLASFLOW_CONFIG_PATH")
            .env_remove("RUST_LOG");
        cmd
    }
}
