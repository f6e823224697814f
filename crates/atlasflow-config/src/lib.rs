//! AtlasFlow の設定
//!
//! リソース定義ファイルの検索と読み込み、環境変数からのプロバイダー設定を扱う。

pub mod document;
pub mod error;
pub mod settings;

pub use document::{ResourceDocument, ResourceEntry};
pub use error::*;
pub use settings::ProviderSettings;

use std::path::PathBuf;

/// 候補ファイル名（優先度の高い順）
const RESOURCE_FILE_NAMES: [&str; 4] = [
    "atlas.local.yaml",
    ".atlas.local.yaml",
    "atlas.yaml",
    ".atlas.yaml",
];

/// プロジェクトのリソース定義ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 `ATLASFLOW_CONFIG_PATH` (直接パス指定)
/// 2. カレントディレクトリ: atlas.local.yaml, .atlas.local.yaml, atlas.yaml, .atlas.yaml
/// 3. `./.atlasflow/` ディレクトリ内: 同様の順序
/// 4. `~/.config/atlasflow/atlas.yaml` (グローバル設定)
pub fn find_resource_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("ATLASFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "ATLASFLOW_CONFIG_PATH points at {}, which does not exist",
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    for filename in &RESOURCE_FILE_NAMES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".atlasflow");
    if project_dir.is_dir() {
        for filename in &RESOURCE_FILE_NAMES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("atlasflow").join("atlas.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ResourceFileNotFound)
}
