use anyhow::Context;
use atlasflow_cloud::{ResourceConfig, StateManager};
use atlasflow_cloud_atlas::{AtlasConfig, AtlasProvider, PollSettings, SENSITIVE_NOTIFICATION_FIELDS};
use atlasflow_config::{ProviderSettings, ResourceDocument};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

/// 環境変数の設定から Atlas プロバイダーを構築
pub fn provider_from_env() -> anyhow::Result<AtlasProvider> {
    let settings = ProviderSettings::from_env()?;
    tracing::debug!("provider settings: {:?}", settings);

    let poll = if settings.fast_poll {
        PollSettings::fast()
    } else {
        PollSettings::default()
    };
    let config = AtlasConfig::new(settings.access_token).with_base_url(settings.base_url);
    Ok(AtlasProvider::from_config(config, poll)?)
}

/// ステートはカレントディレクトリ配下に置く
pub fn state_manager() -> anyhow::Result<StateManager> {
    let root = std::env::current_dir().context("resolving the working directory")?;
    Ok(StateManager::new(root))
}

/// リソース定義ファイルを読み込み、アドレスでリソースを1つ取得
pub fn desired_resource(address: &str) -> anyhow::Result<ResourceConfig> {
    let path: PathBuf = atlasflow_config::find_resource_file()?;
    let document = ResourceDocument::load(&path)?;
    print_loaded_file(&path);

    document
        .to_resource_set()
        .get(address)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("'{}' is not declared in {}", address, path.display()))
}

pub fn print_loaded_file(path: &std::path::Path) {
    println!("📄 {}", path.display().to_string().cyan());
}

/// 保存済みレコードに宣言された属性を上書きする
///
/// `config` のトップレベルのキーで置き換え、定義ファイルに無い
/// computed 属性は保存済みの値をそのまま残す。
pub fn merge_plan(state: &Value, config: &Value) -> Value {
    let mut plan = state.clone();
    if let (Value::Object(plan_map), Value::Object(config_map)) = (&mut plan, config) {
        for (key, value) in config_map {
            plan_map.insert(key.clone(), value.clone());
        }
    }
    plan
}

/// 表示前に書き込み専用のシークレットを伏せる
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if SENSITIVE_NOTIFICATION_FIELDS.contains(&key.as_str()) && child.is_string() {
                    *child = Value::String("<sensitive>".to_string());
                } else {
                    redact(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}
