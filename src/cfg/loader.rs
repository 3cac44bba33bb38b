// 配置解析：JSON5 / YAML / TOML

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// 从 JSON 字符串解析（支持 JSON5：注释、尾随逗号、未引用的键）
pub fn from_json<T: DeserializeOwned>(json_str: &str) -> Result<T> {
    Ok(json5::from_str(json_str)?)
}

/// 从 YAML 字符串解析
pub fn from_yaml<T: DeserializeOwned>(yaml_str: &str) -> Result<T> {
    Ok(serde_yaml::from_str(yaml_str)?)
}

/// 从 TOML 字符串解析
pub fn from_toml<T: DeserializeOwned>(toml_str: &str) -> Result<T> {
    Ok(toml::from_str(toml_str)?)
}

/// 读取配置文件，按扩展名选择格式
pub fn from_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let parsed = match ext.as_str() {
        "json" | "json5" => from_json(&content),
        "yaml" | "yml" => from_yaml(&content),
        "toml" => from_toml(&content),
        _ => Err(anyhow!("unsupported config format {:?}", ext)),
    };
    parsed.with_context(|| format!("Failed to parse config file: {}", path.display()))
}
