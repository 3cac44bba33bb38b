//! cfg 模块 - 配置加载
//!
//! 提供配置文件解析（JSON5 / YAML / TOML）和可读时长的序列化支持

pub mod loader;
pub mod serde_duration;

pub use loader::{from_file, from_json, from_toml, from_yaml};
pub use serde_duration::{format_duration, parse_duration, HumanDur};
