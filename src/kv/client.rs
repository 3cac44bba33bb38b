//! KV 客户端
//!
//! 应用代码的统一入口：按配置选择 SQLite 或 MySQL 后端并转发调用。

use std::path::Path;
use std::sync::Arc;

use super::store::{open_store, DialectKind, KeyValues, KvError, SetOptions, Store, StoreOptions};
use crate::cfg;

/// KV 客户端
///
/// 内部持有 `Arc<dyn Store>`，可廉价克隆并在多个任务间共享。
///
/// # 示例
/// ```ignore
/// use sqlkv::kv::{KvClient, SetOptions};
///
/// let kv = KvClient::open("sqlite", "sqlite.db").await?;
/// kv.set("foo", b"bar", &SetOptions::new()).await?;
/// let value = kv.get("foo").await?;
/// ```
#[derive(Clone)]
pub struct KvClient {
    dialect: DialectKind,
    store: Arc<dyn Store>,
}

impl KvClient {
    /// 按选项创建客户端，并完成建表
    pub async fn new(options: StoreOptions) -> Result<Self, KvError> {
        let dialect = options.dialect();
        let store = open_store(options).await?;
        Ok(Self { dialect, store })
    }

    /// 按方言名和连接目标创建客户端
    ///
    /// 方言名不受支持时立即返回 `KvError::UnsupportedDialect`，不会尝试连接。
    pub async fn open(dialect: &str, target: &str) -> Result<Self, KvError> {
        let dialect: DialectKind = dialect.parse()?;
        Self::new(StoreOptions::from_target(dialect, target)).await
    }

    /// 从配置文件（JSON5 / YAML / TOML）读取 `StoreOptions` 并创建客户端
    pub async fn from_config_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let options: StoreOptions = cfg::from_file(path)?;
        Ok(Self::new(options).await?)
    }

    /// 使用已有的存储实现
    pub fn with_store(dialect: DialectKind, store: Arc<dyn Store>) -> Self {
        Self { dialect, store }
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// 重新确认表结构
    pub async fn init(&self) -> Result<(), KvError> {
        self.store.init().await
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, KvError> {
        self.store.get(key).await
    }

    /// 结果顺序由存储引擎决定，见 [`Store::mget`]
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Vec<u8>>, KvError> {
        self.store.mget(keys).await
    }

    pub async fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<(), KvError> {
        self.store.set(key, value, options).await
    }

    pub async fn mset(&self, kvs: &KeyValues, options: &SetOptions) -> Result<(), KvError> {
        self.store.mset(kvs, options).await
    }

    pub async fn del(&self, key: &str) -> Result<(), KvError> {
        self.store.del(key).await
    }

    pub async fn mdel(&self, keys: &[String]) -> Result<(), KvError> {
        self.store.mdel(keys).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, KvError> {
        self.store.exists(key).await
    }

    pub async fn mexists(&self, keys: &[String]) -> Result<Vec<bool>, KvError> {
        self.store.mexists(keys).await
    }

    pub async fn close(&self) -> Result<(), KvError> {
        self.store.close().await
    }
}

impl std::fmt::Debug for KvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvClient")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}
