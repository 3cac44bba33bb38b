use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// 默认表名
pub const TABLE_NAME: &str = "key_values";

/// 键的最大字节数，用于建表时的键列宽度，本层不做校验
pub const MAX_KEY_LENGTH: usize = 255;

/// 值的最大字节数，用于 MySQL 建表时的值列类型
pub const MAX_VALUE_LENGTH: usize = 65535;

/// 可存储的最晚过期时间 9999-12-31 23:59:59.999999 UTC（微秒时间戳）
///
/// MySQL `datetime(6)` 的上限；SQLite 的定宽时间文本也只对四位年份保持字典序。
pub const MAX_EXPIRES_AT_MICROS: i64 = 253_402_300_799_999_999;

/// 可存储的最晚过期时间
pub fn max_expires_at() -> DateTime<Utc> {
    DateTime::from_timestamp_micros(MAX_EXPIRES_AT_MICROS).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// 把过期时间截断到可存储范围内，更晚的时间点在任何实际时刻都等价于上限
pub fn clamp_expires_at(expires_at: DateTime<Utc>) -> DateTime<Utc> {
    expires_at.min(max_expires_at())
}

/// 批量写入的键值集合，键唯一且顺序确定
pub type KeyValues = BTreeMap<String, Vec<u8>>;

/// KV 存储相关错误类型
#[derive(Error, Debug)]
pub enum KvError {
    /// 键不存在或已过期，仅由 `get` 返回
    #[error("Key not found")]
    KeyNotFound,

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 连接、语句执行或行解码失败，原样透传
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl KvError {
    /// 是否为键不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::KeyNotFound)
    }

    /// 是否为配置错误（方言不支持或配置非法）
    pub fn is_config(&self) -> bool {
        matches!(self, KvError::UnsupportedDialect(_) | KvError::InvalidConfig(_))
    }
}

impl From<garde::Report> for KvError {
    fn from(report: garde::Report) -> Self {
        KvError::InvalidConfig(report.to_string())
    }
}

/// 设置选项
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SetOptions {
    /// 过期时间点，`None` 表示永不过期
    pub expires_at: Option<DateTime<Utc>>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定绝对过期时间
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// 指定相对过期时间，以调用时刻为起点
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self.expires_at = Utc::now().checked_add_signed(ttl);
        self
    }
}

/// 基于关系型数据库的 KV 存储接口
///
/// 读操作（`get`/`mget`/`exists`/`mexists`）只返回未过期的记录，过期记录不会被主动删除，
/// 直到被覆盖或显式删除。
///
/// 所有实现都必须可被多个调用方并发共享，并发控制交给底层连接池。
#[async_trait]
pub trait Store: Send + Sync {
    /// 确认表结构存在，不存在则创建；可重复调用
    async fn init(&self) -> Result<(), KvError>;

    /// 获取键对应的值，键不存在或已过期时返回 `KvError::KeyNotFound`
    async fn get(&self, key: &str) -> Result<Vec<u8>, KvError> {
        let keys = [key.to_string()];
        self.mget(&keys)
            .await?
            .into_iter()
            .next()
            .ok_or(KvError::KeyNotFound)
    }

    /// 批量获取存活键的值
    ///
    /// 结果顺序由存储引擎决定，不保证与 `keys` 对应；缺失或过期的键直接不出现在结果中。
    /// 需要按位置对应时请使用 `mexists` 配合 `get`。
    async fn mget(&self, keys: &[String]) -> Result<Vec<Vec<u8>>, KvError>;

    /// 设置单个键值，等价于只包含一个键的 `mset`
    async fn set(&self, key: &str, value: &[u8], options: &SetOptions) -> Result<(), KvError> {
        let mut kvs = KeyValues::new();
        kvs.insert(key.to_string(), value.to_vec());
        self.mset(&kvs, options).await
    }

    /// 使用多行 upsert 语句批量写入，所有键共享同一个过期时间
    ///
    /// 键数超过方言的参数上限时拆成多条语句并在同一事务中执行，整体成功或整体失败。
    /// 晚于 [`max_expires_at`] 的过期时间按上限存储。
    async fn mset(&self, kvs: &KeyValues, options: &SetOptions) -> Result<(), KvError>;

    /// 删除键，键不存在时也返回成功
    async fn del(&self, key: &str) -> Result<(), KvError> {
        self.mdel(&[key.to_string()]).await
    }

    /// 批量删除
    async fn mdel(&self, keys: &[String]) -> Result<(), KvError>;

    /// 判断键是否存活
    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        let found = self.mexists(&[key.to_string()]).await?;
        Ok(found.first().copied().unwrap_or(false))
    }

    /// 批量判断键是否存活，结果与 `keys` 按位置一一对应
    async fn mexists(&self, keys: &[String]) -> Result<Vec<bool>, KvError>;

    /// 关闭连接池，之后的操作都会失败
    async fn close(&self) -> Result<(), KvError>;
}
