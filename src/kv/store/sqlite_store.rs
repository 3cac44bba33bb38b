use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Row, Sqlite};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::core::{KeyValues, KvError, SetOptions, Store, MAX_KEY_LENGTH, TABLE_NAME};
use super::query::{Arg, QueryBuilder, Statement, SQLITE};
use crate::cfg::serde_duration::{serde_as, HumanDur};

/// 内存数据库路径
pub const MEMORY_PATH: &str = ":memory:";

/// 时间统一存成定宽 UTC 文本，字典序即时间序
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// SQLite 存储配置
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, SmartDefault, Validate)]
#[serde(default)]
pub struct SqliteStoreConfig {
    /// 数据库文件路径，`:memory:` 表示内存数据库；也接受 `sqlite://` URL
    #[default = "sqlite.db"]
    #[garde(length(min = 1))]
    pub path: String,

    /// 表名
    #[default = "key_values"]
    #[garde(pattern(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$"))]
    pub table_name: String,

    /// 连接池大小
    #[default = 5]
    #[garde(range(min = 1, max = 128))]
    pub max_connections: u32,

    /// 单个连接的最长生命周期
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_secs(30 * 60))]
    #[garde(skip)]
    pub max_lifetime: Duration,

    /// 从连接池获取连接的超时
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_secs(30))]
    #[garde(skip)]
    pub acquire_timeout: Duration,

    /// 数据库被锁时的等待时间
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_secs(5))]
    #[garde(skip)]
    pub busy_timeout: Duration,

    /// 文件不存在时是否创建
    #[default = true]
    #[garde(skip)]
    pub create_if_missing: bool,
}

impl SqliteStoreConfig {
    /// 使用指定路径和默认参数
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    fn is_memory(&self) -> bool {
        let path = self
            .path
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        path == MEMORY_PATH || path.starts_with(":memory:?")
    }
}

/// 基于 SQLite 的 KV 存储
///
/// 表结构以 `key` 为主键；写入使用 `ON CONFLICT ... DO UPDATE`。
///
/// # 示例
/// ```ignore
/// use sqlkv::kv::store::{SetOptions, SqliteStore, SqliteStoreConfig, Store};
///
/// let store = SqliteStore::new(SqliteStoreConfig::with_path("kv.db")).await?;
/// store.set("foo", b"bar", &SetOptions::new()).await?;
/// assert_eq!(store.get("foo").await?, b"bar");
/// ```
pub struct SqliteStore {
    pool: SqlitePool,
    query: QueryBuilder,
}

impl SqliteStore {
    /// 打开数据库并确认表结构存在
    pub async fn new(config: SqliteStoreConfig) -> Result<Self, KvError> {
        config.validate()?;
        let query = QueryBuilder::new(SQLITE, &config.table_name)?;

        let mut connect_options = if config.path.starts_with("sqlite:") || config.is_memory() {
            SqliteConnectOptions::from_str(&config.path)
                .map_err(|e| KvError::InvalidConfig(format!("invalid sqlite target: {}", e)))?
        } else {
            SqliteConnectOptions::new().filename(&config.path)
        };
        connect_options = connect_options
            .create_if_missing(config.create_if_missing)
            .busy_timeout(config.busy_timeout);

        let pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);
        let pool_options = if config.is_memory() {
            // 内存库随最后一个连接消失，固定单连接且永不回收
            pool_options
                .max_connections(1)
                .min_connections(1)
                .max_lifetime(None)
                .idle_timeout(None)
        } else {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
            pool_options
                .max_connections(config.max_connections)
                .max_lifetime(Some(config.max_lifetime))
        };

        let pool = pool_options.connect_with(connect_options).await?;

        let store = Self { pool, query };
        store.init().await?;
        info!(
            dialect = SQLITE.name,
            path = %config.path,
            table = %store.query.table(),
            "kv store ready"
        );
        Ok(store)
    }

    /// 底层连接池
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn table_name(&self) -> &str {
        self.query.table()
    }

    fn create_table_sql(&self) -> String {
        format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
  "key" varchar({key_len}) NOT NULL,
  "value" blob NOT NULL,
  "created_at" datetime NOT NULL,
  "updated_at" datetime NOT NULL,
  "expires_at" datetime DEFAULT NULL,
  PRIMARY KEY ("key")
)"#,
            table = self.query.quoted_table(),
            key_len = MAX_KEY_LENGTH
        )
    }

    fn create_index_sql(&self) -> String {
        format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{name}_expires_at" ON {table} ("expires_at")"#,
            name = self.query.table(),
            table = self.query.quoted_table()
        )
    }

    /// 执行写语句，多条语句时放在同一事务中
    async fn execute(&self, op: &str, stmts: Vec<Statement>) -> Result<(), KvError> {
        if stmts.len() <= 1 {
            for Statement { sql, args } in stmts {
                debug!(dialect = SQLITE.name, op, args = args.len(), "execute");
                bind_args(sqlx::query(&sql), args)
                    .execute(&self.pool)
                    .await?;
            }
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let total = stmts.len();
        for (i, Statement { sql, args }) in stmts.into_iter().enumerate() {
            debug!(dialect = SQLITE.name, op, args = args.len(), part = i + 1, total, "execute");
            bind_args(sqlx::query(&sql), args).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch(&self, op: &str, stmts: Vec<Statement>) -> Result<Vec<SqliteRow>, KvError> {
        let mut rows = Vec::new();
        for Statement { sql, args } in stmts {
            debug!(dialect = SQLITE.name, op, args = args.len(), "fetch");
            rows.extend(
                bind_args(sqlx::query(&sql), args)
                    .fetch_all(&self.pool)
                    .await?,
            );
        }
        Ok(rows)
    }
}

/// 转为存储格式的时间文本
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn bind_args<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: Vec<Arg>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            Arg::Text(s) => query.bind(s),
            Arg::Blob(b) => query.bind(b),
            Arg::Timestamp(t) => query.bind(format_timestamp(t)),
            Arg::NullableTimestamp(t) => query.bind(t.map(format_timestamp)),
        };
    }
    query
}

#[async_trait]
impl Store for SqliteStore {
    async fn init(&self) -> Result<(), KvError> {
        sqlx::query(&self.create_table_sql())
            .execute(&self.pool)
            .await?;
        sqlx::query(&self.create_index_sql())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Vec<u8>>, KvError> {
        let stmts = self.query.select_live(keys, Utc::now());
        self.fetch("mget", stmts)
            .await?
            .iter()
            .map(|row| row.try_get::<Vec<u8>, _>(1).map_err(KvError::from))
            .collect()
    }

    async fn mset(&self, kvs: &KeyValues, options: &SetOptions) -> Result<(), KvError> {
        let stmts = self.query.upsert(kvs, options.expires_at, Utc::now());
        self.execute("mset", stmts).await
    }

    async fn mdel(&self, keys: &[String]) -> Result<(), KvError> {
        self.execute("mdel", self.query.delete(keys)).await
    }

    async fn mexists(&self, keys: &[String]) -> Result<Vec<bool>, KvError> {
        let stmts = self.query.select_live_keys(keys, Utc::now());
        let found = self
            .fetch("mexists", stmts)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(keys.iter().map(|k| found.contains(k)).collect())
    }

    async fn close(&self) -> Result<(), KvError> {
        self.pool.close().await;
        Ok(())
    }
}
