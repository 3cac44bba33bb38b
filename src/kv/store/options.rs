use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use super::core::{KvError, Store};
use super::mysql_store::{MySqlStore, MySqlStoreConfig};
use super::sqlite_store::{SqliteStore, SqliteStoreConfig};

/// 支持的数据库方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Sqlite,
    #[serde(rename = "mysql")]
    MySql,
}

impl DialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Sqlite => "sqlite",
            DialectKind::MySql => "mysql",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "mysql" => Ok(DialectKind::MySql),
            _ => Err(KvError::UnsupportedDialect(s.to_string())),
        }
    }
}

/// 存储选项：方言标签加上对应方言的配置
///
/// 与配置文件中的写法一一对应：
/// ```yaml
/// type: sqlite
/// options:
///   path: /var/lib/kv/kv.db
///   max_connections: 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "options")]
pub enum StoreOptions {
    #[serde(rename = "sqlite")]
    Sqlite(SqliteStoreConfig),
    #[serde(rename = "mysql")]
    MySql(MySqlStoreConfig),
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions::Sqlite(SqliteStoreConfig::default())
    }
}

impl StoreOptions {
    /// 用连接目标填充对应方言的默认配置
    ///
    /// SQLite 的目标是文件路径，MySQL 的目标是 URL 或 DSN
    pub fn from_target(dialect: DialectKind, target: &str) -> Self {
        match dialect {
            DialectKind::Sqlite => StoreOptions::Sqlite(SqliteStoreConfig::with_path(target)),
            DialectKind::MySql => StoreOptions::MySql(MySqlStoreConfig::with_url(target)),
        }
    }

    pub fn dialect(&self) -> DialectKind {
        match self {
            StoreOptions::Sqlite(_) => DialectKind::Sqlite,
            StoreOptions::MySql(_) => DialectKind::MySql,
        }
    }

    /// 覆盖表名
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        match &mut self {
            StoreOptions::Sqlite(config) => config.table_name = table_name,
            StoreOptions::MySql(config) => config.table_name = table_name,
        }
        self
    }

    pub fn table_name(&self) -> &str {
        match self {
            StoreOptions::Sqlite(config) => &config.table_name,
            StoreOptions::MySql(config) => &config.table_name,
        }
    }
}

/// 按选项创建并初始化对应的存储
pub async fn open_store(options: StoreOptions) -> Result<Arc<dyn Store>, KvError> {
    let dialect = options.dialect();
    let result = match options {
        StoreOptions::Sqlite(config) => SqliteStore::new(config)
            .await
            .map(|store| Arc::new(store) as Arc<dyn Store>),
        StoreOptions::MySql(config) => MySqlStore::new(config)
            .await
            .map(|store| Arc::new(store) as Arc<dyn Store>),
    };

    if let Err(KvError::InvalidConfig(ref reason)) = result {
        warn!(%dialect, %reason, "rejected kv store config");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg;
    use crate::kv::store::SetOptions;
    use tempfile::TempDir;

    #[test]
    fn test_dialect_kind_from_str() {
        assert_eq!("sqlite".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert_eq!("SQLite3".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert_eq!(" mysql ".parse::<DialectKind>().unwrap(), DialectKind::MySql);

        let result = "postgres".parse::<DialectKind>();
        assert!(matches!(result, Err(KvError::UnsupportedDialect(ref d)) if d == "postgres"));
        assert_eq!(DialectKind::MySql.to_string(), "mysql");
    }

    #[test]
    fn test_store_options_from_target() {
        let options = StoreOptions::from_target(DialectKind::Sqlite, "kv.db");
        assert_eq!(options.dialect(), DialectKind::Sqlite);
        assert_eq!(options, StoreOptions::Sqlite(SqliteStoreConfig::with_path("kv.db")));

        let options = StoreOptions::from_target(DialectKind::MySql, "root@tcp(db:3306)/kv")
            .with_table_name("cache");
        assert_eq!(options.dialect(), DialectKind::MySql);
        assert_eq!(options.table_name(), "cache");
    }

    #[test]
    fn test_store_options_from_config() {
        let options: StoreOptions = cfg::from_json(
            r#"{
                type: "sqlite",
                options: { path: "/tmp/kv.db", max_lifetime: "5m" },
            }"#,
        )
        .unwrap();
        match options {
            StoreOptions::Sqlite(config) => {
                assert_eq!(config.path, "/tmp/kv.db");
                assert_eq!(config.max_lifetime, std::time::Duration::from_secs(300));
                assert_eq!(config.table_name, "key_values");
            }
            other => panic!("unexpected options: {:?}", other),
        }

        let options: StoreOptions = cfg::from_yaml(
            "type: mysql\noptions:\n  url: root:toor@tcp(127.0.0.1:3306)/gokv\n  max_connections: 4\n",
        )
        .unwrap();
        assert!(matches!(options, StoreOptions::MySql(ref c) if c.max_connections == 4));

        let result: anyhow::Result<StoreOptions> =
            cfg::from_json(r#"{ type: "postgres", options: {} }"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_store_sqlite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        let options = StoreOptions::from_target(DialectKind::Sqlite, &path.to_string_lossy());

        let store = open_store(options).await.unwrap();
        store.set("foo", b"bar", &SetOptions::new()).await.unwrap();
        assert_eq!(store.get("foo").await.unwrap(), b"bar");
    }

    #[tokio::test]
    async fn test_open_store_invalid_config() {
        let options = StoreOptions::from_target(DialectKind::Sqlite, ":memory:")
            .with_table_name("not a table");
        let result = open_store(options).await;
        assert!(matches!(result, Err(KvError::InvalidConfig(_))));
    }
}
