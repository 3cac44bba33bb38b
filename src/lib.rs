//! sqlkv - 基于关系型数据库的 KV 存储
//!
//! 同一套 KV 接口（get/set/del/exists，单键与批量，可选过期时间），
//! 可在 SQLite 与 MySQL 之间切换。
//!
//! ## 模块
//!
//! - **kv**: 存储接口、两种方言的实现、SQL 构造以及统一入口 `KvClient`
//! - **cfg**: 配置文件解析和可读时长
//!
//! ## 语义
//!
//! - 写入是单条 upsert 语句，冲突时覆盖值和过期时间，保留创建时间
//! - 过期是惰性的：过期记录仍在表中，只是读不到，直到被覆盖或删除
//! - `mexists` 的结果与输入按位置对应；`mget` 的顺序由存储引擎决定

pub mod cfg;
pub mod kv;

// 重新导出主要的公共 API
pub use kv::{
    open_store, DialectKind, KeyValues, KvClient, KvError, SetOptions, Store, StoreOptions,
};
pub use kv::store::{MySqlStore, MySqlStoreConfig, SqliteStore, SqliteStoreConfig};
