//! KV 存储抽象模块
//!
//! 在 SQLite / MySQL 之上提供统一的 get/set/del/exists 接口（单键与批量、可选过期时间）

pub mod client;
pub mod store;

// 重新导出核心接口
pub use client::KvClient;
pub use store::{
    open_store, DialectKind, KeyValues, KvError, SetOptions, Store, StoreOptions,
};
