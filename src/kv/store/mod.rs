pub mod core;
pub mod mysql_store;
pub mod options;
pub mod query;
pub mod sqlite_store;


// 重新导出核心类型和 trait
pub use self::core::{
    clamp_expires_at, max_expires_at, KeyValues, KvError, SetOptions, Store, MAX_EXPIRES_AT_MICROS,
    MAX_KEY_LENGTH, MAX_VALUE_LENGTH, TABLE_NAME,
};
// 重新导出具体实现
pub use mysql_store::{MySqlStore, MySqlStoreConfig, MySqlTarget};
pub use sqlite_store::{SqliteStore, SqliteStoreConfig};
// 重新导出方言选择
pub use options::{open_store, DialectKind, StoreOptions};
pub use query::{Dialect, QueryBuilder, MYSQL, SQLITE};
