//! SQL 构造
//!
//! 把 KV 语义翻译成带位置参数的 SQL。两种方言的差异（占位符、标识符引号、upsert 子句）
//! 收敛在 [`Dialect`] 里，后端只负责绑定参数和解码结果。
//!
//! 只有表名会被拼进 SQL，且在 [`QueryBuilder::new`] 中校验为合法标识符；
//! 键、值和时间全部作为参数绑定。

use chrono::{DateTime, Utc};

use super::core::{clamp_expires_at, KeyValues, KvError};

/// 单个标识符的最大长度（取 MySQL 的上限）
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

const COL_KEY: &str = "key";
const COL_VALUE: &str = "value";
const COL_CREATED_AT: &str = "created_at";
const COL_UPDATED_AT: &str = "updated_at";
const COL_EXPIRES_AT: &str = "expires_at";

const UPSERT_COLUMNS: [&str; 5] = [COL_KEY, COL_VALUE, COL_CREATED_AT, COL_UPDATED_AT, COL_EXPIRES_AT];

/// 占位符风格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Question,
    /// `?1`, `?2`, ...
    Numbered,
}

impl Placeholder {
    /// 第 `index` 个参数（从 1 开始）的占位符
    pub fn render(&self, index: usize) -> String {
        match self {
            Placeholder::Question => "?".to_string(),
            Placeholder::Numbered => format!("?{}", index),
        }
    }
}

/// 冲突时的覆盖写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// `ON CONFLICT(key) DO UPDATE SET col=excluded.col`
    OnConflictExcluded,
    /// `ON DUPLICATE KEY UPDATE col=VALUES(col)`
    OnDuplicateKeyValues,
}

/// 方言描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub name: &'static str,
    pub quote: char,
    pub placeholder: Placeholder,
    pub upsert: Upsert,
    /// 单条语句允许的最多参数个数，超出时拆成多条语句
    pub max_params: usize,
}

pub const SQLITE: Dialect = Dialect {
    name: "sqlite",
    quote: '"',
    placeholder: Placeholder::Numbered,
    upsert: Upsert::OnConflictExcluded,
    // SQLITE_MAX_VARIABLE_NUMBER 默认值
    max_params: 32766,
};

pub const MYSQL: Dialect = Dialect {
    name: "mysql",
    quote: '`',
    placeholder: Placeholder::Question,
    upsert: Upsert::OnDuplicateKeyValues,
    max_params: 65535,
};

impl Dialect {
    /// 给标识符加引号
    pub fn quote_ident(&self, ident: &str) -> String {
        format!("{q}{ident}{q}", q = self.quote)
    }

    /// upsert 子句：覆盖 value、updated_at、expires_at，保留 created_at
    fn upsert_clause(&self) -> String {
        let replaced = [COL_VALUE, COL_UPDATED_AT, COL_EXPIRES_AT];
        match self.upsert {
            Upsert::OnConflictExcluded => {
                let sets = replaced
                    .iter()
                    .map(|c| format!("{col}=excluded.{col}", col = self.quote_ident(c)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "ON CONFLICT({}) DO UPDATE SET {}",
                    self.quote_ident(COL_KEY),
                    sets
                )
            }
            Upsert::OnDuplicateKeyValues => {
                let sets = replaced
                    .iter()
                    .map(|c| format!("{col}=VALUES({col})", col = self.quote_ident(c)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("ON DUPLICATE KEY UPDATE {}", sets)
            }
        }
    }
}

/// 绑定参数
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
    NullableTimestamp(Option<DateTime<Utc>>),
}

/// SQL 语句及其按顺序排列的参数
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Arg>,
}

/// 校验 SQL 标识符（表名、库名）
pub fn validate_identifier(ident: &str) -> Result<(), KvError> {
    let mut chars = ident.chars();
    let valid_head = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_head || !valid_tail || ident.len() > MAX_IDENTIFIER_LENGTH {
        return Err(KvError::InvalidConfig(format!(
            "invalid identifier {:?}: expected [A-Za-z_][A-Za-z0-9_]* with at most {} characters",
            ident, MAX_IDENTIFIER_LENGTH
        )));
    }
    Ok(())
}

/// 面向一张 KV 表的语句构造器
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Dialect,
    table: String,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect, table: &str) -> Result<Self, KvError> {
        validate_identifier(table)?;
        Ok(Self {
            dialect,
            table: table.to_string(),
        })
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// 带引号的表名，供建表语句使用
    pub fn quoted_table(&self) -> String {
        self.dialect.quote_ident(&self.table)
    }

    fn col(&self, name: &str) -> String {
        self.dialect.quote_ident(name)
    }

    /// 从 `start` 开始连续 `count` 个占位符，逗号分隔
    fn placeholders(&self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|i| self.dialect.placeholder.render(i))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `key IN (...)` 子句和对应参数
    fn key_in(&self, keys: &[String]) -> (String, Vec<Arg>) {
        let clause = format!(
            "{} IN ({})",
            self.col(COL_KEY),
            self.placeholders(1, keys.len())
        );
        let args = keys.iter().map(|k| Arg::Text(k.clone())).collect();
        (clause, args)
    }

    /// 过期谓词，占位符序号为 `index`
    fn live_predicate(&self, index: usize) -> String {
        let expires_at = self.col(COL_EXPIRES_AT);
        format!(
            "({e} IS NULL OR {e} > {p})",
            e = expires_at,
            p = self.dialect.placeholder.render(index)
        )
    }

    /// 每条语句最多容纳的键数，`reserved` 为语句中其余参数的个数
    fn chunk_size(&self, per_item: usize, reserved: usize) -> usize {
        (self.dialect.max_params.saturating_sub(reserved) / per_item).max(1)
    }

    fn select_live_columns(
        &self,
        columns: &str,
        keys: &[String],
        now: DateTime<Utc>,
    ) -> Vec<Statement> {
        keys.chunks(self.chunk_size(1, 1))
            .map(|chunk| {
                let (key_in, mut args) = self.key_in(chunk);
                let sql = format!(
                    "SELECT {} FROM {} WHERE {} AND {}",
                    columns,
                    self.quoted_table(),
                    key_in,
                    self.live_predicate(chunk.len() + 1)
                );
                args.push(Arg::Timestamp(now));
                Statement { sql, args }
            })
            .collect()
    }

    /// 查询存活键的 `(key, value)`
    ///
    /// 键数超过方言的参数上限时拆成多条语句；`keys` 为空时不生成语句。
    pub fn select_live(&self, keys: &[String], now: DateTime<Utc>) -> Vec<Statement> {
        let columns = format!("{}, {}", self.col(COL_KEY), self.col(COL_VALUE));
        self.select_live_columns(&columns, keys, now)
    }

    /// 只查询存活的键，拆分规则同 [`QueryBuilder::select_live`]
    pub fn select_live_keys(&self, keys: &[String], now: DateTime<Utc>) -> Vec<Statement> {
        let columns = self.col(COL_KEY);
        self.select_live_columns(&columns, keys, now)
    }

    /// 多行 upsert，行数超过参数上限时拆成多条语句，调用方需在同一事务中执行
    ///
    /// `now` 同时写入 created_at 和 updated_at；冲突时只覆盖 value、updated_at、expires_at。
    /// `expires_at` 超出可存储范围时按 [`clamp_expires_at`] 截断。
    pub fn upsert(
        &self,
        kvs: &KeyValues,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Vec<Statement> {
        let expires_at = expires_at.map(clamp_expires_at);
        let width = UPSERT_COLUMNS.len();
        let columns = UPSERT_COLUMNS
            .iter()
            .map(|c| self.col(c))
            .collect::<Vec<_>>()
            .join(", ");

        let entries = kvs.iter().collect::<Vec<_>>();
        entries
            .chunks(self.chunk_size(width, 0))
            .map(|chunk| {
                let rows = (0..chunk.len())
                    .map(|row| format!("({})", self.placeholders(row * width + 1, width)))
                    .collect::<Vec<_>>()
                    .join(",");

                let mut args = Vec::with_capacity(chunk.len() * width);
                for (key, value) in chunk {
                    args.push(Arg::Text(key.to_string()));
                    args.push(Arg::Blob(value.to_vec()));
                    args.push(Arg::Timestamp(now));
                    args.push(Arg::Timestamp(now));
                    args.push(Arg::NullableTimestamp(expires_at));
                }

                let sql = format!(
                    "INSERT INTO {} ({}) VALUES {} {}",
                    self.quoted_table(),
                    columns,
                    rows,
                    self.dialect.upsert_clause()
                );
                Statement { sql, args }
            })
            .collect()
    }

    /// 按键删除，拆分规则同 [`QueryBuilder::select_live`]
    pub fn delete(&self, keys: &[String]) -> Vec<Statement> {
        keys.chunks(self.chunk_size(1, 0))
            .map(|chunk| {
                let (key_in, args) = self.key_in(chunk);
                let sql = format!("DELETE FROM {} WHERE {}", self.quoted_table(), key_in);
                Statement { sql, args }
            })
            .collect()
    }
}
