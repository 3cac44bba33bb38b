// CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kv")]
#[command(author = "hatlonely <hatlonely@foxmail.com>")]
#[command(version = "0.1.0")]
#[command(about = "Key-value store on top of SQLite or MySQL", long_about = None)]
pub struct Cli {
    /// Driver to use: sqlite or mysql
    #[arg(short, long, global = true, default_value = "sqlite")]
    pub driver: String,

    /// Connection target (sqlite file path, or mysql URL / DSN)
    #[arg(long, global = true)]
    pub dsn: Option<String>,

    /// Path to a config file (json/yaml/toml); overrides --driver and --dsn
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Table name (default: key_values)
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the values of one or more keys, failing on the first missing key
    Get(KeysArgs),
    /// Print the live values among the given keys (in storage order)
    Mget(KeysArgs),
    /// Set a key
    Set(SetArgs),
    /// Delete keys
    Del(KeysArgs),
    /// Print true/false for each key
    Exists(KeysArgs),
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Keys
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Key
    pub key: String,

    /// Value
    pub value: String,

    /// Expire after this long (e.g. 30s, 10m, 1h30m)
    #[arg(long)]
    pub ttl: Option<String>,
}

impl Cli {
    /// Default connection target for the selected driver
    pub fn default_dsn(driver: &str) -> &'static str {
        match driver {
            "mysql" => "root:toor@tcp(127.0.0.1:3306)/gokv",
            _ => "sqlite.db",
        }
    }
}
