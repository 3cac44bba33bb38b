// Command implementations

use anyhow::{Context, Result};
use sqlkv::cfg::parse_duration;
use sqlkv::{KvClient, SetOptions};

use crate::cli::{KeysArgs, SetArgs};

/// Execute the get command
pub async fn execute_get(args: &KeysArgs, kv: &KvClient) -> Result<()> {
    for key in &args.keys {
        let value = kv
            .get(key)
            .await
            .with_context(|| format!("get {}", key))?;
        println!("{}", String::from_utf8_lossy(&value));
    }
    Ok(())
}

/// Execute the mget command
pub async fn execute_mget(args: &KeysArgs, kv: &KvClient) -> Result<()> {
    for value in kv.mget(&args.keys).await? {
        println!("{}", String::from_utf8_lossy(&value));
    }
    Ok(())
}

/// Execute the set command
pub async fn execute_set(args: &SetArgs, kv: &KvClient) -> Result<()> {
    let mut options = SetOptions::new();
    if let Some(ttl) = &args.ttl {
        let ttl = parse_duration(ttl).with_context(|| format!("invalid --ttl {:?}", ttl))?;
        options = options.with_ttl(ttl);
    }

    kv.set(&args.key, args.value.as_bytes(), &options).await?;
    Ok(())
}

/// Execute the del command
pub async fn execute_del(args: &KeysArgs, kv: &KvClient) -> Result<()> {
    kv.mdel(&args.keys).await?;
    Ok(())
}

/// Execute the exists command
pub async fn execute_exists(args: &KeysArgs, kv: &KvClient) -> Result<()> {
    let found = kv.mexists(&args.keys).await?;
    for (key, exists) in args.keys.iter().zip(found) {
        println!("{}\t{}", key, exists);
    }
    Ok(())
}
