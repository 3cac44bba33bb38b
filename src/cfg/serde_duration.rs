use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

pub use serde_with::{serde_as, DeserializeAs, SerializeAs};

/// 可读的时长格式，如 "500ms"、"30s"、"3m"、"1h30m"
///
/// 用于配置中的连接生命周期、获取连接超时等字段：
/// ```ignore
/// #[serde_as(as = "HumanDur")]
/// pub max_lifetime: Duration,
/// ```
pub struct HumanDur;

impl SerializeAs<Duration> for HumanDur {
    fn serialize_as<S>(source: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*source))
    }
}

impl<'de> DeserializeAs<'de, Duration> for HumanDur {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3_600 * 1_000_000_000),
        "d" => Some(86_400 * 1_000_000_000),
        _ => None,
    }
}

/// 解析时长字符串，由若干 `<整数><单位>` 片段组成
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(anyhow!("empty duration"));
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(anyhow!("expected a number in duration {:?}", s));
        }
        let value: u128 = rest[..digits]
            .parse()
            .map_err(|_| anyhow!("invalid number in duration {:?}", s))?;
        rest = &rest[digits..];

        let letters = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = &rest[..letters];
        let nanos = unit_nanos(unit)
            .ok_or_else(|| anyhow!("unknown unit {:?} in duration {:?}", unit, s))?;
        rest = &rest[letters..];

        total = value
            .checked_mul(nanos)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(|| anyhow!("duration {:?} out of range", s))?;
    }

    let secs = u64::try_from(total / 1_000_000_000)
        .map_err(|_| anyhow!("duration {:?} out of range", s))?;
    Ok(Duration::new(secs, (total % 1_000_000_000) as u32))
}

/// 格式化为最简的可读形式，与 `parse_duration` 互逆
pub fn format_duration(duration: Duration) -> String {
    let mut nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for unit in ["d", "h", "m", "s", "ms", "us", "ns"] {
        let size = unit_nanos(unit).unwrap_or(1);
        if nanos >= size {
            out.push_str(&format!("{}{}", nanos / size, unit));
            nanos %= size;
        }
    }
    out
}
