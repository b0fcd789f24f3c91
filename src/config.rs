//! 应用配置
//! 默认值可由 `TRIALVERSE_*` 环境变量覆盖

use crate::services::clock::DEFAULT_TICK_PERIOD;
use crate::services::ranking::{DEFAULT_POPULATION_SIZE, DEFAULT_RANKING_LIMIT};
use crate::services::wallet::DEFAULT_CONNECT_DELAY;
use crate::utils;
use anyhow::{bail, Context, Result};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown storage backend '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    pub population_size: usize,
    pub ranking_limit: usize,
    /// 患者池随机种子；为空时每次会话不同
    pub seed: Option<u64>,
    pub clock_enabled: bool,
    pub clock_period: Duration,
    pub wallet_delay: Duration,
    pub log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: utils::get_app_data_dir(),
            storage: StorageBackend::Sqlite,
            population_size: DEFAULT_POPULATION_SIZE,
            ranking_limit: DEFAULT_RANKING_LIMIT,
            seed: None,
            clock_enabled: true,
            clock_period: DEFAULT_TICK_PERIOD,
            wallet_delay: DEFAULT_CONNECT_DELAY,
            log_level: LevelFilter::Info,
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("invalid value for {}: '{}'", key, raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("invalid value for {}: '{}'", key, raw),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("TRIALVERSE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("TRIALVERSE_STORAGE") {
            config.storage = parse("TRIALVERSE_STORAGE", &raw)?;
        }
        if let Some(raw) = lookup("TRIALVERSE_POPULATION_SIZE") {
            config.population_size = parse("TRIALVERSE_POPULATION_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("TRIALVERSE_RANKING_LIMIT") {
            config.ranking_limit = parse("TRIALVERSE_RANKING_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("TRIALVERSE_SEED") {
            config.seed = Some(parse("TRIALVERSE_SEED", &raw)?);
        }
        if let Some(raw) = lookup("TRIALVERSE_CLOCK") {
            config.clock_enabled = parse_bool("TRIALVERSE_CLOCK", &raw)?;
        }
        if let Some(raw) = lookup("TRIALVERSE_CLOCK_PERIOD_MS") {
            let millis: u64 = parse("TRIALVERSE_CLOCK_PERIOD_MS", &raw)?;
            if millis == 0 {
                bail!("TRIALVERSE_CLOCK_PERIOD_MS must be positive");
            }
            config.clock_period = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup("TRIALVERSE_WALLET_DELAY_MS") {
            let millis: u64 = parse("TRIALVERSE_WALLET_DELAY_MS", &raw)?;
            config.wallet_delay = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup("TRIALVERSE_LOG") {
            config.log_level = parse("TRIALVERSE_LOG", &raw)?;
        }

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        utils::get_database_path(&self.data_dir)
    }
}
