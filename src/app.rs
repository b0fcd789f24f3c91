//! 应用状态
//! 各服务共享同一个状态存储；患者池与钱包只存在于本次会话

use crate::config::{AppConfig, StorageBackend};
use crate::services::{
    ContentService, KeyValueStore, MemoryStore, RankingService, RegistrationService,
    SqliteStore, StateStore, TrialService, WalletSession,
};
use anyhow::Context;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

pub struct AppState {
    pub version: String,
    pub platform: String,
    pub trials: TrialService,
    pub content: ContentService,
    pub registration: RegistrationService,
    pub ranking: RankingService,
    pub wallet: WalletSession,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let backend: Arc<dyn KeyValueStore> = match config.storage {
            StorageBackend::Sqlite => {
                let path = config.database_path();
                let store = SqliteStore::open(&path)
                    .with_context(|| format!("failed to open database at {}", path.display()))?;
                info!("using sqlite state at {}", path.display());
                Arc::new(store)
            }
            StorageBackend::Memory => {
                info!("using in-memory state");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, StateStore::new(backend)))
    }

    pub fn with_store(config: &AppConfig, state: StateStore) -> Self {
        // 星数与患者池使用不同的随机序列
        let star_rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: crate::utils::get_platform().to_string(),
            trials: TrialService::new(state.clone(), star_rng),
            content: ContentService::new(state.clone()),
            registration: RegistrationService::new(state),
            ranking: RankingService::new(config.population_size, config.ranking_limit, config.seed),
            wallet: WalletSession::new(config.wallet_delay),
        }
    }

    /// 测试与演示用的内存状态
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::with_store(config, StateStore::in_memory())
    }
}
