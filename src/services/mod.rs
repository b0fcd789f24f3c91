// 服务模块
// 提供核心业务逻辑服务

pub mod centres;
pub mod clock;
pub mod content;
pub mod progress;
pub mod ranking;
pub mod registration;
pub mod state;
pub mod storage;
pub mod wallet;

pub use centres::{all_centres, search_centres};

pub use clock::{clock_ticks, format_tick, ClockTick, DEFAULT_TICK_PERIOD};

pub use content::{ContentService, QuizDraft, VideoUpload};

pub use progress::{
    complete_day,
    derive_trial_days,
    difficulty_tier,
    lock_new_schedule,
    summarize,
    TrialService,
};

pub use ranking::{
    filter_by_condition,
    generate_population,
    RankingService,
    DEFAULT_POPULATION_SIZE,
    DEFAULT_RANKING_LIMIT,
};

pub use registration::{is_wallet_address, RegistrationService};

pub use state::StateStore;

pub use storage::{KeyValueStore, MemoryStore, SqliteStore};

pub use wallet::{WalletSession, WalletStatus};
