pub mod app;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

pub use app::AppState;
pub use config::AppConfig;
pub use error::{TrialError, TrialResult};

use log::info;
use tokio::io::BufReader;
use tokio::sync::mpsc;

/// 启动调用桥，stdin 关闭后退出
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    info!(
        "TrialVerse {} ready on {} ({} synthetic patients)",
        state.version, state.platform, config.population_size
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(bridge::write_lines(tokio::io::stdout(), rx));

    let clock = config
        .clock_enabled
        .then(|| tokio::spawn(bridge::emit_clock(config.clock_period, tx.clone())));

    bridge::serve(&state, BufReader::new(tokio::io::stdin()), tx).await?;

    if let Some(clock) = clock {
        clock.abort();
        let _ = clock.await;
    }
    writer.await??;

    info!("input closed, shutting down");
    Ok(())
}
