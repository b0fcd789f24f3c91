use trialverse::{logging, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    logging::init(config.log_level)?;

    trialverse::run(config).await
}
