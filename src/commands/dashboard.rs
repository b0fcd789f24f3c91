// 首页与仪表盘命令：应用信息、钱包、研究中心

use crate::app::AppState;
use crate::models::ResearchCentre;
use crate::services::{self, WalletStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoDto {
    pub version: String,
    pub platform: String,
    pub arch: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCentresArgs {
    #[serde(default)]
    pub query: String,
}

pub async fn get_app_info(state: &AppState) -> Result<AppInfoDto, String> {
    Ok(AppInfoDto {
        version: state.version.clone(),
        platform: state.platform.clone(),
        arch: crate::utils::get_arch().to_string(),
    })
}

pub async fn wallet_status(state: &AppState) -> Result<WalletStatus, String> {
    Ok(state.wallet.status().await)
}

pub async fn connect_wallet(state: &AppState) -> Result<WalletStatus, String> {
    Ok(state.wallet.connect().await)
}

pub async fn disconnect_wallet(state: &AppState) -> Result<WalletStatus, String> {
    Ok(state.wallet.disconnect().await)
}

pub async fn toggle_wallet(state: &AppState) -> Result<WalletStatus, String> {
    Ok(state.wallet.toggle().await)
}

pub async fn search_centres(args: SearchCentresArgs) -> Result<Vec<ResearchCentre>, String> {
    Ok(services::search_centres(&args.query))
}
