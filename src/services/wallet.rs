// 模拟钱包连接
// 仅保存在内存中，连接时模拟一次网络延迟

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub connected: bool,
    pub address: Option<String>,
}

fn mock_address() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}

pub struct WalletSession {
    status: Mutex<WalletStatus>,
    connect_delay: Duration,
}

impl WalletSession {
    pub fn new(connect_delay: Duration) -> Self {
        Self {
            status: Mutex::new(WalletStatus::default()),
            connect_delay,
        }
    }

    pub async fn status(&self) -> WalletStatus {
        self.status.lock().await.clone()
    }

    /// 已连接时直接返回当前状态
    pub async fn connect(&self) -> WalletStatus {
        {
            let status = self.status.lock().await;
            if status.connected {
                return status.clone();
            }
        }

        tokio::time::sleep(self.connect_delay).await;

        let mut status = self.status.lock().await;
        if !status.connected {
            *status = WalletStatus {
                connected: true,
                address: Some(mock_address()),
            };
            log::info!("wallet connected");
        }
        status.clone()
    }

    pub async fn disconnect(&self) -> WalletStatus {
        let mut status = self.status.lock().await;
        *status = WalletStatus::default();
        status.clone()
    }

    pub async fn toggle(&self) -> WalletStatus {
        if self.status().await.connected {
            self.disconnect().await
        } else {
            self.connect().await
        }
    }
}
