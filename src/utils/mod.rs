use std::path::PathBuf;

#[cfg(target_os = "macos")]
const PLATFORM: &str = "macos";

#[cfg(target_os = "windows")]
const PLATFORM: &str = "windows";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM: &str = "linux";

pub fn get_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("trialverse"))
        .unwrap_or_else(|| PathBuf::from(".trialverse"))
}

pub fn get_database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("trialverse.db")
}

pub fn get_platform() -> &'static str {
    PLATFORM
}

pub fn get_arch() -> &'static str {
    std::env::consts::ARCH
}
