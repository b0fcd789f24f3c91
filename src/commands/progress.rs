// 进度地图命令
// 提供给前端调用的试验日程与进度接口

use crate::app::AppState;
use crate::error::TrialError;
use crate::models::{
    PatientProgress, ProgressSummary, ScheduleDetails, TrialConfiguration, TrialDayView,
};
use serde::{Deserialize, Serialize};

/// 试验配置传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialConfigDto {
    pub trial_day_count: u32,
    pub trial_name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub participants: Option<String>,
    pub created_at: Option<String>,
}

impl From<TrialConfiguration> for TrialConfigDto {
    fn from(config: TrialConfiguration) -> Self {
        Self {
            trial_day_count: config.trial_day_count,
            trial_name: config.details.trial_name,
            description: config.details.description,
            duration: config.details.duration,
            participants: config.details.participants,
            created_at: config.created_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// 进度地图：配置、每天状态与统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMapDto {
    pub config: TrialConfigDto,
    pub days: Vec<TrialDayView>,
    pub summary: ProgressSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteDayArgs {
    pub day: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockScheduleArgs {
    #[serde(alias = "trialDays")]
    pub trial_day_count: u32,
    /// 日程表单的其余字段
    #[serde(flatten)]
    pub details: ScheduleDetails,
}

/// 获取当前试验配置
pub async fn get_trial_config(state: &AppState) -> Result<Option<TrialConfigDto>, String> {
    let config = state.trials.trial_config().map_err(|e| e.to_string())?;
    Ok(config.map(Into::into))
}

/// 获取进度地图
pub async fn get_progress_map(state: &AppState) -> Result<ProgressMapDto, String> {
    let days = state.trials.trial_days().map_err(|e| e.to_string())?;
    let summary = state.trials.summary().map_err(|e| e.to_string())?;
    let config = state
        .trials
        .trial_config()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| TrialError::NoActiveTrial.to_string())?;

    Ok(ProgressMapDto {
        config: config.into(),
        days,
        summary,
    })
}

/// 完成当前天
pub async fn complete_day(state: &AppState, args: CompleteDayArgs) -> Result<PatientProgress, String> {
    state.trials.complete_day(args.day).map_err(|e| e.to_string())
}

/// 协调员锁定新日程（会重置患者进度）
pub async fn lock_schedule(state: &AppState, args: LockScheduleArgs) -> Result<TrialConfigDto, String> {
    let config = state
        .trials
        .lock_new_schedule(args.trial_day_count, args.details)
        .map_err(|e| e.to_string())?;
    Ok(config.into())
}
