// 患者匹配命令

use crate::app::AppState;
use crate::error::TrialError;
use crate::models::{Condition, Patient};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPatientsArgs {
    #[serde(default)]
    pub condition: Option<String>,
}

/// 空字符串与缺失同样视为未选择条件
fn parse_condition(raw: Option<&str>) -> Result<Option<Condition>, TrialError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some),
    }
}

/// 按条件查找候选患者
pub async fn find_patients(state: &AppState, args: FindPatientsArgs) -> Result<Vec<Patient>, String> {
    let condition = parse_condition(args.condition.as_deref()).map_err(|e| e.to_string())?;
    state
        .ranking
        .find_patients(condition)
        .map_err(|e| e.to_string())
}

/// 获取本次会话的患者池
pub async fn get_population(state: &AppState) -> Result<Vec<Patient>, String> {
    state.ranking.population().map_err(|e| e.to_string())
}

/// 重新生成患者池，返回人数
pub async fn regenerate_population(state: &AppState) -> Result<usize, String> {
    state.ranking.regenerate().map_err(|e| e.to_string())
}
