// 命令模块
// 提供供前端调用的命令接口，invoke 按命令名分发 JSON 参数

pub mod content;
pub mod dashboard;
pub mod progress;
pub mod ranking;
pub mod registration;

pub use progress::{
    complete_day,
    get_progress_map,
    get_trial_config,
    lock_schedule,
    CompleteDayArgs,
    LockScheduleArgs,
    ProgressMapDto,
    TrialConfigDto,
};

pub use ranking::{find_patients, get_population, regenerate_population, FindPatientsArgs};

pub use content::{
    check_answer,
    list_quizzes,
    list_videos,
    save_quiz,
    upload_video,
    CheckAnswerArgs,
    DayFilterArgs,
    SaveQuizArgs,
    UploadVideoArgs,
    VideoDto,
};

pub use registration::{
    join_as_doctor,
    join_as_patient,
    submit_doctor_registration,
    submit_patient_registration,
    NavigationDto,
};

pub use dashboard::{
    connect_wallet,
    disconnect_wallet,
    get_app_info,
    search_centres,
    toggle_wallet,
    wallet_status,
    AppInfoDto,
    SearchCentresArgs,
};

use crate::app::AppState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// 缺省参数按空对象处理
fn args<T: DeserializeOwned>(raw: Value) -> Result<T, String> {
    let raw = if raw.is_null() {
        Value::Object(Default::default())
    } else {
        raw
    };
    serde_json::from_value(raw).map_err(|e| format!("invalid arguments: {}", e))
}

fn reply<T: Serialize>(result: Result<T, String>) -> Result<Value, String> {
    result.and_then(|value| serde_json::to_value(value).map_err(|e| e.to_string()))
}

/// 按命令名分发
pub async fn invoke(state: &AppState, cmd: &str, raw: Value) -> Result<Value, String> {
    match cmd {
        // 进度地图
        "get_trial_config" => reply(get_trial_config(state).await),
        "get_progress_map" => reply(get_progress_map(state).await),
        "complete_day" => reply(complete_day(state, args(raw)?).await),
        "lock_schedule" => reply(lock_schedule(state, args(raw)?).await),
        // 患者匹配
        "find_patients" => reply(find_patients(state, args(raw)?).await),
        "get_population" => reply(get_population(state).await),
        "regenerate_population" => reply(regenerate_population(state).await),
        // 视频与测验
        "upload_video" => reply(upload_video(state, args(raw)?).await),
        "list_videos" => reply(list_videos(state, args(raw)?).await),
        "save_quiz" => reply(save_quiz(state, args(raw)?).await),
        "list_quizzes" => reply(list_quizzes(state, args(raw)?).await),
        "check_answer" => reply(check_answer(state, args(raw)?).await),
        // 注册
        "submit_doctor_registration" => reply(submit_doctor_registration(state, args(raw)?).await),
        "submit_patient_registration" => reply(submit_patient_registration(state, args(raw)?).await),
        "join_as_doctor" => reply(join_as_doctor(state).await),
        "join_as_patient" => reply(join_as_patient(state).await),
        // 仪表盘
        "get_app_info" => reply(get_app_info(state).await),
        "wallet_status" => reply(wallet_status(state).await),
        "connect_wallet" => reply(connect_wallet(state).await),
        "disconnect_wallet" => reply(disconnect_wallet(state).await),
        "toggle_wallet" => reply(toggle_wallet(state).await),
        "search_centres" => reply(search_centres(args(raw)?).await),
        other => Err(format!("unknown command: {}", other)),
    }
}
