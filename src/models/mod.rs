// 数据模型
// 持久化状态结构与派生视图，字段命名与本地存储中的 JSON 保持一致（camelCase）

use crate::error::TrialError;
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ==================== 试验进度 ====================

/// 日程表单中的描述性字段，原样保存
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<String>,
}

impl ScheduleDetails {
    /// 空白字段视为未填写
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            trial_name: keep(self.trial_name),
            description: keep(self.description),
            duration: keep(self.duration),
            participants: keep(self.participants),
        }
    }
}

/// 试验配置，由协调员锁定日程时写入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialConfiguration {
    #[serde(alias = "trialDays", deserialize_with = "lenient_number")]
    pub trial_day_count: u32,
    #[serde(flatten)]
    pub details: ScheduleDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TrialConfiguration {
    pub fn new(trial_day_count: u32) -> Self {
        Self {
            trial_day_count,
            details: ScheduleDetails::default(),
            created_at: None,
        }
    }
}

/// 患者进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProgress {
    #[serde(alias = "currentLevel")]
    pub current_day: u32,
    #[serde(default, alias = "completedLevels")]
    pub completed_days: BTreeSet<u32>,
    /// 完成时授予的星数，完成后不再变化
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stars_earned: BTreeMap<u32, u8>,
}

impl Default for PatientProgress {
    fn default() -> Self {
        Self {
            current_day: 1,
            completed_days: BTreeSet::new(),
            stars_earned: BTreeMap::new(),
        }
    }
}

impl PatientProgress {
    pub fn is_completed(&self, day: u32) -> bool {
        self.completed_days.contains(&day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Locked,
    Current,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
    Boss,
}

/// 进度地图上的一天（派生，不存储）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialDayView {
    pub day_number: u32,
    pub status: DayStatus,
    pub difficulty_tier: DifficultyTier,
    pub stars_earned: u8,
}

/// 进度统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub days_completed: u32,
    pub stars_earned: u32,
    pub current_day: u32,
    pub days_remaining: u32,
}

// ==================== 患者匹配 ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Asthmatic,
    Hypertensive,
    Smoker,
}

impl Condition {
    pub const ALL: [Condition; 3] = [
        Condition::Asthmatic,
        Condition::Hypertensive,
        Condition::Smoker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Asthmatic => "Asthmatic",
            Condition::Hypertensive => "Hypertensive",
            Condition::Smoker => "Smoker",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = TrialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TrialError::NoConditionSelected);
        }
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TrialError::InvalidField {
                field: "condition",
                reason: format!("unknown condition '{}'", trimmed),
            })
    }
}

/// 合成患者，每个会话重新生成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: u32,
    pub display_name: String,
    pub condition: Condition,
    pub distance_km: u32,
}

// ==================== 协调员内容 ====================

fn new_content_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 协调员上传的视频
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorVideo {
    #[serde(default = "new_content_id")]
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub day: u32,
    #[serde(default, alias = "file", deserialize_with = "lenient_text")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// 单题测验，仅比较正确选项下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorQuiz {
    #[serde(default = "new_content_id")]
    pub id: String,
    #[serde(alias = "question")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub day: Option<u32>,
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub correct_answer_index: usize,
}

// ==================== 注册表单 ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoctorRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license: String,
    pub specialization: String,
    pub centre_id: String,
    pub medical_history: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub gender: String,
    pub health_status: String,
    pub medical_history: String,
    pub wallet_address: String,
}

// ==================== 研究中心 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchCentre {
    pub id: u32,
    pub name: String,
    pub location: String,
    pub rating: f32,
    pub specialties: Vec<String>,
    pub active_trials: u32,
}

// ==================== 宽松解码 ====================
// 旧版前端把数字输入框的原始字符串（如 "3"）直接写进存储

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u32),
    Text(String),
}

impl NumberOrText {
    fn into_number<E: serde::de::Error>(self) -> Result<Option<u32>, E> {
        match self {
            NumberOrText::Number(n) => Ok(Some(n)),
            NumberOrText::Text(text) if text.trim().is_empty() => Ok(None),
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("expected a number, found '{}'", text))),
        }
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    NumberOrText::deserialize(deserializer)?
        .into_number()?
        .ok_or_else(|| D::Error::custom("expected a number, found an empty string"))
}

fn lenient_optional_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(value) => value.into_number(),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrOther {
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// 非字符串值（浏览器 File 对象序列化后为 {}）按空字符串处理
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match TextOrOther::deserialize(deserializer)? {
        TextOrOther::Text(text) => text,
        TextOrOther::Other(_) => String::new(),
    })
}
