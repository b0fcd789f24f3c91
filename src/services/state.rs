// 持久化状态
// 按固定键读写 JSON 值；解码失败视为缺失
// 列表按元素解码，追加时保留无法识别的旧元素

use crate::error::{TrialError, TrialResult};
use crate::models::{
    DoctorQuiz, DoctorRegistration, DoctorVideo, PatientProgress, PatientRegistration,
    TrialConfiguration,
};
use crate::services::storage::{KeyValueStore, KvWrite, MemoryStore};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const TRIAL_CONFIG_KEY: &str = "trialConfig";
pub const PATIENT_PROGRESS_KEY: &str = "patientProgress";
pub const DOCTOR_VIDEOS_KEY: &str = "doctorVideos";
pub const DOCTOR_QUIZZES_KEY: &str = "doctorQuizzes";
pub const DOCTOR_REGISTRATION_KEY: &str = "doctorRegistration";
pub const PATIENT_REGISTRATION_KEY: &str = "patientRegistration";

/// 类型化状态存储
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn KeyValueStore>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> TrialResult<Option<T>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("ignoring undecodable value under '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> TrialResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)
    }

    /// 逐个元素解码，跳过无法识别的元素
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> TrialResult<Vec<T>> {
        let Some(entries) = self.read::<Vec<Value>>(key)? else {
            return Ok(Vec::new());
        };

        let items = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("skipping entry {} under '{}': {}", idx, key, e);
                    None
                }
            })
            .collect();
        Ok(items)
    }

    /// 在原始数组末尾追加；已有值不是 JSON 数组时拒绝写入，避免覆盖
    fn append<T: Serialize>(&self, key: &str, item: &T) -> TrialResult<()> {
        let mut entries: Vec<Value> = match self.backend.get(key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| TrialError::CorruptState {
                key: key.to_string(),
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };

        entries.push(serde_json::to_value(item)?);
        self.write(key, &entries)
    }

    // ==================== 试验配置与进度 ====================

    pub fn trial_config(&self) -> TrialResult<Option<TrialConfiguration>> {
        self.read(TRIAL_CONFIG_KEY)
    }

    /// 缺失时返回初始进度
    pub fn patient_progress(&self) -> TrialResult<PatientProgress> {
        Ok(self.read(PATIENT_PROGRESS_KEY)?.unwrap_or_default())
    }

    pub fn save_patient_progress(&self, progress: &PatientProgress) -> TrialResult<()> {
        self.write(PATIENT_PROGRESS_KEY, progress)
    }

    // ==================== 视频与测验 ====================

    pub fn doctor_videos(&self) -> TrialResult<Vec<DoctorVideo>> {
        self.read_list(DOCTOR_VIDEOS_KEY)
    }

    pub fn append_doctor_video(&self, video: &DoctorVideo) -> TrialResult<()> {
        self.append(DOCTOR_VIDEOS_KEY, video)
    }

    pub fn doctor_quizzes(&self) -> TrialResult<Vec<DoctorQuiz>> {
        self.read_list(DOCTOR_QUIZZES_KEY)
    }

    pub fn append_doctor_quiz(&self, quiz: &DoctorQuiz) -> TrialResult<()> {
        self.append(DOCTOR_QUIZZES_KEY, quiz)
    }

    /// 新日程：写入配置与初始进度，并清除按天编号的内容，一次提交
    pub fn reset_schedule(
        &self,
        config: &TrialConfiguration,
        progress: &PatientProgress,
    ) -> TrialResult<()> {
        self.backend.apply(&[
            KvWrite::set(TRIAL_CONFIG_KEY, serde_json::to_string(config)?),
            KvWrite::set(PATIENT_PROGRESS_KEY, serde_json::to_string(progress)?),
            KvWrite::remove(DOCTOR_VIDEOS_KEY),
            KvWrite::remove(DOCTOR_QUIZZES_KEY),
        ])
    }

    // ==================== 注册信息 ====================

    pub fn doctor_registration(&self) -> TrialResult<Option<DoctorRegistration>> {
        self.read(DOCTOR_REGISTRATION_KEY)
    }

    pub fn save_doctor_registration(&self, form: &DoctorRegistration) -> TrialResult<()> {
        self.write(DOCTOR_REGISTRATION_KEY, form)
    }

    pub fn patient_registration(&self) -> TrialResult<Option<PatientRegistration>> {
        self.read(PATIENT_REGISTRATION_KEY)
    }

    pub fn save_patient_registration(&self, form: &PatientRegistration) -> TrialResult<()> {
        self.write(PATIENT_REGISTRATION_KEY, form)
    }
}
