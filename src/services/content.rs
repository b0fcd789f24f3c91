// 协调员内容服务
// 视频与测验按天编号保存，供患者端读取

use crate::error::{TrialError, TrialResult};
use crate::models::{DoctorQuiz, DoctorVideo};
use crate::services::state::StateStore;
use chrono::Utc;
use log::info;
use uuid::Uuid;

/// 视频上传表单
#[derive(Debug, Clone, Default)]
pub struct VideoUpload {
    pub title: String,
    pub description: Option<String>,
    pub day: Option<u32>,
    pub url: String,
    pub size: Option<u64>,
}

/// 测验表单
#[derive(Debug, Clone, Default)]
pub struct QuizDraft {
    pub title: String,
    pub day: Option<u32>,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
}

fn require(value: &str, field: &'static str) -> TrialResult<()> {
    if value.trim().is_empty() {
        Err(TrialError::MissingRequiredField(field))
    } else {
        Ok(())
    }
}

fn check_day(day: u32) -> TrialResult<()> {
    if day == 0 {
        return Err(TrialError::InvalidField {
            field: "day",
            reason: "days are numbered from 1".to_string(),
        });
    }
    Ok(())
}

pub struct ContentService {
    state: StateStore,
}

impl ContentService {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    // ==================== 视频 ====================

    pub fn add_video(&self, upload: VideoUpload) -> TrialResult<DoctorVideo> {
        require(&upload.title, "title")?;
        require(&upload.url, "file")?;
        let day = upload.day.ok_or(TrialError::MissingRequiredField("day"))?;
        check_day(day)?;

        let video = DoctorVideo {
            id: Uuid::new_v4().to_string(),
            title: upload.title.trim().to_string(),
            description: upload.description.filter(|d| !d.trim().is_empty()),
            day,
            url: upload.url,
            size: upload.size,
            uploaded_at: Some(Utc::now()),
        };

        self.state.append_doctor_video(&video)?;

        info!("video '{}' added for day {}", video.title, video.day);
        Ok(video)
    }

    pub fn list_videos(&self) -> TrialResult<Vec<DoctorVideo>> {
        self.state.doctor_videos()
    }

    pub fn videos_for_day(&self, day: u32) -> TrialResult<Vec<DoctorVideo>> {
        Ok(self
            .state
            .doctor_videos()?
            .into_iter()
            .filter(|v| v.day == day)
            .collect())
    }

    // ==================== 测验 ====================

    pub fn add_quiz(&self, draft: QuizDraft) -> TrialResult<DoctorQuiz> {
        require(&draft.title, "title")?;
        if let Some(day) = draft.day {
            check_day(day)?;
        }

        let options: Vec<String> = draft
            .options
            .into_iter()
            .map(|o| o.trim().to_string())
            .collect();
        if options.len() < 2 || options.iter().any(|o| o.is_empty()) {
            return Err(TrialError::InvalidField {
                field: "options",
                reason: "a quiz needs at least two non-empty options".to_string(),
            });
        }
        if draft.correct_answer_index >= options.len() {
            return Err(TrialError::InvalidField {
                field: "correctAnswerIndex",
                reason: format!(
                    "index {} is out of range for {} options",
                    draft.correct_answer_index,
                    options.len()
                ),
            });
        }

        let quiz = DoctorQuiz {
            id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            day: draft.day,
            options,
            correct_answer_index: draft.correct_answer_index,
        };

        self.state.append_doctor_quiz(&quiz)?;

        info!("quiz '{}' saved", quiz.title);
        Ok(quiz)
    }

    pub fn list_quizzes(&self) -> TrialResult<Vec<DoctorQuiz>> {
        self.state.doctor_quizzes()
    }

    /// 未指定天数的测验对每一天都可见
    pub fn quizzes_for_day(&self, day: u32) -> TrialResult<Vec<DoctorQuiz>> {
        Ok(self
            .state
            .doctor_quizzes()?
            .into_iter()
            .filter(|q| q.day.map_or(true, |d| d == day))
            .collect())
    }

    /// 判题：仅比较选项下标
    pub fn check_answer(&self, quiz_id: &str, selected_index: usize) -> TrialResult<bool> {
        let quiz = self
            .state
            .doctor_quizzes()?
            .into_iter()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| TrialError::NotFound(format!("quiz {}", quiz_id)))?;

        Ok(quiz.correct_answer_index == selected_index)
    }
}
