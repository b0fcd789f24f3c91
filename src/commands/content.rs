// 视频与测验命令

use crate::app::AppState;
use crate::models::{DoctorQuiz, DoctorVideo};
use crate::services::{QuizDraft, VideoUpload};
use serde::{Deserialize, Serialize};

/// 视频传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub day: u32,
    pub url: String,
    pub size: Option<u64>,
    pub uploaded_at: Option<String>,
}

impl From<DoctorVideo> for VideoDto {
    fn from(video: DoctorVideo) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            day: video.day,
            url: video.url,
            size: video.size,
            uploaded_at: video.uploaded_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// 视频上传表单（前端传入）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoArgs {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default, alias = "file")]
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl From<UploadVideoArgs> for VideoUpload {
    fn from(args: UploadVideoArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            day: args.day,
            url: args.url,
            size: args.size,
        }
    }
}

/// 测验表单（前端传入）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuizArgs {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "correctAnswer")]
    pub correct_answer_index: usize,
}

impl From<SaveQuizArgs> for QuizDraft {
    fn from(args: SaveQuizArgs) -> Self {
        Self {
            title: args.title,
            day: args.day,
            options: args.options,
            correct_answer_index: args.correct_answer_index,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFilterArgs {
    #[serde(default)]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerArgs {
    pub quiz_id: String,
    pub selected_index: usize,
}

/// 上传视频
pub async fn upload_video(state: &AppState, args: UploadVideoArgs) -> Result<VideoDto, String> {
    let video = state
        .content
        .add_video(args.into())
        .map_err(|e| e.to_string())?;
    Ok(video.into())
}

/// 列出视频，可按天过滤
pub async fn list_videos(state: &AppState, args: DayFilterArgs) -> Result<Vec<VideoDto>, String> {
    let videos = match args.day {
        Some(day) => state.content.videos_for_day(day),
        None => state.content.list_videos(),
    }
    .map_err(|e| e.to_string())?;

    Ok(videos.into_iter().map(Into::into).collect())
}

/// 保存测验
pub async fn save_quiz(state: &AppState, args: SaveQuizArgs) -> Result<DoctorQuiz, String> {
    state.content.add_quiz(args.into()).map_err(|e| e.to_string())
}

/// 列出测验，可按天过滤
pub async fn list_quizzes(state: &AppState, args: DayFilterArgs) -> Result<Vec<DoctorQuiz>, String> {
    match args.day {
        Some(day) => state.content.quizzes_for_day(day),
        None => state.content.list_quizzes(),
    }
    .map_err(|e| e.to_string())
}

/// 提交答案
pub async fn check_answer(state: &AppState, args: CheckAnswerArgs) -> Result<bool, String> {
    state
        .content
        .check_answer(&args.quiz_id, args.selected_index)
        .map_err(|e| e.to_string())
}
