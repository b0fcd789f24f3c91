//! 试验进度引擎
//! 由试验配置与患者进度派生进度地图，并提供唯一的状态迁移"完成当天"

use crate::error::{TrialError, TrialResult};
use crate::models::{
    DayStatus, DifficultyTier, PatientProgress, ProgressSummary, ScheduleDetails,
    TrialConfiguration, TrialDayView,
};
use crate::services::state::StateStore;
use chrono::Utc;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Mutex;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 3;

/// 旧数据中已完成但没有星数记录的天
const UNRECORDED_STARS: u8 = MIN_STARS;

/// 难度仅由天数决定，按 Boss > Hard > Medium > Easy 的优先级判定
pub fn difficulty_tier(day: u32) -> DifficultyTier {
    if day % 5 == 0 {
        DifficultyTier::Boss
    } else if day % 3 == 0 {
        DifficultyTier::Hard
    } else if day % 2 == 0 {
        DifficultyTier::Medium
    } else {
        DifficultyTier::Easy
    }
}

fn active_day_count(config: Option<&TrialConfiguration>) -> TrialResult<u32> {
    match config {
        Some(c) if c.trial_day_count > 0 => Ok(c.trial_day_count),
        _ => Err(TrialError::NoActiveTrial),
    }
}

fn stars_for(progress: &PatientProgress, day: u32) -> u8 {
    if !progress.is_completed(day) {
        return 0;
    }
    progress
        .stars_earned
        .get(&day)
        .copied()
        .unwrap_or(UNRECORDED_STARS)
}

/// 派生进度地图
pub fn derive_trial_days(
    config: Option<&TrialConfiguration>,
    progress: &PatientProgress,
) -> TrialResult<Vec<TrialDayView>> {
    let day_count = active_day_count(config)?;

    let days = (1..=day_count)
        .map(|day| {
            let status = if progress.is_completed(day) {
                DayStatus::Completed
            } else if day == progress.current_day {
                DayStatus::Current
            } else {
                DayStatus::Locked
            };

            TrialDayView {
                day_number: day,
                status,
                difficulty_tier: difficulty_tier(day),
                stars_earned: stars_for(progress, day),
            }
        })
        .collect();

    Ok(days)
}

/// 完成当天：只允许完成当前天，星数在此刻确定
pub fn complete_day<R: Rng + ?Sized>(
    progress: &PatientProgress,
    day: u32,
    trial_day_count: u32,
    rng: &mut R,
) -> TrialResult<PatientProgress> {
    if day != progress.current_day
        || progress.is_completed(day)
        || day == 0
        || day > trial_day_count
    {
        return Err(TrialError::InvalidTransition {
            day,
            current_day: progress.current_day,
        });
    }

    let mut next = progress.clone();
    next.completed_days.insert(day);
    next.stars_earned
        .insert(day, rng.gen_range(MIN_STARS..=MAX_STARS));
    next.current_day = (day + 1).min(trial_day_count);

    Ok(next)
}

/// 当前天不在 1..=天数 内时（损坏或旧数据），回退到第一个未完成的天
pub fn normalize_progress(progress: PatientProgress, trial_day_count: u32) -> PatientProgress {
    if trial_day_count == 0 || (1..=trial_day_count).contains(&progress.current_day) {
        return progress;
    }

    let current_day = (1..=trial_day_count)
        .find(|day| !progress.is_completed(*day))
        .unwrap_or(trial_day_count);
    warn!(
        "stored current day {} is outside 1..={}, using day {}",
        progress.current_day, trial_day_count, current_day
    );

    PatientProgress {
        current_day,
        ..progress
    }
}

/// 锁定新日程，无条件重置进度
pub fn lock_new_schedule(
    new_day_count: u32,
) -> TrialResult<(TrialConfiguration, PatientProgress)> {
    if new_day_count == 0 {
        return Err(TrialError::InvalidField {
            field: "trialDayCount",
            reason: "a trial needs at least one day".to_string(),
        });
    }

    Ok((
        TrialConfiguration::new(new_day_count),
        PatientProgress::default(),
    ))
}

/// 进度统计
pub fn summarize(
    config: Option<&TrialConfiguration>,
    progress: &PatientProgress,
) -> TrialResult<ProgressSummary> {
    let day_count = active_day_count(config)?;

    let completed: Vec<u32> = progress
        .completed_days
        .iter()
        .copied()
        .filter(|day| *day >= 1 && *day <= day_count)
        .collect();

    let stars_earned = completed
        .iter()
        .map(|day| u32::from(stars_for(progress, *day)))
        .sum();
    let days_completed = completed.len() as u32;

    Ok(ProgressSummary {
        days_completed,
        stars_earned,
        current_day: progress.current_day,
        days_remaining: day_count - days_completed,
    })
}

// ==================== 持久化服务 ====================

/// 进度服务：在状态存储之上执行进度引擎
pub struct TrialService {
    state: StateStore,
    rng: Mutex<StdRng>,
}

impl TrialService {
    pub fn new(state: StateStore, rng: StdRng) -> Self {
        Self {
            state,
            rng: Mutex::new(rng),
        }
    }

    pub fn trial_config(&self) -> TrialResult<Option<TrialConfiguration>> {
        self.state.trial_config()
    }

    /// 读取配置与进度，进度按当前天数校正
    fn load(&self) -> TrialResult<(TrialConfiguration, PatientProgress)> {
        let config = self.state.trial_config()?;
        let day_count = active_day_count(config.as_ref())?;
        let progress = normalize_progress(self.state.patient_progress()?, day_count);
        Ok((config.ok_or(TrialError::NoActiveTrial)?, progress))
    }

    pub fn progress(&self) -> TrialResult<PatientProgress> {
        match self.load() {
            Ok((_, progress)) => Ok(progress),
            Err(TrialError::NoActiveTrial) => self.state.patient_progress(),
            Err(e) => Err(e),
        }
    }

    pub fn trial_days(&self) -> TrialResult<Vec<TrialDayView>> {
        let (config, progress) = self.load()?;
        derive_trial_days(Some(&config), &progress)
    }

    pub fn summary(&self) -> TrialResult<ProgressSummary> {
        let (config, progress) = self.load()?;
        summarize(Some(&config), &progress)
    }

    /// 完成指定天并持久化
    pub fn complete_day(&self, day: u32) -> TrialResult<PatientProgress> {
        let (config, progress) = self.load()?;
        let day_count = config.trial_day_count;

        let next = {
            let mut rng = self.rng.lock().map_err(|_| TrialError::LockPoisoned)?;
            complete_day(&progress, day, day_count, &mut *rng)?
        };

        self.state.save_patient_progress(&next)?;
        info!(
            "day {} completed with {} star(s), current day now {}",
            day,
            next.stars_earned.get(&day).copied().unwrap_or_default(),
            next.current_day
        );

        Ok(next)
    }

    /// 锁定新日程：写入配置、重置进度、清除按天内容（同一批次提交）
    pub fn lock_new_schedule(
        &self,
        new_day_count: u32,
        details: ScheduleDetails,
    ) -> TrialResult<TrialConfiguration> {
        let (mut config, progress) = lock_new_schedule(new_day_count)?;
        config.details = details.normalized();
        config.created_at = Some(Utc::now());

        self.state.reset_schedule(&config, &progress)?;

        info!(
            "schedule locked: {} day(s), patient progress reset",
            config.trial_day_count
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DoctorVideo;
    use crate::services::state::{PATIENT_PROGRESS_KEY, TRIAL_CONFIG_KEY};
    use crate::services::storage::{KeyValueStore, KvWrite, MemoryStore};
    use rand::SeedableRng;
    use std::sync::Arc;

    fn named(name: &str) -> ScheduleDetails {
        ScheduleDetails {
            trial_name: Some(name.to_string()),
            ..ScheduleDetails::default()
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn progress(current_day: u32, completed: &[u32]) -> PatientProgress {
        PatientProgress {
            current_day,
            completed_days: completed.iter().copied().collect(),
            ..PatientProgress::default()
        }
    }

    #[test]
    fn test_fresh_progress_has_single_current_day() {
        for count in 1..=12 {
            let config = TrialConfiguration::new(count);
            let days = derive_trial_days(Some(&config), &PatientProgress::default()).unwrap();

            assert_eq!(days.len(), count as usize);
            assert_eq!(days[0].status, DayStatus::Current);
            assert!(days[1..].iter().all(|d| d.status == DayStatus::Locked));
            assert!(days.iter().all(|d| d.stars_earned == 0));
        }
    }

    #[test]
    fn test_no_active_trial() {
        let progress = PatientProgress::default();

        assert!(matches!(
            derive_trial_days(None, &progress),
            Err(TrialError::NoActiveTrial)
        ));
        assert!(matches!(
            derive_trial_days(Some(&TrialConfiguration::new(0)), &progress),
            Err(TrialError::NoActiveTrial)
        ));
        assert!(matches!(summarize(None, &progress), Err(TrialError::NoActiveTrial)));
    }

    #[test]
    fn test_difficulty_tiers() {
        assert_eq!(difficulty_tier(15), DifficultyTier::Boss);
        assert_eq!(difficulty_tier(10), DifficultyTier::Boss);
        assert_eq!(difficulty_tier(9), DifficultyTier::Hard);
        assert_eq!(difficulty_tier(6), DifficultyTier::Hard);
        assert_eq!(difficulty_tier(4), DifficultyTier::Medium);
        assert_eq!(difficulty_tier(7), DifficultyTier::Easy);
        assert_eq!(difficulty_tier(1), DifficultyTier::Easy);
    }

    #[test]
    fn test_five_day_scenario() {
        let config = TrialConfiguration::new(5);
        let days = derive_trial_days(Some(&config), &progress(3, &[1, 2])).unwrap();

        let statuses: Vec<DayStatus> = days.iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![
                DayStatus::Completed,
                DayStatus::Completed,
                DayStatus::Current,
                DayStatus::Locked,
                DayStatus::Locked,
            ]
        );

        let tiers: Vec<DifficultyTier> = days.iter().map(|d| d.difficulty_tier).collect();
        assert_eq!(
            tiers,
            vec![
                DifficultyTier::Easy,
                DifficultyTier::Medium,
                DifficultyTier::Hard,
                DifficultyTier::Medium,
                DifficultyTier::Boss,
            ]
        );
    }

    #[test]
    fn test_complete_day_advances() {
        let mut rng = rng();
        let next = complete_day(&progress(3, &[1, 2]), 3, 5, &mut rng).unwrap();

        assert!(next.is_completed(3));
        assert_eq!(next.current_day, 4);
        let stars = next.stars_earned[&3];
        assert!((MIN_STARS..=MAX_STARS).contains(&stars));
    }

    #[test]
    fn test_complete_last_day_saturates() {
        let mut rng = rng();
        let next = complete_day(&progress(5, &[1, 2, 3, 4]), 5, 5, &mut rng).unwrap();

        assert_eq!(next.current_day, 5);
        assert_eq!(next.completed_days.len(), 5);

        let days = derive_trial_days(Some(&TrialConfiguration::new(5)), &next).unwrap();
        assert!(days.iter().all(|d| d.status == DayStatus::Completed));

        // 已完成的最后一天不能再次完成
        assert!(matches!(
            complete_day(&next, 5, 5, &mut rng),
            Err(TrialError::InvalidTransition { day: 5, current_day: 5 })
        ));
    }

    #[test]
    fn test_complete_non_current_day_is_rejected() {
        let mut rng = rng();
        let before = progress(3, &[1, 2]);

        for day in [0, 1, 2, 4, 5, 6] {
            let result = complete_day(&before, day, 5, &mut rng);
            assert!(matches!(result, Err(TrialError::InvalidTransition { .. })));
        }
        assert_eq!(before, progress(3, &[1, 2]));
    }

    #[test]
    fn test_stars_are_stable_across_derivations() {
        let mut rng = rng();
        let config = TrialConfiguration::new(5);
        let mut p = PatientProgress::default();
        for day in 1..=3 {
            p = complete_day(&p, day, 5, &mut rng).unwrap();
        }

        let first = derive_trial_days(Some(&config), &p).unwrap();
        let second = derive_trial_days(Some(&config), &p).unwrap();
        assert_eq!(first, second);
        for view in &first[..3] {
            assert_eq!(view.stars_earned, p.stars_earned[&view.day_number]);
        }
    }

    #[test]
    fn test_unrecorded_stars_fall_back_to_minimum() {
        let config = TrialConfiguration::new(5);
        let days = derive_trial_days(Some(&config), &progress(3, &[1, 2])).unwrap();

        assert_eq!(days[0].stars_earned, UNRECORDED_STARS);
        assert_eq!(days[2].stars_earned, 0);
    }

    #[test]
    fn test_lock_new_schedule_resets_progress() {
        let (config, progress) = lock_new_schedule(20).unwrap();

        assert_eq!(config.trial_day_count, 20);
        assert_eq!(progress.current_day, 1);
        assert!(progress.completed_days.is_empty());
        assert!(progress.stars_earned.is_empty());

        assert!(matches!(
            lock_new_schedule(0),
            Err(TrialError::InvalidField { field: "trialDayCount", .. })
        ));
    }

    #[test]
    fn test_summary() {
        let mut p = progress(4, &[1, 2, 3]);
        p.stars_earned.insert(1, 3);
        p.stars_earned.insert(2, 2);

        let summary = summarize(Some(&TrialConfiguration::new(15)), &p).unwrap();
        assert_eq!(summary.days_completed, 3);
        assert_eq!(summary.stars_earned, 3 + 2 + u32::from(UNRECORDED_STARS));
        assert_eq!(summary.current_day, 4);
        assert_eq!(summary.days_remaining, 12);
    }

    #[test]
    fn test_service_complete_and_persist() {
        let state = StateStore::in_memory();
        let service = TrialService::new(state.clone(), rng());

        assert!(matches!(service.trial_days(), Err(TrialError::NoActiveTrial)));
        assert!(matches!(service.complete_day(1), Err(TrialError::NoActiveTrial)));

        let config = service.lock_new_schedule(3, named("Inhaler Study")).unwrap();
        assert_eq!(config.details.trial_name.as_deref(), Some("Inhaler Study"));

        service.complete_day(1).unwrap();
        service.complete_day(2).unwrap();
        assert!(service.complete_day(2).is_err());

        let stored = state.patient_progress().unwrap();
        assert_eq!(stored.current_day, 3);
        assert_eq!(stored.completed_days.len(), 2);

        let days = service.trial_days().unwrap();
        assert_eq!(days[2].status, DayStatus::Current);
    }

    #[test]
    fn test_service_lock_discards_progress_and_content() {
        let state = StateStore::in_memory();
        let service = TrialService::new(state.clone(), rng());

        service.lock_new_schedule(5, ScheduleDetails::default()).unwrap();
        service.complete_day(1).unwrap();
        state
            .append_doctor_video(&DoctorVideo {
                id: "v1".to_string(),
                title: "Day 1 briefing".to_string(),
                description: None,
                day: 1,
                url: "briefing.mp4".to_string(),
                size: None,
                uploaded_at: None,
            })
            .unwrap();

        service.lock_new_schedule(20, named("  ")).unwrap();

        let config = state.trial_config().unwrap().unwrap();
        assert_eq!(config.trial_day_count, 20);
        assert_eq!(config.details.trial_name, None);
        assert_eq!(state.patient_progress().unwrap(), PatientProgress::default());
        assert!(state.doctor_videos().unwrap().is_empty());
    }

    #[test]
    fn test_normalize_progress() {
        let fixed = normalize_progress(progress(0, &[]), 5);
        assert_eq!(fixed.current_day, 1);

        let fixed = normalize_progress(progress(9, &[1, 2]), 5);
        assert_eq!(fixed.current_day, 3);
        assert_eq!(fixed.completed_days, progress(9, &[1, 2]).completed_days);

        let fixed = normalize_progress(progress(6, &[1, 2, 3, 4, 5]), 5);
        assert_eq!(fixed.current_day, 5);

        assert_eq!(normalize_progress(progress(3, &[1, 2]), 5), progress(3, &[1, 2]));
    }

    #[test]
    fn test_service_recovers_from_out_of_range_current_day() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(TRIAL_CONFIG_KEY, r#"{"trialDayCount":5}"#).unwrap();
        backend.set(PATIENT_PROGRESS_KEY, r#"{"currentDay":0}"#).unwrap();
        let service = TrialService::new(StateStore::new(backend), rng());

        let days = service.trial_days().unwrap();
        assert_eq!(days[0].status, DayStatus::Current);
        assert_eq!(service.summary().unwrap().current_day, 1);
        assert_eq!(service.progress().unwrap().current_day, 1);

        let next = service.complete_day(1).unwrap();
        assert_eq!(next.current_day, 2);
    }

    #[test]
    fn test_lock_schedule_keeps_form_details() {
        let state = StateStore::in_memory();
        let service = TrialService::new(state.clone(), rng());

        service
            .lock_new_schedule(
                12,
                ScheduleDetails {
                    trial_name: Some("Peak Flow".to_string()),
                    description: Some("Daily peak flow readings".to_string()),
                    duration: Some("12 weeks".to_string()),
                    participants: Some(" 40 ".to_string()),
                },
            )
            .unwrap();

        let details = state.trial_config().unwrap().unwrap().details;
        assert_eq!(details.description.as_deref(), Some("Daily peak flow readings"));
        assert_eq!(details.duration.as_deref(), Some("12 weeks"));
        assert_eq!(details.participants.as_deref(), Some("40"));
    }

    /// 批量写入总是失败，单键写入正常
    struct FailingBatchStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for FailingBatchStore {
        fn get(&self, key: &str) -> TrialResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> TrialResult<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> TrialResult<()> {
            self.inner.remove(key)
        }

        fn apply(&self, _batch: &[KvWrite]) -> TrialResult<()> {
            Err(TrialError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    #[test]
    fn test_failed_lock_leaves_previous_schedule() {
        let backend = Arc::new(FailingBatchStore {
            inner: MemoryStore::new(),
        });
        backend.set(TRIAL_CONFIG_KEY, r#"{"trialDayCount":5}"#).unwrap();
        backend
            .set(PATIENT_PROGRESS_KEY, r#"{"currentDay":3,"completedDays":[1,2]}"#)
            .unwrap();
        let state = StateStore::new(backend);
        let service = TrialService::new(state.clone(), rng());

        assert!(service.lock_new_schedule(20, ScheduleDetails::default()).is_err());

        assert_eq!(state.trial_config().unwrap().unwrap().trial_day_count, 5);
        assert_eq!(state.patient_progress().unwrap(), progress(3, &[1, 2]));
    }

    #[test]
    fn test_lock_schedule_on_sqlite_is_single_commit() {
        use crate::services::storage::SqliteStore;

        let state = StateStore::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        let service = TrialService::new(state.clone(), rng());

        service.lock_new_schedule(4, named("Spacer Study")).unwrap();
        service.complete_day(1).unwrap();
        service.lock_new_schedule(6, ScheduleDetails::default()).unwrap();

        assert_eq!(state.trial_config().unwrap().unwrap().trial_day_count, 6);
        assert_eq!(state.patient_progress().unwrap(), PatientProgress::default());
    }
}
