//! 患者匹配引擎
//! 生成合成患者池，并按条件匹配与距离排序

use crate::error::{TrialError, TrialResult};
use crate::models::{Condition, Patient};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub const DEFAULT_POPULATION_SIZE: usize = 100;
pub const DEFAULT_RANKING_LIMIT: usize = 50;
pub const MIN_DISTANCE_KM: u32 = 1;
pub const MAX_DISTANCE_KM: u32 = 50;

const FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Avery", "Quinn", "Harper",
    "Rowan", "Skyler", "Emerson", "Dakota", "Parker", "Reese",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Lee", "Garcia", "Brown", "Martinez", "Davis", "Lopez", "Wilson",
    "Anderson", "Thomas", "Moore", "Clark", "Lewis", "Walker", "Young",
];

/// 生成合成患者池
pub fn generate_population<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<Patient> {
    (1..=size)
        .map(|id| {
            let first = FIRST_NAMES.choose(&mut *rng).copied().unwrap_or("Alex");
            let last = LAST_NAMES.choose(&mut *rng).copied().unwrap_or("Smith");
            let condition = Condition::ALL
                .choose(&mut *rng)
                .copied()
                .unwrap_or(Condition::Asthmatic);

            Patient {
                id: id as u32,
                display_name: format!("{} {}", first, last),
                condition,
                distance_km: rng.gen_range(MIN_DISTANCE_KM..=MAX_DISTANCE_KM),
            }
        })
        .collect()
}

/// 匹配者在前、非匹配者在后，各自按距离升序（稳定排序），截断到 limit
pub fn filter_by_condition(
    population: &[Patient],
    target: Option<Condition>,
    limit: usize,
) -> TrialResult<Vec<Patient>> {
    let target = target.ok_or(TrialError::NoConditionSelected)?;

    let (mut matched, mut unmatched): (Vec<Patient>, Vec<Patient>) = population
        .iter()
        .cloned()
        .partition(|p| p.condition == target);

    matched.sort_by_key(|p| p.distance_km);
    unmatched.sort_by_key(|p| p.distance_km);

    matched.extend(unmatched);
    matched.truncate(limit);
    Ok(matched)
}

// ==================== 会话服务 ====================

/// 持有本次会话的患者池（不持久化）
pub struct RankingService {
    population: Mutex<Vec<Patient>>,
    rng: Mutex<StdRng>,
    population_size: usize,
    limit: usize,
}

impl RankingService {
    /// seed 为空时从系统熵初始化，结果不可复现
    pub fn new(population_size: usize, limit: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let population = generate_population(population_size, &mut rng);
        info!("generated synthetic population of {} patients", population.len());

        Self {
            population: Mutex::new(population),
            rng: Mutex::new(rng),
            population_size,
            limit,
        }
    }

    pub fn population(&self) -> TrialResult<Vec<Patient>> {
        let population = self.population.lock().map_err(|_| TrialError::LockPoisoned)?;
        Ok(population.clone())
    }

    pub fn find_patients(&self, target: Option<Condition>) -> TrialResult<Vec<Patient>> {
        let population = self.population.lock().map_err(|_| TrialError::LockPoisoned)?;
        filter_by_condition(&population, target, self.limit)
    }

    /// 重新生成患者池
    pub fn regenerate(&self) -> TrialResult<usize> {
        let fresh = {
            let mut rng = self.rng.lock().map_err(|_| TrialError::LockPoisoned)?;
            generate_population(self.population_size, &mut *rng)
        };
        let mut population = self.population.lock().map_err(|_| TrialError::LockPoisoned)?;
        *population = fresh;
        Ok(population.len())
    }
}
