//! 实时时钟
//! 每个周期产出一次格式化的时间与日期，与其他状态无关

use async_stream::stream;
use chrono::{DateTime, Local, TimeZone};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTick {
    /// 例如 "3:04:05 PM"
    pub time: String,
    /// 例如 "Friday, October 16, 2026"
    pub date: String,
}

pub fn format_tick<Tz>(at: &DateTime<Tz>) -> ClockTick
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ClockTick {
        time: at.format("%-I:%M:%S %p").to_string(),
        date: at.format("%A, %B %-d, %Y").to_string(),
    }
}

/// 时钟流，第一个 tick 立即产出
pub fn clock_ticks(period: Duration) -> impl Stream<Item = ClockTick> {
    stream! {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            yield format_tick(&Local::now());
        }
    }
}
