use std::fmt;

use serde::{Deserialize, Serialize};

/// 毫秒时间戳（浏览器中来自 `Date.now()`）。
pub type Millis = u64;

/// 每次暂停从计时中扣除的秒数。
pub const PAUSE_PENALTY_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerValue {
    pub minutes: u64,
    pub seconds: u64,
}

impl TimerValue {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for TimerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}", self.minutes, self.seconds)
    }
}

/// 游戏计时器。不保存递增的计数，每次读取都由时间戳重新计算。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameClock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Millis>,
    #[serde(default)]
    pub pause_episodes: u32,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Millis) {
        self.started_at = Some(now);
        self.ended_at = None;
        self.pause_episodes = 0;
    }

    pub fn stop(&mut self, now: Millis) {
        self.ended_at = Some(now);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn register_pause(&mut self) {
        self.pause_episodes += 1;
    }

    pub fn is_stopped(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn value_at(&self, now: Millis) -> TimerValue {
        let start = match (self.started_at, self.ended_at) {
            (None, None) => return TimerValue::default(),
            (Some(start), _) => start,
            // 只有结束时间时没有可计算的区间
            (None, Some(_)) => return TimerValue::default(),
        };
        let end = self.ended_at.unwrap_or(now);
        let elapsed = end.saturating_sub(start) / 1000;
        let penalty = PAUSE_PENALTY_SECONDS * u64::from(self.pause_episodes);
        TimerValue::from_seconds(elapsed.saturating_sub(penalty))
    }
}
