//! 单局游戏的配置，可由前端以 JSON 传入，缺省字段使用默认值。

use serde::{Deserialize, Serialize};

use crate::game::{deck, GameError};

pub const DEFAULT_LEADERBOARD_URL: &str = "https://wedev-api.sky.pro/api/leaderboard";
/// 能上排行榜的关卡。
pub const LEADERBOARD_LEVEL: u8 = 3;
pub const MAX_LEVEL: u8 = 3;

const PAIRS_PER_LEVEL: usize = 3;

fn default_pairs_count() -> usize {
    PAIRS_PER_LEVEL
}

fn default_preview_seconds() -> u32 {
    5
}

fn default_max_attempts() -> u8 {
    3
}

fn default_level() -> u8 {
    1
}

fn default_leaderboard_url() -> String {
    DEFAULT_LEADERBOARD_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    #[serde(default = "default_pairs_count")]
    pub pairs_count: usize,
    #[serde(default = "default_preview_seconds")]
    pub preview_seconds: u32,
    /// 开启后配错不会立即失败，而是消耗一次机会；同时失去“困难模式”成就。
    #[serde(default)]
    pub easy_mode: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default = "default_leaderboard_url")]
    pub leaderboard_url: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pairs_count: default_pairs_count(),
            preview_seconds: default_preview_seconds(),
            easy_mode: false,
            max_attempts: default_max_attempts(),
            level: default_level(),
            leaderboard_url: default_leaderboard_url(),
        }
    }
}

impl GameConfig {
    /// 关卡 1/2/3 分别对应 3/6/9 对牌。
    pub fn for_level(level: u8) -> Self {
        Self {
            pairs_count: PAIRS_PER_LEVEL * usize::from(level.max(1)),
            level,
            ..Self::default()
        }
    }

    pub fn with_easy_mode(mut self, easy_mode: bool) -> Self {
        self.easy_mode = easy_mode;
        self
    }

    pub fn with_pairs(mut self, pairs_count: usize) -> Self {
        self.pairs_count = pairs_count;
        self
    }

    pub fn with_preview_seconds(mut self, preview_seconds: u32) -> Self {
        self.preview_seconds = preview_seconds;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|error| GameError::InvalidConfiguration {
                reason: format!("unreadable config: {error}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        deck::validate_pair_count(self.pairs_count)?;
        if self.max_attempts == 0 {
            return Err(GameError::InvalidConfiguration {
                reason: "max_attempts must be at least 1".into(),
            });
        }
        if self.level == 0 || self.level > MAX_LEVEL {
            return Err(GameError::InvalidConfiguration {
                reason: format!("level {} is not in 1..={MAX_LEVEL}", self.level),
            });
        }
        Ok(())
    }

    pub fn preview_millis(&self) -> u64 {
        u64::from(self.preview_seconds) * 1000
    }

    pub fn is_leaderboard_level(&self) -> bool {
        self.level == LEADERBOARD_LEVEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = GameConfig::from_json(r#"{"pairs_count": 9, "easy_mode": true}"#)
            .expect("partial config should parse");
        assert_eq!(config.pairs_count, 9);
        assert!(config.easy_mode);
        assert_eq!(config.preview_seconds, 5);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.leaderboard_url, DEFAULT_LEADERBOARD_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(GameConfig::from_json(r#"{"pairs_count": 37}"#).is_err());
        assert!(GameConfig::from_json(r#"{"max_attempts": 0}"#).is_err());
        assert!(GameConfig::from_json(r#"{"level": 4}"#).is_err());
        assert!(GameConfig::from_json("not json").is_err());
    }

    #[test]
    fn levels_scale_pair_count() {
        assert_eq!(GameConfig::for_level(1).pairs_count, 3);
        assert_eq!(GameConfig::for_level(3).pairs_count, 9);
        assert!(GameConfig::for_level(3).is_leaderboard_level());
        assert!(!GameConfig::for_level(2).is_leaderboard_level());
    }
}
