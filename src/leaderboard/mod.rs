//! 排行榜：数据结构、上榜判定以及基于浏览器 `fetch` 的客户端。
//!
//! 核心状态机不依赖本模块，只有 wasm 绑定层在对局结束后使用。

pub mod client;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::game::GameStatus;

pub use client::LeaderboardClient;

/// 排行榜保留的名次数。
pub const LEADERBOARD_SIZE: usize = 10;
pub const DEFAULT_PLAYER_NAME: &str = "Player";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    /// 用时（秒）。
    pub time: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadersResponse {
    #[serde(default)]
    pub leaders: Vec<LeaderEntry>,
}

/// 提交到排行榜的成绩，序列化为 `{name, time}`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub name: String,
    pub time: u32,
}

impl ScoreSubmission {
    pub fn new(name: &str, time: u32) -> Self {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            DEFAULT_PLAYER_NAME
        } else {
            trimmed
        };
        Self {
            name: name.to_string(),
            time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum LeaderboardError {
    NetworkError { message: String },
    MalformedResponse { message: String },
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardError::NetworkError { message } => {
                write!(f, "leaderboard request failed: {message}")
            }
            LeaderboardError::MalformedResponse { message } => {
                write!(f, "unexpected leaderboard response: {message}")
            }
        }
    }
}

impl std::error::Error for LeaderboardError {}

/// 解析服务端返回的 `{leaders: [...]}`，结果按用时升序。
pub fn parse_leaders(body: &str) -> Result<Vec<LeaderEntry>, LeaderboardError> {
    let response: LeadersResponse =
        serde_json::from_str(body).map_err(|error| LeaderboardError::MalformedResponse {
            message: error.to_string(),
        })?;
    let mut leaders = response.leaders;
    sort_leaders(&mut leaders);
    Ok(leaders)
}

pub fn sort_leaders(leaders: &mut [LeaderEntry]) {
    leaders.sort_by_key(|entry| entry.time);
}

/// 名次不足 10 个，或用时快于第 10 名时可以上榜。
pub fn qualifies(leaders: &[LeaderEntry], time: u32) -> bool {
    let mut times: Vec<u32> = leaders.iter().map(|entry| entry.time).collect();
    times.sort_unstable();
    match times.get(LEADERBOARD_SIZE - 1) {
        Some(tenth) => *tenth > time,
        None => true,
    }
}

/// 只有在排行榜关卡获胜时才提示玩家登记成绩。
pub fn should_prompt(config: &GameConfig, status: GameStatus, leaders: &[LeaderEntry], time: u32) -> bool {
    config.is_leaderboard_level() && status == GameStatus::Won && qualifies(leaders, time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(times: &[u32]) -> Vec<LeaderEntry> {
        times
            .iter()
            .enumerate()
            .map(|(index, time)| LeaderEntry {
                id: Some(index as u64),
                name: format!("player-{index}"),
                time: *time,
            })
            .collect()
    }

    #[test]
    fn parses_and_sorts_leaders() {
        let body = r#"{"leaders":[{"id":1,"name":"b","time":90},{"name":"a","time":30}]}"#;
        let leaders = parse_leaders(body).expect("valid body");
        assert_eq!(leaders[0].name, "a");
        assert_eq!(leaders[1].id, Some(1));
    }

    #[test]
    fn malformed_body_is_reported() {
        let error = parse_leaders("<html>").expect_err("not json");
        assert!(matches!(error, LeaderboardError::MalformedResponse { .. }));
    }

    #[test]
    fn times_wider_than_u32_are_malformed() {
        let body = r#"{"leaders":[{"name":"a","time":5000000000}]}"#;
        let error = parse_leaders(body).expect_err("time exceeds the wire width");
        assert!(matches!(error, LeaderboardError::MalformedResponse { .. }));
    }

    #[test]
    fn short_board_always_qualifies() {
        assert!(qualifies(&[], 999));
        assert!(qualifies(&board(&[1, 2, 3]), 999));
    }

    #[test]
    fn full_board_requires_beating_tenth_place() {
        let leaders = board(&[50, 10, 20, 30, 40, 60, 70, 80, 90, 100, 500]);
        assert!(qualifies(&leaders, 99));
        assert!(!qualifies(&leaders, 100), "a tie does not displace tenth place");
        assert!(!qualifies(&leaders, 300));
    }

    #[test]
    fn prompt_needs_winning_top_level() {
        let leaders = board(&[10]);
        let top = GameConfig::for_level(3);
        assert!(should_prompt(&top, GameStatus::Won, &leaders, 40));
        assert!(!should_prompt(&top, GameStatus::Lost, &leaders, 40));
        assert!(!should_prompt(&GameConfig::for_level(1), GameStatus::Won, &leaders, 40));
    }

    #[test]
    fn blank_names_fall_back_to_default() {
        assert_eq!(ScoreSubmission::new("   ", 12).name, DEFAULT_PLAYER_NAME);
        let submission = ScoreSubmission::new(" Ann ", 12);
        let json = serde_json::to_string(&submission).expect("submission serializes");
        assert_eq!(json, r#"{"name":"Ann","time":12}"#);
    }
}
