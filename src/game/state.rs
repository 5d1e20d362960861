use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::{Millis, TimerValue};
use super::deck::{Card, CardId, Rank, Suit};
use super::scheduler::DeferredEffect;

/// 对局状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// 开局预览：所有牌正面朝上若干秒。
    Preview,
    InProgress,
    /// 能力生效期间暂停。
    Paused,
    Won,
    Lost,
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::Preview
    }
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
}

impl From<GameOutcome> for GameStatus {
    fn from(outcome: GameOutcome) -> Self {
        match outcome {
            GameOutcome::Won => GameStatus::Won,
            GameOutcome::Lost => GameStatus::Lost,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Achievement {
    /// 在没有额外机会的模式下完成。
    HardMode,
    /// 没有使用任何能力。
    NoAbilities,
}

impl Achievement {
    pub fn id(self) -> u8 {
        match self {
            Achievement::HardMode => 1,
            Achievement::NoAbilities => 2,
        }
    }

    pub fn initial_set(easy_mode: bool) -> BTreeSet<Achievement> {
        if easy_mode {
            BTreeSet::from([Achievement::NoAbilities])
        } else {
            BTreeSet::from([Achievement::HardMode, Achievement::NoAbilities])
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Ability {
    /// 5 秒内展示所有牌，计时暂停。
    Epiphany,
    /// 随机翻开一对牌。
    Alohomora,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameError {
    InvalidConfiguration { reason: String },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidConfiguration { reason } => {
                write!(f, "invalid game configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for GameError {}

/// 对局事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    DeckDealt {
        cards: usize,
    },
    StatusChanged {
        from: GameStatus,
        to: GameStatus,
    },
    CardOpened {
        card_id: CardId,
    },
    PairMatched {
        first: CardId,
        second: CardId,
    },
    Mismatch {
        card_ids: Vec<CardId>,
        attempts_left: u8,
    },
    CardsClosed {
        card_ids: Vec<CardId>,
    },
    AbilityUsed {
        ability: Ability,
    },
    AchievementRevoked {
        achievement: Achievement,
    },
    EffectScheduled {
        effect: DeferredEffect,
        due_at: Millis,
    },
}

/// 给前端渲染用的牌面视图。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardView {
    pub id: CardId,
    pub suit: Suit,
    pub rank: Rank,
    pub open: bool,
    /// 预览、暂停和结束时全部正面朝上。
    pub face_up: bool,
}

impl CardView {
    pub fn new(card: &Card, status: GameStatus) -> Self {
        Self {
            id: card.id,
            suit: card.suit,
            rank: card.rank,
            open: card.open,
            face_up: status != GameStatus::InProgress || card.open,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub cards: Vec<CardView>,
    pub timer: TimerValue,
    pub attempts_left: u8,
    pub easy_mode: bool,
    pub epiphany_used: bool,
    pub alohomora_used: bool,
    pub achievements: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<CardId>,
}
