//! 游戏核心逻辑模块（发牌、计时、状态机）。

pub mod clock;
pub mod deck;
pub mod rules;
pub mod scheduler;
pub mod state;

pub use clock::{GameClock, Millis, TimerValue, PAUSE_PENALTY_SECONDS};
pub use deck::{generate_deck, Card, CardId, Rank, Suit, MAX_PAIRS};
pub use rules::{GameSession, Resolution, EPIPHANY_MILLIS, MISMATCH_REVEAL_MILLIS};
pub use scheduler::{DeferredEffect, ScheduledTask, Scheduler, TaskHandle};
pub use state::{
    Ability,
    Achievement,
    CardView,
    GameError,
    GameEvent,
    GameOutcome,
    GameSnapshot,
    GameStatus,
};
