use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

use super::{
    clock::{GameClock, Millis, TimerValue},
    deck::{self, Card, CardId},
    scheduler::{DeferredEffect, Scheduler, TaskHandle},
    state::{
        Ability, Achievement, CardView, GameError, GameEvent, GameOutcome, GameSnapshot,
        GameStatus,
    },
};

/// 配错后两张牌保持翻开的时间。
pub const MISMATCH_REVEAL_MILLIS: Millis = 1_000;
/// “顿悟”展示所有牌的时间。
pub const EPIPHANY_MILLIS: Millis = 5_000;

/// 一次操作后返回给前端的结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub snapshot: GameSnapshot,
    pub events: Vec<GameEvent>,
}

/// 单局游戏的状态机。
///
/// 所有操作都显式接收当前时间戳，延迟副作用通过会话自己的 [`Scheduler`] 登记，
/// 由 [`GameSession::advance`] 在到期时执行。重开一局会取消全部延迟任务并递增
/// `generation`，旧任务即使残留也不会再改动新的对局。
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    status: GameStatus,
    cards: Vec<Card>,
    clock: GameClock,
    attempts_left: u8,
    epiphany_used: bool,
    alohomora_used: bool,
    achievements: BTreeSet<Achievement>,
    pending: Vec<CardId>,
    scheduler: Scheduler,
    /// 预览结束任务，手动开局时按句柄取消。
    begin_play: Option<TaskHandle>,
    generation: u64,
    rng: SmallRng,
}

impl GameSession {
    pub fn new(config: GameConfig, now: Millis) -> Result<Self, GameError> {
        Self::with_rng(config, SmallRng::from_entropy(), now)
    }

    pub fn with_seed(config: GameConfig, seed: u64, now: Millis) -> Result<Self, GameError> {
        Self::with_rng(config, SmallRng::seed_from_u64(seed), now)
    }

    pub fn with_rng(config: GameConfig, rng: SmallRng, now: Millis) -> Result<Self, GameError> {
        config.validate()?;
        let mut session = Self {
            status: GameStatus::Preview,
            cards: Vec::new(),
            clock: GameClock::new(),
            attempts_left: config.max_attempts,
            epiphany_used: false,
            alohomora_used: false,
            achievements: Achievement::initial_set(config.easy_mode),
            pending: Vec::new(),
            scheduler: Scheduler::new(),
            begin_play: None,
            generation: 0,
            rng,
            config,
        };
        session.reset_game(now)?;
        Ok(session)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn attempts_left(&self) -> u8 {
        self.attempts_left
    }

    pub fn epiphany_used(&self) -> bool {
        self.epiphany_used
    }

    pub fn alohomora_used(&self) -> bool {
        self.alohomora_used
    }

    pub fn achievements(&self) -> &BTreeSet<Achievement> {
        &self.achievements
    }

    /// 当前翻开但尚未配对的牌。
    pub fn pending(&self) -> &[CardId] {
        &self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scheduled_effects(&self) -> usize {
        self.scheduler.len()
    }

    pub fn next_effect_due(&self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    pub fn timer(&self, now: Millis) -> TimerValue {
        self.clock.value_at(now)
    }

    /// 暂停时不需要周期性刷新计时器。
    pub fn is_ticking(&self) -> bool {
        self.status != GameStatus::Paused
    }

    pub fn snapshot(&self, now: Millis) -> GameSnapshot {
        GameSnapshot {
            status: self.status,
            cards: self
                .cards
                .iter()
                .map(|card| CardView::new(card, self.status))
                .collect(),
            timer: self.timer(now),
            attempts_left: self.attempts_left,
            easy_mode: self.config.easy_mode,
            epiphany_used: self.epiphany_used,
            alohomora_used: self.alohomora_used,
            achievements: self.achievements.iter().map(|a| a.id()).collect(),
            pending: self.pending.clone(),
        }
    }

    pub fn resolution(&self, now: Millis, events: Vec<GameEvent>) -> Resolution {
        Resolution {
            snapshot: self.snapshot(now),
            events,
        }
    }

    /// 重新发牌并回到预览状态，未执行的延迟任务全部作废。
    pub fn reset_game(&mut self, now: Millis) -> Result<Vec<GameEvent>, GameError> {
        let cards = deck::generate_deck(self.config.pairs_count, &mut self.rng)?;

        self.scheduler.cancel_all();
        self.begin_play = None;
        self.generation += 1;
        self.cards = cards;
        self.pending.clear();
        self.attempts_left = self.config.max_attempts;
        self.epiphany_used = false;
        self.alohomora_used = false;
        self.achievements = Achievement::initial_set(self.config.easy_mode);
        self.clock.clear();

        let mut events = vec![GameEvent::DeckDealt {
            cards: self.cards.len(),
        }];
        self.set_status(GameStatus::Preview, &mut events);
        let due_at = now + self.config.preview_millis();
        self.begin_play = Some(self.schedule(DeferredEffect::BeginPlay, due_at, &mut events));
        log::debug!(target: "game", "session {} reset, play begins at {}", self.generation, due_at);
        Ok(events)
    }

    /// 结束预览并开始计时。只在预览状态下生效。
    pub fn start_game(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Preview {
            return events;
        }
        if let Some(handle) = self.begin_play.take() {
            self.scheduler.cancel(handle);
        }
        self.clock.start(now);
        self.set_status(GameStatus::InProgress, &mut events);
        log::info!(target: "game", "game started with {} cards", self.cards.len());
        events
    }

    pub fn finish_game(&mut self, outcome: GameOutcome, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status.is_finished() {
            return events;
        }
        self.clock.stop(now);
        self.scheduler.cancel_all();
        self.pending.clear();
        self.set_status(outcome.into(), &mut events);
        log::info!(
            target: "game",
            "game finished: {:?} in {}",
            outcome,
            self.clock.value_at(now)
        );
        events
    }

    /// 翻开一张牌。
    ///
    /// 非进行中、已有两张未配对的牌、牌已翻开或 id 不存在时不做任何事。
    pub fn open_card(&mut self, card_id: CardId, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::InProgress || self.pending.len() >= 2 {
            return events;
        }
        let Some(index) = self.cards.iter().position(|card| card.id == card_id) else {
            return events;
        };
        if self.cards[index].open {
            return events;
        }

        self.cards[index].open = true;
        log::trace!(target: "game", "opened card {}", card_id);
        events.push(GameEvent::CardOpened { card_id });

        if self.all_open() {
            events.extend(self.finish_game(GameOutcome::Won, now));
            return events;
        }

        self.pending = self.unmatched_open();
        if !self.pending.contains(&card_id) {
            if let Some(partner) = self.open_partner(index) {
                events.push(GameEvent::PairMatched {
                    first: partner,
                    second: card_id,
                });
            }
        }

        if self.pending.len() >= 2 {
            self.resolve_mismatch(now, &mut events);
        }
        events
    }

    /// “顿悟”：暂停并展示所有牌 5 秒，每局一次。
    pub fn use_epiphany(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.epiphany_used || self.status != GameStatus::InProgress {
            return events;
        }

        self.revoke(Achievement::NoAbilities, &mut events);
        self.clock.register_pause();
        self.set_status(GameStatus::Paused, &mut events);
        self.epiphany_used = true;
        events.push(GameEvent::AbilityUsed {
            ability: Ability::Epiphany,
        });

        let closed: Vec<CardId> = self
            .cards
            .iter()
            .filter(|card| !card.open)
            .map(|card| card.id)
            .collect();
        self.schedule(
            DeferredEffect::EndEpiphany { closed },
            now + EPIPHANY_MILLIS,
            &mut events,
        );
        events
    }

    /// “阿拉霍洞开”：随机翻开一对仍盖着的牌，每局一次。
    pub fn use_alohomora(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.alohomora_used || self.status != GameStatus::InProgress {
            return events;
        }

        let candidates: Vec<usize> = (0..self.cards.len())
            .filter(|&index| self.closed_partner(index).is_some())
            .collect();
        let Some(&index) = candidates.choose(&mut self.rng) else {
            log::debug!(target: "game", "no closed pair left for alohomora");
            return events;
        };
        let Some(partner_index) = self.closed_partner(index) else {
            return events;
        };

        self.revoke(Achievement::NoAbilities, &mut events);
        self.alohomora_used = true;
        events.push(GameEvent::AbilityUsed {
            ability: Ability::Alohomora,
        });

        for i in [index, partner_index] {
            self.cards[i].open = true;
            events.push(GameEvent::CardOpened {
                card_id: self.cards[i].id,
            });
        }
        events.push(GameEvent::PairMatched {
            first: self.cards[index].id,
            second: self.cards[partner_index].id,
        });

        if self.all_open() {
            events.extend(self.finish_game(GameOutcome::Won, now));
        } else {
            self.pending = self.unmatched_open();
        }
        events
    }

    /// 执行所有到期的延迟任务，按到期时间和登记顺序依次生效。
    ///
    /// 重开和结束都会先清空调度器，`generation` 检查只是兜底：
    /// 不属于当前对局的任务直接丢弃。
    pub fn advance(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some(task) = self.scheduler.pop_due(now) {
            if task.generation != self.generation {
                log::debug!(target: "game", "dropping stale task {:?}", task.handle);
                continue;
            }
            self.apply_deferred(task.effect, task.due_at, &mut events);
        }
        events
    }

    fn apply_deferred(&mut self, effect: DeferredEffect, at: Millis, events: &mut Vec<GameEvent>) {
        match effect {
            DeferredEffect::BeginPlay => {
                events.extend(self.start_game(at));
            }
            DeferredEffect::CloseMismatched { card_ids } => {
                if self.status.is_finished() {
                    return;
                }
                let closed = self.close_cards(&card_ids);
                self.pending.clear();
                if !closed.is_empty() {
                    events.push(GameEvent::CardsClosed { card_ids: closed });
                }
            }
            DeferredEffect::EndEpiphany { closed } => {
                let reclosed = self.close_cards(&closed);
                if !reclosed.is_empty() {
                    events.push(GameEvent::CardsClosed { card_ids: reclosed });
                }
                if self.status == GameStatus::Paused {
                    self.set_status(GameStatus::InProgress, events);
                }
            }
        }
    }

    fn resolve_mismatch(&mut self, now: Millis, events: &mut Vec<GameEvent>) {
        let card_ids = self.pending.clone();
        if self.config.easy_mode {
            self.attempts_left = self.attempts_left.saturating_sub(1);
        }
        events.push(GameEvent::Mismatch {
            card_ids: card_ids.clone(),
            attempts_left: self.attempts_left,
        });

        if self.config.easy_mode && self.attempts_left > 0 {
            self.schedule(
                DeferredEffect::CloseMismatched { card_ids },
                now + MISMATCH_REVEAL_MILLIS,
                events,
            );
        } else {
            events.extend(self.finish_game(GameOutcome::Lost, now));
        }
    }

    fn schedule(&mut self, effect: DeferredEffect, due_at: Millis, events: &mut Vec<GameEvent>) -> TaskHandle {
        let handle = self
            .scheduler
            .schedule(effect.clone(), due_at, self.generation);
        events.push(GameEvent::EffectScheduled { effect, due_at });
        handle
    }

    fn set_status(&mut self, to: GameStatus, events: &mut Vec<GameEvent>) {
        if self.status == to {
            return;
        }
        let from = self.status;
        log::debug!(target: "game", "status {:?} -> {:?}", from, to);
        self.status = to;
        events.push(GameEvent::StatusChanged { from, to });
    }

    fn revoke(&mut self, achievement: Achievement, events: &mut Vec<GameEvent>) {
        if self.achievements.remove(&achievement) {
            events.push(GameEvent::AchievementRevoked { achievement });
        }
    }

    fn close_cards(&mut self, card_ids: &[CardId]) -> Vec<CardId> {
        let mut closed = Vec::new();
        for card in self.cards.iter_mut() {
            if card.open && card_ids.contains(&card.id) {
                card.open = false;
                closed.push(card.id);
            }
        }
        closed
    }

    fn all_open(&self) -> bool {
        self.cards.iter().all(|card| card.open)
    }

    fn unmatched_open(&self) -> Vec<CardId> {
        let open: Vec<&Card> = self.cards.iter().filter(|card| card.open).collect();
        open.iter()
            .filter(|card| !open.iter().any(|other| card.pairs_with(other)))
            .map(|card| card.id)
            .collect()
    }

    fn open_partner(&self, index: usize) -> Option<CardId> {
        let card = &self.cards[index];
        self.cards
            .iter()
            .find(|other| other.open && card.pairs_with(other))
            .map(|other| other.id)
    }

    fn closed_partner(&self, index: usize) -> Option<usize> {
        let card = &self.cards[index];
        if card.open {
            return None;
        }
        self.cards
            .iter()
            .position(|other| !other.open && card.pairs_with(other))
    }
}
