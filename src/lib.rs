pub mod config;
pub mod game;
pub mod leaderboard;
pub mod utils;

use gloo_timers::callback::Interval;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use std::fmt::Display;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::{Function, Promise};

pub use config::{GameConfig, DEFAULT_LEADERBOARD_URL, LEADERBOARD_LEVEL};
pub use game::{
    Ability, Achievement, Card, CardId, CardView, DeferredEffect, GameClock, GameError, GameEvent,
    GameOutcome, GameSession, GameSnapshot, GameStatus, Millis, Rank, Resolution, Scheduler, Suit,
    TaskHandle, TimerValue,
};
pub use leaderboard::{
    LeaderEntry, LeaderboardClient, LeaderboardError, LeadersResponse, ScoreSubmission,
};

/// 前端刷新计时器的默认周期。
pub const TICK_MILLIS: u32 = 100;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

/// 安装控制台日志，`level` 取 `error`/`warn`/`info`/`debug`/`trace`。
#[wasm_bindgen(js_name = "initLogging")]
pub fn init_logging(level: Option<String>) {
    utils::init_logging(utils::parse_level(level.as_deref()));
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn seconds_for_js(seconds: u64) -> u32 {
    u32::try_from(seconds).unwrap_or(u32::MAX)
}

/// 一局翻牌游戏，所有操作返回 `{snapshot, events}` 的 JSON。
#[wasm_bindgen]
pub struct MemoryGame {
    session: GameSession,
}

#[wasm_bindgen]
impl MemoryGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(to_js_error)?,
            None => GameConfig::default(),
        };
        let session = GameSession::new(config, utils::now_ms()).map_err(to_js_error)?;
        Ok(MemoryGame { session })
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.snapshot(utils::now_ms()))
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.snapshot(utils::now_ms())).map_err(JsValue::from)
    }

    pub fn open_card(&mut self, card_id: u32) -> Result<String, JsValue> {
        self.apply(|session, now| session.open_card(card_id, now))
    }

    pub fn use_epiphany(&mut self) -> Result<String, JsValue> {
        self.apply(|session, now| session.use_epiphany(now))
    }

    pub fn use_alohomora(&mut self) -> Result<String, JsValue> {
        self.apply(|session, now| session.use_alohomora(now))
    }

    /// 执行到期的延迟效果，应在每次计时器 tick 时调用。
    pub fn tick(&mut self) -> Result<String, JsValue> {
        self.apply(|session, now| session.advance(now))
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        let now = utils::now_ms();
        let events = self.session.reset_game(now).map_err(to_js_error)?;
        to_json(&self.session.resolution(now, events))
    }

    pub fn timer_text(&self) -> String {
        self.session.timer(utils::now_ms()).to_string()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        seconds_for_js(self.session.timer(utils::now_ms()).total_seconds())
    }

    pub fn is_ticking(&self) -> bool {
        self.session.is_ticking()
    }

    pub fn leaderboard_url(&self) -> String {
        self.session.config().leaderboard_url.clone()
    }

    /// 对局结束后根据排行榜 JSON 判断是否提示玩家登记成绩。
    pub fn should_prompt_leaderboard(&self, leaders_json: &str) -> Result<bool, JsValue> {
        let leaders = leaderboard::parse_leaders(leaders_json).map_err(to_js_error)?;
        let time = seconds_for_js(self.session.timer(utils::now_ms()).total_seconds());
        Ok(leaderboard::should_prompt(
            self.session.config(),
            self.session.status(),
            &leaders,
            time,
        ))
    }
}

impl MemoryGame {
    fn apply<F>(&mut self, action: F) -> Result<String, JsValue>
    where
        F: FnOnce(&mut GameSession, Millis) -> Vec<GameEvent>,
    {
        let now = utils::now_ms();
        let events = action(&mut self.session, now);
        to_json(&self.session.resolution(now, events))
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }
}

/// 周期性回调，释放（`free()`）后自动停止。
#[wasm_bindgen]
pub struct Ticker {
    _interval: Interval,
}

#[wasm_bindgen]
impl Ticker {
    #[wasm_bindgen(constructor)]
    pub fn new(callback: Function, period_ms: Option<u32>) -> Ticker {
        let period = period_ms.unwrap_or(TICK_MILLIS);
        let interval = Interval::new(period, move || {
            if let Err(error) = callback.call0(&JsValue::NULL) {
                log::error!(target: "ticker", "tick callback failed: {:?}", error);
            }
        });
        Ticker {
            _interval: interval,
        }
    }
}

/// 拉取排行榜，Promise 结果为按用时排序的 JSON 数组。
#[wasm_bindgen(js_name = "fetchLeaders")]
pub fn fetch_leaders(url: Option<String>) -> Promise {
    let client = LeaderboardClient::new(url.unwrap_or_else(|| DEFAULT_LEADERBOARD_URL.to_string()));
    future_to_promise(async move {
        let leaders = client.fetch_leaders().await.map_err(to_js_error)?;
        Ok(JsValue::from_str(&to_json(&leaders)?))
    })
}

/// 提交成绩，Promise 结果为更新后的排行榜 JSON。
#[wasm_bindgen(js_name = "submitScore")]
pub fn submit_score(url: Option<String>, name: String, time: u32) -> Promise {
    let client = LeaderboardClient::new(url.unwrap_or_else(|| DEFAULT_LEADERBOARD_URL.to_string()));
    let submission = ScoreSubmission::new(&name, time);
    future_to_promise(async move {
        let leaders = client.submit_score(&submission).await.map_err(to_js_error)?;
        Ok(JsValue::from_str(&to_json(&leaders)?))
    })
}

#[wasm_bindgen(js_name = "qualifiesForLeaderboard")]
pub fn qualifies_for_leaderboard(leaders_json: &str, time: u32) -> Result<bool, JsValue> {
    let leaders = leaderboard::parse_leaders(leaders_json).map_err(to_js_error)?;
    Ok(leaderboard::qualifies(&leaders, time))
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
