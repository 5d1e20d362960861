//! 浏览器中运行的测试：`wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use memory_pairs::{
    qualifies_for_leaderboard, LeaderboardClient, LeaderboardError, MemoryGame, ScoreSubmission,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn parse(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("exported JSON should parse")
}

#[wasm_bindgen_test]
fn new_game_starts_in_preview_with_all_cards_face_up() {
    let game = MemoryGame::new(Some(r#"{"pairs_count": 4}"#.to_string()))
        .expect("config is valid");
    let snapshot = parse(&game.snapshot_json().expect("snapshot serializes"));

    assert_eq!(snapshot["status"], "Preview");
    let cards = snapshot["cards"].as_array().expect("cards array");
    assert_eq!(cards.len(), 8);
    assert!(cards.iter().all(|card| card["face_up"] == true));
    assert!(game.is_ticking());
}

#[wasm_bindgen_test]
fn oversized_deck_is_rejected() {
    assert!(MemoryGame::new(Some(r#"{"pairs_count": 37}"#.to_string())).is_err());
}

#[wasm_bindgen_test]
fn clicks_during_preview_change_nothing() {
    let mut game = MemoryGame::new(None).expect("default config");
    let resolution = parse(&game.open_card(1).expect("open_card returns JSON"));
    assert_eq!(resolution["events"], serde_json::json!([]));
    assert_eq!(game.timer_text(), "00.00");
}

#[wasm_bindgen_test]
fn reset_deals_a_new_deck() {
    let mut game = MemoryGame::new(None).expect("default config");
    let resolution = parse(&game.reset().expect("reset returns JSON"));
    assert_eq!(resolution["events"][0]["type"], "DeckDealt");
    assert_eq!(resolution["snapshot"]["attempts_left"], 3);
}

#[wasm_bindgen_test]
fn leaderboard_qualification_from_json() {
    let body = r#"{"leaders":[{"name":"a","time":30}]}"#;
    assert!(qualifies_for_leaderboard(body, 500).expect("body is valid JSON"));
    assert!(qualifies_for_leaderboard("oops", 5).is_err());
}

const LEADERS_DATA_URL: &str = "data:application/json;base64,eyJsZWFkZXJzIjpbeyJuYW1lIjoic2xvdyIsInRpbWUiOjkwfSx7Im5hbWUiOiJmYXN0IiwidGltZSI6MzB9XX0=";

#[wasm_bindgen_test]
async fn unreachable_server_is_a_network_error() {
    let client = LeaderboardClient::new("http://127.0.0.1:1/");

    let fetched = client.fetch_leaders().await;
    assert!(matches!(fetched, Err(LeaderboardError::NetworkError { .. })));

    let submitted = client.submit_score(&ScoreSubmission::new("Ann", 42)).await;
    assert!(matches!(submitted, Err(LeaderboardError::NetworkError { .. })));
}

#[wasm_bindgen_test]
async fn fetched_leaders_come_back_sorted() {
    let client = LeaderboardClient::new(LEADERS_DATA_URL);
    let leaders = client.fetch_leaders().await.expect("data URL serves leaders");

    let names: Vec<&str> = leaders.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["fast", "slow"]);
    assert_eq!(leaders[0].time, 30);
}
