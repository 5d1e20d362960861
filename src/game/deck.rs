use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::GameError;

/// 单局内唯一的卡牌标识。
pub type CardId = u32;

/// 一副牌中不同牌面的数量（4 种花色 × 9 种点数）。
pub const MAX_PAIRS: usize = 36;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 9] = [
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];
}

static FACES: Lazy<Vec<(Suit, Rank)>> = Lazy::new(|| {
    Suit::ALL
        .iter()
        .flat_map(|suit| Rank::ALL.iter().map(move |rank| (*suit, *rank)))
        .collect()
});

/// 桌面上的一张牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub suit: Suit,
    pub rank: Rank,
    #[serde(default)]
    pub open: bool,
}

impl Card {
    pub fn new(id: CardId, suit: Suit, rank: Rank) -> Self {
        Self {
            id,
            suit,
            rank,
            open: false,
        }
    }

    pub fn same_face(&self, other: &Card) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }

    /// 两张牌牌面相同且 id 不同时构成一对。
    pub fn pairs_with(&self, other: &Card) -> bool {
        self.id != other.id && self.same_face(other)
    }
}

/// 生成 `pair_count` 对牌并洗匀。
///
/// 牌面从 36 种组合中随机抽取，每种出现两次，id 从 1 开始连续编号，
/// 返回前用 Fisher–Yates 洗牌。
pub fn generate_deck<R: Rng + ?Sized>(pair_count: usize, rng: &mut R) -> Result<Vec<Card>, GameError> {
    validate_pair_count(pair_count)?;

    let faces: Vec<(Suit, Rank)> = FACES
        .choose_multiple(rng, pair_count)
        .copied()
        .collect();

    let mut cards = Vec::with_capacity(pair_count * 2);
    let mut next_id: CardId = 1;
    for (suit, rank) in faces {
        for _ in 0..2 {
            cards.push(Card::new(next_id, suit, rank));
            next_id += 1;
        }
    }

    cards.shuffle(rng);
    log::debug!(target: "deck", "dealt {} cards ({} pairs)", cards.len(), pair_count);
    Ok(cards)
}

pub fn validate_pair_count(pair_count: usize) -> Result<(), GameError> {
    if pair_count == 0 || pair_count > MAX_PAIRS {
        return Err(GameError::InvalidConfiguration {
            reason: format!("cannot deal {pair_count} pairs, expected 1..={MAX_PAIRS}"),
        });
    }
    Ok(())
}
