//! カード（スート・ランク）

use std::fmt;

/// スート
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 赤スートか（ダイヤ・ハート）
    #[inline]
    pub const fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }

    pub const fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }

    pub fn from_char(c: char) -> Option<Suit> {
        match c.to_ascii_uppercase() {
            'C' => Some(Suit::Clubs),
            'D' => Some(Suit::Diamonds),
            'H' => Some(Suit::Hearts),
            'S' => Some(Suit::Spades),
            _ => None,
        }
    }

    pub fn from_index(i: usize) -> Option<Suit> {
        Suit::ALL.get(i).copied()
    }
}

/// ランク（A=1 .. K=13）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const KING: Rank = Rank(13);

    /// 値から生成（1..=13 以外は不正）
    #[inline]
    pub fn new(v: u8) -> Rank {
        debug_assert!((1..=13).contains(&v), "rank out of range: {v}");
        Rank(v)
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn to_char(self) -> char {
        match self.0 {
            1 => 'A',
            10 => 'T',
            11 => 'J',
            12 => 'Q',
            13 => 'K',
            n => (b'0' + n) as char,
        }
    }

    pub fn from_char(c: char) -> Option<Rank> {
        match c.to_ascii_uppercase() {
            'A' => Some(Rank(1)),
            'T' => Some(Rank(10)),
            'J' => Some(Rank(11)),
            'Q' => Some(Rank(12)),
            'K' => Some(Rank(13)),
            '2'..='9' => Some(Rank(c as u8 - b'0')),
            _ => None,
        }
    }
}

/// カード
///
/// `suit * 13 + rank - 1` の密なID（0..=51）で保持する。
/// このIDが非可逆手カウンタのクラス番号とデルタ符号化のカード番号を兼ねる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Card(u8);

impl Card {
    #[inline]
    pub fn new(suit: Suit, rank: Rank) -> Card {
        Card(suit.index() as u8 * 13 + rank.value() - 1)
    }

    /// 密なID（0..=51）
    #[inline]
    pub const fn id(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn from_id(id: u8) -> Card {
        debug_assert!(id < 52, "card id out of range: {id}");
        Card(id)
    }

    #[inline]
    pub fn suit(self) -> Suit {
        Suit::ALL[(self.0 / 13) as usize]
    }

    #[inline]
    pub fn rank(self) -> Rank {
        Rank(self.0 % 13 + 1)
    }

    #[inline]
    pub fn is_red(self) -> bool {
        self.suit().is_red()
    }

    /// `"AS"` / `"TD"` 形式のテキストから解析
    pub fn parse(s: &str) -> Option<Card> {
        let mut chars = s.chars();
        let rank = Rank::from_char(chars.next()?)?;
        let suit = Suit::from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Card::new(suit, rank))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank().to_char(), self.suit().to_char())
    }
}
