//! 局面表現と盤面テキストの読み書き
//!
//! 盤面テキストは1列1行（スペース区切りのカード、行頭の `:` は任意）。
//! 先頭に `Foundations:` / `Freecells:` 行を置ける。
//!
//! ```text
//! Foundations: C-0 D-0 H-0 S-0
//! Freecells: - -
//! : KC QH JS
//! : ...
//! ```

use std::fmt;

use thiserror::Error;

use crate::types::{Card, Rank, Suit, Variant};

/// 盤面テキストの解析エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionParseError {
    #[error("invalid card token '{0}'")]
    InvalidCard(String),
    #[error("invalid foundations header: {0}")]
    InvalidFoundations(String),
    #[error("invalid freecells header: {0}")]
    InvalidFreecells(String),
    #[error("too many columns: expected at most {expected}")]
    TooManyColumns { expected: usize },
    #[error("too many freecells: expected at most {expected}")]
    TooManyFreecells { expected: usize },
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("deal has {0} cards, expected 52")]
    WrongCardCount(usize),
}

/// 局面
///
/// フリーセルはID降順に正規化して保持する。セルの並びだけが異なる
/// 論理的に同一の局面が別キーに符号化されるのを防ぐため。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    variant: Variant,
    /// スートごとのファンデーション最上位ランク（0 = 空）
    foundations: [u8; 4],
    freecells: Vec<Option<Card>>,
    columns: Vec<Vec<Card>>,
}

impl Position {
    /// 空の局面（テスト・復号用）
    pub fn empty(variant: Variant) -> Position {
        Position {
            variant,
            foundations: [0; 4],
            freecells: vec![None; variant.num_freecells()],
            columns: vec![Vec::new(); variant.num_columns()],
        }
    }

    /// 盤面テキストを解析する
    pub fn from_deal_text(text: &str, variant: Variant) -> Result<Position, PositionParseError> {
        let mut pos = Position::empty(variant);
        let mut seen = [false; 52];
        let mut count = 0usize;

        let mut mark = |card: Card| -> Result<(), PositionParseError> {
            if seen[card.id() as usize] {
                return Err(PositionParseError::DuplicateCard(card));
            }
            seen[card.id() as usize] = true;
            count += 1;
            Ok(())
        };

        let mut col = 0usize;
        for raw in text.lines() {
            let line = raw.trim();
            if let Some(rest) = line.strip_prefix("Foundations:") {
                for token in rest.split_whitespace() {
                    let (suit_str, rank_str) = token
                        .split_once('-')
                        .ok_or_else(|| PositionParseError::InvalidFoundations(token.into()))?;
                    let suit = suit_str
                        .chars()
                        .next()
                        .and_then(Suit::from_char)
                        .ok_or_else(|| PositionParseError::InvalidFoundations(token.into()))?;
                    let rank = if rank_str == "0" {
                        0
                    } else {
                        rank_str
                            .chars()
                            .next()
                            .and_then(Rank::from_char)
                            .ok_or_else(|| PositionParseError::InvalidFoundations(token.into()))?
                            .value()
                    };
                    pos.foundations[suit.index()] = rank;
                    for r in 1..=rank {
                        mark(Card::new(suit, Rank::new(r)))?;
                    }
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix("Freecells:") {
                let mut cell = 0usize;
                for token in rest.split_whitespace() {
                    if token == "-" {
                        cell += 1;
                        continue;
                    }
                    if cell >= variant.num_freecells() {
                        return Err(PositionParseError::TooManyFreecells {
                            expected: variant.num_freecells(),
                        });
                    }
                    let card = Card::parse(token)
                        .ok_or_else(|| PositionParseError::InvalidCard(token.into()))?;
                    mark(card)?;
                    pos.freecells[cell] = Some(card);
                    cell += 1;
                }
                pos.normalize_freecells();
                continue;
            }

            // 列行（空行は空列）
            if col >= variant.num_columns() {
                // 末尾の余計な空行は無視する
                if line.is_empty() {
                    continue;
                }
                return Err(PositionParseError::TooManyColumns {
                    expected: variant.num_columns(),
                });
            }
            let body = line.strip_prefix(':').unwrap_or(line);
            for token in body.split_whitespace() {
                let card = Card::parse(token)
                    .ok_or_else(|| PositionParseError::InvalidCard(token.into()))?;
                mark(card)?;
                pos.columns[col].push(card);
            }
            col += 1;
        }

        if count != 52 {
            return Err(PositionParseError::WrongCardCount(count));
        }
        // Baker's Dozen の配りはキングを各列の底へ寄せてから始める規約
        if variant == Variant::BakersDozen {
            for column in &mut pos.columns {
                column.sort_by_key(|card| card.rank() != Rank::KING);
            }
        }
        Ok(pos)
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// スート `suit` のファンデーション最上位ランク（0 = 空）
    #[inline]
    pub fn foundation(&self, suit: Suit) -> u8 {
        self.foundations[suit.index()]
    }

    #[inline]
    pub fn foundations(&self) -> &[u8; 4] {
        &self.foundations
    }

    #[inline]
    pub fn columns(&self) -> &[Vec<Card>] {
        &self.columns
    }

    #[inline]
    pub fn column(&self, i: usize) -> &[Card] {
        &self.columns[i]
    }

    #[inline]
    pub fn freecells(&self) -> &[Option<Card>] {
        &self.freecells
    }

    /// 52枚すべてがファンデーションに上がったか
    pub fn is_solved(&self) -> bool {
        self.foundations.iter().all(|&r| r == 13)
    }

    // ---- movegen / delta から使う内部操作 ----

    pub(crate) fn push_card(&mut self, col: usize, card: Card) {
        self.columns[col].push(card);
    }

    pub(crate) fn pop_card(&mut self, col: usize) -> Card {
        self.columns[col].pop().expect("pop from empty column")
    }

    pub(crate) fn set_foundation(&mut self, suit: Suit, rank: u8) {
        self.foundations[suit.index()] = rank;
    }

    /// カードをファンデーションへ置く（次ランクであること）
    pub(crate) fn place_on_foundation(&mut self, card: Card) {
        let f = &mut self.foundations[card.suit().index()];
        debug_assert_eq!(*f + 1, card.rank().value(), "foundation placement out of order");
        *f = card.rank().value();
    }

    pub(crate) fn put_freecell(&mut self, cell: usize, card: Option<Card>) {
        self.freecells[cell] = card;
        self.normalize_freecells();
    }

    /// セルをID降順（空を末尾）へ並べ替える
    pub(crate) fn normalize_freecells(&mut self) {
        self.freecells.sort_by(|a, b| match (a, b) {
            (Some(x), Some(y)) => y.id().cmp(&x.id()),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Foundations:")?;
        for suit in Suit::ALL {
            let r = self.foundations[suit.index()];
            if r == 0 {
                write!(f, " {}-0", suit.to_char())?;
            } else {
                write!(f, " {}-{}", suit.to_char(), Rank::new(r).to_char())?;
            }
        }
        writeln!(f)?;
        if !self.freecells.is_empty() {
            write!(f, "Freecells:")?;
            for cell in &self.freecells {
                match cell {
                    Some(card) => write!(f, " {card}")?,
                    None => write!(f, " -")?,
                }
            }
            writeln!(f)?;
        }
        for column in &self.columns {
            write!(f, ":")?;
            for card in column {
                write!(f, " {card}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
