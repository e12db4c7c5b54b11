//! デルタ符号化の本体

use std::fmt;

use super::bits::{BitReader, BitWriter};
use crate::position::Position;
use crate::types::{Card, Suit, Variant};

/// 符号化キーのバイト長
pub const ENCODED_LEN: usize = 32;

/// 符号化された局面キー
///
/// 比較・等価はバイト列そのもの。同一の基準局面から作った
/// [`DeltaCodec`] 同士でのみ比較可能。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EncodedKey([u8; ENCODED_LEN]);

impl EncodedKey {
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; ENCODED_LEN] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<EncodedKey> {
        let arr: [u8; ENCODED_LEN] = bytes.try_into().ok()?;
        Some(EncodedKey(arr))
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedKey(")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// 値 0..=n を表すのに必要なビット数
#[inline]
const fn bits_for(n: u32) -> u32 {
    u32::BITS - n.leading_zeros()
}

/// デルタ符号化器
///
/// 基準（初期配置）と列の接頭辞ビット幅を保持する。同じ基準・同じ
/// バリアントで初期化した符号化器は同じキーを生成する。
pub struct DeltaCodec {
    variant: Variant,
    initial_columns: Vec<Vec<Card>>,
    prefix_len_bits: u32,
}

impl DeltaCodec {
    pub fn new(baseline: &Position) -> DeltaCodec {
        let initial_columns: Vec<Vec<Card>> = baseline.columns().to_vec();
        let max_len = initial_columns.iter().map(Vec::len).max().unwrap_or(0) as u32;
        DeltaCodec {
            variant: baseline.variant(),
            initial_columns,
            prefix_len_bits: bits_for(max_len),
        }
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// `below` の上に積めるスートの候補（固定順）
    fn suit_choices(&self, below: Card) -> Vec<Suit> {
        if self.variant.sequences_by_alternate_color() {
            if below.is_red() {
                vec![Suit::Clubs, Suit::Spades]
            } else {
                vec![Suit::Diamonds, Suit::Hearts]
            }
        } else {
            Suit::ALL.to_vec()
        }
    }

    #[inline]
    fn choice_bits(&self) -> u32 {
        if self.variant.sequences_by_alternate_color() { 1 } else { 2 }
    }

    pub fn encode(&self, pos: &Position) -> EncodedKey {
        debug_assert_eq!(pos.variant(), self.variant);
        let mut w = BitWriter::new();

        for suit in Suit::ALL {
            w.push(pos.foundation(suit) as u32, 4);
        }
        for cell in pos.freecells() {
            let v = cell.map(|c| c.id() as u32 + 1).unwrap_or(0);
            w.push(v, 6);
        }

        for (col, initial) in pos.columns().iter().zip(&self.initial_columns) {
            let prefix = col
                .iter()
                .zip(initial)
                .take_while(|(a, b)| a == b)
                .count();
            let appended = &col[prefix..];
            debug_assert!(appended.len() < 16, "appended run too long");
            w.push(prefix as u32, self.prefix_len_bits);
            w.push(appended.len() as u32, 4);

            let mut below: Option<Card> = if prefix > 0 { Some(initial[prefix - 1]) } else { None };
            for &card in appended {
                match below {
                    None => w.push(card.id() as u32, 6),
                    Some(b) => {
                        debug_assert_eq!(
                            card.rank().value() + 1,
                            b.rank().value(),
                            "appended card does not continue the run"
                        );
                        let choices = self.suit_choices(b);
                        let idx = choices
                            .iter()
                            .position(|&s| s == card.suit())
                            .expect("appended card violates the sequencing rule");
                        w.push(idx as u32, self.choice_bits());
                    }
                }
                below = Some(card);
            }
        }

        EncodedKey(w.finish())
    }

    pub fn decode(&self, key: &EncodedKey) -> Position {
        let mut r = BitReader::new(&key.0);
        let mut pos = Position::empty(self.variant);

        for suit in Suit::ALL {
            pos.set_foundation(suit, r.pull(4) as u8);
        }
        for cell in 0..self.variant.num_freecells() {
            let v = r.pull(6);
            let card = if v == 0 { None } else { Some(Card::from_id(v as u8 - 1)) };
            pos.put_freecell(cell, card);
        }

        for (col, initial) in (0..self.variant.num_columns()).zip(&self.initial_columns) {
            let prefix = r.pull(self.prefix_len_bits) as usize;
            let appended_len = r.pull(4) as usize;
            for &card in &initial[..prefix] {
                pos.push_card(col, card);
            }
            let mut below: Option<Card> = if prefix > 0 { Some(initial[prefix - 1]) } else { None };
            for _ in 0..appended_len {
                let card = match below {
                    None => Card::from_id(r.pull(6) as u8),
                    Some(b) => {
                        let choices = self.suit_choices(b);
                        let idx = r.pull(self.choice_bits()) as usize;
                        let rank = crate::types::Rank::new(b.rank().value() - 1);
                        Card::new(choices[idx], rank)
                    }
                };
                pos.push_card(col, card);
                below = Some(card);
            }
        }

        pos
    }
}
