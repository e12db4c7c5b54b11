//! セーフ・オートプレイ（Horne prune）
//!
//! 「今すぐファンデーションに置けて、かつ以後の展開で必要になり得ない」
//! カードを固定点まで自動で上げる。初期配置に一度適用して成分深度の
//! 基準を作るほか、展開後の各派生局面にも適用する。

use crate::position::Position;
use crate::types::{Card, Suit, Variant, WhichMoves};

/// `card` を今すぐファンデーションへ置けるか
#[inline]
fn playable(pos: &Position, card: Card) -> bool {
    pos.foundation(card.suit()) + 1 == card.rank().value()
}

/// 置いても以後の手組みを壊さないか
///
/// 交互色バリアント: ランク2以下は常に安全。それ以外は反対色の両
/// ファンデーションが `rank - 1` 以上、同色のもう一方が `rank - 2` 以上。
/// ランク系バリアント: 他の全ファンデーションが `rank - 1` 以上。
fn is_safe(pos: &Position, card: Card) -> bool {
    let r = card.rank().value();
    if r <= 2 {
        return true;
    }
    if pos.variant().sequences_by_alternate_color() {
        let (opp, same_other): ([Suit; 2], Suit) = if card.suit().is_red() {
            ([Suit::Clubs, Suit::Spades], opposite_of_same_color(card.suit()))
        } else {
            ([Suit::Diamonds, Suit::Hearts], opposite_of_same_color(card.suit()))
        };
        opp.iter().all(|&s| pos.foundation(s) + 1 >= r)
            && pos.foundation(same_other) + 2 >= r
    } else {
        Suit::ALL
            .iter()
            .filter(|&&s| s != card.suit())
            .all(|&s| pos.foundation(s) + 1 >= r)
    }
}

fn opposite_of_same_color(suit: Suit) -> Suit {
    match suit {
        Suit::Clubs => Suit::Spades,
        Suit::Spades => Suit::Clubs,
        Suit::Diamonds => Suit::Hearts,
        Suit::Hearts => Suit::Diamonds,
    }
}

/// セーフなファンデーション手を固定点まで指す。
///
/// 動かした各カードを `which` に加算し、動かした枚数を返す。
pub fn horne_prune(pos: &mut Position, which: &mut WhichMoves) -> u32 {
    let mut count = 0u32;
    loop {
        let mut moved = false;

        for col in 0..pos.variant().num_columns() {
            while let Some(&top) = pos.column(col).last() {
                if playable(pos, top) && is_safe(pos, top) {
                    pos.pop_card(col);
                    pos.place_on_foundation(top);
                    which.bump(top.id() as usize);
                    count += 1;
                    moved = true;
                } else {
                    break;
                }
            }
        }

        for cell in 0..pos.freecells().len() {
            if let Some(card) = pos.freecells()[cell] {
                if playable(pos, card) && is_safe(pos, card) {
                    pos.put_freecell(cell, None);
                    pos.place_on_foundation(card);
                    which.bump(card.id() as usize);
                    count += 1;
                    moved = true;
                }
            }
        }

        if !moved {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_plays_safe_cards() {
        let text = "\
Foundations: C-K D-K H-J S-K
KH QH
";
        let mut pos = Position::from_deal_text(text, Variant::Freecell).unwrap();
        let mut which = WhichMoves::zero();
        let n = horne_prune(&mut pos, &mut which);
        // QH, KH が順に上がって完成する
        assert_eq!(n, 2);
        assert!(pos.is_solved());
        assert_eq!(which.total(), 2);
    }

    #[test]
    fn test_prune_respects_safety() {
        // H が T 止まりなので QC は安全ではない（JH がまだ場にある）
        let text = "\
Foundations: C-J D-K H-T S-K
JH QC
QH
KH KC
";
        let mut pos = Position::from_deal_text(text, Variant::Freecell).unwrap();
        let mut which = WhichMoves::zero();
        let n = horne_prune(&mut pos, &mut which);
        assert_eq!(n, 0);
        assert!(which.is_zero());
    }

    #[test]
    fn test_prune_cascade() {
        // KC をどけた状態からはオートプレイだけで完成する
        let text = "\
Foundations: C-Q D-K H-T S-K
JH
QH
KH
KC
";
        let mut pos = Position::from_deal_text(text, Variant::Freecell).unwrap();
        let mut which = WhichMoves::zero();
        let n = horne_prune(&mut pos, &mut which);
        assert_eq!(n, 4);
        assert!(pos.is_solved());
    }
}
