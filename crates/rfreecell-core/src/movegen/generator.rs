//! 合法手生成
//!
//! 単カード移動のみ（複数枚の列移動はフリーセル経由の単手列に分解される
//! ため生成しない）。各手の適用後にセーフ・オートプレイを走らせ、起きた
//! 非可逆手を `which_irreversible` に集計する。

use crate::movegen::{Derived, LOC_FOUNDATION, LOC_FREECELL0, Move, prune::horne_prune};
use crate::position::Position;
use crate::types::{Card, WhichMoves};

/// `card` を `onto` の上に積めるか
#[inline]
fn can_stack(pos: &Position, card: Card, onto: Card) -> bool {
    onto.rank().value() == card.rank().value() + 1
        && (!pos.variant().sequences_by_alternate_color() || card.is_red() != onto.is_red())
}

fn finish(mut child: Position, mv: Move, mut which: WhichMoves, out: &mut Vec<Derived>) {
    horne_prune(&mut child, &mut which);
    let num = which.total() as u8;
    out.push(Derived { position: child, mv, which_irreversible: which, num_irreversible: num });
}

/// `pos` の派生局面をすべて `out` へ生成する（`out` はクリアされる）
pub fn expand(pos: &Position, out: &mut Vec<Derived>) {
    out.clear();
    let ncols = pos.variant().num_columns();

    // 列の先頭 → ファンデーション
    for col in 0..ncols {
        if let Some(&top) = pos.column(col).last() {
            if pos.foundation(top.suit()) + 1 == top.rank().value() {
                let mut child = pos.clone();
                child.pop_card(col);
                child.place_on_foundation(top);
                let mut which = WhichMoves::zero();
                which.bump(top.id() as usize);
                finish(child, Move::new(col as u8, LOC_FOUNDATION), which, out);
            }
        }
    }

    // フリーセル → ファンデーション
    for cell in 0..pos.freecells().len() {
        if let Some(card) = pos.freecells()[cell] {
            if pos.foundation(card.suit()) + 1 == card.rank().value() {
                let mut child = pos.clone();
                child.put_freecell(cell, None);
                child.place_on_foundation(card);
                let mut which = WhichMoves::zero();
                which.bump(card.id() as usize);
                finish(child, Move::new(LOC_FREECELL0 + cell as u8, LOC_FOUNDATION), which, out);
            }
        }
    }

    // 列の先頭 → 別の列
    for src in 0..ncols {
        let Some(&top) = pos.column(src).last() else { continue };
        let mut used_empty = false;
        for dst in 0..ncols {
            if dst == src {
                continue;
            }
            match pos.column(dst).last() {
                Some(&onto) => {
                    if !can_stack(pos, top, onto) {
                        continue;
                    }
                }
                None => {
                    // 空列同士は等価なので最初の1つだけを移動先にする
                    if !pos.variant().allows_empty_column_moves() || used_empty {
                        continue;
                    }
                    used_empty = true;
                }
            }
            let mut child = pos.clone();
            child.pop_card(src);
            child.push_card(dst, top);
            finish(child, Move::new(src as u8, dst as u8), WhichMoves::zero(), out);
        }
    }

    // フリーセル → 列
    for cell in 0..pos.freecells().len() {
        let Some(card) = pos.freecells()[cell] else { continue };
        let mut used_empty = false;
        for dst in 0..ncols {
            match pos.column(dst).last() {
                Some(&onto) => {
                    if !can_stack(pos, card, onto) {
                        continue;
                    }
                }
                None => {
                    if !pos.variant().allows_empty_column_moves() || used_empty {
                        continue;
                    }
                    used_empty = true;
                }
            }
            let mut child = pos.clone();
            child.put_freecell(cell, None);
            child.push_card(dst, card);
            finish(child, Move::new(LOC_FREECELL0 + cell as u8, dst as u8), WhichMoves::zero(), out);
        }
    }

    // 列の先頭 → 空きフリーセル（セル同士は等価なので1つだけ）
    if let Some(cell) = pos.freecells().iter().position(|c| c.is_none()) {
        for src in 0..ncols {
            if let Some(&top) = pos.column(src).last() {
                let mut child = pos.clone();
                child.pop_card(src);
                child.put_freecell(cell, Some(top));
                finish(child, Move::new(src as u8, LOC_FREECELL0 + cell as u8), WhichMoves::zero(), out);
            }
        }
    }
}
