//! ゲームバリアント
//!
//! コンパイル時フラグではなく実行時の列挙で切り替える。
//! - `freecell`: 8列・フリーセル2（交互色で降順に積む）
//! - `bakers_dozen`: 13列・フリーセルなし（スート不問でランク降順に積む、空列への移動不可）

use serde::{Deserialize, Serialize};

/// ゲームバリアント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Freecell,
    BakersDozen,
}

impl Variant {
    pub fn from_name(name: &str) -> Option<Variant> {
        match name {
            "freecell" => Some(Variant::Freecell),
            "bakers_dozen" => Some(Variant::BakersDozen),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Variant::Freecell => "freecell",
            Variant::BakersDozen => "bakers_dozen",
        }
    }

    #[inline]
    pub const fn num_columns(self) -> usize {
        match self {
            Variant::Freecell => 8,
            Variant::BakersDozen => 13,
        }
    }

    #[inline]
    pub const fn num_freecells(self) -> usize {
        match self {
            Variant::Freecell => 2,
            Variant::BakersDozen => 0,
        }
    }

    /// 列に積むとき交互色を要求するか（false ならランクのみ）
    #[inline]
    pub const fn sequences_by_alternate_color(self) -> bool {
        matches!(self, Variant::Freecell)
    }

    /// 空列へカードを移動できるか
    #[inline]
    pub const fn allows_empty_column_moves(self) -> bool {
        matches!(self, Variant::Freecell)
    }
}
