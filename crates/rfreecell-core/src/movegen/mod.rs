//! 合法手生成（単カード移動）とセーフ・オートプレイ
//!
//! 生成される手は「1枚移動 + その直後のセーフ・オートプレイ」を1手と
//! 数える。各派生局面には、その手で起きた非可逆手（ファンデーション
//! 置き。オートプレイ分を含む）のカウンタが付く。

mod generator;
mod prune;

use std::fmt;

use crate::position::Position;
use crate::types::WhichMoves;

pub use generator::expand;
pub use prune::horne_prune;

/// 移動先・移動元の位置コード
///
/// 0..=12 は列番号、`0xD`/`0xE` はフリーセル、`0xF` はファンデーション。
pub const LOC_FREECELL0: u8 = 0xD;
pub const LOC_FREECELL1: u8 = 0xE;
pub const LOC_FOUNDATION: u8 = 0xF;

/// 1バイト移動コード（下位4bit = 移動元、上位4bit = 移動先）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u8);

impl Move {
    #[inline]
    pub const fn new(src: u8, dst: u8) -> Move {
        Move((dst << 4) | (src & 0x0F))
    }

    #[inline]
    pub const fn from_code(code: u8) -> Move {
        Move(code)
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn src(self) -> u8 {
        self.0 & 0x0F
    }

    #[inline]
    pub const fn dst(self) -> u8 {
        self.0 >> 4
    }
}

fn fmt_loc(f: &mut fmt::Formatter<'_>, loc: u8) -> fmt::Result {
    match loc {
        LOC_FREECELL0 => write!(f, "x0"),
        LOC_FREECELL1 => write!(f, "x1"),
        LOC_FOUNDATION => write!(f, "home"),
        n => write!(f, "{n}"),
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_loc(f, self.src())?;
        write!(f, "->")?;
        fmt_loc(f, self.dst())
    }
}

/// 展開で得られる派生局面1つ
#[derive(Debug, Clone)]
pub struct Derived {
    pub position: Position,
    pub mv: Move,
    /// この手で起きた非可逆手（オートプレイ分を含む）
    pub which_irreversible: WhichMoves,
    /// `which_irreversible` のレーン総和
    pub num_irreversible: u8,
}
