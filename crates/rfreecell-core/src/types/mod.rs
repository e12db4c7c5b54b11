//! 基本型
//!
//! - `Card` / `Suit` / `Rank`: カード
//! - `Variant`: ゲームバリアント（freecell / bakers_dozen）
//! - `WhichMoves`: 非可逆手のクラス別カウンタ（2bit × 52クラス）

mod card;
mod variant;
mod which_moves;

pub use card::{Card, Rank, Suit};
pub use variant::Variant;
pub use which_moves::{WHICH_MOVES_LEN, WhichMoves};
