//! FreeCell系ソリティアのコアライブラリ
//!
//! - `types`: カード・バリアント・非可逆手カウンタ
//! - `position`: 局面表現と盤面テキストの読み書き
//! - `movegen`: 合法手生成とセーフ・オートプレイ（Horne prune）
//! - `delta`: 初期配置に対するデルタ符号化（探索のキー表現）

pub mod delta;
pub mod movegen;
pub mod position;
pub mod types;

pub use delta::{DeltaCodec, ENCODED_LEN, EncodedKey};
pub use movegen::{Derived, Move, expand, horne_prune};
pub use position::{Position, PositionParseError};
pub use types::{Card, Rank, Suit, Variant, WHICH_MOVES_LEN, WhichMoves};
