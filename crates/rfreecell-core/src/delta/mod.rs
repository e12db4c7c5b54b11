//! デルタ符号化
//!
//! 局面を初期配置との差分として固定長バッファへ詰める。到達可能な局面の
//! 各列は「初期配置の接頭辞 + その上に積まれた降順の連なり」に限られる
//! ことを利用し、積まれたカードは連結規則で決まらない自由度
//! （交互色なら1bit、ランク系なら2bitのスート選択）だけを記録する。
//!
//! 符号化はバイト列の辞書式順序で比較され、探索全体の重複排除キーになる。

mod bits;
mod codec;

pub use codec::{DeltaCodec, ENCODED_LEN, EncodedKey};

#[cfg(test)]
mod tests;
