//! フィンガープリント・キー・手順列の base64 テキスト表現
//!
//! 入出力ファイル（エントリポイント・出口点）の各フィールドに使う。
//! 長さが固定のもの（フィンガープリント・キー）は復号時に厳密長を検査し、
//! 不一致は起動時の設定エラーとして即座に失敗させる。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use rfreecell_core::{ENCODED_LEN, EncodedKey, WHICH_MOVES_LEN, WhichMoves};

use crate::error::DbmError;

pub fn render_fingerprint(fp: &WhichMoves) -> String {
    STANDARD.encode(fp.as_bytes())
}

/// base64 文字列からフィンガープリントを復元する（厳密長）
pub fn parse_fingerprint(text: &str) -> Result<WhichMoves, DbmError> {
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| DbmError::Config(format!("invalid fingerprint base64: {e}")))?;
    WhichMoves::from_bytes(&bytes).ok_or_else(|| {
        DbmError::Config(format!(
            "fingerprint must decode to {WHICH_MOVES_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

pub fn render_key(key: &EncodedKey) -> String {
    STANDARD.encode(key.as_bytes())
}

/// base64 文字列から局面キーを復元する（厳密長）
pub fn parse_key(text: &str) -> Option<EncodedKey> {
    let bytes = STANDARD.decode(text).ok()?;
    if bytes.len() != ENCODED_LEN {
        return None;
    }
    EncodedKey::from_bytes(&bytes)
}

pub fn render_moves(moves: &[u8]) -> String {
    STANDARD.encode(moves)
}

pub fn parse_moves(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}
