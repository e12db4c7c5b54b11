//! エラー型
//!
//! 設定・入出力・永続データ破損は型付きエラーとして上位へ伝播する。
//! 内部不変条件の違反（トレース不一致、エントリポイント索引の欠落など）は
//! バグの兆候であり、エラーにせず panic で即座に停止する。

use std::path::PathBuf;

use thiserror::Error;

use rfreecell_core::PositionParseError;

#[derive(Debug, Error)]
pub enum DbmError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store file {path}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("entry point file {path}, line {line}: {reason}")]
    EntryFile { path: PathBuf, line: usize, reason: String },

    #[error("board parse error: {0}")]
    Board(#[from] PositionParseError),
}

impl DbmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> DbmError {
        DbmError::Io { path: path.into(), source }
    }
}
