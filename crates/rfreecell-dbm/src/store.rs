//! 訪問済みストア
//!
//! キー → レコード（親参照・深さ）の永続マップ。実体はメモリ上のスラブ +
//! キー索引で、挿入ごとに固定長レコードを追記ログへ書き足す。`open` は
//! 既存ログを再生して1シャード内のプロセス再起動に耐える。末尾の
//! 不完全レコードはログ破損として致命的エラーにする。

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rfreecell_core::{ENCODED_LEN, EncodedKey};

use crate::error::DbmError;

/// ログ上の「親なし」を表す番兵
const NIL_PARENT: u32 = u32::MAX;
/// 1レコードのログ長（キー + 親 + 深さ）
const RECORD_LEN: usize = ENCODED_LEN + 4 + 4;

/// ストア内レコードの識別子（スラブ添字）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(u32);

impl RecordId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// スラブ添字からの再構成（キューページの読み戻し用）
    #[inline]
    pub(crate) fn from_raw(raw: u32) -> RecordId {
        RecordId(raw)
    }
}

/// 訪問済み局面1つ
#[derive(Debug, Clone)]
pub struct Record {
    pub key: EncodedKey,
    /// 経路復元用の親参照（`None` は成分の根）
    pub parent: Option<RecordId>,
    pub depth: u32,
}

pub struct Store {
    path: PathBuf,
    log: BufWriter<File>,
    records: Vec<Record>,
    index: HashMap<EncodedKey, RecordId>,
}

impl Store {
    /// ログを開く。既存ファイルがあれば再生してスラブと索引を復元する。
    pub fn open(path: &Path) -> Result<Store, DbmError> {
        let mut records = Vec::new();
        let mut index = HashMap::new();

        if path.exists() {
            let mut bytes = Vec::new();
            File::open(path)
                .and_then(|mut f| f.read_to_end(&mut bytes))
                .map_err(|e| DbmError::io(path, e))?;
            if bytes.len() % RECORD_LEN != 0 {
                return Err(DbmError::CorruptStore {
                    path: path.into(),
                    reason: format!(
                        "trailing partial record ({} bytes past a {RECORD_LEN}-byte boundary)",
                        bytes.len() % RECORD_LEN
                    ),
                });
            }
            for chunk in bytes.chunks_exact(RECORD_LEN) {
                let key = EncodedKey::from_bytes(&chunk[..ENCODED_LEN])
                    .expect("record chunk has key length");
                let raw_parent =
                    u32::from_le_bytes(chunk[ENCODED_LEN..ENCODED_LEN + 4].try_into().unwrap());
                let depth =
                    u32::from_le_bytes(chunk[ENCODED_LEN + 4..].try_into().unwrap());
                let parent = (raw_parent != NIL_PARENT).then_some(RecordId(raw_parent));
                if let Some(p) = parent {
                    if p.index() >= records.len() {
                        return Err(DbmError::CorruptStore {
                            path: path.into(),
                            reason: format!("record {} references unwritten parent", records.len()),
                        });
                    }
                }
                let id = RecordId(records.len() as u32);
                if index.insert(key, id).is_some() {
                    return Err(DbmError::CorruptStore {
                        path: path.into(),
                        reason: format!("duplicate key at record {}", id.index()),
                    });
                }
                records.push(Record { key, parent, depth });
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| DbmError::io(path, e))?;
        Ok(Store { path: path.into(), log: BufWriter::new(file), records, index })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &EncodedKey) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn lookup(&self, key: &EncodedKey) -> Option<RecordId> {
        self.index.get(key).copied()
    }

    #[inline]
    pub fn record(&self, id: RecordId) -> &Record {
        &self.records[id.index()]
    }

    /// 未登録なら挿入して `(id, true)`、登録済みなら既存の `(id, false)`。
    ///
    /// キーごとの挿入は高々一度であることの唯一の強制点。
    pub fn insert_if_absent(
        &mut self,
        key: EncodedKey,
        parent: Option<RecordId>,
        depth: u32,
    ) -> Result<(RecordId, bool), DbmError> {
        if let Some(id) = self.index.get(&key) {
            return Ok((*id, false));
        }
        let id = RecordId(self.records.len() as u32);

        let mut buf = [0u8; RECORD_LEN];
        buf[..ENCODED_LEN].copy_from_slice(key.as_bytes());
        let raw_parent = parent.map(|p| p.0).unwrap_or(NIL_PARENT);
        buf[ENCODED_LEN..ENCODED_LEN + 4].copy_from_slice(&raw_parent.to_le_bytes());
        buf[ENCODED_LEN + 4..].copy_from_slice(&depth.to_le_bytes());
        self.log.write_all(&buf).map_err(|e| DbmError::io(&self.path, e))?;

        self.records.push(Record { key, parent, depth });
        self.index.insert(key, id);
        Ok((id, true))
    }

    /// 指定より浅いレコードを索引から外す（終了時の任意の回収パス）。
    ///
    /// レコード本体と親リンクは残るため経路復元は引き続き可能。
    /// 外した件数を返す。
    pub fn sweep_older_than(&mut self, depth: u32) -> usize {
        let records = &self.records;
        let before = self.index.len();
        self.index.retain(|_, id| records[id.index()].depth >= depth);
        before - self.index.len()
    }

    pub fn flush(&mut self) -> Result<(), DbmError> {
        self.log.flush().map_err(|e| DbmError::io(&self.path, e))
    }
}
