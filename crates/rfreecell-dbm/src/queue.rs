//! 深さ別マルチキュー
//!
//! フロンティアを探索深さごとのバケットに分け、バケット内は FIFO。
//! 取り出しは調整役の現在深さのバケットだけが対象で、これが BFS の
//! 層順序を保証する。オフロード先を指定すると、バケットは満ちた
//! ページ単位で中間部分をファイルへ退避し、FIFO 順のまま読み戻す。

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DbmError;
use crate::store::RecordId;

/// 1バケット。`front` が取り出し側、`back` が書き込み側で、
/// 中間はページファイルの列として退避され得る。
#[derive(Default)]
struct Bucket {
    front: VecDeque<RecordId>,
    pages: VecDeque<PathBuf>,
    back: Vec<RecordId>,
}

impl Bucket {
    fn is_empty(&self) -> bool {
        self.front.is_empty() && self.pages.is_empty() && self.back.is_empty()
    }
}

pub struct DepthMultiQueue {
    buckets: BTreeMap<u32, Bucket>,
    offload_dir: Option<PathBuf>,
    items_per_page: usize,
    page_seq: u64,
    len: usize,
}

impl DepthMultiQueue {
    pub fn new(offload_dir: Option<&Path>, items_per_page: usize) -> DepthMultiQueue {
        DepthMultiQueue {
            buckets: BTreeMap::new(),
            offload_dir: offload_dir.map(Path::to_path_buf),
            items_per_page,
            page_seq: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 空でない最小深さ
    pub fn min_depth(&self) -> Option<u32> {
        self.buckets.iter().find(|(_, b)| !b.is_empty()).map(|(&d, _)| d)
    }

    pub fn insert(&mut self, depth: u32, id: RecordId) -> Result<(), DbmError> {
        let offload = self.offload_dir.is_some();
        let bucket = self.buckets.entry(depth).or_default();
        if offload {
            bucket.back.push(id);
            if bucket.back.len() >= self.items_per_page {
                let dir = self.offload_dir.as_ref().unwrap().clone();
                let path = dir.join(format!("q{depth:04}-{:06}.page", self.page_seq));
                self.page_seq += 1;
                write_page(&path, &bucket.back)?;
                bucket.back.clear();
                bucket.pages.push_back(path);
            }
        } else {
            bucket.front.push_back(id);
        }
        self.len += 1;
        Ok(())
    }

    /// `current_depth` のバケットから1件取り出す。バケットが空なら `None`。
    pub fn extract(&mut self, current_depth: u32) -> Result<Option<RecordId>, DbmError> {
        let Some(bucket) = self.buckets.get_mut(&current_depth) else {
            return Ok(None);
        };
        if bucket.front.is_empty() {
            if let Some(path) = bucket.pages.pop_front() {
                bucket.front = read_page(&path)?;
                fs::remove_file(&path).map_err(|e| DbmError::io(&path, e))?;
            } else {
                bucket.front.extend(bucket.back.drain(..));
            }
        }
        let item = bucket.front.pop_front();
        if item.is_some() {
            self.len -= 1;
        }
        if bucket.is_empty() {
            self.buckets.remove(&current_depth);
        }
        Ok(item)
    }
}

fn write_page(path: &Path, items: &[RecordId]) -> Result<(), DbmError> {
    let mut bytes = Vec::with_capacity(items.len() * 4);
    for id in items {
        bytes.extend_from_slice(&(id.index() as u32).to_le_bytes());
    }
    fs::write(path, bytes).map_err(|e| DbmError::io(path, e))
}

fn read_page(path: &Path) -> Result<VecDeque<RecordId>, DbmError> {
    let bytes = fs::read(path).map_err(|e| DbmError::io(path, e))?;
    if bytes.len() % 4 != 0 {
        return Err(DbmError::CorruptStore {
            path: path.into(),
            reason: "queue page is not a whole number of items".into(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| RecordId::from_raw(u32::from_le_bytes(c.try_into().unwrap())))
        .collect())
}
