//! 訪問済み判定のキャッシュ層
//!
//! 判定順はプリキャッシュ → LRU キャッシュ → ストア。プリキャッシュは
//! 安価な有界集合で、満杯になったら中身ごと LRU へ流し込んで空にする。
//! ストアでのヒットは LRU へ昇格させ、以後のストア往復を避ける。
//! ストアが真実の源で、キャッシュ層は純粋な前段。

use std::collections::{HashMap, HashSet};

use rfreecell_core::EncodedKey;

use crate::config::{CacheMode, ShardConfig};
use crate::error::DbmError;
use crate::store::{RecordId, Store};

/// プリキャッシュ（有界メンバーシップ集合）
struct PreCache {
    set: HashSet<EncodedKey>,
    capacity: usize,
}

impl PreCache {
    fn new(capacity: usize) -> PreCache {
        PreCache { set: HashSet::with_capacity(capacity), capacity }
    }

    #[inline]
    fn contains(&self, key: &EncodedKey) -> bool {
        self.set.contains(key)
    }

    /// 挿入して、満杯になったら `true`
    fn insert(&mut self, key: EncodedKey) -> bool {
        self.set.insert(key);
        self.set.len() >= self.capacity
    }

    fn drain(&mut self) -> impl Iterator<Item = EncodedKey> + '_ {
        self.set.drain()
    }
}

const LRU_NIL: usize = usize::MAX;

struct LruNode {
    key: EncodedKey,
    prev: usize,
    next: usize,
}

/// LRU 削除つきキャッシュ
///
/// ノードは添字リンクの双方向リストで、`head` が最近使用側。
struct LruCache {
    map: HashMap<EncodedKey, usize>,
    nodes: Vec<LruNode>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl LruCache {
    fn new(capacity: usize) -> LruCache {
        LruCache {
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: LRU_NIL,
            tail: LRU_NIL,
            capacity,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            LRU_NIL => self.head = next,
            p => self.nodes[p].next = next,
        }
        match next {
            LRU_NIL => self.tail = prev,
            n => self.nodes[n].prev = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = LRU_NIL;
        self.nodes[idx].next = self.head;
        match self.head {
            LRU_NIL => self.tail = idx,
            h => self.nodes[h].prev = idx,
        }
        self.head = idx;
    }

    /// ヒットなら最近使用側へ移して `true`
    fn touch(&mut self, key: &EncodedKey) -> bool {
        let Some(&idx) = self.map.get(key) else { return false };
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
        true
    }

    fn insert(&mut self, key: EncodedKey) {
        if self.capacity == 0 || self.touch(&key) {
            return;
        }
        let idx = if self.map.len() >= self.capacity {
            // 最も古いノードを追い出して器を再利用する
            let idx = self.tail;
            self.unlink(idx);
            self.map.remove(&self.nodes[idx].key);
            self.nodes[idx].key = key;
            idx
        } else {
            self.nodes.push(LruNode { key, prev: LRU_NIL, next: LRU_NIL });
            self.nodes.len() - 1
        };
        self.map.insert(key, idx);
        self.push_front(idx);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map.len()
    }
}

/// キャッシュ判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// 既に訪問済み（破棄してよい）
    Seen,
    /// 新規。ストアへ挿入済みのレコードを返す
    New(RecordId),
}

/// キャッシュ層 + ストアを束ねた訪問済み集合
pub struct VisitedSet {
    mode: CacheMode,
    pre: PreCache,
    lru: LruCache,
    store: Store,
}

impl VisitedSet {
    pub fn new(store: Store, config: &ShardConfig) -> VisitedSet {
        VisitedSet {
            mode: config.cache_mode,
            pre: PreCache::new(config.pre_cache_max_count),
            lru: LruCache::new(config.main_cache_capacity()),
            store,
        }
    }

    /// 判定と登録を一体で行う。
    ///
    /// 既知のキーは `Seen`（ストアヒットは LRU へ昇格）。未知のキーは
    /// ストアへ挿入し、キャッシュ層にも載せて `New` を返す。
    pub fn check_and_insert(
        &mut self,
        key: EncodedKey,
        parent: Option<RecordId>,
        depth: u32,
    ) -> Result<CheckOutcome, DbmError> {
        if self.mode == CacheMode::CachesAndStore {
            if self.pre.contains(&key) {
                return Ok(CheckOutcome::Seen);
            }
            if self.lru.touch(&key) {
                return Ok(CheckOutcome::Seen);
            }
            if self.store.contains(&key) {
                self.lru.insert(key);
                return Ok(CheckOutcome::Seen);
            }
            let (id, new) = self.store.insert_if_absent(key, parent, depth)?;
            debug_assert!(new);
            if self.pre.insert(key) {
                for k in self.pre.drain() {
                    self.lru.insert(k);
                }
            }
            Ok(CheckOutcome::New(id))
        } else {
            match self.store.insert_if_absent(key, parent, depth)? {
                (_, false) => Ok(CheckOutcome::Seen),
                (id, true) => Ok(CheckOutcome::New(id)),
            }
        }
    }

    #[inline]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }
}
