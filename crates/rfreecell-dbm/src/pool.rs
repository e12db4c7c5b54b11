//! 派生局面ノードのプール
//!
//! 展開1回ごとに派生局面を単方向リストとして確保し、処理後はチェーン
//! ごとフリーリストへ返して再利用する。ワーカースレッドごとに1つ持ち、
//! スレッド間で共有しない。ノードは添字リンクで、`NIL` が終端。

use rfreecell_core::{EncodedKey, Move, WhichMoves};

/// チェーン終端・空フリーリストの番兵
pub const NIL: u32 = u32::MAX;

/// 展開で得た派生局面1つ
#[derive(Debug)]
pub struct DerivedNode<S> {
    pub state: S,
    pub mv: Move,
    pub key: EncodedKey,
    /// この手で起きた非可逆手（オートプレイ分を含む）
    pub which_irreversible: WhichMoves,
    pub num_irreversible: u8,
    /// チェーン内の次ノード添字（`NIL` で終端）
    pub next: u32,
}

/// 添字リンクのノードプール
pub struct DerivedPool<S> {
    nodes: Vec<DerivedNode<S>>,
    free_head: u32,
}

impl<S> DerivedPool<S> {
    pub fn new() -> DerivedPool<S> {
        DerivedPool { nodes: Vec::new(), free_head: NIL }
    }

    /// ノードを1つ確保してチェーン `next` の先頭につなぐ。添字を返す。
    pub fn alloc(
        &mut self,
        state: S,
        mv: Move,
        key: EncodedKey,
        which_irreversible: WhichMoves,
        num_irreversible: u8,
        next: u32,
    ) -> u32 {
        let node = DerivedNode { state, mv, key, which_irreversible, num_irreversible, next };
        if self.free_head == NIL {
            self.nodes.push(node);
            (self.nodes.len() - 1) as u32
        } else {
            let idx = self.free_head;
            self.free_head = self.nodes[idx as usize].next;
            self.nodes[idx as usize] = node;
            idx
        }
    }

    #[inline]
    pub fn node(&self, idx: u32) -> &DerivedNode<S> {
        &self.nodes[idx as usize]
    }

    /// `head` から始まるチェーン全体をフリーリストへ返す
    pub fn release_chain(&mut self, head: u32) {
        let mut idx = head;
        while idx != NIL {
            let next = self.nodes[idx as usize].next;
            self.nodes[idx as usize].next = self.free_head;
            self.free_head = idx;
            idx = next;
        }
    }

    /// チェーンの添字を先頭から順にたどる
    pub fn iter_chain(&self, head: u32) -> ChainIter<'_, S> {
        ChainIter { pool: self, idx: head }
    }
}

impl<S> Default for DerivedPool<S> {
    fn default() -> DerivedPool<S> {
        DerivedPool::new()
    }
}

pub struct ChainIter<'a, S> {
    pool: &'a DerivedPool<S>,
    idx: u32,
}

impl<S> Iterator for ChainIter<'_, S> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.idx == NIL {
            return None;
        }
        let idx = self.idx;
        self.idx = self.pool.nodes[idx as usize].next;
        Some(idx)
    }
}
