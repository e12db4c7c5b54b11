//! 親参照をたどる経路復元
//!
//! ストアのレコードは親参照しか持たないため、各ステップの手は親局面を
//! 再展開して子キーの一致で求め直す。一致する子が見つからないのは
//! ストアか符号化の不整合であり、即座に panic する。

use rfreecell_core::{EncodedKey, Move};

use crate::domain::SearchDomain;
use crate::pool::DerivedPool;
use crate::store::{RecordId, Store};

/// `id` から根まで親参照をたどり、根を先頭にした経路を返す
pub fn trace(store: &Store, id: RecordId) -> Vec<(RecordId, EncodedKey)> {
    let mut path = Vec::new();
    let mut cur = Some(id);
    while let Some(id) = cur {
        let record = store.record(id);
        path.push((id, record.key));
        cur = record.parent;
    }
    path.reverse();
    path
}

/// `parent` を再展開して `child` を生んだ手を求める
pub fn move_between<D: SearchDomain>(
    domain: &D,
    pool: &mut DerivedPool<D::State>,
    parent: &EncodedKey,
    child: &EncodedKey,
) -> Move {
    let state = domain.decode(parent);
    let head = domain.expand(&state, pool);
    let found = pool
        .iter_chain(head)
        .find(|&idx| pool.node(idx).key == *child)
        .map(|idx| pool.node(idx).mv);
    pool.release_chain(head);
    match found {
        Some(mv) => mv,
        None => panic!("no move found between parent and child states"),
    }
}

/// 経路の各ステップの手コード列を求める
pub fn moves_along<D: SearchDomain>(
    domain: &D,
    pool: &mut DerivedPool<D::State>,
    path: &[(RecordId, EncodedKey)],
) -> Vec<u8> {
    path.windows(2)
        .map(|pair| move_between(domain, pool, &pair[0].1, &pair[1].1).code())
        .collect()
}
