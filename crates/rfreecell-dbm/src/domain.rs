//! ルールエンジンとの境界
//!
//! 探索本体はゲーム規則をこのトレイト越しにだけ使う。本番実装は
//! `rfreecell-core` の上の `GameDomain`、テストでは台本どおりに
//! 展開するモックを差し込む。

use rfreecell_core::{
    DeltaCodec, Derived, EncodedKey, Position, Variant, WhichMoves, expand, horne_prune,
};

use crate::error::DbmError;
use crate::pool::{DerivedPool, NIL};

/// 探索が要求するゲーム規則の操作
pub trait SearchDomain {
    type State;

    fn decode(&self, key: &EncodedKey) -> Self::State;
    fn encode(&self, state: &Self::State) -> EncodedKey;

    /// `state` の派生局面をプールへチェーンとして確保し、先頭添字を返す
    fn expand(&self, state: &Self::State, pool: &mut DerivedPool<Self::State>) -> u32;

    fn is_goal(&self, state: &Self::State) -> bool;
}

/// `rfreecell-core` の規則による本番ドメイン
pub struct GameDomain {
    codec: DeltaCodec,
}

impl GameDomain {
    /// 盤面テキストからドメインを作る。
    ///
    /// 初期配置にセーフ・オートプレイを一度適用し、その結果を符号化の
    /// 基準にする。根のキーと、オートプレイで起きた非可逆手カウンタ
    /// （フィンガープリントの基準値）も返す。
    pub fn from_deal_text(
        text: &str,
        variant: Variant,
    ) -> Result<(GameDomain, EncodedKey, WhichMoves), DbmError> {
        let mut pos = Position::from_deal_text(text, variant)?;
        let mut which = WhichMoves::zero();
        horne_prune(&mut pos, &mut which);
        let codec = DeltaCodec::new(&pos);
        let root = codec.encode(&pos);
        Ok((GameDomain { codec }, root, which))
    }
}

impl SearchDomain for GameDomain {
    type State = Position;

    fn decode(&self, key: &EncodedKey) -> Position {
        self.codec.decode(key)
    }

    fn encode(&self, state: &Position) -> EncodedKey {
        self.codec.encode(state)
    }

    fn expand(&self, state: &Position, pool: &mut DerivedPool<Position>) -> u32 {
        let mut scratch: Vec<Derived> = Vec::new();
        expand(state, &mut scratch);
        let mut head = NIL;
        for d in scratch.into_iter().rev() {
            let key = self.codec.encode(&d.position);
            head = pool.alloc(
                d.position,
                d.mv,
                key,
                d.which_irreversible,
                d.num_irreversible,
                head,
            );
        }
        head
    }

    fn is_goal(&self, state: &Position) -> bool {
        state.is_solved()
    }
}
