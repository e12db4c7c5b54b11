//! ディスク退避つきマルチワーカー BFS ソルバー
//!
//! FreeCell 系ソリティアの合法手グラフを幅優先で全探索する。探索空間を
//! 非可逆手で区切られた連結成分（FCC）に分割し、1実行 = 1成分を担当する
//! シャードとして、境界越えの局面を出口点ファイルで次のシャードへ渡す。
//!
//! - `pool`: 派生局面ノードのプール（ワーカーごと）
//! - `store`: 訪問済みストア（追記ログ + スラブ + キー索引）
//! - `cache`: プリキャッシュ / LRU キャッシュ / ストアを束ねた訪問済み集合
//! - `queue`: 深さ別マルチキュー（任意でページ単位のディスク退避）
//! - `fcc`: 入口点索引・入口ファイル読み込み・出口点ファイル書き出し
//! - `fingerprint`: フィンガープリント等の base64 テキスト表現
//! - `trace`: 親参照による経路復元と手の再計算
//! - `domain`: ルールエンジン境界（`SearchDomain` / `GameDomain`）
//! - `instance`: シャード調整役とワーカーループ
//! - `config` / `error`: 実行設定とエラー型

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod fcc;
pub mod fingerprint;
pub mod instance;
pub mod pool;
pub mod queue;
pub mod store;
pub mod trace;

pub use cache::{CheckOutcome, VisitedSet};
pub use config::{CacheMode, MIN_CACHES_DELTA, MIN_PRE_CACHE_MAX_COUNT, ShardConfig};
pub use domain::{GameDomain, SearchDomain};
pub use error::DbmError;
pub use fcc::{EntryPoint, EntryPointIndex, ExitPointWriter};
pub use instance::{Instance, SearchStats, Solution, Step, TerminalState};
pub use pool::{DerivedNode, DerivedPool, NIL};
pub use queue::DepthMultiQueue;
pub use store::{Record, RecordId, Store};
