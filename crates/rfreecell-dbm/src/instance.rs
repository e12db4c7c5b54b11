//! シャード調整役とワーカーループ
//!
//! 1シャード = 1つの連結成分の全探索。`Instance` が訪問済み集合・
//! キュー・入口索引・出口出力・共有カウンタをそれぞれ専用ロックの
//! 内側に持ち、ワーカーはここの公開メソッドだけを通じて共有状態に
//! 触れる。ロックの取得順は
//! `visited → queue → global` と `visited → entry_points → exit_out`
//! の2系列で、循環しない。
//!
//! 終端状態（解発見・回数上限・探索し尽くし）は互いに排他で、一度
//! 立ったら上書きされない。ワーカーは取り出しのたびに旗を確認し、
//! 処理中の1件だけは最後まで済ませてから止まる。

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rfreecell_core::{EncodedKey, Move, WhichMoves};

use crate::cache::{CheckOutcome, VisitedSet};
use crate::config::ShardConfig;
use crate::domain::SearchDomain;
use crate::error::DbmError;
use crate::fcc::{EntryPoint, EntryPointIndex, ExitPointWriter, read_entry_file};
use crate::pool::{DerivedPool, NIL};
use crate::queue::DepthMultiQueue;
use crate::store::{RecordId, Store};
use crate::trace::{move_between, moves_along, trace};

/// フロンティアが一時的に空のときの待ち時間
const IDLE_SLEEP: Duration = Duration::from_millis(5);
/// 統計ログの間隔（処理件数）
const STATS_INTERVAL: u64 = 100_000;

/// 実行の終端状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// ゴール局面に到達した
    SolutionFound,
    /// 展開回数の上限に達した
    MaxItersReached,
    /// フロンティアを展開し尽くした（このシャード内に解なし）
    Exhausted,
}

/// 進行カウンタのスナップショット
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub count_num_processed: u64,
    pub num_states_in_collection: u64,
    pub count_of_items_in_queue: u64,
    pub curr_depth: u32,
    pub num_exit_points: u64,
}

/// ワーカー1ステップの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 1件取り出して展開した
    Processed,
    /// 今は空だが仕掛かり中のワーカーがいる（待って再試行）
    Idle,
    /// 終端（旗が立ったか、フロンティアが尽きた）
    Stop,
}

/// 解の経路（根から順のキー列と、各ステップの手）
#[derive(Debug, Clone)]
pub struct Solution {
    pub keys: Vec<EncodedKey>,
    pub moves: Vec<Move>,
}

struct Global {
    count_num_processed: u64,
    num_states_in_collection: u64,
    count_of_items_in_queue: u64,
    /// 取り出し済みで処理中の件数
    in_flight: u32,
    curr_depth: u32,
    terminal: Option<TerminalState>,
    /// 解の種: ゴールの親レコード・ゴールのキー・最後の手
    solution_seed: Option<(RecordId, EncodedKey, Move)>,
}

pub struct Instance<D: SearchDomain> {
    domain: D,
    start_fingerprint: WhichMoves,
    max_count_num_processed: Option<u64>,
    num_threads: usize,
    visited: Mutex<VisitedSet>,
    queue: Mutex<DepthMultiQueue>,
    entry_points: Mutex<EntryPointIndex>,
    exit_out: Mutex<ExitPointWriter>,
    global: Mutex<Global>,
    /// ワーカーのエラーによる協調停止
    abort: AtomicBool,
}

impl<D: SearchDomain> Instance<D> {
    pub fn new(
        domain: D,
        config: &ShardConfig,
        start_fingerprint: WhichMoves,
    ) -> Result<Instance<D>, DbmError> {
        let store = Store::open(&config.store_path)?;
        Ok(Instance {
            domain,
            start_fingerprint,
            max_count_num_processed: config.max_count_num_processed(),
            num_threads: config.num_threads,
            visited: Mutex::new(VisitedSet::new(store, config)),
            queue: Mutex::new(DepthMultiQueue::new(
                config.offload_dir.as_deref(),
                config.items_per_page,
            )),
            entry_points: Mutex::new(EntryPointIndex::new()),
            exit_out: Mutex::new(ExitPointWriter::create(&config.exit_file)?),
            global: Mutex::new(Global {
                count_num_processed: 0,
                num_states_in_collection: 0,
                count_of_items_in_queue: 0,
                in_flight: 0,
                curr_depth: 0,
                terminal: None,
                solution_seed: None,
            }),
            abort: AtomicBool::new(false),
        })
    }

    /// 入口ファイルを読み込み、索引・ストア・キューへ種を撒く
    pub fn load_entry_points(&self, path: &Path) -> Result<usize, DbmError> {
        let entries = read_entry_file(path)?;
        let n = entries.len();
        for (key, entry) in entries {
            self.seed(key, entry)?;
        }
        Ok(n)
    }

    /// 単一の根（初回実行の初期局面）を種として撒く
    pub fn seed_root(&self, key: EncodedKey, depth: u32) -> Result<(), DbmError> {
        self.seed(key, EntryPoint { depth, file_offset: 0, moves_prefix: Vec::new() })
    }

    fn seed(&self, key: EncodedKey, entry: EntryPoint) -> Result<(), DbmError> {
        let depth = entry.depth;
        self.entry_points.lock().unwrap().insert(key, entry);

        let id = {
            let mut visited = self.visited.lock().unwrap();
            match visited.check_and_insert(key, None, depth)? {
                CheckOutcome::New(id) => {
                    self.global.lock().unwrap().num_states_in_collection += 1;
                    id
                }
                // 再起動でストアに残っていた入口点も積み直す
                CheckOutcome::Seen => {
                    visited.store().lookup(&key).expect("seeded key must be in store")
                }
            }
        };
        self.queue.lock().unwrap().insert(depth, id)?;
        self.global.lock().unwrap().count_of_items_in_queue += 1;
        Ok(())
    }

    /// ワーカー1ステップ: 現在深さから1件取り出して展開・登録する。
    ///
    /// 現在深さのバケットが空で仕掛かり中のワーカーもいなければ次の
    /// 深さへ進み、キュー全体が空なら `Stop` を返す。
    pub fn step(&self, pool: &mut DerivedPool<D::State>) -> Result<Step, DbmError> {
        let extracted = {
            let mut queue = self.queue.lock().unwrap();
            let mut global = self.global.lock().unwrap();
            if global.terminal.is_some() || self.abort.load(Ordering::Relaxed) {
                return Ok(Step::Stop);
            }
            if let Some(max) = self.max_count_num_processed {
                if global.count_num_processed >= max {
                    global.terminal = Some(TerminalState::MaxItersReached);
                    log::info!("iterations limit reached after {} expansions", max);
                    return Ok(Step::Stop);
                }
            }
            let item = match queue.extract(global.curr_depth)? {
                Some(id) => Some((id, global.curr_depth)),
                None if global.in_flight > 0 => None,
                None => match queue.min_depth() {
                    Some(next) => {
                        global.curr_depth = next;
                        queue.extract(next)?.map(|id| (id, next))
                    }
                    None => return Ok(Step::Stop),
                },
            };
            if item.is_some() {
                global.in_flight += 1;
                global.count_of_items_in_queue -= 1;
            }
            item
        };
        let Some((id, depth)) = extracted else {
            return Ok(Step::Idle);
        };

        let result = self.process(pool, id, depth);

        {
            let mut global = self.global.lock().unwrap();
            global.in_flight -= 1;
            global.count_num_processed += 1;
            if let Some(max) = self.max_count_num_processed {
                if global.terminal.is_none() && global.count_num_processed >= max {
                    global.terminal = Some(TerminalState::MaxItersReached);
                    log::info!(
                        "iterations limit reached after {} expansions",
                        global.count_num_processed
                    );
                }
            }
            if global.count_num_processed % STATS_INTERVAL == 0 {
                log::info!(
                    "processed {} states; {} in collection; {} queued; depth {}",
                    global.count_num_processed,
                    global.num_states_in_collection,
                    global.count_of_items_in_queue,
                    global.curr_depth,
                );
            }
        }
        result?;
        Ok(Step::Processed)
    }

    fn process(
        &self,
        pool: &mut DerivedPool<D::State>,
        id: RecordId,
        depth: u32,
    ) -> Result<(), DbmError> {
        let key = self.visited.lock().unwrap().store().record(id).key;
        let state = self.domain.decode(&key);
        let head = self.domain.expand(&state, pool);
        let result = self.register_children(pool, head, id, depth);
        pool.release_chain(head);
        result
    }

    /// 展開チェーンの各子を判定・登録する。
    ///
    /// 既知の子は破棄。新規の子は、可逆手なら次の深さへ積み、非可逆手
    /// なら成分の境界越えとして出口点に記録する（それ以上は展開しない）。
    fn register_children(
        &self,
        pool: &mut DerivedPool<D::State>,
        head: u32,
        parent: RecordId,
        parent_depth: u32,
    ) -> Result<(), DbmError> {
        let mut idx = head;
        while idx != NIL {
            if self.domain.is_goal(&pool.node(idx).state) {
                let node = pool.node(idx);
                let mut global = self.global.lock().unwrap();
                if global.terminal.is_none() {
                    global.terminal = Some(TerminalState::SolutionFound);
                    global.solution_seed = Some((parent, node.key, node.mv));
                }
                return Ok(());
            }
            let (child_key, mv, which, num_irreversible, next) = {
                let node = pool.node(idx);
                (node.key, node.mv, node.which_irreversible, node.num_irreversible, node.next)
            };

            let outcome = self
                .visited
                .lock()
                .unwrap()
                .check_and_insert(child_key, Some(parent), parent_depth + 1)?;
            if let CheckOutcome::New(child) = outcome {
                self.global.lock().unwrap().num_states_in_collection += 1;
                if num_irreversible == 0 {
                    self.queue.lock().unwrap().insert(parent_depth + 1, child)?;
                    self.global.lock().unwrap().count_of_items_in_queue += 1;
                } else {
                    self.record_exit_point(pool, parent, child_key, mv, &which)?;
                }
            }
            idx = next;
        }
        Ok(())
    }

    /// 成分を離れる子を出口点ファイルへ記録する
    fn record_exit_point(
        &self,
        pool: &mut DerivedPool<D::State>,
        parent: RecordId,
        child_key: EncodedKey,
        mv: Move,
        which: &WhichMoves,
    ) -> Result<(), DbmError> {
        // 親から成分の根（入口点）まで遡る。根が索引になければ
        // 入口・出口プロトコルの不整合であり続行できない。
        let path = {
            let visited = self.visited.lock().unwrap();
            trace(visited.store(), parent)
        };
        let root_key = path[0].1;
        let mut moves = {
            let entries = self.entry_points.lock().unwrap();
            match entries.lookup(&root_key) {
                Some(entry) => entry.moves_prefix.clone(),
                None => panic!("entry point lookup miss for {root_key:?}"),
            }
        };
        moves.extend(moves_along(&self.domain, pool, &path));
        moves.push(mv.code());

        let mut fingerprint = self.start_fingerprint;
        fingerprint.add(which);

        self.exit_out.lock().unwrap().append(&fingerprint, &child_key, &moves)
    }

    fn worker(&self, worker_error: &Mutex<Option<DbmError>>) {
        let mut pool = DerivedPool::new();
        loop {
            match self.step(&mut pool) {
                Ok(Step::Processed) => {}
                Ok(Step::Idle) => std::thread::sleep(IDLE_SLEEP),
                Ok(Step::Stop) => break,
                Err(e) => {
                    self.abort.store(true, Ordering::Relaxed);
                    let mut slot = worker_error.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    break;
                }
            }
        }
    }

    /// ワーカーを走らせ、終端状態を返す
    pub fn run(&self) -> Result<TerminalState, DbmError>
    where
        D: Sync,
    {
        {
            let queue = self.queue.lock().unwrap();
            let mut global = self.global.lock().unwrap();
            if let Some(min) = queue.min_depth() {
                global.curr_depth = min;
            }
        }
        let worker_error: Mutex<Option<DbmError>> = Mutex::new(None);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.num_threads)
                .map(|_| scope.spawn(|| self.worker(&worker_error)))
                .collect();
            for handle in handles {
                if let Err(payload) = handle.join() {
                    std::panic::resume_unwind(payload);
                }
            }
        });
        if let Some(e) = worker_error.into_inner().unwrap() {
            return Err(e);
        }

        let mut global = self.global.lock().unwrap();
        let terminal = *global.terminal.get_or_insert(TerminalState::Exhausted);
        Ok(terminal)
    }

    #[inline]
    pub fn terminal(&self) -> Option<TerminalState> {
        self.global.lock().unwrap().terminal
    }

    pub fn stats(&self) -> SearchStats {
        let global = self.global.lock().unwrap();
        SearchStats {
            count_num_processed: global.count_num_processed,
            num_states_in_collection: global.num_states_in_collection,
            count_of_items_in_queue: global.count_of_items_in_queue,
            curr_depth: global.curr_depth,
            num_exit_points: self.exit_out.lock().unwrap().count(),
        }
    }

    /// キーが訪問済みか（ストア基準）
    pub fn is_visited(&self, key: &EncodedKey) -> bool {
        self.visited.lock().unwrap().store().contains(key)
    }

    /// 解の経路を復元する（`SolutionFound` のときのみ `Some`）
    pub fn solution(&self) -> Option<Solution> {
        let (parent, goal_key, last_move) = self.global.lock().unwrap().solution_seed?;
        let path = {
            let visited = self.visited.lock().unwrap();
            trace(visited.store(), parent)
        };
        let mut pool = DerivedPool::new();
        let mut moves: Vec<Move> = path
            .windows(2)
            .map(|pair| move_between(&self.domain, &mut pool, &pair[0].1, &pair[1].1))
            .collect();
        moves.push(last_move);
        let mut keys: Vec<EncodedKey> = path.iter().map(|step| step.1).collect();
        keys.push(goal_key);
        Some(Solution { keys, moves })
    }

    /// 後始末: 任意の回収パス、ストアのフラッシュ、出口点ファイルの公開
    pub fn finish(self) -> Result<(), DbmError> {
        let global = self.global.into_inner().unwrap();
        let mut visited = self.visited.into_inner().unwrap();
        // 上限なしで探索し尽くした場合のみ、最終深さ未満の索引を回収する
        if global.terminal == Some(TerminalState::Exhausted)
            && self.max_count_num_processed.is_none()
        {
            let swept = visited.store_mut().sweep_older_than(global.curr_depth);
            log::info!("swept {swept} store index entries below depth {}", global.curr_depth);
        }
        visited.store_mut().flush()?;
        self.exit_out.into_inner().unwrap().publish()
    }
}
