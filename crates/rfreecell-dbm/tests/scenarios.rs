//! 台本ドメインによる調整役の結合テスト
//!
//! 状態 = キーそのもののモックで、展開・重複排除・出口点・終端状態の
//! 取り決めをルールエンジン抜きで検証する。

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use rfreecell_core::{ENCODED_LEN, EncodedKey, Move, Variant, WhichMoves};
use rfreecell_dbm::config::{CacheMode, ShardConfig};
use rfreecell_dbm::domain::SearchDomain;
use rfreecell_dbm::fingerprint::{parse_fingerprint, parse_key, parse_moves, render_key};
use rfreecell_dbm::instance::{Instance, Step, TerminalState};
use rfreecell_dbm::pool::{DerivedPool, NIL};

fn key(n: u8) -> EncodedKey {
    EncodedKey::from_bytes(&[n; ENCODED_LEN]).unwrap()
}

fn config(dir: &Path) -> ShardConfig {
    ShardConfig {
        variant: Variant::Freecell,
        cache_mode: CacheMode::CachesAndStore,
        pre_cache_max_count: 1000,
        caches_delta: 1000,
        num_threads: 1,
        iters_delta_limit: -1,
        items_per_page: 128,
        store_path: dir.join("store.db"),
        offload_dir: None,
        exit_file: dir.join("exit_points.txt"),
    }
}

/// 台本どおりに展開するドメイン
///
/// 子の2つ目の成分は非可逆手の数。子 i の手コードは i、非可逆手の
/// クラスも i として記録される。
struct ScriptDomain {
    children: HashMap<EncodedKey, Vec<(EncodedKey, u8)>>,
    goals: HashSet<EncodedKey>,
}

impl ScriptDomain {
    fn new(script: &[(EncodedKey, Vec<(EncodedKey, u8)>)]) -> ScriptDomain {
        ScriptDomain {
            children: script.iter().cloned().collect(),
            goals: HashSet::new(),
        }
    }

    fn with_goal(mut self, goal: EncodedKey) -> ScriptDomain {
        self.goals.insert(goal);
        self
    }
}

impl SearchDomain for ScriptDomain {
    type State = EncodedKey;

    fn decode(&self, key: &EncodedKey) -> EncodedKey {
        *key
    }

    fn encode(&self, state: &EncodedKey) -> EncodedKey {
        *state
    }

    fn expand(&self, state: &EncodedKey, pool: &mut DerivedPool<EncodedKey>) -> u32 {
        let mut head = NIL;
        if let Some(children) = self.children.get(state) {
            for (i, &(child, num_irreversible)) in children.iter().enumerate().rev() {
                let mut which = WhichMoves::zero();
                for _ in 0..num_irreversible {
                    which.bump(i);
                }
                head = pool.alloc(
                    child,
                    Move::from_code(i as u8),
                    child,
                    which,
                    num_irreversible,
                    head,
                );
            }
        }
        head
    }

    fn is_goal(&self, state: &EncodedKey) -> bool {
        self.goals.contains(state)
    }
}

// シナリオ: 可逆な子は次の深さへ積まれ、出口点は出ない
#[test]
fn test_reversible_children_are_enqueued() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let domain = ScriptDomain::new(&[(key(1), vec![(key(2), 0), (key(3), 0)])]);
    let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
    instance.seed_root(key(1), 0).unwrap();

    let mut pool = DerivedPool::new();
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Processed);

    for k in [key(1), key(2), key(3)] {
        assert!(instance.is_visited(&k));
    }
    let stats = instance.stats();
    assert_eq!(stats.count_num_processed, 1);
    assert_eq!(stats.num_states_in_collection, 3);
    assert_eq!(stats.count_of_items_in_queue, 2);
    assert_eq!(stats.num_exit_points, 0);

    instance.finish().unwrap();
    assert_eq!(fs::read_to_string(cfg.exit_file).unwrap(), "");
}

// シナリオ: 展開回数の上限で止まる。2件目の展開は決して起きない
#[test]
fn test_iterations_limit_stops_after_one_expansion() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.iters_delta_limit = 1;
    let domain = ScriptDomain::new(&[
        (key(1), vec![(key(2), 0), (key(3), 0), (key(4), 0)]),
        (key(2), vec![(key(5), 0)]),
    ]);
    let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
    instance.seed_root(key(1), 0).unwrap();

    assert_eq!(instance.run().unwrap(), TerminalState::MaxItersReached);
    let stats = instance.stats();
    assert_eq!(stats.count_num_processed, 1);
    // 2件目の展開が起きていないこと
    assert!(!instance.is_visited(&key(5)));
}

// シナリオ: 非可逆な子は積まれず、出口点として1件記録される
#[test]
fn test_irreversible_child_becomes_exit_point() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let domain = ScriptDomain::new(&[(key(1), vec![(key(2), 1)])]);
    let mut start_fingerprint = WhichMoves::zero();
    start_fingerprint.bump(40);
    let instance = Instance::new(domain, &cfg, start_fingerprint).unwrap();
    instance.seed_root(key(1), 0).unwrap();

    assert_eq!(instance.run().unwrap(), TerminalState::Exhausted);
    assert!(instance.is_visited(&key(2)), "exit point is still recorded as visited");
    let stats = instance.stats();
    assert_eq!(stats.count_num_processed, 1);
    assert_eq!(stats.count_of_items_in_queue, 0);
    assert_eq!(stats.num_exit_points, 1);

    instance.finish().unwrap();
    let text = fs::read_to_string(&cfg.exit_file).unwrap();
    let fields: Vec<&str> = text.trim().split(' ').collect();
    assert_eq!(fields.len(), 4);
    let mut expected = start_fingerprint;
    expected.bump(0);
    let recorded = parse_fingerprint(fields[0]).unwrap();
    assert_eq!(recorded, expected);
    // 境界越えでもフィンガープリントは成分ごとに単調非減少
    assert!(recorded.covers(&start_fingerprint));
    assert_eq!(parse_key(fields[1]), Some(key(2)));
    assert_eq!(fields[2], "1");
    assert_eq!(parse_moves(fields[3]), Some(vec![0]));
}

// 入口ファイルの手順接頭辞が出口点の手順に引き継がれる
#[test]
fn test_entry_moves_prefix_carries_into_exit_record() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let entry_path = dir.path().join("entries.txt");
    fs::write(
        &entry_path,
        format!("{} 3 {}\n", render_key(&key(1)), rfreecell_dbm::fingerprint::render_moves(&[9])),
    )
    .unwrap();

    let domain = ScriptDomain::new(&[
        (key(1), vec![(key(2), 0)]),
        (key(2), vec![(key(3), 1)]),
    ]);
    let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
    assert_eq!(instance.load_entry_points(&entry_path).unwrap(), 1);

    assert_eq!(instance.run().unwrap(), TerminalState::Exhausted);
    instance.finish().unwrap();

    let text = fs::read_to_string(&cfg.exit_file).unwrap();
    let fields: Vec<&str> = text.trim().split(' ').collect();
    // 接頭辞 [9] + 成分内の手 [0] + 境界の手 [0]
    assert_eq!(fields[2], "3");
    assert_eq!(parse_moves(fields[3]), Some(vec![9, 0, 0]));
}

// BFS の層順序: 深さ d を出し切るまで d+1 は取り出されない
#[test]
fn test_bfs_layering_and_dedup() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let domain = ScriptDomain::new(&[
        (key(1), vec![(key(2), 0), (key(3), 0)]),
        (key(2), vec![(key(4), 0)]),
        (key(3), vec![(key(4), 0), (key(5), 0)]),
    ]);
    let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
    instance.seed_root(key(1), 0).unwrap();

    let mut pool = DerivedPool::new();
    // 深さ0: 根のみ
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Processed);
    assert_eq!(instance.stats().curr_depth, 0);
    // 深さ1: 2, 3
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Processed);
    assert_eq!(instance.stats().curr_depth, 1);
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Processed);
    // 深さ2: 4, 5（4 は一度だけ登録される）
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Processed);
    assert_eq!(instance.stats().curr_depth, 2);
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Processed);
    assert_eq!(instance.step(&mut pool).unwrap(), Step::Stop);

    let stats = instance.stats();
    assert_eq!(stats.count_num_processed, 5);
    assert_eq!(stats.num_states_in_collection, 5);
    assert_eq!(stats.count_of_items_in_queue, 0);
}

// 終端状態は排他的で、一度立ったら変わらない
#[test]
fn test_terminal_state_is_sticky() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    // 上限と解発見が競合しても、先に立った解発見が残る
    cfg.iters_delta_limit = 1;
    let domain =
        ScriptDomain::new(&[(key(1), vec![(key(9), 0)])]).with_goal(key(9));
    let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
    instance.seed_root(key(1), 0).unwrap();

    assert_eq!(instance.run().unwrap(), TerminalState::SolutionFound);
    assert_eq!(instance.terminal(), Some(TerminalState::SolutionFound));
    // 再実行してもワーカーは即座に止まり、状態は上書きされない
    assert_eq!(instance.run().unwrap(), TerminalState::SolutionFound);
}

// 解の経路復元: 根から順のキー列と手の列が一致する
#[test]
fn test_solution_path_reconstruction() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let domain = ScriptDomain::new(&[
        (key(1), vec![(key(2), 0)]),
        (key(2), vec![(key(3), 0), (key(9), 0)]),
    ])
    .with_goal(key(9));
    let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
    instance.seed_root(key(1), 0).unwrap();

    assert_eq!(instance.run().unwrap(), TerminalState::SolutionFound);
    let solution = instance.solution().unwrap();
    assert_eq!(solution.keys, vec![key(1), key(2), key(9)]);
    let codes: Vec<u8> = solution.moves.iter().map(|m| m.code()).collect();
    assert_eq!(codes, vec![0, 1]);
}

// 複数ワーカーでも重複登録は起きず、結果が一致する
#[test]
fn test_multi_threaded_run_matches_single() {
    // 2分木を2層 + 合流を含む台本
    let mut script: Vec<(EncodedKey, Vec<(EncodedKey, u8)>)> = vec![
        (key(1), vec![(key(2), 0), (key(3), 0)]),
        (key(2), vec![(key(4), 0), (key(5), 0)]),
        (key(3), vec![(key(5), 0), (key(6), 0)]),
    ];
    for n in 4..=6 {
        script.push((key(n), vec![(key(n + 10), 1)]));
    }

    let mut results = Vec::new();
    for threads in [1, 4] {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.num_threads = threads;
        let domain = ScriptDomain::new(&script);
        let instance = Instance::new(domain, &cfg, WhichMoves::zero()).unwrap();
        instance.seed_root(key(1), 0).unwrap();
        assert_eq!(instance.run().unwrap(), TerminalState::Exhausted);
        let stats = instance.stats();
        results.push((stats.count_num_processed, stats.num_states_in_collection, stats.num_exit_points));
        instance.finish().unwrap();
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], (6, 9, 3));
}
