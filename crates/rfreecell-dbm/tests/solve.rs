//! 実ルールでの端局面ソルブ（ドメイン込みの通し確認）

use rfreecell_core::{Variant, expand};
use rfreecell_dbm::config::{CacheMode, ShardConfig};
use rfreecell_dbm::domain::{GameDomain, SearchDomain};
use rfreecell_dbm::instance::{Instance, TerminalState};

// 残り4枚の終盤局面。KC を動かすとオートプレイが連鎖して完成する
const ENDGAME: &str = "\
Foundations: C-Q D-K H-T S-K
JH KC
QH
KH
";

#[test]
fn test_endgame_deal_is_solved() {
    let dir = tempfile::tempdir().unwrap();
    let offload = dir.path().join("offload");
    std::fs::create_dir_all(&offload).unwrap();
    let cfg = ShardConfig {
        variant: Variant::Freecell,
        cache_mode: CacheMode::CachesAndStore,
        pre_cache_max_count: 1000,
        caches_delta: 1000,
        num_threads: 2,
        iters_delta_limit: -1,
        items_per_page: 4,
        store_path: dir.path().join("store.db"),
        offload_dir: Some(offload),
        exit_file: dir.path().join("exit_points.txt"),
    };

    let (domain, root, baseline) =
        GameDomain::from_deal_text(ENDGAME, Variant::Freecell).unwrap();
    assert!(baseline.is_zero());

    let instance = Instance::new(domain, &cfg, baseline).unwrap();
    instance.seed_root(root, 0).unwrap();
    assert_eq!(instance.run().unwrap(), TerminalState::SolutionFound);

    let solution = instance.solution().unwrap();
    assert_eq!(solution.keys.len(), solution.moves.len() + 1);
    assert_eq!(solution.keys[0], root);

    // 経路の各ステップが実際の合法手で結ばれていること
    let (checker, _, _) = GameDomain::from_deal_text(ENDGAME, Variant::Freecell).unwrap();
    for (i, pair) in solution.keys.windows(2).enumerate() {
        let parent = checker.decode(&pair[0]);
        let mut children = Vec::new();
        expand(&parent, &mut children);
        let derived = children
            .iter()
            .find(|d| checker.encode(&d.position) == pair[1])
            .expect("consecutive solution states are parent and child");
        assert_eq!(derived.mv, solution.moves[i]);
    }
    assert!(checker.decode(solution.keys.last().unwrap()).is_solved());

    instance.finish().unwrap();
    assert!(dir.path().join("exit_points.txt").exists());
}
