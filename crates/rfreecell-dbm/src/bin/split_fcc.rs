use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use rfreecell_core::{Variant, WhichMoves};
use rfreecell_dbm::config::{CacheMode, ShardConfig};
use rfreecell_dbm::domain::GameDomain;
use rfreecell_dbm::fingerprint::parse_fingerprint;
use rfreecell_dbm::instance::{Instance, TerminalState};

/// FCC 分割探索の1シャードを実行する。
///
/// # よく使うコマンド例
///
/// - 初回実行（初期局面から、入口ファイルなし）:
///   `cargo run -p rfreecell-dbm --bin split-fcc -- --board deal.txt --output runs/shard0 --dbm-store-path runs/shard0/store.db`
///
/// - 前のシャードの出口点を入口として続行:
///   `cargo run -p rfreecell-dbm --bin split-fcc -- --board deal.txt --fingerprint <base64> --input runs/shard0/exit_points.txt --output runs/shard1 --dbm-store-path runs/shard1/store.db`
///
#[derive(Parser, Debug)]
#[command(author, version, about = "Split-FCC disk-backed BFS solver shard")]
struct Cli {
    /// Game variant (freecell or bakers_dozen)
    #[arg(long, default_value = "freecell")]
    game: String,

    /// Initial board file
    #[arg(long)]
    board: PathBuf,

    /// Fingerprint of the component this shard owns (base64)
    #[arg(long)]
    fingerprint: Option<String>,

    /// Entry-point file seeding this shard's component
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output directory (exit-points file is published here)
    #[arg(long)]
    output: PathBuf,

    /// Directory for queue offload pages (in-memory queue if omitted)
    #[arg(long = "offload-dir-path")]
    offload_dir_path: Option<PathBuf>,

    /// Path of the visited-store log file
    #[arg(long = "dbm-store-path")]
    dbm_store_path: PathBuf,

    /// Pre-cache capacity (minimum 1000)
    #[arg(long = "pre-cache-max-count", default_value_t = 1_000_000)]
    pre_cache_max_count: usize,

    /// Main cache capacity delta over the pre-cache (minimum 1000)
    #[arg(long = "caches-delta", default_value_t = 1_000_000)]
    caches_delta: usize,

    /// Visited-set composition
    #[arg(long = "cache-mode", value_enum, default_value = "caches-and-store")]
    cache_mode: CacheMode,

    /// Worker thread count (minimum 1)
    #[arg(long = "num-threads", default_value_t = 2)]
    num_threads: usize,

    /// Maximum number of expansions (negative for unbounded)
    #[arg(long = "iters-delta-limit", default_value_t = -1)]
    iters_delta_limit: i64,

    /// Queue items per offload page
    #[arg(long = "items-per-page", default_value_t = 131_072)]
    items_per_page: usize,
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("split-fcc: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let variant = Variant::from_name(&cli.game)
        .ok_or_else(|| anyhow!("unknown game variant '{}'", cli.game))?;
    let board_text = fs::read_to_string(&cli.board)
        .with_context(|| format!("reading board file {}", cli.board.display()))?;
    fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;
    if let Some(dir) = &cli.offload_dir_path {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating offload directory {}", dir.display()))?;
    }

    let config = ShardConfig {
        variant,
        cache_mode: cli.cache_mode,
        pre_cache_max_count: cli.pre_cache_max_count,
        caches_delta: cli.caches_delta,
        num_threads: cli.num_threads,
        iters_delta_limit: cli.iters_delta_limit,
        items_per_page: cli.items_per_page,
        store_path: cli.dbm_store_path.clone(),
        offload_dir: cli.offload_dir_path.clone(),
        exit_file: cli.output.join("exit_points.txt"),
    };
    config.validate()?;
    log::info!("config: {}", serde_json::to_string(&config)?);

    let (domain, root_key, baseline_fingerprint) =
        GameDomain::from_deal_text(&board_text, variant)?;
    // シャードのフィンガープリントが与えられなければ、初期局面の
    // オートプレイで決まる基準値が最初の成分の識別子になる
    let start_fingerprint = match &cli.fingerprint {
        Some(text) => parse_fingerprint(text)?,
        None => baseline_fingerprint,
    };

    let instance = Instance::new(domain, &config, start_fingerprint)?;
    match &cli.input {
        Some(path) => {
            let n = instance.load_entry_points(path)?;
            log::info!("loaded {n} entry points from {}", path.display());
        }
        None => {
            instance.seed_root(root_key, 0)?;
            log::info!("seeded initial board as the component root");
        }
    }

    let terminal = instance.run()?;
    let stats = instance.stats();
    log::info!(
        "done: processed {} states; {} in collection; {} exit points",
        stats.count_num_processed,
        stats.num_states_in_collection,
        stats.num_exit_points,
    );

    match terminal {
        TerminalState::SolutionFound => {
            let solution = instance
                .solution()
                .ok_or_else(|| anyhow!("terminal state is solved but no solution path"))?;
            println!("Solution was found in {} moves:", solution.moves.len());
            for mv in &solution.moves {
                println!("{mv}");
            }
        }
        TerminalState::MaxItersReached => println!("Iterations limit exceeded."),
        TerminalState::Exhausted => println!("Could not solve within this shard."),
    }

    instance.finish()?;
    Ok(())
}
