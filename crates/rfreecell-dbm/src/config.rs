//! シャード実行の設定
//!
//! CLI 引数は `ShardConfig` へ写してから `validate` で下限を検査する。
//! 検査を通った設定は起動時に JSON 1行でログへ残す。

use std::path::PathBuf;

use serde::Serialize;

use rfreecell_core::Variant;

use crate::error::DbmError;

/// プリキャッシュ容量の下限
pub const MIN_PRE_CACHE_MAX_COUNT: usize = 1000;
/// メインキャッシュ容量差分の下限
pub const MIN_CACHES_DELTA: usize = 1000;

/// 訪問済み判定の構成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// プリキャッシュ + LRU キャッシュ + ストア（既定）
    CachesAndStore,
    /// キャッシュ層を持たずストアのみで判定する
    StoreOnly,
}

/// 1シャード分の実行設定
#[derive(Debug, Clone, Serialize)]
pub struct ShardConfig {
    pub variant: Variant,
    pub cache_mode: CacheMode,
    pub pre_cache_max_count: usize,
    pub caches_delta: usize,
    pub num_threads: usize,
    /// 展開回数の上限（負なら無制限）
    pub iters_delta_limit: i64,
    /// オフロード1ページあたりのキュー項目数
    pub items_per_page: usize,
    /// 訪問済みストアのログファイル
    pub store_path: PathBuf,
    /// キューのオフロード先（`None` なら常にメモリ上）
    pub offload_dir: Option<PathBuf>,
    /// 出口点ファイルの公開先
    pub exit_file: PathBuf,
}

impl ShardConfig {
    /// 下限検査。違反は起動時に即座に報告する。
    pub fn validate(&self) -> Result<(), DbmError> {
        if self.pre_cache_max_count < MIN_PRE_CACHE_MAX_COUNT {
            return Err(DbmError::Config(format!(
                "pre-cache-max-count must be at least {MIN_PRE_CACHE_MAX_COUNT}"
            )));
        }
        if self.caches_delta < MIN_CACHES_DELTA {
            return Err(DbmError::Config(format!(
                "caches-delta must be at least {MIN_CACHES_DELTA}"
            )));
        }
        if self.num_threads < 1 {
            return Err(DbmError::Config("num-threads must be at least 1".into()));
        }
        if self.items_per_page < 1 {
            return Err(DbmError::Config("items-per-page must be at least 1".into()));
        }
        Ok(())
    }

    /// 展開回数の上限（`None` = 無制限）
    #[inline]
    pub fn max_count_num_processed(&self) -> Option<u64> {
        (self.iters_delta_limit >= 0).then_some(self.iters_delta_limit as u64)
    }

    /// メインキャッシュの容量
    #[inline]
    pub fn main_cache_capacity(&self) -> usize {
        self.pre_cache_max_count + self.caches_delta
    }
}
