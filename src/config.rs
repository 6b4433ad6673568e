use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "pitch_lab";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";
const STATSBOMB_DIR: &str = "Statsbomb";
const POLYMARKET_DIR: &str = "Polymarket";

const DEFAULT_TOP_N: usize = 10;
const DEFAULT_MIN_PLAYERS: usize = 10;
const DEFAULT_PARALLELISM: usize = 4;

/// Loads `.env.local` then `.env`; either may be absent.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
}

impl DataPaths {
    pub fn from_env() -> Self {
        let root = env_path("PITCH_LAB_DATA_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let mut paths = Self::with_root(root);
        if let Some(output_dir) = env_path("PITCH_LAB_OUTPUT_DIR") {
            paths.output_dir = output_dir;
        }
        if let Some(db_path) = env_path("PITCH_LAB_DB") {
            paths.db_path = db_path;
        }
        paths
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            db_path: default_db_path().unwrap_or_else(|| PathBuf::from("warehouse.sqlite")),
        }
    }

    pub fn statsbomb_dir(&self) -> PathBuf {
        self.root.join(STATSBOMB_DIR)
    }

    pub fn polymarket_dir(&self) -> PathBuf {
        self.root.join(POLYMARKET_DIR)
    }

    pub fn statsbomb(&self, file: &str) -> PathBuf {
        self.statsbomb_dir().join(file)
    }

    pub fn polymarket(&self, file: &str) -> PathBuf {
        self.polymarket_dir().join(file)
    }

    pub fn output(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub top_n: usize,
    pub min_players: usize,
    pub parallelism: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_players: DEFAULT_MIN_PLAYERS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            top_n: env_usize("PITCH_LAB_TOP_N", DEFAULT_TOP_N).clamp(1, 100),
            min_players: env_usize("PITCH_LAB_MIN_PLAYERS", DEFAULT_MIN_PLAYERS).clamp(1, 11),
            parallelism: env_usize("PITCH_LAB_PARALLELISM", DEFAULT_PARALLELISM).clamp(1, 32),
        }
    }

    /// Runs `action` on a rayon pool sized by `parallelism`, or inline if the pool can't be built.
    pub fn install<T: Send>(&self, action: impl FnOnce() -> T + Send) -> T {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
        {
            Ok(pool) => pool.install(action),
            Err(_) => action(),
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("warehouse.sqlite"))
}

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;
    std::fs::create_dir_all(path).with_context(|| format!("create dir {}", path.display()))
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
