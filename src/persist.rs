use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::app_cache_dir;
use crate::dashboard::{DashboardState, Filters};

const CACHE_FILE: &str = "dashboard.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    version: u32,
    /// Saved filters keyed by the database they were chosen against.
    #[serde(default)]
    filters: HashMap<String, Filters>,
}

pub fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

pub fn load_into_state(state: &mut DashboardState, db: &Path) {
    let Some(path) = cache_path() else {
        return;
    };
    load_from(&path, state, db);
}

pub fn save_from_state(state: &DashboardState, db: &Path) {
    let Some(path) = cache_path() else {
        return;
    };
    save_to(&path, state, db);
}

pub fn load_from(path: &Path, state: &mut DashboardState, db: &Path) {
    let Some(cache) = load_cache_file(path) else {
        return;
    };
    if cache.version != CACHE_VERSION {
        return;
    }
    let Some(saved) = cache.filters.get(&db_key(db)) else {
        return;
    };
    state.restore_filters(saved.clone());
}

pub fn save_to(path: &Path, state: &DashboardState, db: &Path) {
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let mut cache = load_cache_file(path)
        .filter(|c| c.version == CACHE_VERSION)
        .unwrap_or_default();
    cache.version = CACHE_VERSION;
    cache.filters.insert(db_key(db), state.filters.clone());

    if let Ok(json) = serde_json::to_string_pretty(&cache) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, path);
        }
    }
}

fn load_cache_file(path: &Path) -> Option<CacheFile> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str::<CacheFile>(&raw).ok()
}

fn db_key(db: &Path) -> String {
    fs::canonicalize(db)
        .unwrap_or_else(|_| db.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{load_from, save_to};
    use crate::dashboard::{DashboardState, Filters};
    use crate::statsbomb::MatchRecord;
    use crate::store::DashboardTables;

    fn state() -> DashboardState {
        DashboardState::new(DashboardTables {
            matches: vec![MatchRecord {
                match_id: 1,
                competition_name: Some("FIFA World Cup".to_string()),
                season_name: Some("2022".to_string()),
                home_team: Some("Argentina".to_string()),
                away_team: Some("France".to_string()),
                ..MatchRecord::default()
            }],
            ..DashboardTables::default()
        })
    }

    #[test]
    fn filters_are_restored_per_database() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").join("dashboard.json");
        let db = Path::new("warehouse.db");

        let mut saved = state();
        saved.filters.season = Some("2022".to_string());
        saved.filters.team = Some("France".to_string());
        save_to(&cache, &saved, db);

        let mut restored = state();
        load_from(&cache, &mut restored, db);
        assert_eq!(restored.filters, saved.filters);

        let mut other = state();
        load_from(&cache, &mut other, Path::new("other.db"));
        assert_eq!(other.filters, Filters::default());
    }

    #[test]
    fn unreadable_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("dashboard.json");
        std::fs::write(&cache, "not json").unwrap();
        let mut fresh = state();
        load_from(&cache, &mut fresh, Path::new("warehouse.db"));
        assert_eq!(fresh.filters, Filters::default());
    }
}
