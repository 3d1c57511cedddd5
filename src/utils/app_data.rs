use crate::cache::render_cache::DEFAULT_RENDER_CAPACITY;
use crate::catalog::disk_cache::{DiskSchemaCache, DEFAULT_TTL_SECS};
use crate::coordinator::CoordinatorConfig;
use crate::index::trie::MultiWordPolicy;
use crate::query::executor::SearchOptions;
use crate::query::fuzzy::FuzzyConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "schemafind";
const CONFIG_FILE: &str = "config.json";
const CACHE_DIR: &str = "schema-cache";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchSection,
    pub loader: LoaderSection,
    pub cache: CacheSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub debounce_ms: u64,
    /// Fewer results than this trigger background loading
    pub small_result_threshold: usize,
    pub result_limit: usize,
    pub multi_word_policy: MultiWordPolicy,
    /// Shorter queries only use substring matching in the fuzzy fallback
    pub min_fuzzy_query_len: usize,
    pub max_edit_distance_cap: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            small_result_threshold: 50,
            result_limit: 500,
            multi_word_policy: MultiWordPolicy::Union,
            min_fuzzy_query_len: 2,
            max_edit_distance_cap: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSection {
    pub page_size: usize,
    pub prefetch_margin: usize,
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            page_size: 100,
            prefetch_margin: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub render_capacity: usize,
    pub disk_cache_ttl_secs: u64,
    pub disk_cache_enabled: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            render_capacity: DEFAULT_RENDER_CAPACITY,
            disk_cache_ttl_secs: DEFAULT_TTL_SECS,
            disk_cache_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, then apply environment
    /// overrides. Missing file means defaults.
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply `SCHEMAFIND_*` overrides. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = lookup("SCHEMAFIND_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
            self.search.debounce_ms = ms;
        }

        if let Some(size) = lookup("SCHEMAFIND_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.loader.page_size = size;
        }

        if let Some(cap) = lookup("SCHEMAFIND_RENDER_CAPACITY").and_then(|v| v.parse().ok()) {
            self.cache.render_capacity = cap;
        }

        if let Some(val) = lookup("SCHEMAFIND_MULTI_WORD") {
            match val.to_lowercase().as_str() {
                "union" => self.search.multi_word_policy = MultiWordPolicy::Union,
                "intersection" => self.search.multi_word_policy = MultiWordPolicy::Intersection,
                other => tracing::warn!(value = other, "ignoring unknown SCHEMAFIND_MULTI_WORD"),
            }
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            multi_word_policy: self.search.multi_word_policy,
            result_limit: self.search.result_limit,
            fuzzy: FuzzyConfig {
                min_query_len: self.search.min_fuzzy_query_len,
                max_distance_cap: self.search.max_edit_distance_cap,
                ..FuzzyConfig::default()
            },
            ..SearchOptions::default()
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            page_size: self.loader.page_size.max(1),
            small_result_threshold: self.search.small_result_threshold,
            prefetch_margin: self.loader.prefetch_margin,
            render_capacity: self.cache.render_capacity.max(1),
            search: self.search_options(),
        }
    }

    /// On-disk page cache for one catalog source, if enabled
    pub fn disk_cache(&self, source: &Path) -> Result<Option<DiskSchemaCache>> {
        if !self.cache.disk_cache_enabled {
            return Ok(None);
        }
        let dir = get_cache_dir()?.join(hash_path(source));
        Ok(Some(DiskSchemaCache::with_ttl(
            dir,
            Duration::from_secs(self.cache.disk_cache_ttl_secs),
        )))
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Directory holding the on-disk schema page cache
pub fn get_cache_dir() -> Result<PathBuf> {
    let dir = get_app_data_dir()?.join(CACHE_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Folder name for a catalog source: readable stem plus a hash of the full path
fn hash_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    let stem = canonical
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    let sanitized: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(16)
        .collect();

    let mut hasher = DefaultHasher::new();
    path_str.hash(&mut hasher);
    format!("{}-{:016x}", sanitized, hasher.finish())
}
