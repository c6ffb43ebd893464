use crate::config::CACHE_VERSION;
use crate::models::NameRecord;
use anyhow::{Context, Result};
use bincode::Options;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

#[derive(Serialize, Deserialize)]
pub struct CacheMetadata {
    pub version: u32,
    pub dataset_path: String,
    /// Modification time in nanoseconds since the epoch.
    pub dataset_mtime: u64,
    pub dataset_size: u64,
    pub record_count: usize,
    pub names_hash: u64,
}

#[derive(Deserialize)]
struct KeyCacheDe {
    metadata: CacheMetadata,
    keys: Vec<String>,
}

#[derive(Serialize)]
struct KeyCacheSer<'a> {
    metadata: CacheMetadata,
    keys: &'a [String],
}

/// Search keys are cached next to the dataset they were computed from.
pub fn cache_path(dataset_path: &Path) -> PathBuf {
    dataset_path.with_extension("search.cache")
}

fn get_dataset_metadata(dataset_path: &Path) -> Result<(u64, u64)> {
    let metadata = fs::metadata(dataset_path)
        .with_context(|| format!("Failed to get metadata for: {:?}", dataset_path))?;
    let mtime = metadata
        .modified()
        .context("Failed to get modification time")?
        .duration_since(SystemTime::UNIX_EPOCH)
        .context("Invalid modification time")?
        .as_nanos();
    Ok((u64::try_from(mtime).unwrap_or(u64::MAX), metadata.len()))
}

/// Fingerprint of the name records the keys were computed from.
pub fn names_fingerprint(names: &[NameRecord]) -> u64 {
    let mut hasher = FxHasher::default();
    names.len().hash(&mut hasher);
    for record in names {
        record.city_id.hash(&mut hasher);
        record.name.hash(&mut hasher);
    }
    hasher.finish()
}

/// Returns `Ok(Some(keys))` if the cache matches the dataset on disk and the
/// loaded `names`, `Ok(None)` if it is missing, stale or unreadable.
pub fn try_load_keys(
    cache_path: &Path,
    dataset_path: &Path,
    names: &[NameRecord],
) -> Result<Option<Vec<String>>> {
    if !cache_path.exists() {
        return Ok(None);
    }

    let file_size = fs::metadata(cache_path).map(|m| m.len()).unwrap_or(0);
    let file = match File::open(cache_path) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, path = ?cache_path, "Search cache is unreadable");
            return Ok(None);
        }
    };
    let reader = BufReader::with_capacity(256 * 1024, file);

    let options = bincode::options().with_limit(file_size.saturating_add(1024));

    let cache: KeyCacheDe = match options.deserialize_from(reader) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Search cache is corrupt or unreadable");
            return Ok(None);
        }
    };

    if cache.metadata.version != CACHE_VERSION {
        info!(
            cached = cache.metadata.version,
            current = CACHE_VERSION,
            "Search cache version mismatch"
        );
        return Ok(None);
    }

    let dataset = dataset_path.to_string_lossy();
    if cache.metadata.dataset_path != dataset {
        info!(
            cached = cache.metadata.dataset_path,
            current = %dataset,
            "Search cache dataset path mismatch"
        );
        return Ok(None);
    }

    let (mtime, size) = get_dataset_metadata(dataset_path)?;
    if cache.metadata.dataset_mtime != mtime || cache.metadata.dataset_size != size {
        info!(
            cached_mtime = cache.metadata.dataset_mtime,
            current_mtime = mtime,
            cached_size = cache.metadata.dataset_size,
            current_size = size,
            "Dataset has changed since search cache was created"
        );
        return Ok(None);
    }

    if cache.keys.len() != names.len() || cache.metadata.record_count != names.len() {
        info!(
            cached = cache.keys.len(),
            current = names.len(),
            "Search cache record count mismatch"
        );
        return Ok(None);
    }

    if cache.metadata.names_hash != names_fingerprint(names) {
        info!("Name records have changed since search cache was created");
        return Ok(None);
    }

    info!(keys = cache.keys.len(), "Search keys loaded from cache");
    Ok(Some(cache.keys))
}

/// Writes the keys to a temporary file and renames it into place.
pub fn save_keys(keys: &[String], dataset_path: &Path, names: &[NameRecord]) -> Result<PathBuf> {
    let path = cache_path(dataset_path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let (mtime, size) = get_dataset_metadata(dataset_path)?;
    let cache = KeyCacheSer {
        metadata: CacheMetadata {
            version: CACHE_VERSION,
            dataset_path: dataset_path.to_string_lossy().into_owned(),
            dataset_mtime: mtime,
            dataset_size: size,
            record_count: keys.len(),
            names_hash: names_fingerprint(names),
        },
        keys,
    };

    let tmp_path = path.with_extension("cache.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp cache file: {:?}", tmp_path))?;
    let writer = BufWriter::new(file);

    bincode::DefaultOptions::new()
        .serialize_into(writer, &cache)
        .context("Failed to serialize search cache")?;

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to rename temp cache file to: {:?}", path))?;

    info!(keys = keys.len(), path = ?path, "Search cache saved");
    Ok(path)
}

/// Drops the cache belonging to `dataset_path`, if any.
pub fn invalidate(dataset_path: &Path) -> Result<bool> {
    let path = cache_path(dataset_path);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("Failed to remove cache file: {:?}", path))?;
    info!(path = ?path, "Search cache invalidated");
    Ok(true)
}
