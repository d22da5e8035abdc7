//! Thumbnail cache for incremental batch runs.
//!
//! Re-encoding every preset of every image on each run is wasteful when
//! neither the source nor the preset changed. This module records what was
//! written and lets [`process`](crate::process) skip those renditions.
//!
//! ## Cache keys
//!
//! Lookups are **content-addressed** by `source_hash` + `params_hash`, not by
//! output path, so moving or renaming a source directory does not force a
//! re-encode:
//!
//! - **`source_hash`**: SHA-256 of the source file bytes. Survives
//!   `git checkout`, which resets modification times.
//! - **`params_hash`**: SHA-256 of everything that affects the pixels: box
//!   size, transformation token, format, quality and sharpening.
//!
//! A hit requires a matching entry whose output file still exists. A hit
//! stored under a different path is copied to the new location. Several
//! paths may hold the same content (byte-identical sources); each keeps its
//! own entry. Entries for outputs a run did not produce are dropped.
//!
//! ## Storage
//!
//! `<output_dir>/.thumbsmith-cache.json`. Pass `--no-cache` to start from an
//! empty manifest; old outputs are overwritten.

use crate::imaging::ThumbnailConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the cache manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = ".thumbsmith-cache.json";

/// Bump to invalidate every existing cache when the key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
    /// Dimensions of the written thumbnail.
    pub width: u32,
    pub height: u32,
}

/// On-disk map from output path (relative to the output directory) to the
/// hashes it was produced from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output paths holding that content.
    /// Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, Vec<String>>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the output directory. Missing, corrupt or outdated manifests
    /// load as empty.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILENAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache manifest");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            tracing::debug!(found = manifest.version, expected = MANIFEST_VERSION, "cache version changed");
            return Self::empty();
        }
        let mut content_index: HashMap<String, Vec<String>> = HashMap::new();
        for (output, e) in &manifest.entries {
            content_index
                .entry(content_key(&e.source_hash, &e.params_hash))
                .or_default()
                .push(output.clone());
        }
        for paths in content_index.values_mut() {
            paths.sort();
        }
        manifest.content_index = content_index;
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_dir.join(MANIFEST_FILENAME), json)
    }

    /// Stored output path and dimensions for these hashes, if the file is
    /// still on disk. `output_path` is preferred when it holds the content.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_path: &str,
        output_dir: &Path,
    ) -> Option<(String, (u32, u32))> {
        let paths = self
            .content_index
            .get(&content_key(source_hash, params_hash))?;
        let stored = paths
            .iter()
            .filter(|p| output_dir.join(p.as_str()).exists())
            .min_by_key(|p| p.as_str() != output_path)?;
        let entry = self.entries.get(stored)?;
        Some((stored.clone(), (entry.width, entry.height)))
    }

    /// Record an output, replacing whatever was stored under that path.
    pub fn insert(&mut self, output_path: String, entry: CacheEntry) {
        let key = content_key(&entry.source_hash, &entry.params_hash);
        if let Some(old) = self.entries.insert(output_path.clone(), entry) {
            let old_key = content_key(&old.source_hash, &old.params_hash);
            if old_key != key {
                self.unindex(&old_key, &output_path);
            }
        }
        let paths = self.content_index.entry(key).or_default();
        if !paths.contains(&output_path) {
            paths.push(output_path);
        }
    }

    /// Drop every entry whose path was not produced by the current run.
    pub fn retain_outputs(&mut self, produced: &HashSet<String>) {
        self.entries.retain(|path, _| produced.contains(path));
        self.content_index.retain(|_, paths| {
            paths.retain(|p| produced.contains(p));
            !paths.is_empty()
        });
    }

    fn unindex(&mut self, key: &str, output_path: &str) {
        if let Some(paths) = self.content_index.get_mut(key) {
            paths.retain(|p| p != output_path);
            if paths.is_empty() {
                self.content_index.remove(key);
            }
        }
    }
}

/// SHA-256 of a file's contents as hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// SHA-256 of the parameters that determine a thumbnail's pixels.
pub fn hash_thumbnail_params(config: &ThumbnailConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(config.width.to_le_bytes());
    hasher.update(config.height.to_le_bytes());
    // The token is the canonical encoding of the transformation.
    hasher.update(config.transform.encode().as_bytes());
    hasher.update(b"\0");
    hasher.update(config.format.extension().as_bytes());
    hasher.update(b"\0");
    hasher.update(config.quality.value().to_le_bytes());
    match config.sharpening {
        Some(s) => {
            hasher.update(b"\x01");
            hasher.update(s.sigma.to_le_bytes());
            hasher.update(s.threshold.to_le_bytes());
        }
        None => hasher.update(b"\x00"),
    }
    format!("{:x}", hasher.finalize())
}

/// Cache outcome of a single rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    /// Output already up to date.
    Cached,
    /// Copied from a previous output path.
    Copied,
    /// Rendered and encoded.
    Encoded,
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, outcome: CacheOutcome) {
        match outcome {
            CacheOutcome::Cached => self.hits += 1,
            CacheOutcome::Copied => self.copies += 1,
            CacheOutcome::Encoded => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hits, self.copies) {
            (0, 0) => write!(f, "{} encoded", self.misses),
            (_, 0) => write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            ),
            _ => write!(
                f,
                "{} cached, {} copied, {} encoded ({} total)",
                self.hits,
                self.copies,
                self.misses,
                self.total()
            ),
        }
    }
}
