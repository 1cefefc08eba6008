//! Filesystem cache engine
//!
//! Stores each key as one file under a directory tree: the entry's expiry
//! stamp in decimal text, a newline, then the payload. Group names become
//! nested sub-directories created lazily on first write. Optional advisory
//! locking (shared for reads, exclusive for the truncate-and-rewrite
//! sequence) guards against interleaved writers; without it, concurrent
//! writers corrupting an entry is an accepted configuration tradeoff.
//!
//! Counters are not supported: the write/read path cannot guarantee
//! atomicity across processes without a coordination primitive this engine
//! does not implement, so `increment`/`decrement` fail loudly.

use crate::constants::{VCS_DIRECTORIES, WRITABILITY_PROBE_PREFIX};
use async_trait::async_trait;
use polycache_domain::error::{Error, Result};
use polycache_domain::ports::engine::{AddAtomicity, CacheEngine};
use polycache_domain::value_objects::config::EngineConfig;
use polycache_domain::value_objects::key::normalize;
use polycache_domain::value_objects::ttl::{Ttl, now_unix, stamp_expired};
use polycache_domain::value_objects::value::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Advisory file lock released on drop, on every exit path.
struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    fn exclusive(file: &'a File) -> Result<Self> {
        fs2::FileExt::lock_exclusive(file)
            .map_err(|e| Error::io_with_source("failed to acquire exclusive file lock", e))?;
        Ok(Self { file })
    }

    fn shared(file: &'a File) -> Result<Self> {
        fs2::FileExt::lock_shared(file)
            .map_err(|e| Error::io_with_source("failed to acquire shared file lock", e))?;
        Ok(Self { file })
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(self.file);
    }
}

/// Filesystem cache engine
///
/// One file per key under `path/[group/.../]<prefix><key>`; expiry is an
/// embedded unix-second stamp (0 = never). See the module docs for the
/// locking discipline.
#[derive(Debug, Clone)]
pub struct FileEngine {
    config: EngineConfig,
}

impl FileEngine {
    /// Create a filesystem engine, verifying the base directory exists
    /// (creating it when absent) and is writable.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.path).await.map_err(|e| {
            Error::initialization_with_source(
                format!("cannot create cache directory {}", config.path.display()),
                e,
            )
        })?;

        let base = config.path.clone();
        tokio::task::spawn_blocking(move || probe_writable(&base))
            .await
            .map_err(|e| Error::backend(format!("blocking task failed: {e}")))??;

        Ok(Self { config })
    }

    /// Absolute path for a raw key: base, one directory level per
    /// configured group, then the normalized (prefixed) key.
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let normalized = normalize(key, &self.config.prefix)?;
        let mut path = self.config.path.clone();
        for group in &self.config.groups {
            path.push(group);
        }
        path.push(normalized);
        Ok(path)
    }

    fn encode_payload(&self, value: &Value) -> Result<Vec<u8>> {
        if self.config.serialize {
            return value.encode();
        }
        // raw mode stores text and decimal payloads verbatim
        match value {
            Value::String(s) => Ok(s.clone().into_bytes()),
            Value::Int(n) => Ok(n.to_string().into_bytes()),
            other => Err(Error::invalid_value(format!(
                "serialize is disabled; {other:?} does not round-trip as raw text"
            ))),
        }
    }

    fn decode_payload(&self, bytes: &[u8]) -> Result<Value> {
        if self.config.serialize {
            return Value::decode(bytes);
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::corrupt_with_source("raw payload is not valid UTF-8", e))?;
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        Ok(Value::String(text.to_string()))
    }
}

#[async_trait]
impl CacheEngine for FileEngine {
    async fn write(&self, key: &str, value: &Value, ttl: Option<Ttl>) -> Result<()> {
        if value.is_empty_string() {
            return Err(Error::invalid_value(
                "filesystem backend rejects empty string values (ambiguous with a miss)",
            ));
        }

        let path = self.entry_path(key)?;
        let ttl = ttl.unwrap_or(self.config.duration);
        let expires_at = ttl.expires_at(now_unix());
        let payload = self.encode_payload(value)?;
        let lock = self.config.lock;

        tokio::task::spawn_blocking(move || write_entry(&path, expires_at, &payload, lock))
            .await
            .map_err(|e| Error::backend(format!("blocking task failed: {e}")))?
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.entry_path(key)?;
        let lock = self.config.lock;

        let entry = tokio::task::spawn_blocking(move || read_entry(&path, lock))
            .await
            .map_err(|e| Error::backend(format!("blocking task failed: {e}")))?;

        let (expires_at, payload) = match entry {
            Ok(Some(parts)) => parts,
            Ok(None) => return Ok(None),
            Err(e) if e.is_corrupt_entry() => {
                tracing::warn!(key, error = %e, "corrupt cache file treated as miss");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if stamp_expired(expires_at, now_unix()) {
            return Ok(None);
        }

        match self.decode_payload(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_corrupt_entry() => {
                tracing::warn!(key, error = %e, "corrupt cache payload treated as miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io_with_source(
                format!("failed to delete cache file {}", path.display()),
                e,
            )),
        }
    }

    async fn clear(&self, only_expired: bool) -> Result<()> {
        let base = self.config.path.clone();
        let prefix = self.config.prefix.clone();
        let duration = self.config.duration;

        let removed = tokio::task::spawn_blocking(move || {
            clear_tree(&base, &prefix, only_expired, duration)
        })
        .await
        .map_err(|e| Error::backend(format!("blocking task failed: {e}")))??;

        tracing::debug!(removed, only_expired, "cleared filesystem cache entries");
        Ok(())
    }

    async fn increment(&self, _key: &str, _offset: i64) -> Result<i64> {
        Err(Error::unsupported(
            "files cannot be atomically incremented",
        ))
    }

    async fn decrement(&self, _key: &str, _offset: i64) -> Result<i64> {
        Err(Error::unsupported(
            "files cannot be atomically decremented",
        ))
    }

    async fn groups(&self) -> Result<Vec<String>> {
        // groups are physical sub-directories, so the labels are the names
        Ok(self.config.groups.clone())
    }

    async fn clear_group(&self, group: &str) -> Result<()> {
        let base = self.config.path.clone();
        let prefix = self.config.prefix.clone();
        let group = group.to_string();

        let removed =
            tokio::task::spawn_blocking(move || clear_group_tree(&base, &prefix, &group))
                .await
                .map_err(|e| Error::backend(format!("blocking task failed: {e}")))??;

        tracing::debug!(removed, "cleared filesystem cache group");
        Ok(())
    }

    fn add_atomicity(&self) -> AddAtomicity {
        AddAtomicity::CheckThenWrite
    }

    fn engine_name(&self) -> &str {
        "filesystem"
    }
}

/// Probe that the base directory accepts writes by creating and dropping a
/// scratch file inside it.
fn probe_writable(base: &Path) -> Result<()> {
    tempfile::Builder::new()
        .prefix(WRITABILITY_PROBE_PREFIX)
        .tempfile_in(base)
        .map(drop)
        .map_err(|e| {
            Error::initialization_with_source(
                format!("cache directory {} is not writable", base.display()),
                e,
            )
        })
}

/// Truncate-and-rewrite an entry file, exclusively locked when requested.
fn write_entry(path: &Path, expires_at: i64, payload: &[u8], lock: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::io_with_source(
                format!("failed to create group directory {}", parent.display()),
                e,
            )
        })?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| {
            Error::io_with_source(format!("failed to open cache file {}", path.display()), e)
        })?;

    let guard = if lock {
        Some(FileLock::exclusive(&file)?)
    } else {
        None
    };

    // truncate under the lock, never before it
    let result = file
        .set_len(0)
        .and_then(|()| (&file).seek(SeekFrom::Start(0)).map(drop))
        .and_then(|()| (&file).write_all(format!("{expires_at}\n").as_bytes()))
        .and_then(|()| (&file).write_all(payload))
        .and_then(|()| (&file).flush())
        .map_err(|e| {
            Error::io_with_source(format!("failed to write cache file {}", path.display()), e)
        });

    drop(guard);
    result
}

/// Read an entry file into its `(expires_at, payload)` parts; `None` when
/// the file does not exist, `CorruptEntry` when the stamp line is missing
/// or unparseable.
fn read_entry(path: &Path, lock: bool) -> Result<Option<(i64, Vec<u8>)>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::io_with_source(
                format!("failed to open cache file {}", path.display()),
                e,
            ));
        }
    };

    let guard = if lock {
        Some(FileLock::shared(&file)?)
    } else {
        None
    };

    let mut contents = Vec::new();
    let read_result = (&file).read_to_end(&mut contents);
    drop(guard);
    read_result.map_err(|e| {
        Error::io_with_source(format!("failed to read cache file {}", path.display()), e)
    })?;

    parse_entry(&contents).map(Some)
}

fn parse_entry(contents: &[u8]) -> Result<(i64, Vec<u8>)> {
    let boundary = contents
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::corrupt("cache file has no expiry stamp boundary"))?;
    let stamp = std::str::from_utf8(&contents[..boundary])
        .ok()
        .and_then(|line| line.trim().parse::<i64>().ok())
        .ok_or_else(|| Error::corrupt("cache file expiry stamp is not an integer"))?;
    Ok((stamp, contents[boundary + 1..].to_vec()))
}

/// Read only the expiry stamp line, for the clear walk's second filter.
fn read_stamp(path: &Path) -> Result<i64> {
    let file = File::open(path).map_err(|e| {
        Error::io_with_source(format!("failed to open cache file {}", path.display()), e)
    })?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).map_err(|e| {
        Error::io_with_source(format!("failed to read cache file {}", path.display()), e)
    })?;
    line.trim()
        .parse::<i64>()
        .map_err(|_| Error::corrupt("cache file expiry stamp is not an integer"))
}

fn skip_in_walk(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || VCS_DIRECTORIES.contains(&name.as_ref())
}

/// Unix mtime of a walked file, when the platform exposes it.
fn entry_mtime(entry: &walkdir::DirEntry) -> Option<i64> {
    let modified = entry.metadata().ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs() as i64)
}

/// Depth-first walk deleting this engine's entries; lazy iteration keeps
/// memory bounded on large caches, and every physical path is visited
/// exactly once.
fn clear_tree(base: &Path, prefix: &str, only_expired: bool, duration: Ttl) -> Result<usize> {
    let now = now_unix();
    // files younger than one default duration cannot have expired yet
    let mtime_threshold = now - duration.as_secs() as i64;
    let mut removed = 0usize;

    let walker = WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !skip_in_walk(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry during cache clear");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }

        if only_expired {
            if let Some(mtime) = entry_mtime(&entry) {
                if mtime > mtime_threshold {
                    continue;
                }
            }
            match read_stamp(entry.path()) {
                Ok(stamp) if !stamp_expired(stamp, now) => continue,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e,
                        "skipping unreadable entry during cache clear");
                    continue;
                }
            }
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e,
                    "failed to delete cache file during clear");
            }
        }
    }

    Ok(removed)
}

/// Delete every file whose path contains `group` as a segment and whose
/// name carries the engine prefix.
fn clear_group_tree(base: &Path, prefix: &str, group: &str) -> Result<usize> {
    let mut removed = 0usize;

    let walker = WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !skip_in_walk(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry during group clear");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let in_group = entry
            .path()
            .strip_prefix(base)
            .map(|relative| relative.components().any(|c| c.as_os_str() == group))
            .unwrap_or(false);
        if !in_group {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e,
                    "failed to delete cache file during group clear");
            }
        }
    }

    Ok(removed)
}
