//! Bounded FIFO cache in front of an `AudioProbe`.
//!
//! Several gates read the same file (format, duration, silence, loudness);
//! decoding once per file per process is enough. Keys include the file's
//! length and mtime so a regenerated file is decoded again.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use rustc_hash::FxHashMap;

use reelgate_core::errors::GateError;

use super::probe::{AudioMetadata, AudioProbe, DecodedAudio};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl CacheKey {
    fn for_path(path: &Path) -> Self {
        let meta = std::fs::metadata(path).ok();
        Self {
            path: path.to_path_buf(),
            len: meta.as_ref().map(|m| m.len()).unwrap_or(0),
            modified: meta.and_then(|m| m.modified().ok()),
        }
    }
}

/// Insertion-ordered store; the oldest entry goes first when full.
#[derive(Debug)]
struct FifoStore<V> {
    map: FxHashMap<CacheKey, V>,
    order: VecDeque<CacheKey>,
    max_entries: usize,
}

impl<V: Clone> FifoStore<V> {
    fn new(max_entries: usize) -> Self {
        Self {
            map: FxHashMap::default(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<V> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, value: V) {
        if self.map.contains_key(&key) {
            self.map.insert(key, value);
            return;
        }
        while self.order.len() >= self.max_entries {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Counters for one store, exported as `audio_cache_*{kind}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub kind: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct DecodeCache {
    inner: Arc<dyn AudioProbe>,
    metadata: Mutex<FifoStore<AudioMetadata>>,
    samples: Mutex<FifoStore<Arc<DecodedAudio>>>,
    metadata_counters: Counters,
    samples_counters: Counters,
}

impl DecodeCache {
    pub fn new(inner: Arc<dyn AudioProbe>, max_entries: usize) -> Self {
        Self {
            inner,
            metadata: Mutex::new(FifoStore::new(max_entries)),
            samples: Mutex::new(FifoStore::new(max_entries)),
            metadata_counters: Counters::default(),
            samples_counters: Counters::default(),
        }
    }

    pub fn stats(&self) -> Vec<CacheStats> {
        vec![
            CacheStats {
                kind: "metadata",
                hits: self.metadata_counters.hits.load(Ordering::Relaxed),
                misses: self.metadata_counters.misses.load(Ordering::Relaxed),
                entries: store_len(&self.metadata),
            },
            CacheStats {
                kind: "samples",
                hits: self.samples_counters.hits.load(Ordering::Relaxed),
                misses: self.samples_counters.misses.load(Ordering::Relaxed),
                entries: store_len(&self.samples),
            },
        ]
    }
}

fn store_len<V: Clone>(m: &Mutex<FifoStore<V>>) -> u64 {
    m.lock().map(|s| s.len() as u64).unwrap_or(0)
}

/// Look up `key`, else compute outside the lock and insert. Errors are not
/// cached.
fn get_or_load<V: Clone>(
    store: &Mutex<FifoStore<V>>,
    counters: &Counters,
    key: CacheKey,
    load: impl FnOnce() -> Result<V, GateError>,
) -> Result<V, GateError> {
    let cached = store.lock().ok().and_then(|s| s.get(&key));
    if let Some(v) = cached {
        counters.hits.fetch_add(1, Ordering::Relaxed);
        return Ok(v);
    }
    counters.misses.fetch_add(1, Ordering::Relaxed);
    let value = load()?;
    if let Ok(mut s) = store.lock() {
        s.insert(key, value.clone());
    }
    Ok(value)
}

impl AudioProbe for DecodeCache {
    fn metadata(&self, path: &Path) -> Result<AudioMetadata, GateError> {
        get_or_load(
            &self.metadata,
            &self.metadata_counters,
            CacheKey::for_path(path),
            || self.inner.metadata(path),
        )
    }

    fn samples(&self, path: &Path) -> Result<Arc<DecodedAudio>, GateError> {
        get_or_load(
            &self.samples,
            &self.samples_counters,
            CacheKey::for_path(path),
            || self.inner.samples(path),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingProbe {
        calls: AtomicUsize,
    }

    impl AudioProbe for CountingProbe {
        fn metadata(&self, _path: &Path) -> Result<AudioMetadata, GateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AudioMetadata {
                sample_rate: 16_000,
                channels: 1,
                frames: 16_000,
                bits_per_sample: 16,
                format: "test".to_string(),
            })
        }

        fn samples(&self, _path: &Path) -> Result<Arc<DecodedAudio>, GateError> {
            Err(GateError::DecoderUnavailable("test".to_string()))
        }
    }

    #[test]
    fn fifo_evicts_oldest() {
        let mut store = FifoStore::new(2);
        let k = |n: &str| CacheKey {
            path: PathBuf::from(n),
            len: 0,
            modified: None,
        };
        store.insert(k("a"), 1);
        store.insert(k("b"), 2);
        assert_eq!(store.get(&k("a")), Some(1));
        store.insert(k("c"), 3);
        // FIFO, not LRU: "a" goes even though it was just read.
        assert_eq!(store.get(&k("a")), None);
        assert_eq!(store.get(&k("b")), Some(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn counts_hits_and_misses_and_skips_errors() {
        let inner = Arc::new(CountingProbe {
            calls: AtomicUsize::new(0),
        });
        let cache = DecodeCache::new(inner.clone(), 8);
        let p = Path::new("/nonexistent/a.wav");
        cache.metadata(p).unwrap();
        cache.metadata(p).unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert!(cache.samples(p).is_err());
        assert!(cache.samples(p).is_err());

        let stats = cache.stats();
        assert_eq!(stats[0].hits, 1);
        assert_eq!(stats[0].misses, 1);
        assert_eq!(stats[0].entries, 1);
        assert_eq!(stats[1].misses, 2);
        assert_eq!(stats[1].entries, 0);
        assert!((stats[0].hit_rate() - 0.5).abs() < 1e-9);
    }
}
