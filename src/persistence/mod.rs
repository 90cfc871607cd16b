//! Save payload persistence
//!
//! Features:
//! - Versioned JSON payload `{ version, bestScore, walletCoins, upgrades }`
//! - Field-by-field recovery: a bad field falls back to its default, the rest survive
//! - Pluggable storage backends (memory, file)

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::progress::MetaProgress;

/// Current save payload version
pub const SAVE_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePayload<'a> {
    version: u32,
    #[serde(flatten)]
    progress: &'a MetaProgress,
}

/// Serialize progress into a save payload
pub fn encode(progress: &MetaProgress) -> String {
    let payload = SavePayload {
        version: SAVE_VERSION,
        progress,
    };
    // Plain data with string keys always serializes
    serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
}

/// Parse a save payload, recovering whatever fields are valid
pub fn decode(json: &str) -> MetaProgress {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Save payload unreadable, starting fresh: {}", e);
            return MetaProgress::default();
        }
    };
    decode_value(&value)
}

/// Field-by-field decode of an already parsed payload
pub fn decode_value(value: &Value) -> MetaProgress {
    let Some(object) = value.as_object() else {
        log::warn!("Save payload is not an object, starting fresh");
        return MetaProgress::default();
    };

    if let Some(version) = object.get("version").and_then(Value::as_u64) {
        if version > u64::from(SAVE_VERSION) {
            log::warn!("Save payload version {} is newer than {}", version, SAVE_VERSION);
        }
    }

    let best_score = object
        .get("bestScore")
        .and_then(|v| {
            v.as_u64().or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.floor() as u64)
            })
        })
        .unwrap_or(0);

    let wallet_coins = object
        .get("walletCoins")
        .and_then(Value::as_f64)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .unwrap_or(0.0);

    let upgrades = object
        .get("upgrades")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(branch, level)| {
                    let level = u32::try_from(level.as_u64()?).ok()?;
                    Some((branch.clone(), level))
                })
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    MetaProgress {
        best_score,
        wallet_coins,
        upgrades,
    }
}

/// Where save payloads live
pub trait SaveStore {
    /// Raw payload, `None` if nothing was saved yet
    fn load(&self) -> Option<String>;
    fn save(&mut self, payload: &str) -> io::Result<()>;
}

/// In-memory store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    payload: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.payload.clone()
    }

    fn save(&mut self, payload: &str) -> io::Result<()> {
        self.payload = Some(payload.to_string());
        Ok(())
    }
}

/// Store backed by a JSON file; writes go through a temp file then rename
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Some(json),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read save {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&mut self, payload: &str) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, payload)?;
        std::fs::rename(&tmp, &self.path)
    }
}

/// Load progress from a store, defaulting when empty
pub fn load_progress(store: &dyn SaveStore) -> MetaProgress {
    match store.load() {
        Some(json) => {
            let progress = decode(&json);
            log::info!(
                "Loaded progress: best {}, wallet {}, {} upgrades",
                progress.best_score,
                progress.wallet_coins,
                progress.upgrades.len()
            );
            progress
        }
        None => {
            log::info!("No save found, starting fresh");
            MetaProgress::default()
        }
    }
}

/// Write progress to a store; failures are logged, never fatal
pub fn save_progress(store: &mut dyn SaveStore, progress: &MetaProgress) -> bool {
    match store.save(&encode(progress)) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to persist progress: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetaProgress {
        MetaProgress {
            best_score: 680,
            wallet_coins: 42.5,
            upgrades: BTreeMap::from([("aegis".to_string(), 2), ("keel".to_string(), 1)]),
        }
    }

    #[test]
    fn test_round_trip() {
        let progress = sample();
        let json = encode(&progress);
        assert!(json.contains("\"bestScore\":680"));
        assert!(json.contains("\"version\":1"));
        assert_eq!(decode(&json), progress);
    }

    #[test]
    fn test_bad_fields_fall_back_individually() {
        let json = r#"{
            "version": 1,
            "bestScore": "lots",
            "walletCoins": 17.5,
            "upgrades": { "aegis": 2, "keel": "max", "sling": -1 }
        }"#;
        let progress = decode(json);
        assert_eq!(progress.best_score, 0);
        assert_eq!(progress.wallet_coins, 17.5);
        assert_eq!(progress.upgrades, BTreeMap::from([("aegis".to_string(), 2)]));
    }

    #[test]
    fn test_missing_fields_default() {
        let progress = decode(r#"{ "bestScore": 90 }"#);
        assert_eq!(progress.best_score, 90);
        assert_eq!(progress.wallet_coins, 0.0);
        assert!(progress.upgrades.is_empty());
    }

    #[test]
    fn test_garbage_payload_defaults() {
        assert_eq!(decode("not json at all"), MetaProgress::default());
        assert_eq!(decode("[1, 2, 3]"), MetaProgress::default());
        assert_eq!(decode(r#"{ "walletCoins": -5 }"#).wallet_coins, 0.0);
    }

    /// Store whose writes always fail
    struct FailingStore;

    impl SaveStore for FailingStore {
        fn load(&self) -> Option<String> {
            None
        }

        fn save(&mut self, _payload: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_failed_write_is_swallowed() {
        let mut store = FailingStore;
        assert!(!save_progress(&mut store, &sample()));
        assert_eq!(load_progress(&store), MetaProgress::default());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(load_progress(&store), MetaProgress::default());
        assert!(save_progress(&mut store, &sample()));
        assert_eq!(load_progress(&store), sample());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("charon-run-save-{}.json", std::process::id()));
        let mut store = FileStore::new(&path);
        assert!(store.load().is_none());
        assert!(save_progress(&mut store, &sample()));
        assert_eq!(load_progress(&store), sample());
        let _ = std::fs::remove_file(&path);
    }
}
