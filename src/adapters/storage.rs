use crate::adapters::codec::{decode_cart, encode_cart};
use crate::domain::model::Cart;
use crate::domain::ports::{CartStore, KeyValueStore};
use crate::utils::error::{CartError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CART_KEY: &str = "cart";

/// In-process key-value store. An optional byte quota makes writes fail the
/// way a full browser storage does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(CartError::PersistenceWriteFailure {
                    message: format!("storage quota exceeded ({} > {} bytes)", needed, quota),
                });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| CartError::MalformedStoreData {
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    // 先寫入暫存檔再 rename，避免寫到一半的檔案
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // 檔案損毀時以空白內容覆寫，其他 key 會遺失
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("Store file unreadable, starting fresh: {}", e);
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).map_err(|e| CartError::PersistenceWriteFailure {
            message: e.to_string(),
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.write_entries(&entries)
                .map_err(|e| CartError::PersistenceWriteFailure {
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Cart store on top of any key-value backend, one key holding the whole cart.
#[derive(Debug, Clone)]
pub struct KeyValueCartStore<K: KeyValueStore> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> KeyValueCartStore<K> {
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, DEFAULT_CART_KEY)
    }

    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }
}

impl<K: KeyValueStore> CartStore for KeyValueCartStore<K> {
    fn load(&self) -> Cart {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                tracing::warn!("Could not read stored cart, starting empty: {}", e);
                return Cart::new();
            }
        };

        match decode_cart(&raw) {
            Ok(cart) => {
                tracing::debug!("Loaded cart with {} item(s)", cart.len());
                cart
            }
            Err(e) => {
                tracing::warn!("Stored cart is malformed, starting empty: {}", e);
                Cart::new()
            }
        }
    }

    fn save(&mut self, cart: &Cart) -> Result<()> {
        let encoded = encode_cart(cart)?;
        self.backend
            .set(&self.key, &encoded)
            .map_err(|e| match e {
                CartError::PersistenceWriteFailure { .. } => e,
                other => CartError::PersistenceWriteFailure {
                    message: other.to_string(),
                },
            })
    }

    fn clear(&mut self) -> Result<()> {
        self.backend.remove(&self.key)
    }
}
