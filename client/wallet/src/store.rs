use async_trait::async_trait;
use tokio::sync::RwLock;

use ellora_common::ClientError;

/// Key the last-connected address is stored under
const ADDRESS_KEY: &[u8] = b"wallet:last-address";

/// Best-effort persistence of the last-connected address. One string slot:
/// written on connect, removed on disconnect and on a failed restore.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>, ClientError>;
    async fn set(&self, address: &str) -> Result<(), ClientError>;
    async fn remove(&self) -> Result<(), ClientError>;
}

/// Volatile store for tests and one-shot tools
#[derive(Default)]
pub struct MemoryStore {
    slot: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn get(&self) -> Result<Option<String>, ClientError> {
        Ok(self.slot.read().await.clone())
    }

    async fn set(&self, address: &str) -> Result<(), ClientError> {
        *self.slot.write().await = Some(address.to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<(), ClientError> {
        *self.slot.write().await = None;
        Ok(())
    }
}

/// File-backed store, the moral equivalent of the browser's local storage
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: &str) -> Result<Self, ClientError> {
        let db = sled::open(path).map_err(|e| ClientError::Unknown(e.to_string()))?;
        Ok(Self { db })
    }

    /// In-memory database, dropped on close; used by tests
    pub fn temporary() -> Result<Self, ClientError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ClientError::Unknown(e.to_string()))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl AddressStore for SledStore {
    async fn get(&self) -> Result<Option<String>, ClientError> {
        let raw = self
            .db
            .get(ADDRESS_KEY)
            .map_err(|e| ClientError::Unknown(e.to_string()))?;
        Ok(raw.and_then(|bytes| String::from_utf8(bytes.to_vec()).ok()))
    }

    async fn set(&self, address: &str) -> Result<(), ClientError> {
        self.db
            .insert(ADDRESS_KEY, address.as_bytes())
            .map_err(|e| ClientError::Unknown(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), ClientError> {
        self.db
            .remove(ADDRESS_KEY)
            .map_err(|e| ClientError::Unknown(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get().await.unwrap(), None);

        store.set("ADDR").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("ADDR".to_string()));

        store.remove().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sled_store_round_trips() {
        let store = SledStore::temporary().unwrap();
        assert_eq!(store.get().await.unwrap(), None);

        store.set("ADDR").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("ADDR".to_string()));

        store.set("OTHER").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("OTHER".to_string()));

        store.remove().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }
}
