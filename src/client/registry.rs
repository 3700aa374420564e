//! Client registry
//!
//! A fixed-capacity slot table of connected clients behind a single mutex.
//! Slots are scanned in index order; the table never grows.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use tokio::sync::Mutex;

use crate::client::{ClientId, ClientRecord, DisplayName};
use crate::error::RegistryError;

/// Default number of slots.
pub const MAX_CLIENTS: usize = 100;

struct SlotTable {
    slots: Vec<Option<ClientRecord>>,
    occupied: usize,
}

impl SlotTable {
    fn position(&self, id: ClientId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|r| r.id() == id))
    }
}

/// Registry for tracking connected clients
pub struct ClientRegistry {
    table: Mutex<SlotTable>,
    // Written only while `table` is locked.
    live: AtomicUsize,
    capacity: usize,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CLIENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(SlotTable {
                slots: vec![None; capacity],
                occupied: 0,
            }),
            live: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Stores `record` in the first empty slot and returns the slot index.
    pub async fn add(&self, record: ClientRecord) -> Result<usize, RegistryError> {
        let mut table = self.table.lock().await;

        if table.position(record.id()).is_some() {
            return Err(RegistryError::DuplicateId(record.id()));
        }

        let index = table
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(RegistryError::Full {
                capacity: self.capacity,
            })?;

        debug!("Client {} stored in slot {}", record.id(), index);
        table.slots[index] = Some(record);
        table.occupied += 1;
        self.live.store(table.occupied, Ordering::Release);

        Ok(index)
    }

    /// Clears the first slot holding `id` and returns its record.
    pub async fn remove(&self, id: ClientId) -> Result<ClientRecord, RegistryError> {
        let mut table = self.table.lock().await;

        let index = table.position(id).ok_or(RegistryError::NotFound(id))?;
        let record = table.slots[index]
            .take()
            .ok_or(RegistryError::NotFound(id))?;
        table.occupied -= 1;
        self.live.store(table.occupied, Ordering::Release);

        debug!("Client {} cleared from slot {}", id, index);
        Ok(record)
    }

    /// Records the display name chosen during the handshake.
    pub async fn set_display_name(
        &self,
        id: ClientId,
        name: DisplayName,
    ) -> Result<(), RegistryError> {
        let mut table = self.table.lock().await;
        let index = table.position(id).ok_or(RegistryError::NotFound(id))?;
        match table.slots[index].as_mut() {
            Some(record) => {
                record.set_display_name(name);
                Ok(())
            }
            None => Err(RegistryError::NotFound(id)),
        }
    }

    /// Returns a copy of the record registered under `id`.
    pub async fn get(&self, id: ClientId) -> Option<ClientRecord> {
        let table = self.table.lock().await;
        table
            .position(id)
            .and_then(|index| table.slots[index].clone())
    }

    /// Copies every occupied slot, in slot order.
    pub async fn snapshot(&self) -> Vec<ClientRecord> {
        let table = self.table.lock().await;
        table.slots.iter().flatten().cloned().collect()
    }

    /// Exact number of occupied slots.
    pub async fn len(&self) -> usize {
        self.table.lock().await.occupied
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lock-free read of the occupied-slot count. May be stale by the time
    /// the caller acts on it.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Advisory check against `live_count`.
    pub fn is_full(&self) -> bool {
        self.live_count() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::sync::Arc;

    fn record(id: u64) -> ClientRecord {
        let addr: SocketAddr = format!("127.0.0.1:{}", 40000 + id).parse().unwrap();
        ClientRecord::new(ClientId(id), addr)
    }

    #[tokio::test]
    async fn add_uses_first_empty_slot() {
        let registry = ClientRegistry::with_capacity(3);
        assert_eq!(registry.add(record(10)).await, Ok(0));
        assert_eq!(registry.add(record(11)).await, Ok(1));
        assert_eq!(registry.add(record(12)).await, Ok(2));

        registry.remove(ClientId(11)).await.unwrap();
        assert_eq!(registry.add(record(13)).await, Ok(1));
        assert_eq!(registry.live_count(), 3);
    }

    #[tokio::test]
    async fn add_to_full_table_is_reported() {
        let registry = ClientRegistry::with_capacity(2);
        registry.add(record(10)).await.unwrap();
        registry.add(record(11)).await.unwrap();

        assert!(registry.is_full());
        assert_eq!(
            registry.add(record(12)).await,
            Err(RegistryError::Full { capacity: 2 })
        );
        assert_eq!(registry.len().await, 2);
        assert!(registry.get(ClientId(12)).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_refused() {
        let registry = ClientRegistry::with_capacity(4);
        registry.add(record(10)).await.unwrap();
        assert_eq!(
            registry.add(record(10)).await,
            Err(RegistryError::DuplicateId(ClientId(10)))
        );
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn removing_absent_id_leaves_other_slots_alone() {
        let registry = ClientRegistry::with_capacity(4);
        registry.add(record(10)).await.unwrap();
        registry.add(record(11)).await.unwrap();

        let removed = registry.remove(ClientId(10)).await.unwrap();
        assert_eq!(removed.id(), ClientId(10));

        assert_eq!(
            registry.remove(ClientId(10)).await,
            Err(RegistryError::NotFound(ClientId(10)))
        );
        assert_eq!(
            registry.remove(ClientId(99)).await,
            Err(RegistryError::NotFound(ClientId(99)))
        );

        let remaining = registry.snapshot().await;
        assert_eq!(remaining, vec![record(11)]);
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test]
    async fn display_name_is_stored_in_slot() {
        let registry = ClientRegistry::with_capacity(2);
        registry.add(record(10)).await.unwrap();
        let name = DisplayName::parse(b"al\n").unwrap();

        registry.set_display_name(ClientId(10), name.clone()).await.unwrap();
        let stored = registry.get(ClientId(10)).await.unwrap();
        assert_eq!(stored.display_name(), Some(&name));

        assert_eq!(
            registry.set_display_name(ClientId(11), name).await,
            Err(RegistryError::NotFound(ClientId(11)))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_add_remove_keeps_ids_unique() {
        let registry = Arc::new(ClientRegistry::with_capacity(MAX_CLIENTS));
        let mut tasks = Vec::new();

        for id in 0..400u64 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                if registry.add(record(id)).await.is_ok() {
                    tokio::task::yield_now().await;
                    let snapshot = registry.snapshot().await;
                    let unique: HashSet<ClientId> = snapshot.iter().map(|r| r.id()).collect();
                    assert_eq!(unique.len(), snapshot.len());
                    assert!(snapshot.len() <= MAX_CLIENTS);
                    registry.remove(ClientId(id)).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(registry.is_empty().await);
        assert_eq!(registry.live_count(), 0);
    }
}
