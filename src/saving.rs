use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::account::Account;
use crate::error::{DashboardError, DashboardResult};
use crate::store::AccountStore;

/// Key the account snapshot lives under.
pub const SNAPSHOT_KEY: &str = "crm_root";

/// Opaque key/value blob storage used for durability.
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> std::io::Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, blob: &[u8]) -> std::io::Result<()>;
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    accounts: &'a [Account],
}

#[derive(Deserialize)]
struct Snapshot {
    accounts: Vec<Account>,
}

/// Encode the collection as a gzip-compressed bincode snapshot.
pub fn encode_snapshot(accounts: &[Account]) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let encoder = GzEncoder::new(&mut buffer, Compression::default());
        let mut writer = BufWriter::new(encoder);
        serialize_into(&mut writer, &SnapshotRef { accounts })
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?;
    }
    Ok(buffer)
}

pub fn decode_snapshot(blob: &[u8]) -> std::io::Result<Vec<Account>> {
    let decoder = GzDecoder::new(Cursor::new(blob));
    let mut reader = BufReader::new(decoder);

    let snapshot: Snapshot = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(snapshot.accounts)
}

/// Stores each key as `<dir>/<key>.bin.gz`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        FileSnapshotStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.bin.gz"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, blob: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");

        let mut file = fs::File::create(&tmp)?;
        file.write_all(blob)?;
        file.sync_all()?;
        fs::rename(tmp, path)
    }
}

/// In-process blob store, handy for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "snapshot lock poisoned"))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &[u8]) -> std::io::Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "snapshot lock poisoned"))?;
        blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

/// Mirror every store mutation into `backend`.
///
/// Write failures are logged and otherwise swallowed; the in-memory store
/// stays authoritative.
pub fn attach(store: &mut AccountStore, backend: Arc<dyn SnapshotStore>) {
    store.subscribe(Box::new(move |accounts| {
        let result = encode_snapshot(accounts).and_then(|blob| backend.write(SNAPSHOT_KEY, &blob));
        if let Err(e) = result {
            log::warn!("Failed to persist {} accounts: {e}", accounts.len());
        }
    }));
}

/// Replay the persisted snapshot into `store`, if one exists.
///
/// Returns the number of restored accounts, or `None` when nothing was stored.
pub fn restore(store: &mut AccountStore, backend: &dyn SnapshotStore) -> DashboardResult<Option<usize>> {
    let Some(blob) = backend.read(SNAPSHOT_KEY)? else {
        return Ok(None);
    };
    let accounts = decode_snapshot(&blob)
        .map_err(|e| DashboardError::Decode(format!("corrupt snapshot: {e}")))?;
    let count = accounts.len();
    store.hydrate(accounts);
    log::info!("Restored {count} accounts from snapshot");
    Ok(Some(count))
}

/// Build the application store: restore the snapshot (or fall back to the
/// seed set / an empty collection), then start write-through persistence.
pub fn open_store(backend: Arc<dyn SnapshotStore>, seed_when_empty: bool) -> DashboardResult<AccountStore> {
    let mut store = if seed_when_empty {
        AccountStore::with_seed()
    } else {
        AccountStore::empty()
    };

    if restore(&mut store, backend.as_ref())?.is_none() {
        log::info!("No snapshot found, starting with {} accounts", store.len());
    }

    attach(&mut store, backend);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountFields, AccountId, seed_accounts};

    fn fields(name: &str) -> AccountFields {
        AccountFields {
            name: name.to_string(),
            email: "a@b.co".to_string(),
            phone: "0123456789".to_string(),
            website: "https://b.co".to_string(),
            industry: "Media".to_string(),
            status: false,
            remark: "note".to_string(),
        }
    }

    #[test]
    fn snapshot_codec_preserves_order_and_fields() {
        let accounts = seed_accounts();
        let blob = encode_snapshot(&accounts).unwrap();
        assert_eq!(decode_snapshot(&blob).unwrap(), accounts);
    }

    #[test]
    fn garbage_blob_is_rejected() {
        assert!(decode_snapshot(b"definitely not gzip").is_err());
    }

    #[test]
    fn mutations_write_through_and_restore() {
        let backend: Arc<dyn SnapshotStore> = Arc::new(MemorySnapshotStore::new());

        let mut store = open_store(Arc::clone(&backend), true).unwrap();
        let id = store.create(fields("Persisted"));
        store.delete(AccountId(1));

        let reopened = open_store(backend, true).unwrap();
        assert_eq!(reopened.accounts(), store.accounts());
        assert!(reopened.contains(id));
        assert!(!reopened.contains(AccountId(1)));
    }

    #[test]
    fn empty_backend_without_seed_starts_empty() {
        let backend: Arc<dyn SnapshotStore> = Arc::new(MemorySnapshotStore::new());
        let store = open_store(backend, false).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileSnapshotStore::new(dir.path().join("nested"));

        assert!(backend.read(SNAPSHOT_KEY).unwrap().is_none());
        backend.write(SNAPSHOT_KEY, b"blob").unwrap();
        assert_eq!(backend.read(SNAPSHOT_KEY).unwrap().as_deref(), Some(&b"blob"[..]));
        assert!(dir.path().join("nested").join("crm_root.bin.gz").exists());
    }

    #[test]
    fn corrupt_snapshot_surfaces_decode_error() {
        let backend = MemorySnapshotStore::new();
        backend.write(SNAPSHOT_KEY, b"junk").unwrap();
        let mut store = AccountStore::empty();
        assert!(matches!(
            restore(&mut store, &backend),
            Err(DashboardError::Decode(_))
        ));
        assert!(store.is_empty());
    }
}
